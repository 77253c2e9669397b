extern crate rand;
extern crate ssh;

use std::io::Cursor;

use rand::Rng;
use ssh::packet::WritePacketExt;
use ssh::public_key::{self, CryptoSystem, KeyPair};

fn test_export_import(keypair: &Box<dyn KeyPair>) -> Box<dyn KeyPair> {
    // Export the keypair to a vector and import it again
    let mut buffer = Vec::new();
    keypair.export(&mut buffer).unwrap();
    (keypair.system().import)(&mut Cursor::new(buffer)).unwrap()
}

fn test_crypto_system(system: &CryptoSystem, key_size: Option<u32>) {
    // Generate a key pair
    let keypair = (system.generate_key_pair)(key_size);
    assert!(keypair.has_private());

    // Export and import that key pair again
    let keypair2 = test_export_import(&keypair);

    // Generate a random message
    let mut buffer = [0; 4096];
    rand::thread_rng().fill(&mut buffer[..]);

    // Sign the message and verify it
    let signature = keypair.sign(&buffer).unwrap();
    let verified = keypair2.verify(&buffer, signature.as_slice()).unwrap();
    assert!(verified);

    // Corrupt random message and try again
    buffer[2342] = !buffer[2342];
    let verified = keypair2.verify(&buffer, signature.as_slice()).unwrap();
    assert!(!verified);
}

#[test]
fn test_ed25519() {
    test_crypto_system(&public_key::ED25519, None);
}

#[test]
fn test_decode_public_blob() {
    let keypair = (public_key::ED25519.generate_key_pair)(None);
    let blob = keypair.public_blob().unwrap();

    let public = (public_key::ED25519.decode_public)(&blob).unwrap();
    assert!(!public.has_private());
    assert_eq!(public.public_blob().unwrap(), blob);

    // A public key verifies but cannot sign
    let signature = keypair.sign(b"exchange hash").unwrap();
    assert_eq!(public.verify(b"exchange hash", &signature), Ok(true));
    assert!(public.sign(b"exchange hash").is_err());
}

#[test]
fn test_decode_public_rejects_malformed_blobs() {
    let keypair = (public_key::ED25519.generate_key_pair)(None);
    let blob = keypair.public_blob().unwrap();
    let decode = public_key::ED25519.decode_public;

    // Truncated anywhere
    for len in 0..blob.len() {
        assert!(decode(&blob[..len]).is_err(), "accepted {} bytes", len);
    }

    // Trailing data
    let mut long = blob.clone();
    long.push(0);
    assert!(decode(&long).is_err());

    // Wrong key type
    let mut other = Vec::new();
    other.write_string("ssh-rsa").unwrap();
    other.write_bytes(&[0; 32]).unwrap();
    assert!(decode(&other).is_err());
}

#[test]
fn test_verify_rejects_malformed_signatures() {
    let keypair = (public_key::ED25519.generate_key_pair)(None);
    let signature = keypair.sign(b"data").unwrap();

    // Raw signature without the blob framing
    assert_eq!(keypair.verify(b"data", &signature[signature.len() - 64..]), Err(()));

    // Truncated blob
    assert_eq!(keypair.verify(b"data", &signature[..signature.len() - 1]), Err(()));

    // Wrong signature type
    let mut other = Vec::new();
    other.write_string("ssh-rsa").unwrap();
    other.write_bytes(&signature[signature.len() - 64..]).unwrap();
    assert_eq!(keypair.verify(b"data", &other), Err(()));
}
