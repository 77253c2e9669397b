use std::io::{self, Read, Write};

use algorithm::PublicKeyAlgorithm;

mod ed25519;

pub use self::ed25519::ED25519;

/// A host key. Servers hold the private half and sign the exchange hash,
/// clients decode the public half from the key exchange reply and verify.
pub trait KeyPair: Send + Sync {
    fn system(&self) -> &'static CryptoSystem;

    fn has_private(&self) -> bool;

    /// Verify an encoded signature blob. `Err` means the blob is malformed.
    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, ()>;
    /// Sign `data` and return the encoded signature blob
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, ()>;

    /// Write the public key blob (key type followed by key data)
    fn write_public(&self, w: &mut dyn Write) -> io::Result<()>;
    fn export(&self, w: &mut dyn Write) -> io::Result<()>;

    fn public_blob(&self) -> io::Result<Vec<u8>> {
        let mut blob = Vec::new();
        self.write_public(&mut blob)?;
        Ok(blob)
    }
}

pub struct CryptoSystem {
    pub id: &'static str,
    pub generate_key_pair: fn(bits: Option<u32>) -> Box<dyn KeyPair>,
    pub import: fn(r: &mut dyn Read) -> io::Result<Box<dyn KeyPair>>,
    /// Read the key data that follows the key type in a public key blob
    pub read_public: fn(r: &mut dyn Read) -> io::Result<Box<dyn KeyPair>>,
    /// Decode a complete public key blob as sent on the wire
    pub decode_public: fn(blob: &[u8]) -> io::Result<Box<dyn KeyPair>>,
}

/// The crypto system implementing a negotiated host key algorithm
pub fn system(algorithm: PublicKeyAlgorithm) -> &'static CryptoSystem {
    match algorithm
    {
        PublicKeyAlgorithm::SSH_ED25519 => &ED25519,
    }
}
