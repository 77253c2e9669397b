use std::io::{self, Read, Write};
use std::io::ErrorKind::InvalidData;

use crypto::ed25519;
use rand::{self, RngCore};
use zeroize::Zeroize;

use packet::{ReadPacketExt, WritePacketExt};
use public_key::{CryptoSystem, KeyPair};

pub static ED25519: CryptoSystem = CryptoSystem {
    id: "ssh-ed25519",
    generate_key_pair: Ed25519KeyPair::generate,
    import: Ed25519KeyPair::import,
    read_public: Ed25519KeyPair::read_public,
    decode_public: Ed25519KeyPair::decode_public,
};

struct Ed25519KeyPair {
    private: Option<[u8; 64]>,
    public: [u8; 32],
}

impl Ed25519KeyPair {
    fn generate(_: Option<u32>) -> Box<dyn KeyPair> {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);

        let (private, public) = ed25519::keypair(&seed);
        seed.zeroize();

        Box::new(Ed25519KeyPair {
            private: Some(private),
            public: public,
        })
    }

    fn import(mut r: &mut dyn Read) -> io::Result<Box<dyn KeyPair>> {
        if r.read_utf8()? != "ssh-ed25519" {
            return Err(io::Error::new(InvalidData, "not a ED25519 key"));
        }

        if r.read_uint32()? != 32 {
            return Err(io::Error::new(InvalidData, "invalid ED25519 key"));
        }

        let mut public = [0u8; 32];
        r.read_exact(&mut public)?;

        if r.read_uint32()? != 64 {
            return Err(io::Error::new(InvalidData, "invalid ED25519 key"));
        }

        let mut private = [0u8; 64];
        r.read_exact(&mut private)?;

        Ok(Box::new(Ed25519KeyPair {
            public: public,
            private: Some(private),
        }))
    }

    fn read_public(mut r: &mut dyn Read) -> io::Result<Box<dyn KeyPair>> {
        if r.read_uint32()? != 32 {
            return Err(io::Error::new(InvalidData, "invalid ED25519 key"));
        }

        let mut public = [0u8; 32];
        r.read_exact(&mut public)?;

        Ok(Box::new(Ed25519KeyPair {
            private: None,
            public: public,
        }))
    }

    fn decode_public(mut blob: &[u8]) -> io::Result<Box<dyn KeyPair>> {
        if blob.read_utf8()? != "ssh-ed25519" {
            return Err(io::Error::new(InvalidData, "not a ED25519 key"));
        }

        let key = Ed25519KeyPair::read_public(&mut blob)?;

        if !blob.is_empty() {
            return Err(io::Error::new(InvalidData, "trailing key data"));
        }

        Ok(key)
    }
}

impl KeyPair for Ed25519KeyPair {
    fn system(&self) -> &'static CryptoSystem {
        &ED25519
    }

    fn has_private(&self) -> bool {
        self.private.is_some()
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool, ()> {
        let mut reader = signature;

        let id = reader.read_utf8().map_err(|_| ())?;
        let signature = reader.read_string().map_err(|_| ())?;

        if id != "ssh-ed25519" || signature.len() != 64 || !reader.is_empty() {
            return Err(());
        }

        Ok(ed25519::verify(data, &self.public, &signature))
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, ()> {
        if let Some(ref private_key) = self.private {
            let signature = ed25519::signature(data, private_key);

            let mut blob = Vec::new();
            blob.write_string("ssh-ed25519").map_err(|_| ())?;
            blob.write_bytes(&signature).map_err(|_| ())?;
            Ok(blob)
        } else {
            Err(())
        }
    }

    fn write_public(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_string("ssh-ed25519")?;
        w.write_bytes(&self.public)
    }

    fn export(&self, w: &mut dyn Write) -> io::Result<()> {
        w.write_string("ssh-ed25519")?;
        w.write_bytes(&self.public)?;
        if let Some(ref private_key) = self.private {
            w.write_bytes(private_key)?;
        }
        Ok(())
    }
}

impl Drop for Ed25519KeyPair {
    fn drop(&mut self) {
        if let Some(ref mut private_key) = self.private {
            private_key.zeroize();
        }
    }
}
