use std::fmt;

use crypto::digest::Digest;
use crypto::sha1::Sha1;
use crypto::sha2::Sha256;

/// A hash function selected by name at algorithm negotiation.
pub struct HashAlgorithm {
    pub id: &'static str,
    /// Digest length in bytes
    pub size: usize,
    /// Hash the concatenation of all given slices
    pub digest: fn(data: &[&[u8]]) -> Vec<u8>,
}

pub static SHA1: HashAlgorithm = HashAlgorithm {
    id: "sha1",
    size: 20,
    digest: sha1,
};

pub static SHA256: HashAlgorithm = HashAlgorithm {
    id: "sha256",
    size: 32,
    digest: sha256,
};

impl HashAlgorithm {
    pub fn hash(&self, data: &[&[u8]]) -> Vec<u8> {
        (self.digest)(data)
    }
}

impl fmt::Debug for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HashAlgorithm({})", self.id)
    }
}

fn run<D: Digest>(mut hasher: D, data: &[&[u8]]) -> Vec<u8> {
    for item in data {
        hasher.input(item);
    }

    let mut hash = vec![0; hasher.output_bytes()];
    hasher.result(&mut hash);
    hash
}

fn sha1(data: &[&[u8]]) -> Vec<u8> {
    run(Sha1::new(), data)
}

fn sha256(data: &[&[u8]]) -> Vec<u8> {
    run(Sha256::new(), data)
}
