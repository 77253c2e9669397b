use std::fmt;
use std::str::FromStr;

use error::{ConnectionError, ConnectionResult};
use hash::{self, HashAlgorithm};

/// Slice of implemented key exchange algorithms, ordered by preference
pub static KEY_EXCHANGE: &[KeyExchangeAlgorithm] = &[
    KeyExchangeAlgorithm::DH_GROUP_EXCHANGE_SHA256,
    KeyExchangeAlgorithm::DH_GROUP_EXCHANGE_SHA1,
];

/// Slice of implemented host key algorithms, ordered by preference
pub static HOST_KEY: &[PublicKeyAlgorithm] = &[PublicKeyAlgorithm::SSH_ED25519];

// Advertised in KEXINIT only. Switching to the negotiated ciphers happens
// after NEWKEYS, which is up to the caller of the key exchange.
pub static ENCRYPTION: &[&str] = &["aes256-ctr"];
pub static MAC: &[&str] = &["hmac-sha2-256"];
pub static COMPRESSION: &[&str] = &["none"];

/// Find the best matching algorithm
pub fn negotiate<A: PartialEq + Copy>(server: &[A], client: &[A])
    -> ConnectionResult<A> {
    for algorithm in client.iter() {
        if server.iter().any(|a| a == algorithm) {
            return Ok(*algorithm);
        }
    }
    Err(ConnectionError::NegotiationError)
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(non_camel_case_types)]
pub enum KeyExchangeAlgorithm {
    DH_GROUP_EXCHANGE_SHA256,
    DH_GROUP_EXCHANGE_SHA1,
}

impl KeyExchangeAlgorithm {
    /// Hash function the exchange hash is computed with
    pub fn hash(&self) -> &'static HashAlgorithm {
        match self
        {
            &KeyExchangeAlgorithm::DH_GROUP_EXCHANGE_SHA256 => &hash::SHA256,
            &KeyExchangeAlgorithm::DH_GROUP_EXCHANGE_SHA1 => &hash::SHA1,
        }
    }
}

impl FromStr for KeyExchangeAlgorithm {
    type Err = ();
    fn from_str(s: &str) -> Result<KeyExchangeAlgorithm, ()> {
        use self::KeyExchangeAlgorithm::*;
        match s
        {
            "diffie-hellman-group-exchange-sha256" => Ok(
                DH_GROUP_EXCHANGE_SHA256,
            ),
            "diffie-hellman-group-exchange-sha1" => Ok(DH_GROUP_EXCHANGE_SHA1),
            _ => {
                trace!("Unsupported kex algorithm: {}", s);
                Err(())
            }
        }
    }
}

impl fmt::Display for KeyExchangeAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::KeyExchangeAlgorithm::*;
        f.write_str(match self
        {
            &DH_GROUP_EXCHANGE_SHA256 => "diffie-hellman-group-exchange-sha256",
            &DH_GROUP_EXCHANGE_SHA1 => "diffie-hellman-group-exchange-sha1",
        })
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(non_camel_case_types)]
pub enum PublicKeyAlgorithm {
    SSH_ED25519,
}

impl FromStr for PublicKeyAlgorithm {
    type Err = ();
    fn from_str(s: &str) -> Result<PublicKeyAlgorithm, ()> {
        match s
        {
            "ssh-ed25519" => Ok(PublicKeyAlgorithm::SSH_ED25519),
            _ => {
                trace!("Unsupported host key algorithm: {}", s);
                Err(())
            }
        }
    }
}

impl fmt::Display for PublicKeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self
        {
            &PublicKeyAlgorithm::SSH_ED25519 => "ssh-ed25519",
        })
    }
}
