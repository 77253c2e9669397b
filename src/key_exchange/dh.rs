use num_bigint::{BigUint, RandBigInt};
use num_traits::One;
use rand;
use zeroize::Zeroizing;

use error::KexError;
use key_exchange::group::Group;
use packet::mpint_bytes;

/// The shared secret K, mpint encoded, wiped on drop
pub type SharedSecret = Zeroizing<Vec<u8>>;

/// Ephemeral Diffie-Hellman key pair for one handshake.
///
/// The private exponent only lives as big endian bytes in a buffer that is
/// wiped on drop. Temporaries inside the big integer arithmetic are not.
pub struct DhKeyPair {
    private: Zeroizing<Vec<u8>>,
    public: BigUint,
}

impl DhKeyPair {
    /// Pick a private exponent in `[2, p - 2]` and compute `g^x mod p`
    pub fn generate(group: &Group) -> Result<DhKeyPair, KexError> {
        let two = BigUint::from(2u32);

        if group.p <= BigUint::from(3u32) {
            return Err(KexError::Crypto("group modulus too small"));
        }

        let x = rand::thread_rng().gen_biguint_range(&two, &(&group.p - 1u32));
        let public = group.g.modpow(&x, &group.p);

        if public <= BigUint::one() {
            return Err(KexError::Crypto("degenerate public value"));
        }

        Ok(DhKeyPair {
            private: Zeroizing::new(x.to_bytes_be()),
            public: public,
        })
    }

    pub fn public(&self) -> &BigUint {
        &self.public
    }

    /// `peer^x mod p`, after checking `1 < peer < p - 1`
    pub fn compute_shared_secret(&self, group: &Group, peer: &BigUint)
        -> Result<SharedSecret, KexError> {
        let one = BigUint::one();

        if *peer <= one || *peer >= &group.p - 1u32 {
            return Err(KexError::Crypto("peer public value out of range"));
        }

        let x = BigUint::from_bytes_be(&self.private);
        let k = peer.modpow(&x, &group.p);

        if k <= one {
            return Err(KexError::Crypto("degenerate shared secret"));
        }

        Ok(Zeroizing::new(mpint_bytes(&k)))
    }
}
