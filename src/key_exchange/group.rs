use std::cmp;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{self, Rng};

use error::KexError;
use packet::ReadPacketExt;

pub const DH_GROUP_MIN: u32 = 1024;
pub const DH_GROUP_MAX: u32 = 8192;

/// Embedded 1024 bit test prime and generator 2, encoded as two mpints
#[cfg_attr(rustfmt, rustfmt_skip)]
static TEST_PRIME_AND_GENERATOR: &[u8] = &[
    0x00, 0x00, 0x00, 0x81, 0x00, 0xe3, 0x1d, 0xfe, 0x85, 0x59, 0x9b, 0xcb, 0x5c, 0x2b, 0xbe, 0xcf,
    0x20, 0x1f, 0x5f, 0x49, 0xf1, 0xea, 0x31, 0x07, 0x7d, 0xa9, 0x26, 0xcb, 0x31, 0x03, 0x9d, 0x82,
    0x33, 0x2f, 0xed, 0x67, 0xa3, 0xa9, 0xb1, 0xc9, 0xe6, 0x34, 0x6c, 0xd7, 0xb5, 0x1a, 0x0a, 0x94,
    0x11, 0xa7, 0xd9, 0x26, 0xff, 0x0e, 0x8d, 0x72, 0xc1, 0x7b, 0x53, 0x9a, 0x13, 0x78, 0x7e, 0x16,
    0x38, 0x74, 0x7c, 0xb2, 0xdc, 0x60, 0x2c, 0x8c, 0xe8, 0x31, 0xf8, 0xd9, 0x7b, 0xac, 0xa6, 0x71,
    0xee, 0x61, 0x0c, 0x1a, 0xa4, 0x2f, 0x47, 0x2f, 0xe2, 0x22, 0xbd, 0x01, 0xe5, 0x25, 0xb6, 0x95,
    0xda, 0x3f, 0xf7, 0x03, 0xf4, 0x0e, 0xd6, 0x8c, 0xbb, 0x69, 0x1d, 0xcb, 0xd1, 0xe2, 0x60, 0xdb,
    0xf5, 0x0b, 0x85, 0x98, 0xe6, 0x17, 0xbe, 0x29, 0x4e, 0xa7, 0x90, 0x11, 0xac, 0xbc, 0xa5, 0x3e,
    0x05, 0xfe, 0xe9, 0x56, 0x93, 0x00, 0x00, 0x00, 0x01, 0x02,
];

#[cfg_attr(rustfmt, rustfmt_skip)]
static SMALL_PRIMES: &[u32] = &[
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251,
];

/// Miller-Rabin rounds once a candidate survived the quick checks
const PRIME_ROUNDS: usize = 24;

/// A Diffie-Hellman group, modulus `p` and generator `g`
#[derive(Clone, PartialEq, Debug)]
pub struct Group {
    pub p: BigUint,
    pub g: BigUint,
}

impl Group {
    pub fn bits(&self) -> u64 {
        self.p.bits()
    }

    /// Checks a client applies to the group a server picked for it
    pub fn validate(&self, min: u32, max: u32) -> Result<(), KexError> {
        let bits = self.bits();

        if bits < min as u64 || bits > max as u64 {
            debug!("Group of {} bits outside of {}..{}", bits, min, max);
            return Err(KexError::Crypto("group size outside requested range"));
        }

        if self.p <= BigUint::from(3u32) || !is_odd(&self.p) {
            return Err(KexError::Crypto("invalid group modulus"));
        }

        if self.g <= BigUint::one() || self.g >= &self.p - 1u32 {
            return Err(KexError::Crypto("invalid group generator"));
        }

        Ok(())
    }
}

/// Group size parameters a client asks for
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GroupRequest {
    pub min: u32,
    pub n: u32,
    pub max: u32,
}

impl Default for GroupRequest {
    fn default() -> GroupRequest {
        GroupRequest {
            min: DH_GROUP_MIN,
            n: DH_GROUP_MIN,
            max: DH_GROUP_MAX,
        }
    }
}

/// Limit a requested `(min, n, max)` to what we are willing to serve.
/// Fails if no size is left.
pub fn clamp(min: u32, n: u32, max: u32) -> Result<(u32, u32, u32), KexError> {
    let min = cmp::max(min, DH_GROUP_MIN);
    let max = cmp::min(max, DH_GROUP_MAX);

    if min > max {
        return Err(KexError::GroupRange { min: min, max: max });
    }

    Ok((min, cmp::min(cmp::max(n, min), max), max))
}

/// Source of groups for the server side of a group exchange.
///
/// Providers are shared read-only between all connections.
pub trait GroupProvider: Send + Sync {
    fn select_group(&self, bits: u32) -> Result<Group, KexError>;
}

/// Always hands out the embedded test group, whatever size was asked for
pub struct FixedGroup;

impl GroupProvider for FixedGroup {
    fn select_group(&self, bits: u32) -> Result<Group, KexError> {
        trace!("Serving fixed test group for a {} bit request", bits);

        let mut reader = TEST_PRIME_AND_GENERATOR;
        let p = reader.read_mpint()?;
        let g = reader.read_mpint()?;

        Ok(Group { p: p, g: g })
    }
}

/// Generates a safe prime `p = 2q + 1` of the requested size the first time
/// a size is asked for and serves it from a cache afterwards.
///
/// Generation holds the cache lock, so however many peers ask at once only
/// one search runs per provider.
pub struct SafePrimeGroups {
    generator: u32,
    cache: Mutex<HashMap<u32, Group>>,
}

impl SafePrimeGroups {
    pub fn new() -> SafePrimeGroups {
        SafePrimeGroups {
            generator: 2,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl GroupProvider for SafePrimeGroups {
    fn select_group(&self, bits: u32) -> Result<Group, KexError> {
        // A panic while generating leaves nothing half written in the map
        let mut cache = self.cache.lock().unwrap_or_else(|err| err.into_inner());

        if let Some(group) = cache.get(&bits) {
            trace!("Serving cached {} bit group", bits);
            return Ok(group.clone());
        }

        debug!("Generating a {} bit safe prime", bits);

        let group = Group {
            p: generate_safe_prime(bits)?,
            g: BigUint::from(self.generator),
        };

        cache.insert(bits, group.clone());
        Ok(group)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum GroupPolicy {
    /// The embedded test group, for reproducible tests and debugging
    Fixed,
    /// Generated safe primes, cached per size
    Generated,
}

impl GroupPolicy {
    pub fn provider(&self) -> Arc<dyn GroupProvider> {
        match self
        {
            &GroupPolicy::Fixed => Arc::new(FixedGroup),
            &GroupPolicy::Generated => Arc::new(SafePrimeGroups::new()),
        }
    }
}

impl Default for GroupPolicy {
    #[cfg(feature = "test-group")]
    fn default() -> GroupPolicy {
        GroupPolicy::Fixed
    }

    #[cfg(not(feature = "test-group"))]
    fn default() -> GroupPolicy {
        GroupPolicy::Generated
    }
}

/// Search for a safe prime of exactly `bits` bits with `p = 23 (mod 24)`,
/// which makes 2 a generator of the subgroup of order `q`.
pub fn generate_safe_prime(bits: u32) -> Result<BigUint, KexError> {
    if bits < 16 {
        return Err(KexError::Crypto("safe prime size too small"));
    }

    let mut rng = rand::thread_rng();
    let top = BigUint::one() << (bits as usize - 2);
    let twelve = BigUint::from(12u32);
    let mut candidates = 0u64;

    loop {
        candidates += 1;

        // q = 11 (mod 12) gives p = 2q + 1 = 23 (mod 24)
        let q = rng.gen_biguint(bits as u64 - 1) | &top;
        let q = &q - (&q % &twelve) + 11u32;
        let p: BigUint = (&q << 1usize) + 1u32;

        if p.bits() != bits as u64 {
            continue;
        }

        if SMALL_PRIMES
            .iter()
            .any(|&prime| (&q % prime).is_zero() || (&p % prime).is_zero())
        {
            continue;
        }

        if is_probable_prime(&q, 1, &mut rng) &&
            is_probable_prime(&p, 1, &mut rng) &&
            is_probable_prime(&q, PRIME_ROUNDS, &mut rng) &&
            is_probable_prime(&p, PRIME_ROUNDS, &mut rng)
        {
            debug!("Found {} bit safe prime after {} candidates", bits, candidates);
            return Ok(p);
        }
    }
}

/// Miller-Rabin with random bases
pub fn is_probable_prime<R: Rng>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u32);

    if *n <= BigUint::from(3u32) {
        return *n >= two;
    }

    if !is_odd(n) {
        return false;
    }

    let n_minus_one = n - &one;
    let mut d = n_minus_one.clone();
    let mut s = 0;
    while !is_odd(&d) {
        d >>= 1usize;
        s += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);

        if x == one || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }

        return false;
    }

    true
}

fn is_odd(n: &BigUint) -> bool {
    n.to_bytes_le()[0] & 1 == 1
}
