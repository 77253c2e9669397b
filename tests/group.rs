extern crate num_bigint;
extern crate rand;
extern crate ssh;

use std::sync::Arc;
use std::thread;

use num_bigint::BigUint;
use rand::Rng;
use ssh::error::KexError;
use ssh::key_exchange::group::{self, FixedGroup, Group, GroupProvider, SafePrimeGroups,
                               DH_GROUP_MAX, DH_GROUP_MIN};

#[test]
fn test_clamp_bounds() {
    let mut rng = rand::thread_rng();

    for _ in 0..10000 {
        let min = rng.gen_range(0..10000);
        let n = rng.gen_range(0..10000);
        let max = rng.gen_range(0..10000);

        match group::clamp(min, n, max)
        {
            Ok((min2, n2, max2)) => {
                assert!(DH_GROUP_MIN <= min2);
                assert!(min2 <= n2 && n2 <= max2);
                assert!(max2 <= DH_GROUP_MAX);
            }
            Err(KexError::GroupRange { min: min2, max: max2 }) => {
                assert!(min2 > max2, "({}, {}, {}) rejected", min, n, max);
            }
            Err(err) => panic!("unexpected error: {}", err),
        }
    }
}

#[test]
fn test_clamp_examples() {
    assert_eq!(group::clamp(1024, 1024, 8192).unwrap(), (1024, 1024, 8192));
    assert_eq!(group::clamp(512, 768, 2048).unwrap(), (1024, 1024, 2048));
    assert_eq!(group::clamp(2048, 16384, 16384).unwrap(), (2048, 8192, 8192));
    assert_eq!(group::clamp(0, 0, 4096).unwrap(), (1024, 1024, 4096));

    assert!(group::clamp(9000, 9000, 9000).is_err());
    assert!(group::clamp(4096, 2048, 2048).is_err());
    assert!(group::clamp(0, 0, 0).is_err());
}

#[test]
fn test_fixed_group() {
    let group = FixedGroup.select_group(4096).unwrap();

    assert_eq!(group.bits(), 1024);
    assert_eq!(group.g, BigUint::from(2u32));
    assert!(group.validate(1024, 8192).is_ok());
    assert!(group::is_probable_prime(&group.p, 16, &mut rand::thread_rng()));

    // The same group whatever the request
    assert_eq!(FixedGroup.select_group(1024).unwrap(), group);
}

#[test]
fn test_group_validation() {
    let fixed = FixedGroup.select_group(1024).unwrap();

    // Outside the requested range
    assert!(fixed.validate(2048, 8192).is_err());
    assert!(fixed.validate(512, 1023).is_err());

    let bad_generators = [0u32, 1];
    for &g in bad_generators.iter() {
        let group = Group {
            p: fixed.p.clone(),
            g: BigUint::from(g),
        };
        assert!(group.validate(1024, 8192).is_err());
    }

    let group = Group {
        p: fixed.p.clone(),
        g: &fixed.p - 1u32,
    };
    assert!(group.validate(1024, 8192).is_err());

    let group = Group {
        p: &fixed.p + 1u32,
        g: BigUint::from(2u32),
    };
    assert!(group.validate(1024, 8192).is_err());
}

#[test]
fn test_primality() {
    let mut rng = rand::thread_rng();

    let primes = [2u32, 3, 5, 7, 65537, 2147483647];
    for &p in primes.iter() {
        assert!(group::is_probable_prime(&BigUint::from(p), 16, &mut rng), "{}", p);
    }

    // Includes Carmichael numbers
    let composites = [0u32, 1, 4, 9, 561, 1105, 6601, 65535, 2147483649];
    for &n in composites.iter() {
        assert!(!group::is_probable_prime(&BigUint::from(n), 16, &mut rng), "{}", n);
    }
}

#[test]
fn test_safe_prime() {
    let mut rng = rand::thread_rng();

    for &bits in [64u32, 96, 128].iter() {
        let p = group::generate_safe_prime(bits).unwrap();
        let q: BigUint = (&p - 1u32) >> 1usize;

        assert_eq!(p.bits(), bits as u64);
        assert_eq!(&p % 24u32, BigUint::from(23u32));
        assert!(group::is_probable_prime(&p, 16, &mut rng));
        assert!(group::is_probable_prime(&q, 16, &mut rng));
    }

    assert!(group::generate_safe_prime(8).is_err());
}

#[test]
fn test_safe_prime_groups() {
    let group = SafePrimeGroups::new().select_group(128).unwrap();

    assert_eq!(group.bits(), 128);
    assert_eq!(group.g, BigUint::from(2u32));
    assert!(group.validate(128, 128).is_ok());
}

#[test]
fn test_safe_prime_groups_are_cached_per_size() {
    let groups = SafePrimeGroups::new();

    let first = groups.select_group(128).unwrap();
    assert_eq!(groups.select_group(128).unwrap(), first);

    let other = groups.select_group(96).unwrap();
    assert_eq!(other.bits(), 96);
    assert!(other != first);

    // A second provider keeps its own cache
    let fresh = SafePrimeGroups::new().select_group(128).unwrap();
    assert_eq!(fresh.bits(), 128);
}

#[test]
fn test_safe_prime_groups_shared_between_threads() {
    let groups = Arc::new(SafePrimeGroups::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let groups = groups.clone();
            thread::spawn(move || groups.select_group(112).unwrap())
        })
        .collect();

    let selected: Vec<Group> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for group in &selected[1..] {
        assert_eq!(group, &selected[0]);
    }
}
