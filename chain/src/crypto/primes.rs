//! Primality testing and safe-prime search.
//!
//! All sampling goes through the caller's RNG, so a seeded RNG makes the
//! whole search deterministic. That property is what lets every node derive
//! the same scheduled public key from the same seed.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::Rng;

/// Number of Miller-Rabin witness rounds per candidate.
pub const MILLER_RABIN_ROUNDS: usize = 25;

/// Miller-Rabin probabilistic primality test.
///
/// Witnesses are drawn from `rng`, so the test is deterministic for a
/// deterministic RNG. The error probability is at most `4^-rounds` for
/// composite `n`.
pub fn is_probable_prime<R: Rng + ?Sized>(n: &BigUint, rng: &mut R) -> bool {
    let two = BigUint::from(2u32);
    let three = BigUint::from(3u32);

    if *n < two {
        return false;
    }
    if *n == two || *n == three {
        return true;
    }
    if n.is_even() {
        return false;
    }

    // n - 1 = 2^s * d with d odd.
    let n_minus_one = n - 1u32;
    let mut d = n_minus_one.clone();
    let mut s = 0u64;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Finds a safe prime `p = 2q + 1` with `p` of exactly `bit_length` bits.
///
/// Returns `(p, q)`. `q` is sampled with `bit_length - 1` bits (top bit
/// forced so the width is exact, low bit forced so it is odd) until both
/// `q` and `2q + 1` pass Miller-Rabin.
///
/// # Panics
///
/// Panics if `bit_length < 8`; the difficulty floor in
/// [`crate::consensus::ConsensusConfig`] keeps real callers well above it.
pub fn safe_prime<R: Rng + ?Sized>(bit_length: u64, rng: &mut R) -> (BigUint, BigUint) {
    assert!(bit_length >= 8, "safe prime bit length must be at least 8");

    loop {
        let mut q = rng.gen_biguint(bit_length - 1);
        q.set_bit(bit_length - 2, true);
        q.set_bit(0, true);

        if !is_probable_prime(&q, rng) {
            continue;
        }
        let p = (&q << 1) | BigUint::one();
        if is_probable_prime(&p, rng) {
            return (p, q);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_rng() -> ChaCha20Rng {
        ChaCha20Rng::from_seed([7u8; 32])
    }

    #[test]
    fn known_primes_pass() {
        let mut rng = test_rng();
        for p in [2u32, 3, 5, 7, 65_537, 2_147_483_647] {
            assert!(
                is_probable_prime(&BigUint::from(p), &mut rng),
                "{p} should be prime"
            );
        }
    }

    #[test]
    fn known_composites_fail() {
        let mut rng = test_rng();
        // Includes Carmichael numbers, which fool the Fermat test.
        for c in [1u32, 4, 561, 41_041, 65_536, 825_265] {
            assert!(
                !is_probable_prime(&BigUint::from(c), &mut rng),
                "{c} should be composite"
            );
        }
    }

    #[test]
    fn safe_prime_has_exact_width_and_prime_order() {
        let mut rng = test_rng();
        let (p, q) = safe_prime(16, &mut rng);

        assert_eq!(p.bits(), 16);
        assert_eq!(&p, &((&q << 1) | BigUint::one()));

        let mut check_rng = test_rng();
        assert!(is_probable_prime(&p, &mut check_rng));
        assert!(is_probable_prime(&q, &mut check_rng));
    }

    #[test]
    fn safe_prime_search_is_deterministic() {
        let (p1, _) = safe_prime(20, &mut test_rng());
        let (p2, _) = safe_prime(20, &mut test_rng());
        assert_eq!(p1, p2);
    }
}
