//! Pollard-rho collision solutions and private-key reconstruction.
//!
//! A collision `g^a1 · h^b1 ≡ g^a2 · h^b2 (mod p)` pins the discrete log:
//!
//! ```text
//! h^(b1 - b2) ≡ g^(a2 - a1)      (mod p)
//! (b1 - b2)·x ≡ (a2 - a1)        (mod n)
//! ```
//!
//! so `x` falls out of one modular inversion. The solution is persisted
//! with its block as `a1, a2, b1, b2, n` in decimal.

use std::fmt;

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::crypto::elgamal::{mod_inverse, PrivateKey, PublicKey};

/// Why a collision failed to yield a usable private key.
#[derive(Debug, Eq, PartialEq)]
pub enum SolutionError {
    /// `b1 ≡ b2 (mod n)`: the congruence has no information about `x`.
    DegenerateCollision,
    /// `gcd(b1 - b2, n) > 1` and the reduced congruence has no solution.
    Unsolvable,
    /// The reconstructed exponent is outside `[1, n)`.
    ExponentOutOfRange,
    /// `g^x` matches neither `h` nor its accepted mirror.
    KeyMismatch,
    /// Malformed persisted text form.
    Parse(String),
}

impl fmt::Display for SolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionError::DegenerateCollision => write!(f, "collision has b1 = b2"),
            SolutionError::Unsolvable => write!(f, "collision congruence is unsolvable"),
            SolutionError::ExponentOutOfRange => write!(f, "exponent outside [1, n)"),
            SolutionError::KeyMismatch => write!(f, "exponent does not match public key"),
            SolutionError::Parse(msg) => write!(f, "malformed solution: {msg}"),
        }
    }
}

impl std::error::Error for SolutionError {}

/// A Pollard-rho collision, bound to the public key it solves.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Solution {
    pub a1: BigUint,
    pub a2: BigUint,
    pub b1: BigUint,
    pub b2: BigUint,
    pub n: BigUint,
    pub pubkey: PublicKey,
}

impl Solution {
    /// Parses the persisted text form (`a1, a2, b1, b2, n` in decimal),
    /// binding it to the block's public key.
    pub fn parse(text: &str, pubkey: PublicKey) -> Result<Self, SolutionError> {
        let nums: Vec<&str> = text.split(',').map(str::trim).collect();
        if nums.len() < 5 {
            return Err(SolutionError::Parse(format!(
                "expected 5 comma-separated values, got {}",
                nums.len()
            )));
        }
        let parse = |s: &str| {
            s.parse::<BigUint>()
                .map_err(|e| SolutionError::Parse(format!("bad decimal value {s:?}: {e}")))
        };
        Ok(Solution {
            a1: parse(nums[0])?,
            a2: parse(nums[1])?,
            b1: parse(nums[2])?,
            b2: parse(nums[3])?,
            n: parse(nums[4])?,
            pubkey,
        })
    }

    /// Reconstructs the private key and checks it against the public key.
    ///
    /// With `accept_mirror` set, `g^x + h ≡ p` is accepted alongside
    /// `g^x ≡ h` (the observed sign-flip variant).
    pub fn to_private_key(&self, accept_mirror: bool) -> Result<PrivateKey, SolutionError> {
        let x = self.solve_collision()?;
        if x.is_zero() || x >= self.n {
            return Err(SolutionError::ExponentOutOfRange);
        }
        let key = PrivateKey {
            p: self.pubkey.p.clone(),
            g: self.pubkey.g.clone(),
            x,
            bit_length: self.pubkey.bit_length,
        };
        if key.matches(&self.pubkey.h, accept_mirror) {
            Ok(key)
        } else {
            Err(SolutionError::KeyMismatch)
        }
    }

    /// Solves `(b1 - b2)·x ≡ (a2 - a1) (mod n)` for `x`.
    ///
    /// With `n` prime the gcd is 1 or `n`; the reduced branch exists for
    /// the `gcd > 1` case and returns one representative, which
    /// [`Solution::to_private_key`] then verifies.
    fn solve_collision(&self) -> Result<BigUint, SolutionError> {
        let n = BigInt::from(self.n.clone());
        let r = (BigInt::from(self.b1.clone()) - BigInt::from(self.b2.clone())).mod_floor(&n);
        if r.is_zero() {
            return Err(SolutionError::DegenerateCollision);
        }
        let diff = (BigInt::from(self.a2.clone()) - BigInt::from(self.a1.clone())).mod_floor(&n);

        let d = r.gcd(&n);
        let (modulus, r, diff) = if d.is_one() {
            (n, r, diff)
        } else {
            if !(&diff % &d).is_zero() {
                return Err(SolutionError::Unsolvable);
            }
            (&n / &d, &r / &d, &diff / &d)
        };

        let r = r.to_biguint().ok_or(SolutionError::Unsolvable)?;
        let diff = diff.to_biguint().ok_or(SolutionError::Unsolvable)?;
        let modulus = modulus.to_biguint().ok_or(SolutionError::Unsolvable)?;

        let inv = mod_inverse(&r, &modulus).ok_or(SolutionError::Unsolvable)?;
        Ok((inv * diff) % &modulus)
    }
}

/// Persisted text form: `a1, a2, b1, b2, n` in decimal.
impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            self.a1, self.a2, self.b1, self.b2, self.n
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::elgamal::generate_pub_key;

    /// Key with a known exponent: reuse (p, g) from the deterministic
    /// generator, then overwrite h with g^x for a chosen x.
    fn key_with_exponent(x: u64) -> (PublicKey, BigUint) {
        let base = generate_pub_key(16, &BigUint::from(42u32));
        let x = BigUint::from(x) % base.order();
        let pk = PublicKey {
            h: base.g.modpow(&x, &base.p),
            ..base
        };
        (pk, x)
    }

    /// Builds a collision consistent with the known exponent:
    /// `a2 = a1 + x·(b1 - b2) (mod n)`.
    fn crafted_solution(pk: &PublicKey, x: &BigUint) -> Solution {
        let n = pk.order();
        let a1 = BigUint::from(5u32);
        let b1 = BigUint::from(9u32);
        let b2 = BigUint::from(3u32);
        let a2 = (&a1 + x * ((&b1 - &b2) % &n)) % &n;
        Solution {
            a1,
            a2,
            b1,
            b2,
            n,
            pubkey: pk.clone(),
        }
    }

    #[test]
    fn crafted_collision_recovers_exponent() {
        let (pk, x) = key_with_exponent(1_234);
        let solution = crafted_solution(&pk, &x);
        let key = solution.to_private_key(false).expect("valid collision");
        assert_eq!(key.x, x);
    }

    #[test]
    fn equal_b_values_are_degenerate() {
        let (pk, x) = key_with_exponent(77);
        let mut solution = crafted_solution(&pk, &x);
        solution.b2 = solution.b1.clone();
        assert_eq!(
            solution.to_private_key(true),
            Err(SolutionError::DegenerateCollision)
        );
    }

    #[test]
    fn inconsistent_collision_is_rejected() {
        let (pk, x) = key_with_exponent(500);
        let mut solution = crafted_solution(&pk, &x);
        solution.a2 += 1u32;
        assert_eq!(
            solution.to_private_key(true),
            Err(SolutionError::KeyMismatch)
        );
    }

    #[test]
    fn text_form_roundtrips() {
        let (pk, x) = key_with_exponent(321);
        let solution = crafted_solution(&pk, &x);
        let parsed = Solution::parse(&solution.to_string(), pk).expect("parse");
        assert_eq!(parsed, solution);
    }

    #[test]
    fn short_text_form_is_rejected() {
        let (pk, _) = key_with_exponent(1);
        assert!(matches!(
            Solution::parse("1, 2, 3", pk),
            Err(SolutionError::Parse(_))
        ));
    }
}
