//! ElGamal keys over safe-prime groups, deterministic generation, and the
//! encryption primitive used for time-release messages.
//!
//! Key generation is fully deterministic in `(bit_length, seed)`: the seed
//! is folded through SHA-256 into a ChaCha20 stream, and every sample
//! (safe-prime candidates, generator candidates, the discarded secret
//! exponent, Miller-Rabin witnesses) is drawn from that stream. Two nodes
//! that agree on a seed therefore agree on the key, byte for byte — the
//! property the whole key schedule rests on.
//!
//! The secret exponent is discarded at generation time. Nobody, including
//! the node that generated the key, holds the private key; it is recovered
//! later by the Pollard-rho miner and published inside the sealed block.

use std::fmt;

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{Num, One, Zero};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use super::primes::safe_prime;

/// Errors from ElGamal operations and key-material parsing.
#[derive(Debug)]
pub enum ElGamalError {
    /// Plaintext is not a group element (`m >= p` or `m == 0`).
    MessageOutOfRange,
    /// A modular inverse does not exist; indicates corrupt key material.
    NotInvertible,
    /// Malformed hex-triple or ciphertext text form.
    Parse(String),
}

impl fmt::Display for ElGamalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElGamalError::MessageOutOfRange => write!(f, "plaintext is not a group element"),
            ElGamalError::NotInvertible => write!(f, "modular inverse does not exist"),
            ElGamalError::Parse(msg) => write!(f, "malformed key material: {msg}"),
        }
    }
}

impl std::error::Error for ElGamalError {}

/// ElGamal public key `(p, g, h)` over the order-`n` subgroup of a
/// safe-prime group, tagged with the bit length of `p`.
///
/// The bit length doubles as the chain's difficulty tag: it fixes
/// `n ≈ 2^(bit_length - 1)` and therefore the `Θ(√n)` cost of the
/// discrete-log proof of work.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicKey {
    /// Safe-prime modulus.
    pub p: BigUint,
    /// Generator of the order-`(p-1)/2` subgroup.
    pub g: BigUint,
    /// Public element `h = g^x mod p` for the discarded secret `x`.
    pub h: BigUint,
    /// Bit length of `p` (difficulty tag).
    pub bit_length: u64,
}

impl PublicKey {
    /// Order of the subgroup generated by `g`: `n = (p - 1) / 2`.
    pub fn order(&self) -> BigUint {
        (&self.p - 1u32) >> 1
    }

    /// Seed for the next key in the schedule: `p + g + h`.
    pub fn chain_seed(&self) -> BigUint {
        &self.p + &self.g + &self.h
    }

    /// Parses the hex-triple text form produced by `Display`
    /// (`0x<g>, 0x<h>, 0x<p>`). The bit length is recovered from `p`.
    pub fn from_hex_str(text: &str) -> Result<Self, ElGamalError> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ElGamalError::Parse(format!(
                "expected 3 comma-separated values, got {}",
                parts.len()
            )));
        }
        let g = parse_hex(parts[0])?;
        let h = parse_hex(parts[1])?;
        let p = parse_hex(parts[2])?;
        let bit_length = p.bits();
        Ok(PublicKey { p, g, h, bit_length })
    }
}

/// The canonical text form, used both for the store's `public_key` column
/// and inside the block-header preimage: `0x<g>, 0x<h>, 0x<p>`.
impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}, 0x{:x}, 0x{:x}", self.g, self.h, self.p)
    }
}

/// ElGamal private key `(p, g, x)`.
///
/// Never created by key generation (the secret exponent is discarded
/// there); the only constructor path is
/// [`Solution::to_private_key`](crate::types::Solution::to_private_key),
/// i.e. a successful discrete-log attack by the miner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrivateKey {
    pub p: BigUint,
    pub g: BigUint,
    pub x: BigUint,
    pub bit_length: u64,
}

impl PrivateKey {
    /// Checks that this key matches the public element `h`.
    ///
    /// Accepts `g^x ≡ h (mod p)`. With `accept_mirror` set, also accepts
    /// the observed variant `g^x + h ≡ p`; see
    /// [`ConsensusConfig::accept_mirror_solutions`](crate::consensus::ConsensusConfig).
    pub fn matches(&self, h: &BigUint, accept_mirror: bool) -> bool {
        let actual = self.g.modpow(&self.x, &self.p);
        if actual == *h {
            return true;
        }
        accept_mirror && &actual + h == self.p
    }
}

/// ElGamal ciphertext pair `(c1, c2)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ciphertext {
    pub c1: BigUint,
    pub c2: BigUint,
}

impl Ciphertext {
    /// Parses the text form produced by `Display` (`0x<c1>, 0x<c2>`).
    pub fn from_hex_str(text: &str) -> Result<Self, ElGamalError> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        if parts.len() != 2 {
            return Err(ElGamalError::Parse(format!(
                "expected 2 comma-separated values, got {}",
                parts.len()
            )));
        }
        Ok(Ciphertext {
            c1: parse_hex(parts[0])?,
            c2: parse_hex(parts[1])?,
        })
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}, 0x{:x}", self.c1, self.c2)
    }
}

/// Generates a public key deterministically from `(bit_length, seed)`.
///
/// 1. Seed a ChaCha20 RNG with `SHA-256(seed_le_bytes)`.
/// 2. Find a safe prime `p = 2q + 1` of `bit_length` bits.
/// 3. Find `g` with `g^q ≡ 1 (mod p)` and `g^2 ≢ 1`.
/// 4. Draw `x ∈ [2, q)`, set `h = g^x mod p`, and discard `x`.
pub fn generate_pub_key(bit_length: u64, seed: &BigUint) -> PublicKey {
    let mut rng = seeded_rng(seed);
    let two = BigUint::from(2u32);

    let (p, q) = safe_prime(bit_length, &mut rng);

    let upper = &p - 1u32;
    let g = loop {
        let candidate = rng.gen_biguint_range(&two, &upper);
        if candidate.modpow(&q, &p).is_one() && !candidate.modpow(&two, &p).is_one() {
            break candidate;
        }
    };

    let x = rng.gen_biguint_range(&two, &q);
    let h = g.modpow(&x, &p);

    PublicKey { p, g, h, bit_length }
}

/// Encrypts a group element `m` (`0 < m < p`) against `pk`.
///
/// Standard ElGamal with an ephemeral `k ∈ [1, n)` drawn from `rng`:
/// `c1 = g^k`, `c2 = m · h^k (mod p)`.
pub fn encrypt<R: Rng + ?Sized>(
    pk: &PublicKey,
    m: &BigUint,
    rng: &mut R,
) -> Result<Ciphertext, ElGamalError> {
    if m.is_zero() || *m >= pk.p {
        return Err(ElGamalError::MessageOutOfRange);
    }
    let k = rng.gen_biguint_range(&BigUint::one(), &pk.order());
    let c1 = pk.g.modpow(&k, &pk.p);
    let c2 = (m * pk.h.modpow(&k, &pk.p)) % &pk.p;
    Ok(Ciphertext { c1, c2 })
}

/// Decrypts a ciphertext with a recovered private key:
/// `m = c2 · (c1^x)^-1 (mod p)`.
pub fn decrypt(sk: &PrivateKey, ct: &Ciphertext) -> Result<BigUint, ElGamalError> {
    let shared = ct.c1.modpow(&sk.x, &sk.p);
    let inv = mod_inverse(&shared, &sk.p).ok_or(ElGamalError::NotInvertible)?;
    Ok((&ct.c2 * inv) % &sk.p)
}

/// Modular inverse via the extended Euclidean algorithm.
///
/// Returns `None` when `gcd(a, m) != 1`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    let a = BigInt::from(a.clone());
    let m = BigInt::from(m.clone());
    let e = a.extended_gcd(&m);
    if !e.gcd.is_one() {
        return None;
    }
    e.x.mod_floor(&m).to_biguint()
}

/// ChaCha20 stream deterministically derived from an arbitrary-size seed.
pub(crate) fn seeded_rng(seed: &BigUint) -> ChaCha20Rng {
    let digest = Sha256::digest(seed.to_bytes_le());
    ChaCha20Rng::from_seed(digest.into())
}

fn parse_hex(part: &str) -> Result<BigUint, ElGamalError> {
    let digits = part.strip_prefix("0x").unwrap_or(part);
    BigUint::from_str_radix(digits, 16)
        .map_err(|e| ElGamalError::Parse(format!("bad hex value {part:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::primes::is_probable_prime;

    fn small_key() -> PublicKey {
        generate_pub_key(16, &BigUint::from(0xFFFF_FFFF_FFFFu64))
    }

    #[test]
    fn generation_is_deterministic() {
        let seed = BigUint::from(833_050_814u64);
        let k1 = generate_pub_key(24, &seed);
        let k2 = generate_pub_key(24, &seed);
        assert_eq!(k1, k2);
    }

    #[test]
    fn different_seeds_give_different_keys() {
        let k1 = generate_pub_key(16, &BigUint::from(1u32));
        let k2 = generate_pub_key(16, &BigUint::from(2u32));
        assert_ne!(k1, k2);
    }

    #[test]
    fn generated_key_satisfies_group_invariants() {
        let pk = small_key();
        let n = pk.order();
        let mut rng = rand::thread_rng();

        assert_eq!(pk.p.bits(), 16);
        assert!(is_probable_prime(&pk.p, &mut rng), "p must be prime");
        assert!(is_probable_prime(&n, &mut rng), "(p-1)/2 must be prime");
        assert!(pk.g.modpow(&n, &pk.p).is_one(), "g must generate order n");
        assert!(
            !pk.g.modpow(&BigUint::from(2u32), &pk.p).is_one(),
            "g must not have order <= 2"
        );
        assert!(pk.h > BigUint::one() && pk.h < pk.p);
    }

    #[test]
    fn some_private_exponent_exists() {
        // The generator discards x; exhaustively confirm a matching
        // exponent exists for a 16-bit key, i.e. the key is solvable.
        let pk = small_key();
        let n = pk.order();

        let mut power = pk.g.clone();
        let mut x = BigUint::one();
        while x < n {
            if power == pk.h {
                return;
            }
            power = (&power * &pk.g) % &pk.p;
            x += 1u32;
        }
        panic!("no exponent satisfies g^x = h");
    }

    #[test]
    fn encrypt_decrypt_roundtrip_with_known_exponent() {
        let base = small_key();
        let n = base.order();
        let x = BigUint::from(12_345u32) % &n;
        let pk = PublicKey {
            h: base.g.modpow(&x, &base.p),
            ..base.clone()
        };
        let sk = PrivateKey {
            p: pk.p.clone(),
            g: pk.g.clone(),
            x,
            bit_length: pk.bit_length,
        };

        let mut rng = rand::thread_rng();
        for m in [1u32, 2, 42, 12_345] {
            let m = BigUint::from(m) % &pk.p;
            let ct = encrypt(&pk, &m, &mut rng).expect("message fits the group");
            assert_eq!(decrypt(&sk, &ct).expect("decrypt"), m);
        }
    }

    #[test]
    fn oversized_plaintext_is_rejected() {
        let pk = small_key();
        let mut rng = rand::thread_rng();
        assert!(matches!(
            encrypt(&pk, &pk.p, &mut rng),
            Err(ElGamalError::MessageOutOfRange)
        ));
    }

    #[test]
    fn hex_triple_roundtrip() {
        let pk = small_key();
        let text = pk.to_string();
        let parsed = PublicKey::from_hex_str(&text).expect("parse own text form");
        assert_eq!(parsed, pk);
    }

    #[test]
    fn ciphertext_text_roundtrip() {
        let ct = Ciphertext {
            c1: BigUint::from(0xDEADu32),
            c2: BigUint::from(0xBEEFu32),
        };
        let parsed = Ciphertext::from_hex_str(&ct.to_string()).expect("parse");
        assert_eq!(parsed, ct);
    }

    #[test]
    fn mod_inverse_agrees_with_definition() {
        let m = BigUint::from(65_537u32);
        let a = BigUint::from(1_234u32);
        let inv = mod_inverse(&a, &m).expect("65537 is prime");
        assert!(((a * inv) % m).is_one());
    }

    #[test]
    fn mirror_acceptance_is_gated() {
        let pk = small_key();
        let n = pk.order();
        let x = BigUint::from(999u32) % &n;
        let mirrored_h = &pk.p - pk.g.modpow(&x, &pk.p);
        let sk = PrivateKey {
            p: pk.p.clone(),
            g: pk.g.clone(),
            x,
            bit_length: pk.bit_length,
        };
        assert!(sk.matches(&mirrored_h, true));
        assert!(!sk.matches(&mirrored_h, false));
    }
}
