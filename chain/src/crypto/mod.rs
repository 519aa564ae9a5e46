//! Cryptographic primitives for the chain.
//!
//! - [`elgamal`]: deterministic ElGamal key generation over safe-prime
//!   groups plus the time-release encryption primitive,
//! - [`primes`]: Miller-Rabin and safe-prime search,
//! - [`ecdsa`]: the external secp256k1 transaction-signature verifier.

pub mod ecdsa;
pub mod elgamal;
pub mod primes;

pub use ecdsa::{K256Verifier, SignatureError, SignatureVerifier};
pub use elgamal::{
    decrypt, encrypt, generate_pub_key, Ciphertext, ElGamalError, PrivateKey, PublicKey,
};
