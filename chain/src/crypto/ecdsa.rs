//! Transaction signing primitive: ECDSA over secp256k1.
//!
//! The consensus layer only consumes the [`SignatureVerifier`] trait; the
//! concrete [`K256Verifier`] implementation lives here together with the
//! wallet-side helpers (key generation and signing). Addresses are the
//! base64 of SEC1-encoded verifying-key bytes, signatures the base64 of
//! the raw `r ‖ s` bytes.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};

use crate::types::Address;

/// Errors from key/signature decoding.
///
/// A signature that decodes but does not verify is *not* an error; that
/// case is the `Ok(false)` verdict.
#[derive(Debug)]
pub enum SignatureError {
    /// Address is not base64, or not a valid secp256k1 point.
    BadAddress(String),
    /// Secret key text is not 64 hex characters or not a valid scalar.
    BadSecretKey(String),
    /// Signature text is not base64.
    BadSignature(String),
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureError::BadAddress(msg) => write!(f, "bad address: {msg}"),
            SignatureError::BadSecretKey(msg) => write!(f, "bad secret key: {msg}"),
            SignatureError::BadSignature(msg) => write!(f, "bad signature: {msg}"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Pluggable transaction-signature verifier.
///
/// Implementations should be deterministic and side-effect free; the
/// ledger validator calls this for every non-coinbase transaction.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies `signature_b64` over `message` for the key behind `address`.
    fn verify(
        &self,
        address: &Address,
        signature_b64: &str,
        message: &[u8],
    ) -> Result<bool, SignatureError>;
}

/// secp256k1 verifier backed by the `k256` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct K256Verifier;

impl SignatureVerifier for K256Verifier {
    fn verify(
        &self,
        address: &Address,
        signature_b64: &str,
        message: &[u8],
    ) -> Result<bool, SignatureError> {
        let key_bytes = BASE64
            .decode(address.as_str())
            .map_err(|e| SignatureError::BadAddress(e.to_string()))?;
        let verifying_key = VerifyingKey::from_sec1_bytes(&key_bytes)
            .map_err(|e| SignatureError::BadAddress(e.to_string()))?;

        let sig_bytes = BASE64
            .decode(signature_b64)
            .map_err(|e| SignatureError::BadSignature(e.to_string()))?;
        let signature = match Signature::from_slice(&sig_bytes) {
            Ok(sig) => sig,
            // Wrong length or out-of-range scalars: a wrong signature,
            // not a transport failure.
            Err(_) => return Ok(false),
        };

        Ok(verifying_key.verify(message, &signature).is_ok())
    }
}

/// A freshly generated wallet keypair in its text encodings.
#[derive(Clone, Debug)]
pub struct Keypair {
    /// base64 SEC1 verifying-key bytes; doubles as the wallet address.
    pub address: Address,
    /// 64 hex characters of the secret scalar.
    pub secret_hex: String,
}

/// Generates a new secp256k1 keypair from the OS RNG.
pub fn generate_keypair() -> Keypair {
    let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
    let address = address_of(&signing_key);
    Keypair {
        address,
        secret_hex: hex::encode(signing_key.to_bytes()),
    }
}

/// Signs `message` with the secret key given as 64 hex characters.
///
/// Returns the base64 of the raw `r ‖ s` signature bytes.
pub fn sign_message(secret_hex: &str, message: &[u8]) -> Result<String, SignatureError> {
    let signing_key = signing_key_from_hex(secret_hex)?;
    let signature: Signature = signing_key.sign(message);
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Derives the wallet address for a secret key given as 64 hex characters.
pub fn address_for_secret(secret_hex: &str) -> Result<Address, SignatureError> {
    Ok(address_of(&signing_key_from_hex(secret_hex)?))
}

fn signing_key_from_hex(secret_hex: &str) -> Result<SigningKey, SignatureError> {
    let bytes = hex::decode(secret_hex)
        .map_err(|e| SignatureError::BadSecretKey(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|e| SignatureError::BadSecretKey(e.to_string()))
}

fn address_of(signing_key: &SigningKey) -> Address {
    let point = signing_key.verifying_key().to_encoded_point(false);
    Address::new(BASE64.encode(point.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_roundtrip() {
        let keypair = generate_keypair();
        let message = b"{\"addr_from\":\"a\",\"addr_to\":\"b\",\"amount\":40}";

        let sig = sign_message(&keypair.secret_hex, message).expect("sign");
        let ok = K256Verifier
            .verify(&keypair.address, &sig, message)
            .expect("verify");
        assert!(ok);
    }

    #[test]
    fn flipped_signature_bit_is_rejected() {
        let keypair = generate_keypair();
        let message = b"payload";

        let sig = sign_message(&keypair.secret_hex, message).expect("sign");
        let mut raw = BASE64.decode(&sig).expect("own signature is base64");
        raw[7] ^= 0x01;
        let tampered = BASE64.encode(&raw);

        let ok = K256Verifier
            .verify(&keypair.address, &tampered, message)
            .expect("verify");
        assert!(!ok);
    }

    #[test]
    fn verifying_other_message_fails() {
        let keypair = generate_keypair();
        let sig = sign_message(&keypair.secret_hex, b"one").expect("sign");
        let ok = K256Verifier
            .verify(&keypair.address, &sig, b"two")
            .expect("verify");
        assert!(!ok);
    }

    #[test]
    fn malformed_address_is_an_error() {
        let sig = BASE64.encode([0u8; 64]);
        let res = K256Verifier.verify(&Address::new("!!not-base64!!"), &sig, b"m");
        assert!(matches!(res, Err(SignatureError::BadAddress(_))));
    }

    #[test]
    fn secret_hex_roundtrips_to_same_address() {
        let keypair = generate_keypair();
        let derived = address_for_secret(&keypair.secret_hex).expect("derive");
        assert_eq!(derived, keypair.address);
    }
}
