//! Transaction type and canonical encodings.
//!
//! A transaction moves `amount` tokens from `addr_from` to `addr_to` and
//! may carry a time-release payload: an ElGamal ciphertext plus the block
//! height at which mining will publish the matching private key.
//!
//! Two canonical byte forms matter here and must stay stable:
//!
//! - the **signing payload**: compact JSON of
//!   `{"addr_from":..,"addr_to":..,"amount":..}` in exactly that key
//!   order; wallets sign these bytes and the node verifies them,
//! - the **body form**: the transaction as it enters the block-body hash.
//!   The signature is excluded (signatures are validated separately, and
//!   the stored schema predates them), so body hashes are independent of
//!   signature encoding.

use serde::Serialize;

use crate::crypto::elgamal::Ciphertext;

use super::Address;

/// A transfer, optionally carrying a time-release ciphertext.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transaction {
    /// Sender address, or [`Address::network`] for coinbase.
    pub addr_from: Address,
    /// Recipient address.
    pub addr_to: Address,
    /// Token amount; non-negative by construction.
    pub amount: u64,
    /// Time-release ciphertext, if any.
    pub cipher: Option<Ciphertext>,
    /// Height whose mined solution decrypts `cipher`.
    pub release_block_idx: Option<u64>,
    /// base64 `r ‖ s` signature over [`Transaction::signing_payload`];
    /// `None` for coinbase.
    pub signature: Option<String>,
}

/// Signing payload with the fixed canonical key order.
#[derive(Serialize)]
struct SigningPayload<'a> {
    addr_from: &'a str,
    addr_to: &'a str,
    amount: u64,
}

/// Body-canonical form: everything except the signature.
#[derive(Serialize)]
struct BodyForm<'a> {
    addr_from: &'a str,
    addr_to: &'a str,
    amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    cipher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    release_block_idx: Option<u64>,
}

impl Transaction {
    /// Plain signed transfer.
    pub fn transfer(
        addr_from: Address,
        addr_to: Address,
        amount: u64,
        signature: String,
    ) -> Self {
        Transaction {
            addr_from,
            addr_to,
            amount,
            cipher: None,
            release_block_idx: None,
            signature: Some(signature),
        }
    }

    /// Coinbase transaction minting the mining reward.
    pub fn coinbase(miner: &Address, reward: u64) -> Self {
        Transaction {
            addr_from: Address::network(),
            addr_to: miner.clone(),
            amount: reward,
            cipher: None,
            release_block_idx: None,
            signature: None,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.addr_from.is_network()
    }

    /// The exact bytes wallets sign and the node verifies.
    pub fn signing_payload(&self) -> Vec<u8> {
        signing_payload(&self.addr_from, &self.addr_to, self.amount)
    }

    /// Compact-JSON body form entering the block-body hash.
    pub(crate) fn body_json(&self) -> serde_json::Value {
        let body = BodyForm {
            addr_from: self.addr_from.as_str(),
            addr_to: self.addr_to.as_str(),
            amount: self.amount,
            cipher: self.cipher.as_ref().map(|c| c.to_string()),
            release_block_idx: self.release_block_idx,
        };
        serde_json::to_value(body).expect("transaction body form is always serializable")
    }
}

/// Builds the canonical signing payload for the given transfer fields.
///
/// Exposed so wallets can sign a transfer before a [`Transaction`] exists.
pub fn signing_payload(addr_from: &Address, addr_to: &Address, amount: u64) -> Vec<u8> {
    let payload = SigningPayload {
        addr_from: addr_from.as_str(),
        addr_to: addr_to.as_str(),
        amount,
    };
    serde_json::to_vec(&payload).expect("signing payload is always serializable")
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;

    use super::*;

    #[test]
    fn signing_payload_is_compact_with_fixed_key_order() {
        let tx = Transaction::transfer(
            Address::new("alice"),
            Address::new("bob"),
            40,
            "c2ln".to_string(),
        );
        assert_eq!(
            tx.signing_payload(),
            br#"{"addr_from":"alice","addr_to":"bob","amount":40}"#
        );
    }

    #[test]
    fn coinbase_has_network_sender_and_no_signature() {
        let tx = Transaction::coinbase(&Address::new("miner"), 100);
        assert!(tx.is_coinbase());
        assert_eq!(tx.amount, 100);
        assert!(tx.signature.is_none());
    }

    #[test]
    fn body_form_excludes_signature() {
        let mut tx = Transaction::transfer(
            Address::new("alice"),
            Address::new("bob"),
            7,
            "sig-a".to_string(),
        );
        let body_a = tx.body_json();
        tx.signature = Some("sig-b".to_string());
        assert_eq!(tx.body_json(), body_a);
    }

    #[test]
    fn body_form_includes_time_release_fields() {
        let mut tx = Transaction::transfer(
            Address::new("alice"),
            Address::new("bob"),
            7,
            "sig".to_string(),
        );
        tx.cipher = Some(Ciphertext {
            c1: BigUint::from(0xAAu32),
            c2: BigUint::from(0xBBu32),
        });
        tx.release_block_idx = Some(5);

        let body = tx.body_json();
        assert_eq!(body["cipher"], "0xaa, 0xbb");
        assert_eq!(body["release_block_idx"], 5);
    }
}
