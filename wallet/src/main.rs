// wallet/src/main.rs

//! Menu-driven CLI wallet.
//!
//! Here you can do several things:
//!
//! - generate a new address (keep the credentials: there is no recovery),
//! - send coins to another address, optionally attaching a time-release
//!   message that unlocks once a future block is mined,
//! - list the chain and check balances,
//! - print the node's logs.
//!
//! The wallet never learns any ElGamal private key. To lock a message it
//! fetches the chain tip, fast-forwards the public-key schedule to the
//! release height, and encrypts against a key whose private counterpart
//! will only exist once that block's proof of work is solved.

use std::io::{self, Write};
use std::process::ExitCode;

use num_bigint::BigUint;

use chain::crypto::ecdsa::{generate_keypair, sign_message};
use chain::crypto::elgamal::encrypt;
use chain::schedule::fast_forward;
use chain::types::tx::signing_payload;
use chain::{Address, BlockWire, ConsensusConfig};

fn main() -> ExitCode {
    println!(
        r#"       =========================================

        TIME RELEASE BLOCKCHAIN SYSTEM - WALLET

       =========================================

        Make sure you are using the latest version or you may end in
        a parallel chain.

"#
    );

    loop {
        let choice = prompt(
            "What do you want to do?\n\
             \t1. Generate new wallet\n\
             \t2. Send coins to another wallet\n\
             \t3. Check transactions\n\
             \t4. Print miner logs\n\
             \t5. Quit\n",
        );
        match choice.trim() {
            "1" => generate_wallet(),
            "2" => send_transaction_flow(),
            "3" => check_transactions(),
            "4" => check_logs(),
            "5" => break,
            other => println!("{other:?} is not an option."),
        }
    }
    ExitCode::SUCCESS
}

fn node_url() -> String {
    let base = std::env::var("MINER_NODE").unwrap_or_else(|_| "http://127.0.0.1".to_string());
    let port = std::env::var("MINER_PORT").unwrap_or_else(|_| "5000".to_string());
    format!("{base}:{port}")
}

fn prompt(message: &str) -> String {
    print!("{message}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_string()
}

fn generate_wallet() {
    println!(
        "=========================================\n\
         IMPORTANT: save these credentials or you won't be able to recover your wallet\n\
         ========================================="
    );
    let keypair = generate_keypair();
    println!("Address (public key): {}", keypair.address);
    println!("Private key: {}", keypair.secret_hex);
}

fn send_transaction_flow() {
    let addr_from = prompt("From: introduce your wallet address (public key)\n");
    let secret = prompt("Introduce your private key\n");
    let addr_to = prompt("To: introduce destination wallet address\n");
    let amount_text = prompt("Amount: number stating how much do you want to send\n");
    let message = prompt("Hidden/Locked Message: number to be released in the future (empty for none)\n");
    let lock_time_text = prompt("Lock Time (sec): time for locking the message\n");

    println!("=========================================\n");
    println!("Is everything correct?");
    println!("From: {addr_from}\nTo: {addr_to}\nAmount: {amount_text}");
    if !message.is_empty() {
        println!("Message: {message} (released after {lock_time_text} seconds)");
    }
    if prompt("y/n\n").to_lowercase() != "y" {
        return;
    }

    if secret.len() != 64 {
        println!("Wrong address or key length! Verify and try again.");
        return;
    }
    let Ok(amount) = amount_text.parse::<u64>() else {
        println!("{amount_text:?} is not a valid amount.");
        return;
    };
    let lock_time = lock_time_text.parse::<u64>().unwrap_or(0);

    match send_transaction(&addr_from, &secret, &addr_to, amount, &message, lock_time) {
        Ok(response) => println!("{response}"),
        Err(e) => println!("{e}"),
    }
}

/// Signs and submits a transfer; attaches a time-release cipher when a
/// message and a positive lock time are given.
fn send_transaction(
    addr_from: &str,
    secret_hex: &str,
    addr_to: &str,
    amount: u64,
    message: &str,
    lock_time: u64,
) -> Result<String, String> {
    let from = Address::new(addr_from);
    let to = Address::new(addr_to);

    let payload = signing_payload(&from, &to, amount);
    let signature =
        sign_message(secret_hex, &payload).map_err(|e| format!("failed to sign: {e}"))?;

    let mut body = serde_json::json!({
        "addr_from": addr_from,
        "addr_to": addr_to,
        "amount": amount,
        "signature": signature,
    });

    if !message.is_empty() && lock_time > 0 {
        let (cipher, release_height) = lock_message(message, lock_time)?;
        body["cipher"] = serde_json::Value::String(cipher);
        body["release_block_idx"] = serde_json::Value::from(release_height);
    }

    let client = reqwest::blocking::Client::new();
    let response = client
        .post(format!("{}/txion", node_url()))
        .json(&body)
        .send()
        .map_err(|e| format!("failed to reach the node: {e}"))?;
    response
        .text()
        .map_err(|e| format!("failed to read the node's response: {e}"))
}

/// Derives the scheduled public key `lock_time / BLOCK_TIME` blocks above
/// the tip and encrypts `message` against it.
fn lock_message(message: &str, lock_time: u64) -> Result<(String, u64), String> {
    let block_time = ConsensusConfig::default().block_time_secs;
    let intervals = lock_time / block_time;
    if intervals == 0 {
        return Err(format!(
            "lock time {lock_time}s is shorter than one block time ({block_time}s)"
        ));
    }

    let tip_wire: BlockWire = reqwest::blocking::get(format!("{}/last", node_url()))
        .and_then(|r| r.json())
        .map_err(|e| format!("failed to fetch the chain tip: {e}"))?;
    let tip = tip_wire
        .into_block()
        .map_err(|e| format!("bad tip block from node: {e}"))?;

    let future_key = fast_forward(&tip.public_key, intervals);

    let m = message
        .parse::<BigUint>()
        .map_err(|_| format!("{message:?} is not a number; messages are decimal integers"))?;
    if m >= future_key.p {
        return Err("message is too large for the scheduled key; split it up".to_string());
    }

    let cipher = encrypt(&future_key, &m, &mut rand::thread_rng())
        .map_err(|e| format!("encryption failed: {e}"))?;
    Ok((cipher.to_string(), tip.height + intervals))
}

/// Retrieve the entire blockchain. With this you can check your wallet's
/// balance. If the chain is long, it may take some time to load.
fn check_transactions() {
    match reqwest::blocking::get(format!("{}/blocks", node_url())).and_then(|r| r.text()) {
        Ok(text) => println!("{text}"),
        Err(e) => println!("failed to fetch blocks: {e}"),
    }
}

/// Get the status logs from the miner.
fn check_logs() {
    match reqwest::blocking::get(format!("{}/logs", node_url())).and_then(|r| r.text()) {
        Ok(text) => println!("{text}"),
        Err(e) => println!("failed to fetch logs: {e}"),
    }
}
