//! Pollard-rho discrete-log miner.
//!
//! The walk lives in the order-`n` subgroup and tracks `(y, a, b)` with
//! the invariant `y = g^a · h^b (mod p)`. Each step hashes the candidate
//! block's header with the current element in the nonce slot and branches
//! three ways on the hash:
//!
//! ```text
//! H = header_hash(y) mod p
//! H ≡ 0 (mod 3):  y ← y^H        a ← a·H      b ← b·H
//! H ≡ 1 (mod 3):  y ← g^H · y    a ← a + H    b ← b
//! H ≡ 2 (mod 3):  y ← h^H · y    a ← a        b ← b + H
//! ```
//!
//! Because the update exponents are the header hash itself, a step cannot
//! be replayed or transplanted without re-evaluating the oracle for this
//! exact block: that is what turns a textbook DLP attack into a proof of
//! work. Floyd's tortoise and hare detect the cycle; the collision yields
//! the [`Solution`] and the collided element becomes the block's nonce.
//!
//! Expected cost is `Θ(√n)` group operations, two SHA-256 evaluations
//! each, so block time is tuned by the key's bit length.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use num_bigint::{BigUint, RandBigInt};
use num_traits::ToPrimitive;
use rand::Rng;

use crate::crypto::elgamal::PublicKey;
use crate::types::{Block, Solution};

use super::oracle::HeaderOracle;

/// Result of a mining attempt.
#[derive(Clone, Debug)]
pub enum MineOutcome {
    /// The candidate, sealed with nonce and solution.
    Sealed(Block),
    /// Deadline or stop flag fired before a collision.
    TimedOut,
}

/// One walk position.
#[derive(Clone)]
struct Walk {
    y: BigUint,
    a: BigUint,
    b: BigUint,
}

/// Miner for a single candidate block.
pub struct PollardRhoMiner {
    oracle: HeaderOracle,
    pubkey: PublicKey,
    n: BigUint,
    accept_mirror: bool,
}

impl PollardRhoMiner {
    /// Prepares the miner for `candidate`, pre-absorbing its header prefix.
    pub fn new(candidate: &Block, accept_mirror: bool) -> Self {
        let pubkey = candidate.public_key.clone();
        PollardRhoMiner {
            oracle: HeaderOracle::for_block(candidate),
            n: pubkey.order(),
            pubkey,
            accept_mirror,
        }
    }

    /// Runs tortoise-and-hare until a usable collision, the deadline, or
    /// the stop flag. Returns `(nonce, solution)` on success.
    ///
    /// A degenerate collision (`b1 ≡ b2`) re-randomizes the start and
    /// keeps searching within the same deadline. Cancellation is checked
    /// once per iteration, so it fires within a small multiple of a
    /// single walk step.
    pub fn mine<R: Rng + ?Sized>(
        &self,
        deadline: Instant,
        stop: Option<&AtomicBool>,
        rng: &mut R,
    ) -> Option<(BigUint, Solution)> {
        let cap = self.n.to_u128().unwrap_or(u128::MAX);

        loop {
            let mut tortoise = self.random_walk(rng);
            let mut hare = tortoise.clone();

            let mut i: u128 = 1;
            while i <= cap {
                if Instant::now() >= deadline
                    || stop.is_some_and(|s| s.load(Ordering::Relaxed))
                {
                    return None;
                }

                self.step(&mut tortoise);
                self.step(&mut hare);
                self.step(&mut hare);

                if tortoise.y == hare.y {
                    let solution = Solution {
                        a1: tortoise.a.clone(),
                        a2: hare.a.clone(),
                        b1: tortoise.b.clone(),
                        b2: hare.b.clone(),
                        n: self.n.clone(),
                        pubkey: self.pubkey.clone(),
                    };
                    if solution.to_private_key(self.accept_mirror).is_ok() {
                        return Some((tortoise.y, solution));
                    }
                    // Degenerate collision: the whole cycle is burned,
                    // only a fresh start can escape it.
                    break;
                }
                i += 1;
            }
        }
    }

    fn random_walk<R: Rng + ?Sized>(&self, rng: &mut R) -> Walk {
        let p = &self.pubkey.p;
        let a = rng.gen_biguint_below(&self.n);
        let b = rng.gen_biguint_below(&self.n);
        let y = self.pubkey.g.modpow(&a, p) * self.pubkey.h.modpow(&b, p) % p;
        Walk { y, a, b }
    }

    fn step(&self, w: &mut Walk) {
        let p = &self.pubkey.p;
        let hash = self.oracle.int_mod_p(&w.y);
        let branch = (&hash % 3u32)
            .to_u32()
            .expect("a value mod 3 fits in u32");
        match branch {
            0 => {
                w.a = &w.a * &hash % &self.n;
                w.b = &w.b * &hash % &self.n;
                w.y = w.y.modpow(&hash, p);
            }
            1 => {
                w.a = (&w.a + &hash) % &self.n;
                w.y = self.pubkey.g.modpow(&hash, p) * &w.y % p;
            }
            _ => {
                w.b = (&w.b + &hash) % &self.n;
                w.y = self.pubkey.h.modpow(&hash, p) * &w.y % p;
            }
        }
    }
}

/// [`seal`] with the thread-local RNG; convenience for blocking tasks.
pub fn seal_candidate(
    candidate: &Block,
    deadline: Instant,
    stop: Option<&AtomicBool>,
    accept_mirror: bool,
) -> MineOutcome {
    seal(candidate, deadline, stop, accept_mirror, &mut rand::thread_rng())
}

/// Mines `candidate` and, on success, returns it sealed with nonce and
/// solution. This is the operation the node's miner loop runs to a
/// deadline.
pub fn seal<R: Rng + ?Sized>(
    candidate: &Block,
    deadline: Instant,
    stop: Option<&AtomicBool>,
    accept_mirror: bool,
    rng: &mut R,
) -> MineOutcome {
    let miner = PollardRhoMiner::new(candidate, accept_mirror);
    match miner.mine(deadline, stop, rng) {
        Some((nonce, solution)) => {
            let mut sealed = candidate.clone();
            sealed.nonce = Some(nonce);
            sealed.solution = Some(solution);
            MineOutcome::Sealed(sealed)
        }
        None => MineOutcome::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::crypto::elgamal::generate_pub_key;
    use crate::schedule;

    fn tiny_candidate() -> Block {
        // A height-1 candidate over a 16-bit key, small enough that the
        // walk collides in a few hundred steps.
        let genesis = Block::genesis();
        let pubkey = schedule::schedule_next(&genesis.public_key, 16);
        Block::new(
            1,
            GENESIS_PLUS_30,
            Vec::new(),
            pubkey,
            Some(genesis.header_hash()),
        )
    }

    const GENESIS_PLUS_30: u64 = crate::types::GENESIS_TIMESTAMP + 30;

    #[test]
    fn mined_solution_recovers_the_private_key() {
        let candidate = tiny_candidate();
        let deadline = Instant::now() + Duration::from_secs(120);
        let mut rng = rand::thread_rng();

        match seal(&candidate, deadline, None, true, &mut rng) {
            MineOutcome::Sealed(block) => {
                let solution = block.solution.expect("sealed block has a solution");
                let key = solution.to_private_key(true).expect("solution verifies");
                assert!(key.matches(&candidate.public_key.h, true));
                assert!(block.nonce.is_some());
            }
            MineOutcome::TimedOut => panic!("16-bit key must be mined well inside the deadline"),
        }
    }

    #[test]
    fn expired_deadline_times_out() {
        let candidate = tiny_candidate();
        let mut rng = rand::thread_rng();
        let outcome = seal(
            &candidate,
            Instant::now() - Duration::from_secs(1),
            None,
            true,
            &mut rng,
        );
        assert!(matches!(outcome, MineOutcome::TimedOut));
    }

    #[test]
    fn stop_flag_cancels_the_walk() {
        let candidate = tiny_candidate();
        let stop = AtomicBool::new(true);
        let mut rng = rand::thread_rng();
        let outcome = seal(
            &candidate,
            Instant::now() + Duration::from_secs(120),
            Some(&stop),
            true,
            &mut rng,
        );
        assert!(matches!(outcome, MineOutcome::TimedOut));
    }

    #[test]
    fn walk_keeps_its_group_invariant() {
        let candidate = tiny_candidate();
        let miner = PollardRhoMiner::new(&candidate, true);
        let pk = &candidate.public_key;
        let mut rng = rand::thread_rng();

        let mut walk = miner.random_walk(&mut rng);
        for _ in 0..32 {
            miner.step(&mut walk);
            let expected =
                pk.g.modpow(&walk.a, &pk.p) * pk.h.modpow(&walk.b, &pk.p) % &pk.p;
            assert_eq!(walk.y, expected, "y must stay g^a * h^b");
        }
    }

    #[test]
    fn walk_is_bound_to_the_header() {
        // Same element, different timestamp: the oracle must disagree, so
        // solutions cannot be transplanted between headers.
        let c1 = tiny_candidate();
        let mut c2 = tiny_candidate();
        c2.timestamp += 1;

        let o1 = HeaderOracle::for_block(&c1);
        let o2 = HeaderOracle::for_block(&c2);
        let y = BigUint::from(7u32);
        assert_ne!(o1.int_mod_p(&y), o2.int_mod_p(&y));
    }

    #[test]
    fn generated_keys_are_minable_across_the_schedule() {
        // Chain three scheduled keys at tiny difficulty and mine each one,
        // mirroring the original miner's burn-in test.
        let mut pubkey = generate_pub_key(16, &BigUint::from(GENESIS_PLUS_30));
        let mut rng = rand::thread_rng();

        for height in 1..=3u64 {
            let block = Block::new(
                height,
                GENESIS_PLUS_30 + height,
                Vec::new(),
                pubkey.clone(),
                None,
            );
            let deadline = Instant::now() + Duration::from_secs(120);
            match seal(&block, deadline, None, true, &mut rng) {
                MineOutcome::Sealed(sealed) => {
                    let key = sealed
                        .solution
                        .expect("sealed")
                        .to_private_key(true)
                        .expect("verifies");
                    assert!(key.matches(&pubkey.h, true));
                }
                MineOutcome::TimedOut => panic!("tiny key timed out"),
            }
            pubkey = schedule::schedule_next(&pubkey, 16);
        }
    }
}
