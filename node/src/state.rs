//! Shared application state and the pending-transaction pool.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use chain::{Address, DefaultChainEngine, MetricsRegistry, Transaction};

/// In-memory pending-transaction pool backed by a FIFO queue.
///
/// HTTP handlers push transactions in; the miner drains all of them at
/// block assembly. Both operations go through one mutex, so a submitted
/// transaction is never lost or duplicated across a drain.
#[derive(Default)]
pub struct PendingPool {
    queue: VecDeque<Transaction>,
}

impl PendingPool {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Enqueues a transaction for a future block.
    pub fn push(&mut self, tx: Transaction) {
        self.queue.push_back(tx);
    }

    /// Removes and returns every pending transaction.
    pub fn drain(&mut self) -> Vec<Transaction> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Shared state held by the HTTP handlers and the miner loop.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Embedded consensus engine (storage + validators).
    pub engine: Mutex<DefaultChainEngine>,
    /// Pending transactions awaiting the next candidate block.
    pub pending: Mutex<PendingPool>,
    /// Address credited by this node's coinbase; also gates the
    /// `GET /txion?update=` drain endpoint.
    pub miner_address: Address,
    /// Metrics registry shared between the miner loop and the API.
    pub metrics: Arc<MetricsRegistry>,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(amount: u64) -> Transaction {
        Transaction::coinbase(&Address::new("miner"), amount)
    }

    #[test]
    fn push_then_drain_empties_the_pool() {
        let mut pool = PendingPool::new();
        pool.push(tx(1));
        pool.push(tx(2));
        assert_eq!(pool.len(), 2);

        let drained = pool.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].amount, 1);
        assert!(pool.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_pushes_and_drains_conserve_transactions() {
        // Pending-drain atomicity: no transaction is lost or duplicated
        // across concurrent submissions and drains.
        const WRITERS: u64 = 4;
        const PER_WRITER: u64 = 100;

        let pool = Arc::new(Mutex::new(PendingPool::new()));
        let mut handles = Vec::new();

        for writer in 0..WRITERS {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..PER_WRITER {
                    pool.lock().await.push(tx(writer * PER_WRITER + i));
                    tokio::task::yield_now().await;
                }
            }));
        }

        let drainer = {
            let pool = pool.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..200 {
                    seen.extend(pool.lock().await.drain());
                    tokio::task::yield_now().await;
                }
                seen
            })
        };

        for handle in handles {
            handle.await.expect("writer");
        }
        let mut seen = drainer.await.expect("drainer");
        seen.extend(pool.lock().await.drain());

        let mut amounts: Vec<u64> = seen.iter().map(|t| t.amount).collect();
        amounts.sort_unstable();
        let expected: Vec<u64> = (0..WRITERS * PER_WRITER).collect();
        assert_eq!(amounts, expected, "every submission lands exactly once");
    }
}
