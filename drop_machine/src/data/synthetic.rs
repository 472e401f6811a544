//! Seeded stand-in feed for running without an RPC endpoint.

use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::channel::send_outputs_then_block;
use crate::data::model::{BlockPayload, FeedEvent};
use crate::data::FEED_CHANNEL_BOUND;

#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub start_height: u64,
    pub outputs_per_block: usize,
    pub block_interval: Duration,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            start_height: 800_000,
            outputs_per_block: 120,
            block_interval: Duration::from_secs(10),
        }
    }
}

/// Most outputs are small; one in ten is drawn from a much wider range.
pub fn output_value<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.gen_bool(0.9) {
        rng.gen_range(0.0..2.0)
    } else {
        rng.gen_range(0.0..200.0)
    }
}

pub struct SyntheticFeed {
    config: SyntheticConfig,
    rng: StdRng,
    next_height: u64,
}

impl SyntheticFeed {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            next_height: config.start_height,
            config,
        }
    }

    pub fn next_block(&mut self) -> BlockPayload {
        let tx_values = (0..self.config.outputs_per_block)
            .map(|_| output_value(&mut self.rng))
            .collect();
        let payload = BlockPayload::new(self.next_height, tx_values);
        self.next_height += 1;
        payload
    }

    /// Emit one block immediately, then one per `block_interval` with its
    /// outputs trickling in as live outputs beforehand.
    pub fn spawn(mut self) -> Receiver<FeedEvent> {
        let (tx, rx) = crossbeam_channel::bounded(FEED_CHANNEL_BOUND);
        thread::spawn(move || {
            if tx.send(FeedEvent::Block(self.next_block())).is_err() {
                return;
            }
            loop {
                let payload = self.next_block();
                if send_outputs_then_block(&tx, payload, self.config.block_interval).is_err() {
                    return;
                }
            }
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_increase_and_outputs_stay_in_range() {
        let mut feed = SyntheticFeed::new(SyntheticConfig {
            outputs_per_block: 500,
            ..SyntheticConfig::default()
        });
        let a = feed.next_block();
        let b = feed.next_block();
        assert_eq!(b.number, a.number + 1);
        assert_eq!(a.tx_count(), 500);
        assert!(a.tx_values.iter().all(|v| (0.0..200.0).contains(v)));
        let small = a.tx_values.iter().filter(|v| **v < 2.0).count();
        assert!(small > 400, "expected mostly small outputs, got {small}");
    }

    #[test]
    fn same_seed_same_blocks() {
        let config = SyntheticConfig {
            seed: 77,
            ..SyntheticConfig::default()
        };
        let mut a = SyntheticFeed::new(config.clone());
        let mut b = SyntheticFeed::new(config);
        assert_eq!(a.next_block(), b.next_block());
    }

    #[test]
    fn spawned_feed_trickles_outputs_between_blocks() {
        let rx = SyntheticFeed::new(SyntheticConfig {
            outputs_per_block: 3,
            block_interval: Duration::from_millis(4),
            ..SyntheticConfig::default()
        })
        .spawn();
        let events: Vec<FeedEvent> = (0..5)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();

        match &events[0] {
            FeedEvent::Block(first) => assert_eq!(first.number, 800_000),
            other => panic!("expected a block first, got {other:?}"),
        }
        assert!(events[1..4]
            .iter()
            .all(|e| matches!(e, FeedEvent::TxOutput { .. })));
        match &events[4] {
            FeedEvent::Block(second) => assert_eq!(second.number, 800_001),
            other => panic!("expected the next block, got {other:?}"),
        }
    }
}
