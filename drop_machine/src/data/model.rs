// Chain-agnostic feed payloads.
// Alloy-specific types stay in evm.rs; conversion happens there.

use alloy_chains::Chain;
use serde::{Deserialize, Serialize};

/// One block as the visualizer sees it: its height and the value of each
/// transaction output, in native units (ETH for EVM chains).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockPayload {
    #[serde(default = "Chain::mainnet")]
    pub chain: Chain,
    pub number: u64,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub tx_values: Vec<f64>,
}

impl BlockPayload {
    pub fn new(number: u64, tx_values: Vec<f64>) -> Self {
        Self {
            chain: Chain::mainnet(),
            number,
            timestamp: 0,
            tx_values,
        }
    }

    pub fn tx_count(&self) -> usize {
        self.tx_values.len()
    }
}

/// One item off the feed: a mined block, or a single transaction output seen
/// before its block.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    Block(BlockPayload),
    TxOutput { chain: Chain, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_entries_may_omit_chain_and_timestamp() {
        let payload: BlockPayload =
            serde_json::from_str(r#"{"number": 19000000, "tx_values": [0.5, 12.0]}"#).unwrap();
        assert_eq!(payload.chain, Chain::mainnet());
        assert_eq!(payload.timestamp, 0);
        assert_eq!(payload.tx_count(), 2);
    }
}
