mod channel;
pub mod evm;
mod model;
pub mod synthetic;

use alloy_chains::Chain;
use crossbeam_channel::Receiver;
use thiserror::Error;
use url::Url;

pub use channel::{init_feed_channel, init_fixture_channel, init_multi_chain_channel, FeedChannel};
pub use model::{BlockPayload, FeedEvent};
pub use synthetic::{SyntheticConfig, SyntheticFeed};

/// Capacity of every fetcher → frame-loop channel.
pub const FEED_CHANNEL_BOUND: usize = 64;

/// Configuration for spawning a chain fetcher.
#[derive(Clone, Debug, PartialEq)]
pub struct FetcherConfig {
    pub chain: Chain,
    pub rpc_url: Url,
}

/// Interface for chain-specific fetchers: mined blocks plus the live
/// transaction outputs seen between them.
pub trait ChainFetcher: Send + 'static {
    fn spawn(config: FetcherConfig) -> Receiver<FeedEvent>;
}

/// Where blocks and live outputs come from.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedSource {
    Chains(Vec<FetcherConfig>),
    Fixture(std::path::PathBuf),
    Synthetic(SyntheticConfig),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("at least one chain config is required")]
    NoChains,
    #[error("failed to read fixture {path}: {source}")]
    FixtureIo {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture {path}: {source}")]
    FixtureJson {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
