//! Minimal prelude for SDK consumers.

pub use crate::config::{chain_config, chain_configs, feed_source, initial_quality};
pub use crate::data::{
    BlockPayload, ChainFetcher, FeedEvent, FeedSource, FetcherConfig, SyntheticConfig,
};
pub use crate::render::{ProxyRenderer, SpheresAndCubesRenderer};
pub use crate::sdk::VisualizerBuilder;
pub use crate::sim::quality::QualityTier;
pub use crate::sim::{SimContext, SimSettings};
