//! Pooled rigid-body visualizer: blocks drop onto a plinth as cubes, their
//! transaction outputs as spheres.
//!
//! Library root: simulation core, data feeds, SDK builder, and config.

mod camera;
pub mod config;
pub mod data;
pub mod render;
pub mod scene;
pub mod sim;
mod ui;

pub mod prelude;
pub mod sdk;

pub use data::evm::EvmFetcher;
pub use data::{BlockPayload, ChainFetcher, FeedError, FeedEvent, FeedSource, FetcherConfig};
pub use sim::collision::{ImpactFeedback, SpeedMetric};
pub use sim::pool::{ObjectClass, ObjectPool, PoolError, PoolSettings, SlotRef, SpawnReceipt};
pub use sim::quality::QualityTier;
pub use sim::{FrameReport, SimContext, SimSettings};
