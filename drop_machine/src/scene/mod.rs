pub(crate) mod feedback;
pub(crate) mod ingest;
pub(crate) mod labels;
pub(crate) mod playback;
pub(crate) mod proxies;
pub(crate) mod setup;
pub(crate) mod simulation;

pub use feedback::{feedback_plugin, FeedbackLog};
pub use ingest::{ingest_feed, ingest_first_block, ingest_output, BestBlock};
pub use playback::{preload_system, Benchmark, PlayMode, Preload};
pub use proxies::{sync_proxies, LabelShellOf, PooledProxy, ProxyIndex};
pub use setup::{setup_scene, Arena, Plinth};
pub use simulation::{
    apply_quality_tier, cycle_quality_system, step_simulation, sync_shadows_system, ImpactEvent,
    KeyLight, PendingLabels, Simulation,
};
