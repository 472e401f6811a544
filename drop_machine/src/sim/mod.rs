//! Simulation core: pool, world, collision feedback and replay, owned by one
//! explicit [`SimContext`] and advanced once per frame.

pub mod collision;
pub mod label;
pub mod pool;
pub mod quality;
pub mod random;
pub mod replay;
pub mod sizing;
pub mod world;

use rand::rngs::StdRng;
use rand::SeedableRng;

use collision::{CollisionDispatcher, FeedbackSettings, ImpactFeedback};
use label::LabelRequest;
use pool::{ObjectClass, ObjectPool, PoolError, PoolSettings, SlotRef, SpawnReceipt};
use quality::QualityTier;
use replay::{ReplayQueue, ReplaySettings};
use world::{ArenaSettings, PhysicsWorld};

/// Every tunable of the simulation core.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimSettings {
    pub pool: PoolSettings,
    pub arena: ArenaSettings,
    pub feedback: FeedbackSettings,
    pub replay: ReplaySettings,
}

/// What one frame produced for the layers around the core.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub feedback: Vec<ImpactFeedback>,
    pub labels: Vec<LabelRequest>,
    pub condemned: Vec<SlotRef>,
    pub spawn_errors: Vec<PoolError>,
}

/// Magnitudes the pool accepts. Everything else is dropped at the boundary.
pub fn accepts_magnitude(magnitude: f64) -> bool {
    magnitude.is_finite() && magnitude > 0.0
}

pub struct SimContext {
    pub world: PhysicsWorld,
    pub pool: ObjectPool,
    pub dispatcher: CollisionDispatcher,
    pub replay: ReplayQueue,
    rng: StdRng,
    tier: QualityTier,
}

impl SimContext {
    pub fn new(settings: SimSettings, tier: QualityTier, seed: u64) -> Self {
        let mut world = PhysicsWorld::new(tier.settings());
        world.add_static_geometry(&settings.arena);
        let dispatcher = CollisionDispatcher::new(settings.feedback, settings.pool.drop_height);
        Self {
            world,
            pool: ObjectPool::new(settings.pool, tier),
            dispatcher,
            replay: ReplayQueue::new(settings.replay),
            rng: StdRng::seed_from_u64(seed),
            tier,
        }
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn spawn(
        &mut self,
        class: ObjectClass,
        magnitude: f64,
    ) -> Result<Option<SpawnReceipt>, PoolError> {
        if !accepts_magnitude(magnitude) {
            return Ok(None);
        }
        self.pool
            .spawn(&mut self.world, &mut self.rng, class, magnitude)
            .map(Some)
    }

    pub fn on_new_block(&mut self, height: f64) -> Result<Option<SpawnReceipt>, PoolError> {
        self.spawn(ObjectClass::Block, height)
    }

    pub fn on_new_transaction_output(
        &mut self,
        value: f64,
    ) -> Result<Option<SpawnReceipt>, PoolError> {
        self.spawn(ObjectClass::Transaction, value)
    }

    /// Trickle a block's outputs in over the coming ticks. Returns how many
    /// older pending outputs were dropped to keep the queue bounded.
    pub fn queue_outputs(&mut self, values: impl IntoIterator<Item = f64>) -> usize {
        self.replay
            .schedule(values.into_iter().filter(|v| accepts_magnitude(*v)))
    }

    /// Reconfigure the world and reselect transaction geometry in place.
    /// Returns how many live transaction proxies were swapped.
    pub fn set_quality_tier(&mut self, tier: QualityTier) -> usize {
        self.tier = tier;
        self.world.configure(tier.settings());
        self.pool.set_tier(tier)
    }

    pub fn release_all(&mut self) -> usize {
        self.replay.clear();
        ObjectClass::ALL
            .into_iter()
            .map(|class| self.pool.release_all(&mut self.world, class))
            .sum()
    }

    /// Replayed spawns, one physics step, pool maintenance, then contact feedback.
    pub fn frame(&mut self) -> FrameReport {
        let mut report = FrameReport::default();

        for value in self.replay.advance() {
            if let Err(err) = self.on_new_transaction_output(value) {
                report.spawn_errors.push(err);
            }
        }

        self.world.step();
        report.condemned = self.pool.tick(&mut self.world);

        let samples: Vec<_> = self.world.drain_contacts().collect();
        report.feedback = self.dispatcher.dispatch(&self.pool, samples);
        report.labels = self.pool.take_label_requests();
        report
    }
}
