//! Startup benchmark: drop a sample load, measure fps, pick a tier, then wait
//! for the first block.

use std::time::Duration;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::data::synthetic::output_value;
use crate::scene::simulation::{apply_quality_tier, Simulation};
use crate::sim::pool::ObjectClass;

pub const BENCHMARK_WINDOW: Duration = Duration::from_millis(3200);

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayMode {
    /// Sample objects are falling while fps is measured.
    #[default]
    Preload,
    /// Sample cleared and tier chosen; waiting for the first block.
    Loaded,
    Play,
}

/// Frame counter over a fixed wall-clock window.
#[derive(Clone, Debug)]
pub struct Benchmark {
    frames: u32,
    elapsed: Duration,
    window: Duration,
}

impl Benchmark {
    pub fn new(window: Duration) -> Self {
        Self {
            frames: 0,
            elapsed: Duration::ZERO,
            window,
        }
    }

    /// Count one frame; returns the average fps once the window has passed.
    pub fn record(&mut self, dt: Duration) -> Option<f64> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < self.window || self.elapsed.is_zero() {
            return None;
        }
        Some(self.frames as f64 / self.elapsed.as_secs_f64())
    }
}

#[derive(Resource)]
pub struct Preload {
    seeded: bool,
    rng: StdRng,
    benchmark: Benchmark,
}

impl Preload {
    pub fn new(seed: u64) -> Self {
        Self {
            seeded: false,
            rng: StdRng::seed_from_u64(seed),
            benchmark: Benchmark::new(BENCHMARK_WINDOW),
        }
    }
}

fn seed_sample_load(sim: &mut Simulation, rng: &mut StdRng) {
    let settings = sim.0.pool.settings().clone();
    let tx_count = settings.capacity(ObjectClass::Transaction) / 3;
    let block_count = settings.capacity(ObjectClass::Block) / 3;
    for _ in 0..tx_count {
        if let Err(err) = sim.0.on_new_transaction_output(output_value(rng)) {
            warn!("preload spawn failed: {err}");
        }
    }
    for _ in 0..block_count {
        if let Err(err) = sim.0.on_new_block(1.0) {
            warn!("preload spawn failed: {err}");
        }
    }
}

pub fn preload_system(
    time: Res<Time>,
    mut mode: ResMut<PlayMode>,
    mut preload: ResMut<Preload>,
    mut sim: ResMut<Simulation>,
) {
    let current = *mode;
    match current {
        // Ingest moves Loaded on once the first block is in.
        PlayMode::Loaded | PlayMode::Play => {}
        PlayMode::Preload => {
            let preload = &mut *preload;
            if !preload.seeded {
                seed_sample_load(&mut sim, &mut preload.rng);
                preload.seeded = true;
                return;
            }
            let Some(fps) = preload.benchmark.record(time.delta()) else {
                return;
            };
            let released = sim.0.release_all();
            let tier = sim.0.tier().from_benchmark(fps);
            info!("benchmark {fps:.1} fps, released {released} sample objects");
            apply_quality_tier(&mut sim, tier);
            *mode = PlayMode::Loaded;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::quality::QualityTier;
    use crate::sim::SimSettings;

    #[test]
    fn benchmark_reports_after_window() {
        let mut bench = Benchmark::new(Duration::from_secs(1));
        for _ in 0..9 {
            assert_eq!(bench.record(Duration::from_millis(100)), None);
        }
        let fps = bench.record(Duration::from_millis(100)).unwrap();
        assert!((fps - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_window_needs_real_time() {
        let mut bench = Benchmark::new(Duration::ZERO);
        assert_eq!(bench.record(Duration::ZERO), None);
    }

    #[test]
    fn preload_seeds_a_third_of_each_pool() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<PlayMode>()
            .insert_resource(Preload::new(4))
            .insert_resource(Simulation::new(SimSettings::default(), QualityTier::Medium, 4))
            .add_systems(Update, preload_system);
        app.update();

        let sim = &app.world().resource::<Simulation>().0;
        let tx = sim.pool.class(ObjectClass::Transaction).active_count();
        assert!(tx > 70 && tx <= 83, "{tx}");
        assert_eq!(sim.pool.class(ObjectClass::Block).active_count(), 8);
        assert_eq!(*app.world().resource::<PlayMode>(), PlayMode::Preload);
    }

    #[test]
    fn loaded_stays_put_without_a_block() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .insert_resource(PlayMode::Loaded)
            .insert_resource(Preload::new(0))
            .insert_resource(Simulation::new(SimSettings::default(), QualityTier::Medium, 0))
            .add_systems(Update, preload_system);
        app.update();
        app.update();
        assert_eq!(*app.world().resource::<PlayMode>(), PlayMode::Loaded);
    }
}
