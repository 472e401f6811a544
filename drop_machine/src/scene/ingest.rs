//! Feed ingestion: blocks become cubes, live outputs become spheres.

use std::time::Duration;

use bevy::prelude::*;

use crate::data::{BlockPayload, FeedChannel, FeedEvent, FEED_CHANNEL_BOUND};
use crate::scene::playback::PlayMode;
use crate::scene::simulation::Simulation;
use crate::sim::pool::ObjectClass;

const MAX_BLOCKS_PER_FRAME: usize = 5;
const MAX_OUTPUTS_PER_FRAME: usize = 64;

/// Highest block seen so far and when it arrived.
#[derive(Resource, Default, Debug)]
pub struct BestBlock {
    pub number: Option<u64>,
    pub arrived_at: Duration,
    pub blocks_ingested: u64,
}

impl BestBlock {
    pub fn record(&mut self, number: u64, now: Duration) {
        self.blocks_ingested += 1;
        if self.number.map_or(true, |best| number > best) {
            self.number = Some(number);
            self.arrived_at = now;
        }
    }

    pub fn since_last(&self, now: Duration) -> Option<Duration> {
        self.number.map(|_| now.saturating_sub(self.arrived_at))
    }
}

fn spawn_block(sim: &mut Simulation, payload: &BlockPayload) {
    if let Err(err) = sim.0.on_new_block(payload.number as f64) {
        warn!("block {} not spawned: {err}", payload.number);
    }
}

/// The block playback starts from: spawn it and replay at most one pool's
/// worth of its outputs. Later blocks arrive with their outputs already
/// streamed in live.
pub fn ingest_first_block(sim: &mut Simulation, payload: &BlockPayload) {
    spawn_block(sim, payload);
    let cap = sim.0.pool.settings().capacity(ObjectClass::Transaction);
    let dropped = sim
        .0
        .queue_outputs(payload.tx_values.iter().copied().take(cap));
    if dropped > 0 {
        debug!("replay backlog full, dropped {dropped} older outputs");
    }
}

pub fn ingest_output(sim: &mut Simulation, value: f64) {
    if let Err(err) = sim.0.on_new_transaction_output(value) {
        warn!("output {value} not spawned: {err}");
    }
}

pub fn ingest_feed(
    channel: Res<FeedChannel>,
    mut mode: ResMut<PlayMode>,
    time: Res<Time>,
    mut sim: ResMut<Simulation>,
    mut best: ResMut<BestBlock>,
) {
    let current = *mode;
    match current {
        PlayMode::Preload => {}
        PlayMode::Loaded => {
            // Outputs seen before the first block are not shown.
            let first = channel
                .0
                .try_iter()
                .take(FEED_CHANNEL_BOUND)
                .find_map(|event| match event {
                    FeedEvent::Block(payload) => Some(payload),
                    FeedEvent::TxOutput { .. } => None,
                });
            if let Some(payload) = first {
                info!(
                    "{}: starting at block {} ({} outputs)",
                    payload.chain,
                    payload.number,
                    payload.tx_count()
                );
                best.record(payload.number, time.elapsed());
                ingest_first_block(&mut sim, &payload);
                *mode = PlayMode::Play;
            }
        }
        PlayMode::Play => {
            let mut blocks = 0;
            let mut outputs = 0;
            while blocks < MAX_BLOCKS_PER_FRAME && outputs < MAX_OUTPUTS_PER_FRAME {
                let Ok(event) = channel.0.try_recv() else {
                    break;
                };
                match event {
                    FeedEvent::Block(payload) => {
                        blocks += 1;
                        debug!("{}: block {}", payload.chain, payload.number);
                        best.record(payload.number, time.elapsed());
                        spawn_block(&mut sim, &payload);
                    }
                    FeedEvent::TxOutput { value, .. } => {
                        outputs += 1;
                        ingest_output(&mut sim, value);
                    }
                }
            }
        }
    }
}
