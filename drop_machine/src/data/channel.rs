use std::path::Path;
use std::time::Duration;

use bevy::log::info;
use crossbeam_channel::{Receiver, SendError, Sender};

use crate::data::evm::EvmFetcher;
use crate::data::model::{BlockPayload, FeedEvent};
use crate::data::synthetic::SyntheticFeed;
use crate::data::{ChainFetcher, FeedError, FeedSource, FetcherConfig, FEED_CHANNEL_BOUND};

/// Bevy resource holding the receiving end of the feed.
/// Drained by the ingest system, never blocked on.
#[derive(bevy::prelude::Resource)]
pub struct FeedChannel(pub Receiver<FeedEvent>);

/// Open the channel for whichever source was configured.
pub fn init_feed_channel(source: FeedSource) -> Result<FeedChannel, FeedError> {
    match source {
        FeedSource::Chains(configs) => init_multi_chain_channel(configs),
        FeedSource::Fixture(path) => init_fixture_channel(&path, FIXTURE_PACE),
        FeedSource::Synthetic(config) => Ok(FeedChannel(SyntheticFeed::new(config).spawn())),
    }
}

/// Spawn one fetcher per config and fan them into a single receiver.
pub fn init_multi_chain_channel(configs: Vec<FetcherConfig>) -> Result<FeedChannel, FeedError> {
    let mut configs = configs.into_iter();
    let first = configs.next().ok_or(FeedError::NoChains)?;
    let rest: Vec<_> = configs.collect();
    if rest.is_empty() {
        return Ok(FeedChannel(EvmFetcher::spawn(first)));
    }

    let (fan_tx, fan_rx) = crossbeam_channel::bounded(FEED_CHANNEL_BOUND);
    for config in std::iter::once(first).chain(rest) {
        let tx = fan_tx.clone();
        let rx = EvmFetcher::spawn(config);
        std::thread::spawn(move || {
            while let Ok(event) = rx.recv() {
                if tx.send(event).is_err() {
                    return;
                }
            }
        });
    }

    Ok(FeedChannel(fan_rx))
}

const FIXTURE_PACE: Duration = Duration::from_secs(2);

/// Load pre-recorded payloads from a JSON array.
pub fn load_fixture(path: &Path) -> Result<Vec<BlockPayload>, FeedError> {
    let json = std::fs::read_to_string(path).map_err(|source| FeedError::FixtureIo {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| FeedError::FixtureJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Send a block's outputs as live outputs spread over `interval`, then the
/// block itself, the way a node sees pending transactions before they are mined.
pub(crate) fn send_outputs_then_block(
    tx: &Sender<FeedEvent>,
    payload: BlockPayload,
    interval: Duration,
) -> Result<(), SendError<FeedEvent>> {
    let step = interval / (payload.tx_values.len() as u32 + 1);
    for &value in &payload.tx_values {
        std::thread::sleep(step);
        tx.send(FeedEvent::TxOutput {
            chain: payload.chain,
            value,
        })?;
    }
    std::thread::sleep(step);
    tx.send(FeedEvent::Block(payload))
}

/// Replay a fixture file: the first block at once, then one block every
/// `pace` with its outputs streamed ahead of it.
pub fn init_fixture_channel(path: &Path, pace: Duration) -> Result<FeedChannel, FeedError> {
    let payloads = load_fixture(path)?;
    info!("replaying {} blocks from {}", payloads.len(), path.display());

    let (tx, rx) = crossbeam_channel::bounded(FEED_CHANNEL_BOUND);
    std::thread::spawn(move || {
        let mut payloads = payloads.into_iter();
        let Some(first) = payloads.next() else {
            return;
        };
        if tx.send(FeedEvent::Block(first)).is_err() {
            return;
        }
        for payload in payloads {
            if send_outputs_then_block(&tx, payload, pace).is_err() {
                return;
            }
        }
    });

    Ok(FeedChannel(rx))
}
