//! EVM fetcher: dedicated thread + alloy → blocks and pending transaction outputs.

use alloy::consensus::Transaction as TxConsensus;
use alloy::eips::BlockNumberOrTag;
use alloy::primitives::B256;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::BlockTransactions;
use alloy_chains::Chain;
use bevy::log::{debug, error, info, warn};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::thread;
use std::time::Duration;
use url::Url;

use crate::data::model::{BlockPayload, FeedEvent};
use crate::data::{ChainFetcher, FetcherConfig, FEED_CHANNEL_BOUND};

const BACKFILL_COUNT: u64 = 3;
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const PENDING_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_PENDING_PER_POLL: usize = 64;

/// EVM-compatible fetcher using Alloy.
pub struct EvmFetcher;

impl ChainFetcher for EvmFetcher {
    fn spawn(config: FetcherConfig) -> Receiver<FeedEvent> {
        let (tx, rx) = crossbeam_channel::bounded(FEED_CHANNEL_BOUND);
        thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    error!("failed to build tokio runtime: {err}");
                    return;
                }
            };
            rt.block_on(fetcher_loop(config.chain, config.rpc_url, tx));
        });
        rx
    }
}

/// The receiver going away ends the loop.
struct Disconnected;

async fn fetcher_loop(chain: Chain, rpc_url: Url, tx: Sender<FeedEvent>) {
    let provider = ProviderBuilder::new().connect_http(rpc_url);
    tokio::join!(
        block_loop(&provider, chain, &tx),
        pending_loop(&provider, chain, &tx)
    );
}

async fn block_loop(provider: &impl Provider, chain: Chain, tx: &Sender<FeedEvent>) {
    let latest = match provider.get_block_number().await {
        Ok(n) => n,
        Err(err) => {
            error!("{chain}: failed to get latest block number: {err}");
            return;
        }
    };

    let start = latest.saturating_sub(BACKFILL_COUNT - 1);
    info!("{chain}: backfilling blocks {start}..={latest}");

    for n in start..=latest {
        if fetch_and_send(provider, chain, n, tx).await.is_err() {
            return;
        }
    }

    let mut last_seen = latest;
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let tip = match provider.get_block_number().await {
            Ok(n) => n,
            Err(err) => {
                warn!("{chain}: poll error: {err}");
                continue;
            }
        };

        for n in (last_seen + 1)..=tip {
            if fetch_and_send(provider, chain, n, tx).await.is_err() {
                return;
            }
        }
        last_seen = last_seen.max(tip);
    }
}

/// Stream output values of pending transactions through an `eth_newPendingTransactionFilter`.
/// Endpoints without filter support only deliver blocks.
async fn pending_loop(provider: &impl Provider, chain: Chain, tx: &Sender<FeedEvent>) {
    let filter = match provider.new_pending_transactions_filter(false).await {
        Ok(id) => id,
        Err(err) => {
            warn!("{chain}: pending transactions unavailable, blocks only: {err}");
            return;
        }
    };

    loop {
        tokio::time::sleep(PENDING_POLL_INTERVAL).await;

        let hashes: Vec<B256> = match provider.get_filter_changes(filter).await {
            Ok(hashes) => hashes,
            Err(err) => {
                warn!("{chain}: pending poll error: {err}");
                continue;
            }
        };
        if hashes.len() > MAX_PENDING_PER_POLL {
            debug!(
                "{chain}: {} pending transactions, reading the first {MAX_PENDING_PER_POLL}",
                hashes.len()
            );
        }

        for hash in hashes.into_iter().take(MAX_PENDING_PER_POLL) {
            let value = match provider.get_transaction_by_hash(hash).await {
                Ok(Some(pending)) => wei_to_eth(pending.value()),
                Ok(None) => continue,
                Err(err) => {
                    debug!("{chain}: pending transaction {hash} unavailable: {err}");
                    continue;
                }
            };
            match tx.try_send(FeedEvent::TxOutput { chain, value }) {
                Ok(()) => {}
                // Live outputs are lossy; blocks must not queue behind them.
                Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

async fn fetch_and_send(
    provider: &impl Provider,
    chain: Chain,
    number: u64,
    tx: &Sender<FeedEvent>,
) -> Result<(), Disconnected> {
    let block = match provider
        .get_block_by_number(BlockNumberOrTag::Number(number))
        .full()
        .await
    {
        Ok(Some(block)) => block,
        Ok(None) => {
            warn!("{chain}: block {number} not found");
            return Ok(());
        }
        Err(err) => {
            warn!("{chain}: failed to fetch block {number}: {err}");
            return Ok(());
        }
    };

    let payload = block_to_payload(chain, &block);
    debug!(
        "{chain}: block {} ({} outputs)",
        payload.number,
        payload.tx_count()
    );
    tx.send(FeedEvent::Block(payload)).map_err(|_| Disconnected)
}

fn block_to_payload(chain: Chain, block: &alloy::rpc::types::Block) -> BlockPayload {
    let tx_values = match &block.transactions {
        BlockTransactions::Full(txs) => txs.iter().map(|tx| wei_to_eth(tx.value())).collect(),
        _ => Vec::new(),
    };

    BlockPayload {
        chain,
        number: block.header.number,
        timestamp: block.header.timestamp,
        tx_values,
    }
}

fn wei_to_eth(wei: alloy::primitives::U256) -> f64 {
    let wei_u128: u128 = wei.try_into().unwrap_or(u128::MAX);
    wei_u128 as f64 / 1e18
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    #[test]
    fn wei_to_eth_converts_1_eth() {
        let wei = U256::from(1_000_000_000_000_000_000u128);
        let eth = wei_to_eth(wei);
        assert!((eth - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wei_to_eth_handles_zero() {
        assert_eq!(wei_to_eth(U256::ZERO), 0.0);
    }

    #[test]
    fn wei_to_eth_saturates_huge_values() {
        let eth = wei_to_eth(U256::MAX);
        assert_eq!(eth, u128::MAX as f64 / 1e18);
    }
}
