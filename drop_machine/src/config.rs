//! Env parsing and feed/quality selection.

use std::path::PathBuf;

use alloy_chains::{Chain, NamedChain};
use bevy::log::warn;
use thiserror::Error;
use url::Url;

use crate::data::{FeedSource, FetcherConfig, SyntheticConfig};
use crate::sim::quality::{ParseQualityError, QualityTier};

const CHAIN_ENV_VARS: &[(NamedChain, &str)] = &[
    (NamedChain::Mainnet, "MAINNET_RPC_URL"),
    (NamedChain::Base, "BASE_RPC_URL"),
    (NamedChain::Optimism, "OPTIMISM_RPC_URL"),
    (NamedChain::Arbitrum, "ARBITRUM_RPC_URL"),
];

const DEFAULT_RPC: &str = "http://127.0.0.1:8545";

pub const FIXTURE_ENV: &str = "PLINTH_FIXTURE";
pub const SYNTHETIC_ENV: &str = "PLINTH_SYNTHETIC";
pub const QUALITY_ENV: &str = "PLINTH_QUALITY";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid URL in {var}: {raw:?}: {source}")]
    InvalidUrl {
        var: &'static str,
        raw: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid seed in PLINTH_SYNTHETIC: {0:?}")]
    InvalidSeed(String),
    #[error(transparent)]
    Quality(#[from] ParseQualityError),
}

fn env_chain(named: NamedChain, env_var: &'static str) -> Option<FetcherConfig> {
    let raw = std::env::var(env_var).ok()?;
    match raw.parse::<Url>() {
        Ok(url) => Some(FetcherConfig {
            chain: Chain::from_named(named),
            rpc_url: url,
        }),
        Err(err) => {
            warn!("ignoring invalid URL in {env_var}: {raw:?}: {err}");
            None
        }
    }
}

/// The first chain whose env var holds a valid URL, else `RPC_URL` on mainnet.
pub fn chain_config() -> Result<FetcherConfig, ConfigError> {
    if let Some(config) = CHAIN_ENV_VARS
        .iter()
        .find_map(|&(named, env_var)| env_chain(named, env_var))
    {
        return Ok(config);
    }
    let raw = std::env::var("RPC_URL").unwrap_or_else(|_| DEFAULT_RPC.to_string());
    let url = raw.parse::<Url>().map_err(|source| ConfigError::InvalidUrl {
        var: "RPC_URL",
        raw: raw.clone(),
        source,
    })?;
    Ok(FetcherConfig {
        chain: Chain::mainnet(),
        rpc_url: url,
    })
}

/// Every chain with a valid env var; falls back to [`chain_config`].
pub fn chain_configs() -> Result<Vec<FetcherConfig>, ConfigError> {
    let configs: Vec<_> = CHAIN_ENV_VARS
        .iter()
        .filter_map(|&(named, env_var)| env_chain(named, env_var))
        .collect();
    if configs.is_empty() {
        return Ok(vec![chain_config()?]);
    }
    Ok(configs)
}

/// Fixture replay wins over the synthetic feed, which wins over live chains.
pub fn feed_source() -> Result<FeedSource, ConfigError> {
    if let Ok(path) = std::env::var(FIXTURE_ENV) {
        return Ok(FeedSource::Fixture(PathBuf::from(path)));
    }
    if let Ok(raw) = std::env::var(SYNTHETIC_ENV) {
        let seed = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidSeed(raw.clone()))?;
        return Ok(FeedSource::Synthetic(SyntheticConfig {
            seed,
            ..SyntheticConfig::default()
        }));
    }
    chain_configs().map(FeedSource::Chains)
}

/// A pinned quality tier, if `PLINTH_QUALITY` is set.
pub fn initial_quality() -> Result<Option<QualityTier>, ConfigError> {
    match std::env::var(QUALITY_ENV) {
        Ok(raw) => Ok(Some(raw.parse()?)),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    struct EnvGuard {
        snapshot: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn capture(keys: &[&'static str]) -> Self {
            let snapshot = keys
                .iter()
                .map(|&key| {
                    let value = std::env::var(key).ok();
                    std::env::remove_var(key);
                    (key, value)
                })
                .collect();
            Self { snapshot }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in &self.snapshot {
                match value {
                    Some(val) => std::env::set_var(key, val),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    const ENV_KEYS: [&str; 8] = [
        "MAINNET_RPC_URL",
        "BASE_RPC_URL",
        "OPTIMISM_RPC_URL",
        "ARBITRUM_RPC_URL",
        "RPC_URL",
        FIXTURE_ENV,
        SYNTHETIC_ENV,
        QUALITY_ENV,
    ];

    #[test]
    fn chain_specific_env_takes_priority() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        std::env::set_var("BASE_RPC_URL", "http://127.0.0.1:8545");
        std::env::set_var("RPC_URL", "http://127.0.0.1:9999");

        let config = chain_config().unwrap();

        assert_eq!(config.chain, Chain::from_named(NamedChain::Base));
        assert_eq!(config.rpc_url.as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn rpc_url_is_used_when_no_chain_envs_present() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        std::env::set_var("RPC_URL", "http://127.0.0.1:8545");

        let config = chain_config().unwrap();

        assert_eq!(config.chain, Chain::mainnet());
        assert_eq!(config.rpc_url.as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn invalid_chain_env_falls_back_to_rpc_url() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        std::env::set_var("MAINNET_RPC_URL", "not-a-url");
        std::env::set_var("RPC_URL", "http://127.0.0.1:8545");

        let config = chain_config().unwrap();

        assert_eq!(config.chain, Chain::mainnet());
        assert_eq!(config.rpc_url.as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn invalid_rpc_url_is_an_error() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        std::env::set_var("RPC_URL", "not-a-url");

        assert!(matches!(
            chain_config(),
            Err(ConfigError::InvalidUrl { var: "RPC_URL", .. })
        ));
    }

    #[test]
    fn chain_configs_collects_every_chain() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        std::env::set_var("MAINNET_RPC_URL", "http://127.0.0.1:8545");
        std::env::set_var("OPTIMISM_RPC_URL", "http://127.0.0.1:9545");

        let chains: Vec<_> = chain_configs()
            .unwrap()
            .into_iter()
            .map(|c| c.chain)
            .collect();
        assert_eq!(
            chains,
            vec![Chain::mainnet(), Chain::from_named(NamedChain::Optimism)]
        );
    }

    #[test]
    fn fixture_beats_synthetic_beats_chains() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        assert!(matches!(feed_source(), Ok(FeedSource::Chains(_))));

        std::env::set_var(SYNTHETIC_ENV, "42");
        match feed_source() {
            Ok(FeedSource::Synthetic(config)) => assert_eq!(config.seed, 42),
            other => panic!("expected synthetic feed, got {other:?}"),
        }

        std::env::set_var(FIXTURE_ENV, "blocks.json");
        assert_eq!(
            feed_source(),
            Ok(FeedSource::Fixture(PathBuf::from("blocks.json")))
        );
    }

    #[test]
    fn synthetic_seed_must_be_numeric() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        std::env::set_var(SYNTHETIC_ENV, "yes");
        assert_eq!(
            feed_source(),
            Err(ConfigError::InvalidSeed("yes".to_string()))
        );
    }

    #[test]
    fn quality_env_pins_the_tier() {
        let _lock = lock_env();
        let _guard = EnvGuard::capture(&ENV_KEYS);

        assert_eq!(initial_quality(), Ok(None));
        std::env::set_var(QUALITY_ENV, "low");
        assert_eq!(initial_quality(), Ok(Some(QualityTier::Low)));
        std::env::set_var(QUALITY_ENV, "ultra");
        assert!(initial_quality().is_err());
    }
}
