use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::Context;
use storesync_connect::{RetryPolicy, SyncConfig};
use storesync_core::sync::LeaseConfig;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Base URL of the platform sync gateway, if any.
    pub gateway_url: Option<String>,
    /// Platform ids served by the gateway.
    pub platforms: Vec<String>,
    pub sync: SyncConfig,
    pub scheduler_tick: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: "./db/storesync.db".to_string(),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(30_000),
            gateway_url: None,
            platforms: Vec::new(),
            sync: SyncConfig::default(),
            scheduler_tick: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = std::env::var("SS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid SS_LISTEN_ADDR")?;
        let db_path = std::env::var("SS_DB_PATH").unwrap_or(defaults.db_path);
        let cors_allow = split_list(
            &std::env::var("SS_CORS_ALLOW_ORIGINS").unwrap_or_else(|_| "*".into()),
        );
        let timeout_ms: u64 = env_or("SS_REQUEST_TIMEOUT_MS", 30_000);
        let gateway_url = std::env::var("SS_PLATFORM_GATEWAY_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());
        let platforms = split_list(&std::env::var("SS_PLATFORMS").unwrap_or_default());

        let retry_defaults = RetryPolicy::default();
        let lease_defaults = LeaseConfig::default();
        let sync = SyncConfig {
            max_concurrency: env_or("SS_SYNC_MAX_CONCURRENCY", defaults.sync.max_concurrency),
            adapter_timeout: Duration::from_secs(env_or(
                "SS_ADAPTER_TIMEOUT_SECS",
                defaults.sync.adapter_timeout.as_secs(),
            )),
            retry: RetryPolicy {
                max_attempts: env_or("SS_RETRY_MAX_ATTEMPTS", retry_defaults.max_attempts),
                initial_backoff: Duration::from_millis(env_or(
                    "SS_RETRY_INITIAL_BACKOFF_MS",
                    retry_defaults.initial_backoff.as_millis() as u64,
                )),
                max_backoff: Duration::from_millis(env_or(
                    "SS_RETRY_MAX_BACKOFF_MS",
                    retry_defaults.max_backoff.as_millis() as u64,
                )),
            },
            lease: LeaseConfig {
                ttl: Duration::from_secs(env_or("SS_LEASE_TTL_SECS", lease_defaults.ttl.as_secs())),
                wait_timeout: Duration::from_secs(env_or(
                    "SS_LEASE_WAIT_SECS",
                    lease_defaults.wait_timeout.as_secs(),
                )),
                ..lease_defaults
            },
            stale_run_max_age: Duration::from_secs(env_or(
                "SS_STALE_RUN_MAX_AGE_SECS",
                defaults.sync.stale_run_max_age.as_secs(),
            )),
            ..defaults.sync
        };
        sync.validate().context("Invalid sync timing configuration")?;

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            gateway_url,
            platforms,
            sync,
            scheduler_tick: Duration::from_secs(env_or(
                "SS_SCHEDULER_TICK_SECS",
                defaults.scheduler_tick.as_secs(),
            )),
        })
    }
}

/// Reads and parses `key`, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
