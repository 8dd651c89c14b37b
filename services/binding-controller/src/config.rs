//! Binding controller configuration from `FANOUT_*` environment variables.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::controller::ControllerConfig;
use crate::materializer::MaterializeOptions;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub resync_interval: Duration,
    pub reconcile_timeout: Duration,
    pub replica_kinds: BTreeSet<String>,
    pub seed_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_level = lookup("FANOUT_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let resync_interval = secs(&lookup, "FANOUT_RESYNC_INTERVAL_SECS", 30)?;
        let reconcile_timeout = secs(&lookup, "FANOUT_RECONCILE_TIMEOUT_SECS", 30)?;

        let replica_kinds: BTreeSet<String> = lookup("FANOUT_REPLICA_KINDS")
            .unwrap_or_else(|| "Deployment".to_string())
            .split(',')
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(str::to_string)
            .collect();

        let seed_file = lookup("FANOUT_SEED_FILE")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            log_level,
            resync_interval,
            reconcile_timeout,
            replica_kinds,
            seed_file,
        })
    }

    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            resync_interval: self.resync_interval,
            reconcile_timeout: self.reconcile_timeout,
            ..ControllerConfig::default()
        }
    }

    pub fn materialize_options(&self) -> MaterializeOptions {
        MaterializeOptions {
            replica_kinds: self.replica_kinds.clone(),
        }
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    let secs = match lookup(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds, got {raw:?}"))?,
        None => default,
    };
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
