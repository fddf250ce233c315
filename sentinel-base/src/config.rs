//! Result pool configuration.
//!
//! Defaults can be overridden with environment variables:
//! - `SENTINEL_RESULT_POOL_MAX_IDLE`: idle results kept for reuse (default 1024)
//! - `SENTINEL_RESULT_POOL_PREWARM`: results allocated up front (default 0)

use serde::Deserialize;
use tracing::warn;

use crate::error::{ConfigError, Result};

pub const MAX_IDLE_ENV: &str = "SENTINEL_RESULT_POOL_MAX_IDLE";
pub const PREWARM_ENV: &str = "SENTINEL_RESULT_POOL_PREWARM";

const DEFAULT_MAX_IDLE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResultPoolConfig {
    /// Returned results beyond this many idle ones are freed instead of kept.
    pub max_idle: usize,
    /// Results allocated when the pool is built. Capped at `max_idle`.
    pub prewarm: usize,
}

impl Default for ResultPoolConfig {
    fn default() -> Self {
        Self {
            max_idle: DEFAULT_MAX_IDLE,
            prewarm: 0,
        }
    }
}

impl ResultPoolConfig {
    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn with_prewarm(mut self, prewarm: usize) -> Self {
        self.prewarm = prewarm;
        self
    }

    /// Defaults overridden by the environment. Fails on the first unparseable value.
    pub fn try_from_env() -> Result<Self> {
        Self::try_from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`try_from_env`](Self::try_from_env), but an unparseable value is logged and
    /// its default kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(max_idle) = parse_var(&lookup, MAX_IDLE_ENV)? {
            config.max_idle = max_idle;
        }
        if let Some(prewarm) = parse_var(&lookup, PREWARM_ENV)? {
            config.prewarm = prewarm;
        }
        Ok(config)
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        match parse_var(&lookup, MAX_IDLE_ENV) {
            Ok(Some(max_idle)) => config.max_idle = max_idle,
            Ok(None) => {}
            Err(e) => warn!(error = %e, default = config.max_idle, "Ignoring pool override"),
        }
        match parse_var(&lookup, PREWARM_ENV) {
            Ok(Some(prewarm)) => config.prewarm = prewarm,
            Ok(None) => {}
            Err(e) => warn!(error = %e, default = config.prewarm, "Ignoring pool override"),
        }
        config
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<usize>> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|e| ConfigError::InvalidValue {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
