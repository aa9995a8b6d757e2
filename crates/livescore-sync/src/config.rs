//! Runtime configuration for the upstream client and the poller
//!
//! # Environment
//! - `ODDS_API_KEY` - credential, passed as `apiKey` on every request
//! - `ODDS_API_BASE_URL` - override for the official base URL
//! - `ODDS_FORMAT` - `decimal` (default) or `american`
//! - `ODDS_POLL_INTERVAL_SECS` - refresh interval, default 5

use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::types::OddsFormat;
use crate::{DEFAULT_POLL_INTERVAL_SECS, ODDS_API_BASE};

/// Configuration consumed by `OddsApiClient` and `SyncController`
#[derive(Clone)]
pub struct SyncConfig {
    /// Upstream credential (may be empty; the client then refuses every call)
    pub api_key: String,
    /// Base URL without trailing slash
    pub base_url: String,
    /// Price format requested from the odds endpoint
    pub odds_format: OddsFormat,
    /// Recurring refresh interval for odds and scores
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: ODDS_API_BASE.to_string(),
            odds_format: OddsFormat::Decimal,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl SyncConfig {
    /// Create a config with the given credential and defaults elsewhere
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Self::default() }
    }

    /// Load configuration from environment variables
    ///
    /// A missing `ODDS_API_KEY` is not an error here; the client reports it
    /// on first use so the caller can still render the failure.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(std::env::var("ODDS_API_KEY").unwrap_or_default());

        if let Ok(base_url) = std::env::var("ODDS_API_BASE_URL") {
            config = config.with_base_url(&base_url)?;
        }

        if let Ok(format) = std::env::var("ODDS_FORMAT") {
            config.odds_format = format
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid ODDS_FORMAT")?;
        }

        if let Ok(secs) = std::env::var("ODDS_POLL_INTERVAL_SECS") {
            let secs: u64 = secs.trim().parse().context("Invalid ODDS_POLL_INTERVAL_SECS")?;
            anyhow::ensure!(secs > 0, "ODDS_POLL_INTERVAL_SECS must be positive");
            config.poll_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Replace the base URL after validating it
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
        anyhow::ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            "Unsupported base URL scheme: {}",
            parsed.scheme()
        );
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Set the price format requested from the odds endpoint
    pub fn with_odds_format(mut self, odds_format: OddsFormat) -> Self {
        self.odds_format = odds_format;
        self
    }

    /// Set the delay between refreshes while a session is steady
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Check if a usable credential is present (non-blank)
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("api_key", &format!("{}...", &self.api_key.chars().take(4).collect::<String>()))
            .field("base_url", &self.base_url)
            .field("odds_format", &self.odds_format)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
