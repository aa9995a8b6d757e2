//! The Odds API REST client
//!
//! Base URL: https://api.the-odds-api.com
//!
//! # Endpoints
//! - GET /v4/sports - Sport catalogue (cached after the first success)
//! - GET /v4/sports/{sport}/odds - Odds per fixture
//! - GET /v4/sports/{sport}/scores - Live and recent scores
//!
//! The credential travels as the `apiKey` query parameter on every call.
//! This client never retries; the controller owns retry decisions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::types::{OddsFormat, RawOddsRecord, RawScoreRecord, Sport};
use crate::SUPPORTED_SPORTS;

const MISSING_KEY_MESSAGE: &str = "API key is missing. Please set ODDS_API_KEY in your environment.";
const REJECTED_KEY_MESSAGE: &str = "Invalid API key. Please check your API key configuration.";

/// Source of sports, odds and scores consumed by the controller
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Supported, active sports
    async fn sports(&self) -> Result<Vec<Sport>, SyncError>;

    /// Odds for every upcoming/live fixture of a sport
    async fn odds(&self, sport_key: &str) -> Result<Vec<RawOddsRecord>, SyncError>;

    /// Scores for fixtures of a sport from the last day
    async fn scores(&self, sport_key: &str) -> Result<Vec<RawScoreRecord>, SyncError>;
}

/// The Odds API client
#[derive(Clone)]
pub struct OddsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    odds_format: OddsFormat,
    /// Set once the credential is known to be unusable; never cleared
    credential_invalid: Arc<AtomicBool>,
    /// Filtered catalogue, written only on success; held across the fetch
    sports_cache: Arc<Mutex<Option<Vec<Sport>>>>,
}

impl OddsApiClient {
    /// Create a new client from configuration
    ///
    /// A blank credential does not fail construction: every call then fails
    /// with `SyncError::Credential` without touching the network.
    pub fn new(config: &SyncConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        let credential_invalid = !config.has_credential();
        if credential_invalid {
            warn!("{}", MISSING_KEY_MESSAGE);
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.trim().to_string(),
            odds_format: config.odds_format,
            credential_invalid: Arc::new(AtomicBool::new(credential_invalid)),
            sports_cache: Arc::new(Mutex::new(None)),
        })
    }

    /// Whether the client will still attempt requests
    pub fn is_credential_valid(&self) -> bool {
        !self.credential_invalid.load(Ordering::Acquire)
    }

    fn credential_error(&self) -> SyncError {
        if self.api_key.is_empty() {
            SyncError::Credential(MISSING_KEY_MESSAGE.to_string())
        } else {
            SyncError::Credential(REJECTED_KEY_MESSAGE.to_string())
        }
    }

    /// GET `{base_url}{path}` with the credential and extra query parameters
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SyncError> {
        if !self.is_credential_valid() {
            return Err(self.credential_error());
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();

        // 401 = credential rejected; stop spending request budget on it
        if status == StatusCode::UNAUTHORIZED {
            warn!("Credential rejected by {}, disabling client", self.base_url);
            self.credential_invalid.store(true, Ordering::Release);
            return Err(self.credential_error());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate limited on {}", path);
            return Err(SyncError::RateLimit);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::upstream(status.as_u16(), &body));
        }

        if let Some(remaining) = response.headers().get("x-requests-remaining") {
            debug!("Request budget remaining: {:?}", remaining);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SyncError::Decode(e.to_string()))
    }

    /// GET /v4/sports - catalogue filtered to supported, active sports
    ///
    /// The first successful result is kept for the lifetime of the client.
    /// Concurrent callers wait for the request already in flight.
    pub async fn get_sports(&self) -> Result<Vec<Sport>, SyncError> {
        let mut cache = self.sports_cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            debug!("Returning {} cached sports", cached.len());
            return Ok(cached.clone());
        }

        let sports: Vec<Sport> = self.get_json("/v4/sports", &[]).await?;
        let total = sports.len();
        let supported: Vec<Sport> = sports
            .into_iter()
            .filter(|s| s.active && SUPPORTED_SPORTS.contains(&s.key.as_str()))
            .collect();

        info!("Loaded sport catalogue: {} of {} supported and active", supported.len(), total);

        *cache = Some(supported.clone());
        Ok(supported)
    }

    /// GET /v4/sports/{sport}/odds?regions=us&markets=h2h,spreads,totals&oddsFormat=...
    pub async fn get_odds(&self, sport_key: &str) -> Result<Vec<RawOddsRecord>, SyncError> {
        let sport_key = require_sport_key(sport_key)?;
        let path = format!("/v4/sports/{}/odds", sport_key);
        self.get_json(
            &path,
            &[
                ("regions", "us"),
                ("markets", "h2h,spreads,totals"),
                ("oddsFormat", self.odds_format.as_str()),
            ],
        )
        .await
    }

    /// GET /v4/sports/{sport}/scores?daysFrom=1&completed=false
    pub async fn get_scores(&self, sport_key: &str) -> Result<Vec<RawScoreRecord>, SyncError> {
        let sport_key = require_sport_key(sport_key)?;
        let path = format!("/v4/sports/{}/scores", sport_key);
        self.get_json(&path, &[("daysFrom", "1"), ("completed", "false")]).await
    }

    /// Test connectivity and credential by fetching the catalogue
    pub async fn test_connectivity(&self) -> Result<usize, SyncError> {
        info!("Testing connectivity to {}", self.base_url);
        let sports = self.get_sports().await?;
        info!("Connectivity OK, {} supported sports", sports.len());
        Ok(sports.len())
    }
}

fn require_sport_key(sport_key: &str) -> Result<&str, SyncError> {
    let sport_key = sport_key.trim();
    if sport_key.is_empty() {
        return Err(SyncError::InvalidArgument("Sport key is required".to_string()));
    }
    Ok(sport_key)
}

#[async_trait]
impl Upstream for OddsApiClient {
    async fn sports(&self) -> Result<Vec<Sport>, SyncError> {
        self.get_sports().await
    }

    async fn odds(&self, sport_key: &str) -> Result<Vec<RawOddsRecord>, SyncError> {
        self.get_odds(sport_key).await
    }

    async fn scores(&self, sport_key: &str) -> Result<Vec<RawScoreRecord>, SyncError> {
        self.get_scores(sport_key).await
    }
}
