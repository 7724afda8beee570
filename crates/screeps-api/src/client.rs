//! Screeps API client.
//!
//! [`ScreepsClient`] is the production implementation of the [`ScreepsApi`]
//! trait. The trait exists so the reconstruction engine and identity
//! resolver can be tested against scripted responses without a network.

use crate::error::ApiError;
use crate::types::{
    AllianceInfo, BattleList, BattleQuery, HistoryFetch, RoomHistory, Tick, UserFind,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Configuration for the Screeps API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the main API (battle list, user lookup).
    pub api_url: String,
    /// Base URL for room-history JSON files.
    pub history_url: String,
    /// URL of the alliance roster document.
    pub alliances_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for API requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://screeps.com/api".to_string(),
            history_url: "https://screeps.com/room-history".to_string(),
            alliances_url: "https://www.leagueofautomatednations.com/alliances.js".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: "warreport/0.1.0".to_string(),
        }
    }
}

impl ClientConfig {
    /// Set the main API base URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the room-history base URL.
    pub fn with_history_url(mut self, url: impl Into<String>) -> Self {
        self.history_url = url.into();
        self
    }

    /// Set the alliance roster URL.
    pub fn with_alliances_url(mut self, url: impl Into<String>) -> Self {
        self.alliances_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Read-only access to the Screeps APIs the pipeline consumes.
#[async_trait]
pub trait ScreepsApi: Send + Sync {
    /// Fetch one 20-tick history window of a room.
    ///
    /// `window_start` must be aligned to a multiple of 20. A 404 yields
    /// [`HistoryFetch::NotYetAvailable`]; an HTTP 200 with an empty body is
    /// a valid empty segment.
    async fn room_history(&self, room: &str, window_start: Tick)
        -> Result<HistoryFetch, ApiError>;

    /// List rooms with recent hostile activity.
    async fn battles(&self, query: BattleQuery) -> Result<BattleList, ApiError>;

    /// Resolve an opaque player id to a display name.
    async fn find_username(&self, user_id: &str) -> Result<String, ApiError>;

    /// Fetch the complete alliance roster.
    async fn alliances(&self) -> Result<BTreeMap<String, AllianceInfo>, ApiError>;
}

/// Production HTTP client for the Screeps APIs.
#[derive(Debug, Clone)]
pub struct ScreepsClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ScreepsClient {
    /// Create a new client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { http, config })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Decode a JSON body, attaching the endpoint for context.
    fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    async fn read_ok_body(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: format!("{} (at {})", body, endpoint),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ScreepsApi for ScreepsClient {
    async fn room_history(
        &self,
        room: &str,
        window_start: Tick,
    ) -> Result<HistoryFetch, ApiError> {
        let url = format!("{}/{}/{}.json", self.config.history_url, room, window_start);
        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(room, window_start = window_start.value(), "History window not yet generated");
            return Ok(HistoryFetch::NotYetAvailable);
        }

        let body = Self::read_ok_body(&url, response).await?;
        if body.trim().is_empty() {
            // A generated-but-empty window: a recording gap, not an error.
            return Ok(HistoryFetch::Available(RoomHistory {
                room: room.to_string(),
                base: window_start,
                ..Default::default()
            }));
        }

        let history: RoomHistory = Self::decode(&url, &body)?;
        Ok(HistoryFetch::Available(history))
    }

    async fn battles(&self, query: BattleQuery) -> Result<BattleList, ApiError> {
        let url = format!("{}/experimental/pvp", self.config.api_url);
        let (key, value) = query.as_query_pair();
        let response = self.http.get(&url).query(&[(key, value)]).send().await?;
        let body = Self::read_ok_body(&url, response).await?;

        let battles: BattleList = Self::decode(&url, &body)?;
        if battles.ok != 1 {
            return Err(ApiError::Rejected { endpoint: url });
        }
        Ok(battles)
    }

    async fn find_username(&self, user_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/user/find", self.config.api_url);
        let response = self.http.get(&url).query(&[("id", user_id)]).send().await?;
        let endpoint = format!("{}?id={}", url, user_id);
        let body = Self::read_ok_body(&endpoint, response).await?;

        let found: UserFind = Self::decode(&endpoint, &body)?;
        found
            .user
            .and_then(|u| u.username)
            .ok_or(ApiError::MissingField {
                endpoint,
                field: "user.username".to_string(),
            })
    }

    async fn alliances(&self) -> Result<BTreeMap<String, AllianceInfo>, ApiError> {
        let url = self.config.alliances_url.clone();
        let response = self.http.get(&url).send().await?;
        let body = Self::read_ok_body(&url, response).await?;
        Self::decode(&url, &body)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
