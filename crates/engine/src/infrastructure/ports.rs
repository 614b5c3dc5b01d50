//! Port traits for injecting time, randomness and the lobby store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use worldcast_domain::SessionCode;

// =============================================================================
// Testability Ports
// =============================================================================

pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// Uniform index in `0..upper`.
    fn gen_index(&self, upper: usize) -> usize;
}

// =============================================================================
// Lobby Store
// =============================================================================

/// Listing data sent when a session is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyRegistration {
    pub code: SessionCode,
    pub host_name: String,
    pub movie_title: Option<String>,
    pub world_url: String,
    pub public_addr: String,
    pub foundry_url: Option<String>,
    pub max_viewers: u32,
}

/// Periodic liveness report for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyHeartbeat {
    pub code: SessionCode,
    pub viewer_count: u32,
    pub is_movie_playing: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("Lobby request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Lobby returned status {0}")]
    Status(u16),
}

/// External discovery store. Calls are fire-and-forget from the relay's
/// point of view; implementations report failures and the caller logs them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LobbyPort: Send + Sync {
    async fn register(&self, registration: LobbyRegistration) -> Result<(), LobbyError>;
    async fn heartbeat(&self, heartbeat: LobbyHeartbeat) -> Result<(), LobbyError>;
    async fn end(&self, code: SessionCode) -> Result<(), LobbyError>;
}
