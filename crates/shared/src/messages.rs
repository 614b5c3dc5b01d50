//! WebSocket message types for Engine-Player communication
//!
//! Every frame is one JSON object tagged by a kebab-case `type` field, with
//! camelCase payload fields, e.g. `{"type":"join-session","sessionCode":"K7HQ2X",...}`.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Renaming variants is a breaking change
//! - Unknown `type` values deserialize to `Unknown` so callers can drop them

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position as `[x, y, z]`
pub type Vec3 = [f64; 3];

/// Rotation quaternion as `[x, y, z, w]`
pub type Quat = [f64; 4];

// =============================================================================
// Client Messages (Player → Engine)
// =============================================================================

/// Messages from client (Player) to server (Engine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Host opens a new session for a world
    CreateSession {
        world_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        foundry_url: Option<String>,
        #[serde(default)]
        name: String,
        #[serde(default)]
        color: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_viewers: Option<u32>,
        /// Forwarded to the lobby listing only
        #[serde(default, skip_serializing_if = "Option::is_none")]
        movie_title: Option<String>,
    },
    /// Viewer joins an existing session by code
    JoinSession {
        session_code: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        color: u32,
    },
    /// Leave the current session (a host leaving ends it)
    LeaveSession {},
    /// Legacy session-less world join
    Join {
        world: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        color: u32,
    },
    /// Avatar position/rotation update
    State {
        pos: Vec3,
        rot: Quat,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<u32>,
    },
    /// Host-only: shared video playback position
    PlaybackSync { is_paused: bool, timestamp: f64 },
    /// Host-only: puppeted AI character snapshot
    CharacterSync { characters: Vec<CharacterSnapshot> },
    /// Host-only: shared screen endpoint status
    FoundrySync {
        is_connected: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        foundry_url: Option<String>,
    },
    /// Session chat line
    Chat { message: String },

    /// Unknown message type for forward compatibility
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Server Messages (Engine → Player)
// =============================================================================

/// Messages from server (Engine) to client (Player)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message on every connection: the id the server assigned
    Welcome { id: Uuid },
    SessionCreated {
        session_code: String,
        world_url: String,
        foundry_url: Option<String>,
        max_viewers: u32,
    },
    SessionJoined {
        session_code: String,
        world_url: String,
        foundry_url: Option<String>,
        host_name: String,
        is_movie_playing: bool,
    },
    SessionError {
        /// Human-readable message
        error: String,
        /// `SESSION_NOT_FOUND` | `SESSION_FULL` | `ALREADY_HOSTING`
        code: String,
        /// Existing code for `ALREADY_HOSTING`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_code: Option<String>,
    },
    SessionEnded { reason: String },
    SessionInfo {
        session_code: String,
        host: Option<PeerSummary>,
        viewers: Vec<PeerSummary>,
        viewer_count: u32,
        max_viewers: u32,
        foundry_url: Option<String>,
    },
    /// Existing members, sent once to a connection that just joined
    Peers { peers: Vec<PeerInfo> },
    /// A member arrived
    Join {
        id: Uuid,
        name: String,
        color: u32,
        is_host: bool,
    },
    /// A member left
    Leave { id: Uuid },
    /// Host-directed: push a fresh snapshot for the named viewer
    RequestFullState { viewer_id: Uuid, viewer_name: String },
    State {
        from: Uuid,
        t: i64,
        pos: Vec3,
        rot: Quat,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<u32>,
    },
    PlaybackSync {
        from: Uuid,
        t: i64,
        is_paused: bool,
        timestamp: f64,
    },
    CharacterSync {
        from: Uuid,
        t: i64,
        characters: Vec<CharacterSnapshot>,
    },
    FoundrySync {
        from: Uuid,
        t: i64,
        is_connected: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        foundry_url: Option<String>,
    },
    Chat {
        from: Uuid,
        t: i64,
        name: String,
        color: u32,
        message: String,
    },

    /// Unknown message type for forward compatibility
    #[serde(other)]
    Unknown,
}

// =============================================================================
// Payloads
// =============================================================================

/// One puppeted character in a `character-sync` snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSnapshot {
    pub id: String,
    pub position: Vec3,
    pub rotation: Quat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Member listing entry in `peers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    pub id: Uuid,
    pub name: String,
    pub color: u32,
    pub is_host: bool,
}

/// Host/viewer entry in `session-info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerSummary {
    pub id: Uuid,
    pub name: String,
}
