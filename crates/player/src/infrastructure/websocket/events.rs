//! Typed event stream published by the session client.

use uuid::Uuid;

use worldcast_shared::{CharacterSnapshot, PeerInfo, PeerSummary, Quat, ServerMessage, Vec3};

use super::protocol::ConnectionState;

/// Everything the application can observe from a [`super::SessionClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connection(ConnectionState),
    Welcome {
        id: Uuid,
    },
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
        error: String,
        code: String,
        session_code: Option<String>,
    },
    SessionEnded {
        reason: String,
    },
    SessionInfo {
        session_code: String,
        host: Option<PeerSummary>,
        viewers: Vec<PeerSummary>,
        viewer_count: u32,
        max_viewers: u32,
        foundry_url: Option<String>,
    },
    Peers(Vec<PeerInfo>),
    PeerJoined(PeerInfo),
    PeerLeft {
        id: Uuid,
    },
    /// Host only: a viewer needs a fresh snapshot
    FullStateRequested {
        viewer_id: Uuid,
        viewer_name: String,
    },
    State {
        from: Uuid,
        t: i64,
        pos: Vec3,
        rot: Quat,
        meta: Option<serde_json::Value>,
        color: Option<u32>,
    },
    Playback {
        from: Uuid,
        t: i64,
        is_paused: bool,
        timestamp: f64,
    },
    Characters {
        from: Uuid,
        t: i64,
        characters: Vec<CharacterSnapshot>,
    },
    Foundry {
        from: Uuid,
        t: i64,
        is_connected: bool,
        foundry_url: Option<String>,
    },
    Chat {
        from: Uuid,
        t: i64,
        name: String,
        color: u32,
        message: String,
    },
}

impl SessionEvent {
    /// Map a server frame to an event. Unknown frames produce nothing.
    pub fn from_server(msg: ServerMessage) -> Option<Self> {
        let event = match msg {
            ServerMessage::Welcome { id } => Self::Welcome { id },
            ServerMessage::SessionCreated {
                session_code,
                world_url,
                foundry_url,
                max_viewers,
            } => Self::SessionCreated {
                session_code,
                world_url,
                foundry_url,
                max_viewers,
            },
            ServerMessage::SessionJoined {
                session_code,
                world_url,
                foundry_url,
                host_name,
                is_movie_playing,
            } => Self::SessionJoined {
                session_code,
                world_url,
                foundry_url,
                host_name,
                is_movie_playing,
            },
            ServerMessage::SessionError {
                error,
                code,
                session_code,
            } => Self::SessionError {
                error,
                code,
                session_code,
            },
            ServerMessage::SessionEnded { reason } => Self::SessionEnded { reason },
            ServerMessage::SessionInfo {
                session_code,
                host,
                viewers,
                viewer_count,
                max_viewers,
                foundry_url,
            } => Self::SessionInfo {
                session_code,
                host,
                viewers,
                viewer_count,
                max_viewers,
                foundry_url,
            },
            ServerMessage::Peers { peers } => Self::Peers(peers),
            ServerMessage::Join {
                id,
                name,
                color,
                is_host,
            } => Self::PeerJoined(PeerInfo {
                id,
                name,
                color,
                is_host,
            }),
            ServerMessage::Leave { id } => Self::PeerLeft { id },
            ServerMessage::RequestFullState {
                viewer_id,
                viewer_name,
            } => Self::FullStateRequested {
                viewer_id,
                viewer_name,
            },
            ServerMessage::State {
                from,
                t,
                pos,
                rot,
                meta,
                color,
            } => Self::State {
                from,
                t,
                pos,
                rot,
                meta,
                color,
            },
            ServerMessage::PlaybackSync {
                from,
                t,
                is_paused,
                timestamp,
            } => Self::Playback {
                from,
                t,
                is_paused,
                timestamp,
            },
            ServerMessage::CharacterSync {
                from,
                t,
                characters,
            } => Self::Characters {
                from,
                t,
                characters,
            },
            ServerMessage::FoundrySync {
                from,
                t,
                is_connected,
                foundry_url,
            } => Self::Foundry {
                from,
                t,
                is_connected,
                foundry_url,
            },
            ServerMessage::Chat {
                from,
                t,
                name,
                color,
                message,
            } => Self::Chat {
                from,
                t,
                name,
                color,
                message,
            },
            ServerMessage::Unknown => return None,
        };
        Some(event)
    }
}
