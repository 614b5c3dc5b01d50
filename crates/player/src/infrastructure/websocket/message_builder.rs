//! ClientMessage construction for the session client.

use worldcast_shared::{CharacterSnapshot, ClientMessage, Quat, Vec3};

use super::core::{HostParams, ViewParams};

/// Builder for the `ClientMessage` variants the session client sends.
pub struct ClientMessageBuilder;

impl ClientMessageBuilder {
    // =========================================================================
    // Session lifecycle
    // =========================================================================

    pub fn create_session(params: &HostParams) -> ClientMessage {
        ClientMessage::CreateSession {
            world_url: params.world_url.clone(),
            foundry_url: params.foundry_url.clone(),
            name: params.name.clone(),
            color: params.color,
            max_viewers: params.max_viewers,
            movie_title: params.movie_title.clone(),
        }
    }

    pub fn join_session(params: &ViewParams) -> ClientMessage {
        ClientMessage::JoinSession {
            session_code: params.code.to_string(),
            name: params.name.clone(),
            color: params.color,
        }
    }

    pub fn leave_session() -> ClientMessage {
        ClientMessage::LeaveSession {}
    }

    /// Session-less world join
    pub fn join_world(world: &str, name: &str, color: u32) -> ClientMessage {
        ClientMessage::Join {
            world: world.to_string(),
            name: name.to_string(),
            color,
        }
    }

    // =========================================================================
    // Sync traffic
    // =========================================================================

    pub fn state(
        pos: Vec3,
        rot: Quat,
        meta: Option<serde_json::Value>,
        color: Option<u32>,
    ) -> ClientMessage {
        ClientMessage::State {
            pos,
            rot,
            meta,
            color,
        }
    }

    pub fn playback_sync(is_paused: bool, timestamp: f64) -> ClientMessage {
        ClientMessage::PlaybackSync {
            is_paused,
            timestamp,
        }
    }

    pub fn character_sync(characters: Vec<CharacterSnapshot>) -> ClientMessage {
        ClientMessage::CharacterSync { characters }
    }

    pub fn foundry_sync(is_connected: bool, foundry_url: Option<String>) -> ClientMessage {
        ClientMessage::FoundrySync {
            is_connected,
            foundry_url,
        }
    }

    pub fn chat(message: &str) -> ClientMessage {
        ClientMessage::Chat {
            message: message.to_string(),
        }
    }
}
