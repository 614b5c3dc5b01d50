//! Session-scoped sync traffic: avatar state, host directives, chat.

use worldcast_domain::{ConnectionId, SessionCode};
use worldcast_shared::{CharacterSnapshot, Quat, ServerMessage, Vec3};

use super::relay::RelayState;

impl RelayState {
    /// Avatar state goes to the session, or to the legacy room when the
    /// sender has no session.
    pub fn relay_state(
        &mut self,
        connection_id: ConnectionId,
        pos: Vec3,
        rot: Quat,
        meta: Option<serde_json::Value>,
        color: Option<u32>,
    ) {
        let Some(info) = self.connections.get_mut(connection_id) else {
            return;
        };
        if let Some(color) = color {
            info.color = color;
        }
        let session_code = info.session_code.clone();
        let world = info.world.clone();

        let message = ServerMessage::State {
            from: connection_id.to_uuid(),
            t: self.now_millis(),
            pos,
            rot,
            meta,
            color,
        };

        match (session_code, world) {
            (Some(code), _) => {
                self.broadcast_to_session(&code, message, Some(connection_id));
            }
            (None, Some(world)) => {
                self.broadcast_to_room(&world, message, Some(connection_id));
            }
            (None, None) => {
                tracing::debug!(connection_id = %connection_id, "Dropping state outside any room");
            }
        }
    }

    pub fn playback_sync(&mut self, connection_id: ConnectionId, is_paused: bool, timestamp: f64) {
        let Some(code) = self.hosted_session(connection_id) else {
            return;
        };
        let message = ServerMessage::PlaybackSync {
            from: connection_id.to_uuid(),
            t: self.now_millis(),
            is_paused,
            timestamp,
        };
        self.broadcast_to_session(&code, message, Some(connection_id));
    }

    pub fn character_sync(
        &mut self,
        connection_id: ConnectionId,
        characters: Vec<CharacterSnapshot>,
    ) {
        let Some(code) = self.hosted_session(connection_id) else {
            return;
        };
        let message = ServerMessage::CharacterSync {
            from: connection_id.to_uuid(),
            t: self.now_millis(),
            characters,
        };
        self.broadcast_to_session(&code, message, Some(connection_id));
    }

    /// Also records whether the shared screen is live, for late joiners.
    pub fn foundry_sync(
        &mut self,
        connection_id: ConnectionId,
        is_connected: bool,
        foundry_url: Option<String>,
    ) {
        let Some(code) = self.hosted_session(connection_id) else {
            return;
        };
        self.sessions.touch_is_movie_playing(&code, is_connected);
        let message = ServerMessage::FoundrySync {
            from: connection_id.to_uuid(),
            t: self.now_millis(),
            is_connected,
            foundry_url,
        };
        self.broadcast_to_session(&code, message, Some(connection_id));
    }

    /// Not host-gated. Echoed to the sender too.
    pub fn chat(&mut self, connection_id: ConnectionId, message: &str) {
        let Some(info) = self.connections.get(connection_id) else {
            return;
        };
        let Some(code) = info.session_code.clone() else {
            tracing::debug!(connection_id = %connection_id, "Dropping chat outside a session");
            return;
        };
        let text: String = message
            .trim()
            .chars()
            .take(self.config.chat_max_chars)
            .collect();
        if text.is_empty() {
            return;
        }

        let message = ServerMessage::Chat {
            from: connection_id.to_uuid(),
            t: self.now_millis(),
            name: info.display_name.clone(),
            color: info.color,
            message: text,
        };
        self.broadcast_to_session(&code, message, None);
    }

    /// The session this connection is the current host of.
    ///
    /// Authority is the `(code, host connection)` pair, not the tag alone.
    fn hosted_session(&self, connection_id: ConnectionId) -> Option<SessionCode> {
        let code = self
            .connections
            .get(connection_id)
            .filter(|info| info.is_host)
            .and_then(|info| info.session_code.clone());
        let authorized = code.filter(|code| {
            self.sessions
                .get(code)
                .is_some_and(|session| session.is_hosted_by(connection_id))
        });
        if authorized.is_none() {
            tracing::debug!(connection_id = %connection_id, "Ignoring host-only directive");
        }
        authorized
    }
}
