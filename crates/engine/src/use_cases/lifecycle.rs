//! Session lifecycle: create, join, leave, end.

use worldcast_domain::{ConnectionId, SessionCode, SessionError};
use worldcast_shared::{PeerInfo, ServerMessage};

use crate::infrastructure::ports::LobbyRegistration;
use crate::stores::session::NewSession;

use super::relay::{LobbyEvent, RelayState};

pub const REASON_HOST_LEFT: &str = "Host left";
pub const REASON_HOST_DISCONNECTED: &str = "Host disconnected";

impl RelayState {
    pub fn create_session(
        &mut self,
        connection_id: ConnectionId,
        world_url: String,
        foundry_url: Option<String>,
        name: String,
        color: u32,
        max_viewers: Option<u32>,
        movie_title: Option<String>,
    ) -> Result<(), SessionError> {
        if let Some(existing) = self.sessions.hosted_by(connection_id) {
            return Err(SessionError::AlreadyHosting {
                existing: existing.code().clone(),
            });
        }

        self.leave_current(connection_id);

        let max_viewers = self.config.clamp_max_viewers(max_viewers);
        let now = self.clock.now();
        let code = self.sessions.create(
            NewSession {
                world_url: world_url.clone(),
                host_connection_id: connection_id,
                host_name: name.clone(),
                foundry_url: foundry_url.clone(),
                max_viewers,
            },
            self.random.as_ref(),
            now,
        )?;

        if let Some(info) = self.connections.get_mut(connection_id) {
            info.display_name = name.clone();
            info.color = color;
            info.world = Some(world_url.clone());
            info.session_code = Some(code.clone());
            info.is_host = true;
        }
        self.rooms.join(&world_url, connection_id);

        tracing::info!(
            connection_id = %connection_id,
            session_code = %code,
            world = %world_url,
            max_viewers,
            "Session created"
        );

        self.connections.send_to(
            connection_id,
            ServerMessage::SessionCreated {
                session_code: code.to_string(),
                world_url: world_url.clone(),
                foundry_url: foundry_url.clone(),
                max_viewers,
            },
        );
        self.broadcast_session_info(&code);

        let public_addr = self.config.public_addr.clone();
        self.push_lobby(LobbyEvent::Register(LobbyRegistration {
            code,
            host_name: name,
            movie_title,
            world_url,
            public_addr,
            foundry_url,
            max_viewers,
        }));
        Ok(())
    }

    pub fn join_session(
        &mut self,
        connection_id: ConnectionId,
        raw_code: &str,
        name: String,
        color: u32,
    ) -> Result<(), SessionError> {
        let session = self
            .sessions
            .lookup(raw_code)
            .ok_or(SessionError::NotFound)?;
        let code = session.code().clone();

        if session.is_hosted_by(connection_id) {
            return Err(SessionError::AlreadyHosting { existing: code });
        }

        let rejoin = self
            .connections
            .get(connection_id)
            .is_some_and(|info| info.in_session(&code));

        if !rejoin {
            if !session.has_room_for_viewer(self.viewer_count(session) as usize) {
                return Err(SessionError::Full);
            }
            self.leave_current(connection_id);
        }

        // Re-read: leaving a hosted session above never touches this one.
        let Some(session) = self.sessions.get(&code) else {
            return Err(SessionError::NotFound);
        };
        let world_url = session.world_url().to_string();
        let joined = ServerMessage::SessionJoined {
            session_code: code.to_string(),
            world_url: world_url.clone(),
            foundry_url: session.foundry_url().map(str::to_string),
            host_name: session.host_name().to_string(),
            is_movie_playing: session.is_movie_playing(),
        };
        let host_id = session.host_connection_id();
        let host_present = self.host_present(session);

        if let Some(info) = self.connections.get_mut(connection_id) {
            info.display_name = name.clone();
            info.color = color;
            info.world = Some(world_url.clone());
            info.session_code = Some(code.clone());
            info.is_host = false;
        }
        self.rooms.join(&world_url, connection_id);

        tracing::info!(
            connection_id = %connection_id,
            session_code = %code,
            world = %world_url,
            rejoin,
            "Viewer joined session"
        );

        self.connections.send_to(connection_id, joined);
        self.send_peers(connection_id, &code);

        if !rejoin {
            self.broadcast_to_session(
                &code,
                ServerMessage::Join {
                    id: connection_id.to_uuid(),
                    name: name.clone(),
                    color,
                    is_host: false,
                },
                Some(connection_id),
            );
        }
        self.broadcast_session_info(&code);

        if host_present {
            self.connections.send_to(
                host_id,
                ServerMessage::RequestFullState {
                    viewer_id: connection_id.to_uuid(),
                    viewer_name: name,
                },
            );
        }
        Ok(())
    }

    /// Explicit `leave-session`. A host leaving ends the session.
    pub fn leave_session(&mut self, connection_id: ConnectionId) {
        let Some(code) = self
            .connections
            .get(connection_id)
            .and_then(|info| info.session_code.clone())
        else {
            tracing::debug!(connection_id = %connection_id, "leave-session outside a session");
            return;
        };

        let hosted = self
            .sessions
            .get(&code)
            .is_some_and(|session| session.is_hosted_by(connection_id));

        if hosted {
            self.end_session(&code, REASON_HOST_LEFT);
        } else {
            self.viewer_leave(connection_id, &code);
        }
        self.detach(connection_id);
    }

    /// Remove a session and notify every remaining non-host member once.
    ///
    /// Returns the notified connections.
    pub fn end_session(&mut self, code: &SessionCode, reason: &str) -> Vec<ConnectionId> {
        let Some(session) = self.sessions.get(code) else {
            return Vec::new();
        };
        let members = self.members_of(session);
        let host_id = session.host_connection_id();
        let world_url = session.world_url().to_string();
        self.sessions.remove(code);

        let now = self.clock.now();
        let mut notified = Vec::new();
        for id in members {
            if id != host_id {
                self.connections.send_to(
                    id,
                    ServerMessage::SessionEnded {
                        reason: reason.to_string(),
                    },
                );
                notified.push(id);
            }
            if let Some(info) = self.connections.get_mut(id) {
                info.clear_session();
                info.world = None;
            }
            self.rooms.leave(&world_url, id, now);
        }

        tracing::info!(
            session_code = %code,
            reason,
            notified = notified.len(),
            "Session ended"
        );
        self.push_lobby(LobbyEvent::End(code.clone()));
        notified
    }

    /// Leave whatever session or legacy room the connection is in.
    pub(crate) fn leave_current(&mut self, connection_id: ConnectionId) {
        let Some(info) = self.connections.get(connection_id) else {
            return;
        };
        match (info.session_code.clone(), info.world.clone()) {
            (Some(code), _) => {
                let hosted = self
                    .sessions
                    .get(&code)
                    .is_some_and(|session| session.is_hosted_by(connection_id));
                if hosted {
                    self.end_session(&code, REASON_HOST_LEFT);
                } else {
                    self.viewer_leave(connection_id, &code);
                }
            }
            (None, Some(world)) => self.legacy_leave(connection_id, &world),
            (None, None) => {}
        }
        self.detach(connection_id);
    }

    /// Take a viewer out of the room and tell the rest of the session.
    pub(crate) fn viewer_leave(&mut self, connection_id: ConnectionId, code: &SessionCode) {
        let now = self.clock.now();
        if let Some(world) = self
            .connections
            .get(connection_id)
            .and_then(|info| info.world.clone())
        {
            self.rooms.leave(&world, connection_id, now);
        }
        if let Some(info) = self.connections.get_mut(connection_id) {
            info.clear_session();
        }

        tracing::info!(connection_id = %connection_id, session_code = %code, "Viewer left session");

        self.broadcast_to_session(
            code,
            ServerMessage::Leave {
                id: connection_id.to_uuid(),
            },
            None,
        );
        self.broadcast_session_info(code);
    }

    fn detach(&mut self, connection_id: ConnectionId) {
        if let Some(info) = self.connections.get_mut(connection_id) {
            info.clear_session();
            info.world = None;
        }
    }

    /// `peers` lists the other members of the session.
    fn send_peers(&self, connection_id: ConnectionId, code: &SessionCode) {
        let Some(session) = self.sessions.get(code) else {
            return;
        };
        let peers = self
            .members_of(session)
            .into_iter()
            .filter(|id| *id != connection_id)
            .filter_map(|id| {
                self.connections.get(id).map(|info| PeerInfo {
                    id: id.to_uuid(),
                    name: info.display_name.clone(),
                    color: info.color,
                    is_host: session.is_hosted_by(id),
                })
            })
            .collect();
        self.connections
            .send_to(connection_id, ServerMessage::Peers { peers });
    }
}
