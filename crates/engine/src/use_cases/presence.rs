//! Liveness: transport close, ping sweep, session reaping, lobby heartbeat.

use worldcast_domain::ConnectionId;
use worldcast_shared::ServerMessage;

use crate::infrastructure::ports::LobbyHeartbeat;

use super::lifecycle::REASON_HOST_DISCONNECTED;
use super::relay::{LobbyEvent, RelayState};

impl RelayState {
    pub fn mark_alive(&mut self, connection_id: ConnectionId) {
        if let Some(info) = self.connections.get_mut(connection_id) {
            info.alive = true;
        }
    }

    /// Transport closed (gracefully or by the ping sweep).
    ///
    /// A departing host does not end its session; the session waits for the
    /// reaper so a brief host reconnect does not strand viewers.
    pub fn disconnect(&mut self, connection_id: ConnectionId) {
        let Some(info) = self.connections.unregister(connection_id) else {
            return;
        };
        let now = self.clock.now();

        match (info.session_code, info.world) {
            (Some(code), world) => {
                if let Some(world) = world {
                    self.rooms.leave(&world, connection_id, now);
                }
                if let Some(session) = self.sessions.get_mut(&code) {
                    if session.is_hosted_by(connection_id) {
                        session.mark_host_absent(now);
                        tracing::info!(
                            connection_id = %connection_id,
                            session_code = %code,
                            "Host transport closed, session awaiting host"
                        );
                    }
                }
                self.broadcast_to_session(
                    &code,
                    ServerMessage::Leave {
                        id: connection_id.to_uuid(),
                    },
                    None,
                );
                self.broadcast_session_info(&code);
            }
            (None, Some(world)) => {
                self.rooms.leave(&world, connection_id, now);
                self.broadcast_to_room(
                    &world,
                    ServerMessage::Leave {
                        id: connection_id.to_uuid(),
                    },
                    None,
                );
            }
            (None, None) => {}
        }

        tracing::info!(connection_id = %connection_id, "Connection closed");
    }

    /// Close connections that missed the previous ping, then ping the rest.
    pub fn ping_sweep(&mut self) {
        for connection_id in self.connections.ids() {
            let alive = self
                .connections
                .get(connection_id)
                .is_some_and(|info| info.alive);
            if alive {
                if let Some(info) = self.connections.get_mut(connection_id) {
                    info.alive = false;
                }
                self.connections.ping(connection_id);
            } else {
                tracing::info!(connection_id = %connection_id, "Terminating unresponsive connection");
                self.connections.close(connection_id);
                self.disconnect(connection_id);
            }
        }
    }

    /// End sessions whose host has been absent for the grace period and drop
    /// rooms that stayed empty.
    pub fn reap(&mut self) {
        let now = self.clock.now();
        let grace = self.config.host_absence_grace();

        let mut expired = Vec::new();
        for code in self.sessions.codes() {
            let Some(session) = self.sessions.get(&code) else {
                continue;
            };
            if self.host_present(session) {
                continue;
            }
            if let Some(session) = self.sessions.get_mut(&code) {
                session.mark_host_absent(now);
                if session.host_absence_expired(now, grace) {
                    expired.push(code);
                }
            }
        }

        for code in expired {
            self.end_session(&code, REASON_HOST_DISCONNECTED);
        }

        let removed = self.rooms.sweep_empty(now, self.config.room_empty_grace());
        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "Dropped empty rooms");
        }
    }

    /// Queue one lobby heartbeat per active session.
    pub fn heartbeat(&mut self) {
        let beats: Vec<LobbyHeartbeat> = self
            .sessions
            .iter()
            .map(|session| LobbyHeartbeat {
                code: session.code().clone(),
                viewer_count: self.viewer_count(session),
                is_movie_playing: session.is_movie_playing(),
            })
            .collect();
        for beat in beats {
            self.push_lobby(LobbyEvent::Heartbeat(beat));
        }
    }
}
