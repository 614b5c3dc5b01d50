//! Broadcast engine: the only place that decides who receives what.
//!
//! Membership is derived, never stored: the members of a session are the
//! connections in its world's room whose session tag equals its code. The
//! legacy room audience is the connections in a room with no session tag.

use worldcast_domain::{ConnectionId, Session, SessionCode};
use worldcast_shared::{PeerSummary, ServerMessage};

use crate::api::connections::ConnectionRegistry;
use crate::stores::RoomIndex;

use super::relay::RelayState;

/// Members of the session `code` hosted in `world`.
pub fn session_members(
    connections: &ConnectionRegistry,
    rooms: &RoomIndex,
    world: &str,
    code: &SessionCode,
) -> Vec<ConnectionId> {
    rooms
        .members(world)
        .filter(|id| {
            connections
                .get(*id)
                .is_some_and(|info| info.in_session(code))
        })
        .collect()
}

/// Session-less connections in `world`.
pub fn legacy_room_members(
    connections: &ConnectionRegistry,
    rooms: &RoomIndex,
    world: &str,
) -> Vec<ConnectionId> {
    rooms
        .members(world)
        .filter(|id| {
            connections
                .get(*id)
                .is_some_and(|info| info.session_code.is_none())
        })
        .collect()
}

impl RelayState {
    pub(crate) fn members_of(&self, session: &Session) -> Vec<ConnectionId> {
        session_members(
            &self.connections,
            &self.rooms,
            session.world_url(),
            session.code(),
        )
    }

    /// Non-host members currently in the session.
    pub(crate) fn viewer_count(&self, session: &Session) -> u32 {
        self.members_of(session)
            .into_iter()
            .filter(|id| !session.is_hosted_by(*id))
            .count() as u32
    }

    /// The host transport is live and still tagged into this session.
    pub(crate) fn host_present(&self, session: &Session) -> bool {
        let host = session.host_connection_id();
        self.rooms.contains(session.world_url(), host)
            && self
                .connections
                .get(host)
                .is_some_and(|info| info.is_host && info.in_session(session.code()))
    }

    /// Fan out to every member of `code`, optionally skipping the sender.
    pub(crate) fn broadcast_to_session(
        &self,
        code: &SessionCode,
        message: ServerMessage,
        except: Option<ConnectionId>,
    ) -> usize {
        let Some(session) = self.sessions.get(code) else {
            return 0;
        };
        let mut delivered = 0;
        for id in self.members_of(session) {
            if Some(id) == except {
                continue;
            }
            if self.connections.send_to(id, message.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Legacy path: session-less members of a world room only.
    pub(crate) fn broadcast_to_room(
        &self,
        world: &str,
        message: ServerMessage,
        except: Option<ConnectionId>,
    ) -> usize {
        let mut delivered = 0;
        for id in legacy_room_members(&self.connections, &self.rooms, world) {
            if Some(id) == except {
                continue;
            }
            if self.connections.send_to(id, message.clone()) {
                delivered += 1;
            }
        }
        delivered
    }

    pub(crate) fn broadcast_session_info(&self, code: &SessionCode) {
        let Some(session) = self.sessions.get(code) else {
            return;
        };

        let mut host = None;
        let mut viewers = Vec::new();
        for id in self.members_of(session) {
            let Some(info) = self.connections.get(id) else {
                continue;
            };
            let summary = PeerSummary {
                id: id.to_uuid(),
                name: info.display_name.clone(),
            };
            if session.is_hosted_by(id) {
                host = Some(summary);
            } else {
                viewers.push(summary);
            }
        }

        let message = ServerMessage::SessionInfo {
            session_code: code.to_string(),
            host,
            viewer_count: viewers.len() as u32,
            viewers,
            max_viewers: session.max_viewers(),
            foundry_url: session.foundry_url().map(str::to_string),
        };
        self.broadcast_to_session(code, message, None);
    }
}
