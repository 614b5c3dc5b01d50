//! Legacy session-less world rooms.
//!
//! A connection that joins a world without a code only ever talks to the other
//! session-less connections in that world. Once it has a session code it never
//! reaches this path.

use worldcast_domain::ConnectionId;
use worldcast_shared::{PeerInfo, ServerMessage};

use super::broadcast::legacy_room_members;
use super::relay::RelayState;

impl RelayState {
    pub fn join_world(&mut self, connection_id: ConnectionId, world: String, name: String, color: u32) {
        let Some(info) = self.connections.get(connection_id) else {
            return;
        };
        if info.session_code.is_some() {
            tracing::debug!(connection_id = %connection_id, "Ignoring legacy join while in a session");
            return;
        }
        if let Some(current) = info.world.clone() {
            if current != world {
                self.legacy_leave(connection_id, &current);
            }
        }

        let peers = legacy_room_members(&self.connections, &self.rooms, &world)
            .into_iter()
            .filter(|id| *id != connection_id)
            .filter_map(|id| {
                self.connections.get(id).map(|peer| PeerInfo {
                    id: id.to_uuid(),
                    name: peer.display_name.clone(),
                    color: peer.color,
                    is_host: false,
                })
            })
            .collect();

        if let Some(info) = self.connections.get_mut(connection_id) {
            info.display_name = name.clone();
            info.color = color;
            info.world = Some(world.clone());
        }
        self.rooms.join(&world, connection_id);

        tracing::info!(connection_id = %connection_id, world = %world, "Legacy world join");

        self.connections
            .send_to(connection_id, ServerMessage::Peers { peers });
        self.broadcast_to_room(
            &world,
            ServerMessage::Join {
                id: connection_id.to_uuid(),
                name,
                color,
                is_host: false,
            },
            Some(connection_id),
        );
    }

    pub(crate) fn legacy_leave(&mut self, connection_id: ConnectionId, world: &str) {
        let now = self.clock.now();
        if !self.rooms.leave(world, connection_id, now) {
            return;
        }
        if let Some(info) = self.connections.get_mut(connection_id) {
            info.world = None;
        }
        self.broadcast_to_room(
            world,
            ServerMessage::Leave {
                id: connection_id.to_uuid(),
            },
            None,
        );
    }
}
