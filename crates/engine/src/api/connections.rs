//! Connection registry for WebSocket clients.
//!
//! Tracks every live transport and the ephemeral identity attached to it.
//! Owned by `RelayState`, so all methods are synchronous.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use worldcast_domain::{ConnectionId, SessionCode};
use worldcast_shared::ServerMessage;

/// Frames queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message(ServerMessage),
    /// Liveness probe, written as a WebSocket ping frame
    Ping,
    /// Ask the writer to close the transport
    Close,
}

/// Identity attached to a connected client.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Assigned on accept, never reused
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub color: u32,
    /// World room this connection is in
    pub world: Option<String>,
    /// Session this connection belongs to
    pub session_code: Option<SessionCode>,
    pub is_host: bool,
    /// Cleared on each ping, set again by a pong
    pub alive: bool,
}

impl ConnectionInfo {
    fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            display_name: String::new(),
            color: 0,
            world: None,
            session_code: None,
            is_host: false,
            alive: true,
        }
    }

    pub fn in_session(&self, code: &SessionCode) -> bool {
        self.session_code.as_ref() == Some(code)
    }

    /// Drop session tags, keeping display identity.
    pub fn clear_session(&mut self) {
        self.session_code = None;
        self.is_host = false;
    }
}

#[derive(Debug)]
struct Entry {
    info: ConnectionInfo,
    sender: mpsc::Sender<Outbound>,
    /// Cancelled when the transport must go away, whatever its queue holds
    shutdown: CancellationToken,
}

/// All live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Entry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new transport. The returned token fires when the relay drops it.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        sender: mpsc::Sender<Outbound>,
    ) -> CancellationToken {
        let shutdown = CancellationToken::new();
        self.connections.insert(
            connection_id,
            Entry {
                info: ConnectionInfo::new(connection_id),
                sender,
                shutdown: shutdown.clone(),
            },
        );
        tracing::debug!(connection_id = %connection_id, "Connection registered");
        shutdown
    }

    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<ConnectionInfo> {
        let entry = self.connections.remove(&connection_id)?;
        entry.shutdown.cancel();
        tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        Some(entry.info)
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<&ConnectionInfo> {
        self.connections.get(&connection_id).map(|entry| &entry.info)
    }

    pub fn get_mut(&mut self, connection_id: ConnectionId) -> Option<&mut ConnectionInfo> {
        self.connections
            .get_mut(&connection_id)
            .map(|entry| &mut entry.info)
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queue a message without blocking; a full or closed channel drops it.
    pub fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) -> bool {
        self.push(connection_id, Outbound::Message(message))
    }

    pub fn ping(&self, connection_id: ConnectionId) -> bool {
        self.push(connection_id, Outbound::Ping)
    }

    /// Terminate the transport. The close frame is best effort; the shutdown
    /// token fires even when the queue is full.
    pub fn close(&self, connection_id: ConnectionId) -> bool {
        let Some(entry) = self.connections.get(&connection_id) else {
            return false;
        };
        let _ = entry.sender.try_send(Outbound::Close);
        entry.shutdown.cancel();
        true
    }

    fn push(&self, connection_id: ConnectionId, frame: Outbound) -> bool {
        let Some(entry) = self.connections.get(&connection_id) else {
            return false;
        };
        match entry.sender.try_send(frame) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to queue frame, channel full or closed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_to_unknown_connection_is_false() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send_to(ConnectionId::new(), ServerMessage::Unknown));
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new();
        let (tx, mut rx) = mpsc::channel(1);
        let _shutdown = registry.register(id, tx);

        assert!(registry.ping(id));
        assert!(!registry.ping(id));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Ping);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn new_connection_starts_alive_without_session() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new();
        let (tx, _rx) = mpsc::channel(4);
        let shutdown = registry.register(id, tx);

        let info = registry.get(id).unwrap();
        assert!(info.alive);
        assert!(info.session_code.is_none());
        assert!(!info.is_host);

        assert!(registry.unregister(id).is_some());
        assert!(registry.is_empty());
        assert!(shutdown.is_cancelled());
    }

    #[test]
    fn close_fires_shutdown_even_when_queue_is_full() {
        let mut registry = ConnectionRegistry::new();
        let id = ConnectionId::new();
        let (tx, mut rx) = mpsc::channel(1);
        let shutdown = registry.register(id, tx);

        assert!(registry.ping(id));
        assert!(registry.close(id));
        assert!(shutdown.is_cancelled());
        assert_eq!(rx.try_recv().unwrap(), Outbound::Ping);
        assert!(rx.try_recv().is_err());
    }
}
