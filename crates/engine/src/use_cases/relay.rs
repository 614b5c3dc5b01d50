//! Serialized relay coordinator.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use worldcast_domain::{ConnectionId, Session, SessionCode, SessionError};
use worldcast_shared::{ClientMessage, ServerMessage};

use crate::api::connections::{ConnectionRegistry, Outbound};
use crate::infrastructure::config::RelayConfig;
use crate::infrastructure::ports::{
    ClockPort, LobbyHeartbeat, LobbyPort, LobbyRegistration, RandomPort,
};
use crate::stores::{RoomIndex, SessionTable};

/// Lobby store side effects collected under the lock, sent after release.
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
    Register(LobbyRegistration),
    Heartbeat(LobbyHeartbeat),
    End(SessionCode),
}

/// Public view of one session.
#[derive(Debug, Clone)]
pub struct SessionOverview {
    pub session: Session,
    pub viewer_count: u32,
}

/// Everything the relay mutates. Only reachable through [`Relay`] outside tests.
pub struct RelayState {
    pub(crate) connections: ConnectionRegistry,
    pub(crate) rooms: RoomIndex,
    pub(crate) sessions: SessionTable,
    pub(crate) clock: Arc<dyn ClockPort>,
    pub(crate) random: Arc<dyn RandomPort>,
    pub(crate) config: RelayConfig,
    lobby_events: Vec<LobbyEvent>,
}

impl RelayState {
    pub fn new(
        config: RelayConfig,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            connections: ConnectionRegistry::new(),
            rooms: RoomIndex::new(),
            sessions: SessionTable::new(),
            clock,
            random,
            config,
            lobby_events: Vec::new(),
        }
    }

    /// Accept a transport; the server-assigned id is announced via `welcome`.
    /// The token fires once the relay has dropped the connection.
    pub fn connect(
        &mut self,
        sender: mpsc::Sender<Outbound>,
    ) -> (ConnectionId, CancellationToken) {
        let connection_id = ConnectionId::new();
        let shutdown = self.connections.register(connection_id, sender);
        self.connections.send_to(
            connection_id,
            ServerMessage::Welcome {
                id: connection_id.to_uuid(),
            },
        );
        (connection_id, shutdown)
    }

    /// Route one parsed client message.
    pub fn dispatch(&mut self, connection_id: ConnectionId, msg: ClientMessage) {
        if !self.connections.contains(connection_id) {
            return;
        }

        match msg {
            ClientMessage::CreateSession {
                world_url,
                foundry_url,
                name,
                color,
                max_viewers,
                movie_title,
            } => {
                let result = self.create_session(
                    connection_id,
                    world_url,
                    foundry_url,
                    name,
                    color,
                    max_viewers,
                    movie_title,
                );
                self.report(connection_id, result);
            }
            ClientMessage::JoinSession {
                session_code,
                name,
                color,
            } => {
                let result = self.join_session(connection_id, &session_code, name, color);
                self.report(connection_id, result);
            }
            ClientMessage::LeaveSession {} => self.leave_session(connection_id),
            ClientMessage::Join { world, name, color } => {
                self.join_world(connection_id, world, name, color)
            }
            ClientMessage::State {
                pos,
                rot,
                meta,
                color,
            } => self.relay_state(connection_id, pos, rot, meta, color),
            ClientMessage::PlaybackSync {
                is_paused,
                timestamp,
            } => self.playback_sync(connection_id, is_paused, timestamp),
            ClientMessage::CharacterSync { characters } => {
                self.character_sync(connection_id, characters)
            }
            ClientMessage::FoundrySync {
                is_connected,
                foundry_url,
            } => self.foundry_sync(connection_id, is_connected, foundry_url),
            ClientMessage::Chat { message } => self.chat(connection_id, &message),
            ClientMessage::Unknown => {
                tracing::debug!(connection_id = %connection_id, "Dropping unknown message type");
            }
        }
    }

    /// Session errors go to the originating connection only.
    fn report(&self, connection_id: ConnectionId, result: Result<(), SessionError>) {
        if let Err(err) = result {
            tracing::info!(
                connection_id = %connection_id,
                code = err.code(),
                "Session request rejected"
            );
            self.connections.send_to(
                connection_id,
                ServerMessage::SessionError {
                    error: err.to_string(),
                    code: err.code().to_string(),
                    session_code: err.session_code().map(|code| code.to_string()),
                },
            );
        }
    }

    pub(crate) fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    pub(crate) fn push_lobby(&mut self, event: LobbyEvent) {
        self.lobby_events.push(event);
    }

    pub(crate) fn take_lobby_events(&mut self) -> Vec<LobbyEvent> {
        std::mem::take(&mut self.lobby_events)
    }

    pub fn overview(&self, raw_code: &str) -> Option<SessionOverview> {
        let session = self.sessions.lookup(raw_code)?;
        Some(SessionOverview {
            session: session.clone(),
            viewer_count: self.viewer_count(session),
        })
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// The relay: one lock around all state, plus a queue into the lobby worker.
pub struct Relay {
    state: Mutex<RelayState>,
    lobby: mpsc::UnboundedSender<LobbyEvent>,
}

impl Relay {
    pub fn new(
        config: RelayConfig,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        lobby: Arc<dyn LobbyPort>,
    ) -> Self {
        let (lobby_tx, lobby_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_lobby_worker(lobby, lobby_rx));
        Self {
            state: Mutex::new(RelayState::new(config, clock, random)),
            lobby: lobby_tx,
        }
    }

    /// Run `f` under the lock, then hand collected lobby events to the store.
    async fn with_state<R>(&self, f: impl FnOnce(&mut RelayState) -> R) -> R {
        let (result, events) = {
            let mut state = self.state.lock().await;
            let result = f(&mut state);
            (result, state.take_lobby_events())
        };
        self.dispatch_lobby(events);
        result
    }

    fn dispatch_lobby(&self, events: Vec<LobbyEvent>) {
        for event in events {
            if self.lobby.send(event).is_err() {
                tracing::warn!("Lobby worker stopped, dropping lobby event");
            }
        }
    }

    pub async fn connect(
        &self,
        sender: mpsc::Sender<Outbound>,
    ) -> (ConnectionId, CancellationToken) {
        self.with_state(|state| state.connect(sender)).await
    }

    pub async fn handle(&self, connection_id: ConnectionId, msg: ClientMessage) {
        self.with_state(|state| state.dispatch(connection_id, msg))
            .await
    }

    pub async fn pong(&self, connection_id: ConnectionId) {
        self.with_state(|state| state.mark_alive(connection_id))
            .await
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) {
        self.with_state(|state| state.disconnect(connection_id))
            .await
    }

    pub async fn ping_sweep(&self) {
        self.with_state(RelayState::ping_sweep).await
    }

    pub async fn reap(&self) {
        self.with_state(RelayState::reap).await
    }

    pub async fn heartbeat(&self) {
        self.with_state(RelayState::heartbeat).await
    }

    pub async fn overview(&self, raw_code: &str) -> Option<SessionOverview> {
        self.with_state(|state| state.overview(raw_code)).await
    }

    pub async fn counts(&self) -> (usize, usize) {
        self.with_state(|state| (state.connection_count(), state.session_count()))
            .await
    }
}

/// Apply lobby events one at a time, in the order the relay produced them.
async fn run_lobby_worker(
    lobby: Arc<dyn LobbyPort>,
    mut events: mpsc::UnboundedReceiver<LobbyEvent>,
) {
    while let Some(event) = events.recv().await {
        let (kind, result) = match event {
            LobbyEvent::Register(registration) => {
                ("register", lobby.register(registration).await)
            }
            LobbyEvent::Heartbeat(heartbeat) => {
                ("heartbeat", lobby.heartbeat(heartbeat).await)
            }
            LobbyEvent::End(code) => ("end", lobby.end(code).await),
        };
        if let Err(e) = result {
            tracing::warn!(call = kind, error = %e, "Lobby store call failed");
        }
    }
    tracing::debug!("Lobby worker stopped");
}
