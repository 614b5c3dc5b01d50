//! Session client driver using tokio-tungstenite.
//!
//! Owns at most one socket at a time. Requests are decided by
//! [`SessionMachine`] under one lock, so queued joins, rejoins and live
//! sends never interleave out of order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use worldcast_shared::{CharacterSnapshot, ClientMessage, Quat, Vec3};

use super::core::{HostParams, Outgoing, SessionMachine};
use super::events::SessionEvent;
use super::message_builder::ClientMessageBuilder;
use super::protocol::{ConnectionState, Role};
use super::shared::{parse_server_message, EVENT_BUFFER, OUTBOUND_BUFFER};
use crate::config::ClientConfig;

type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long a closing writer gets to flush the close frame.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to the session client. Clones share one connection.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: ClientConfig,
    machine: Mutex<SessionMachine>,
    /// Sender for the open transport; lock only while holding `machine`
    tx: Mutex<Option<mpsc::Sender<ClientMessage>>>,
    events: broadcast::Sender<SessionEvent>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionClient {
    pub fn new(config: ClientConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(Inner {
                config,
                machine: Mutex::new(SessionMachine::new()),
                tx: Mutex::new(None),
                events,
                task: Mutex::new(None),
            }),
        }
    }

    /// Start connecting. Must be called inside a tokio runtime.
    ///
    /// Returns false if a connection loop is already running.
    pub fn connect(&self) -> bool {
        let mut task = lock(&self.inner.task);
        if let Some((cancel, handle)) = task.as_ref() {
            if !cancel.is_cancelled() && !handle.is_finished() {
                return false;
            }
        }

        lock(&self.inner.machine).on_connecting();
        self.inner.emit(SessionEvent::Connection(ConnectionState::Connecting));

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Arc::clone(&self.inner).run(cancel.clone()));
        *task = Some((cancel, handle));
        true
    }

    /// Close the socket and stop reconnecting. Forgets the current role.
    pub fn disconnect(&self) {
        let Some((cancel, _handle)) = lock(&self.inner.task).take() else {
            return;
        };
        {
            let mut machine = lock(&self.inner.machine);
            cancel.cancel();
            machine.on_disconnect();
            *lock(&self.inner.tx) = None;
        }
        tracing::info!("Disconnected from relay");
        self.inner.emit(SessionEvent::Connection(ConnectionState::Disconnected));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        lock(&self.inner.machine).connection()
    }

    pub fn role(&self) -> Role {
        lock(&self.inner.machine).role().clone()
    }

    /// Id the relay assigned to the current socket, once welcomed.
    pub fn self_id(&self) -> Option<uuid::Uuid> {
        lock(&self.inner.machine).self_id()
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Host a new session. Queued while connecting.
    pub fn create_session(&self, params: HostParams) -> bool {
        self.submit(|machine| machine.request_create(params))
    }

    /// Join by code. Queued while connecting; invalid codes return false.
    pub fn join_session(&self, code: &str, name: &str, color: u32) -> bool {
        self.submit(|machine| machine.request_join(code, name, color))
    }

    pub fn leave_session(&self) -> bool {
        self.submit(SessionMachine::request_leave)
    }

    /// Session-less world join.
    pub fn join_world(&self, world: &str, name: &str, color: u32) -> bool {
        self.submit(|machine| machine.request_join_world(world, name, color))
    }

    // =========================================================================
    // Sync traffic (never queued)
    // =========================================================================

    pub fn send_state(
        &self,
        pos: Vec3,
        rot: Quat,
        meta: Option<serde_json::Value>,
        color: Option<u32>,
    ) -> bool {
        self.submit(|machine| {
            gate(
                machine.can_relay(),
                || ClientMessageBuilder::state(pos, rot, meta, color),
            )
        })
    }

    pub fn send_playback_sync(&self, is_paused: bool, timestamp: f64) -> bool {
        self.submit(|machine| {
            gate(machine.can_direct(), || {
                ClientMessageBuilder::playback_sync(is_paused, timestamp)
            })
        })
    }

    pub fn send_character_sync(&self, characters: Vec<CharacterSnapshot>) -> bool {
        self.submit(|machine| {
            gate(machine.can_direct(), || {
                ClientMessageBuilder::character_sync(characters)
            })
        })
    }

    pub fn send_foundry_sync(&self, is_connected: bool, foundry_url: Option<String>) -> bool {
        self.submit(|machine| {
            gate(machine.can_direct(), || {
                ClientMessageBuilder::foundry_sync(is_connected, foundry_url)
            })
        })
    }

    pub fn send_chat(&self, message: &str) -> bool {
        if message.trim().is_empty() {
            return false;
        }
        self.submit(|machine| gate(machine.can_chat(), || ClientMessageBuilder::chat(message)))
    }

    fn submit(&self, decide: impl FnOnce(&mut SessionMachine) -> Outgoing) -> bool {
        let mut machine = lock(&self.inner.machine);
        match decide(&mut machine) {
            Outgoing::Send(msg) => self.inner.try_send(msg),
            Outgoing::Queued => {
                tracing::debug!("Session request queued until the connection opens");
                true
            }
            Outgoing::Rejected => false,
        }
    }
}

fn gate(allowed: bool, build: impl FnOnce() -> ClientMessage) -> Outgoing {
    if allowed {
        Outgoing::Send(build())
    } else {
        Outgoing::Rejected
    }
}

enum Exit {
    Cancelled,
    Closed,
}

impl Inner {
    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn try_send(&self, msg: ClientMessage) -> bool {
        match lock(&self.tx).as_ref() {
            Some(tx) => match tx.try_send(msg) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping outbound message");
                    false
                }
            },
            None => false,
        }
    }

    /// Connection loop: one socket at a time, fixed delay between attempts.
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let url = self.config.url.to_string();
        loop {
            let attempt = tokio::select! {
                _ = cancel.cancelled() => return,
                attempt = connect_async(url.as_str()) => attempt,
            };

            let was_open = match attempt {
                Ok((socket, _)) => {
                    tracing::info!(url = %url, "Connected to relay");
                    match self.serve(socket, &cancel).await {
                        Exit::Cancelled => return,
                        Exit::Closed => true,
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Connection attempt failed");
                    false
                }
            };

            {
                let mut machine = lock(&self.machine);
                if cancel.is_cancelled() {
                    return;
                }
                *lock(&self.tx) = None;
                machine.on_closed(false);
            }
            if was_open {
                tracing::info!(
                    delay_ms = self.config.reconnect_delay.as_millis() as u64,
                    "Connection lost, reconnecting"
                );
                self.emit(SessionEvent::Connection(ConnectionState::Connecting));
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }
    }

    async fn serve(&self, socket: ClientSocket, cancel: &CancellationToken) -> Exit {
        let (mut write, mut read) = socket.split();
        let (tx, mut rx) = mpsc::channel::<ClientMessage>(OUTBOUND_BUFFER);

        {
            let mut machine = lock(&self.machine);
            if cancel.is_cancelled() {
                return Exit::Cancelled;
            }
            for msg in machine.on_open() {
                if let Err(e) = tx.try_send(msg) {
                    tracing::warn!(error = %e, "Dropping replayed session request");
                }
            }
            *lock(&self.tx) = Some(tx);
        }
        self.emit(SessionEvent::Connection(ConnectionState::Open));

        let mut writer = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize client message");
                        continue;
                    }
                };
                if write.send(Message::Text(json)).await.is_err() {
                    return;
                }
            }
            let _ = write.send(Message::Close(None)).await;
        });

        let exit = loop {
            tokio::select! {
                _ = cancel.cancelled() => break Exit::Cancelled,
                _ = &mut writer => break Exit::Closed,
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(&text),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => self.handle_text(&text),
                        Err(_) => tracing::debug!("Dropping non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Relay closed the connection");
                        break Exit::Closed;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket read failed");
                        break Exit::Closed;
                    }
                    Some(Ok(_)) => {}
                },
            }
        };

        match exit {
            Exit::Cancelled if !writer.is_finished() => {
                // The sender was dropped on disconnect; let the close frame out.
                if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, writer).await.is_err() {
                    tracing::debug!("Writer did not finish closing in time");
                }
            }
            _ => writer.abort(),
        }
        exit
    }

    fn handle_text(&self, text: &str) {
        match parse_server_message(text) {
            Ok(msg) => {
                lock(&self.machine).on_server_message(&msg);
                if let Some(event) = SessionEvent::from_server(msg) {
                    self.emit(event);
                }
            }
            Err(e) => tracing::debug!(error = %e, "Dropping malformed server frame"),
        }
    }
}
