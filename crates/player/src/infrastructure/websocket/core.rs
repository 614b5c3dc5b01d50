//! Platform-agnostic core of the session client.
//!
//! This is deliberately free of any runtime dependency. The driver owns the
//! socket and timers; it feeds transport and server events into
//! [`SessionMachine`] and sends whatever messages the machine hands back.

use worldcast_domain::SessionCode;
use worldcast_shared::{ClientMessage, ServerMessage};

use super::message_builder::ClientMessageBuilder;
use super::protocol::{ConnectionState, Role};

/// Everything needed to (re)issue `create-session`.
#[derive(Debug, Clone, PartialEq)]
pub struct HostParams {
    pub world_url: String,
    pub foundry_url: Option<String>,
    pub name: String,
    pub color: u32,
    pub max_viewers: Option<u32>,
    pub movie_title: Option<String>,
}

impl HostParams {
    pub fn new(world_url: impl Into<String>, name: impl Into<String>, color: u32) -> Self {
        Self {
            world_url: world_url.into(),
            foundry_url: None,
            name: name.into(),
            color,
            max_viewers: None,
            movie_title: None,
        }
    }
}

/// Everything needed to (re)issue `join-session`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewParams {
    pub code: SessionCode,
    pub name: String,
    pub color: u32,
}

/// A session request waiting for the transport to open. One slot only.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingJoin {
    Host(HostParams),
    View(ViewParams),
}

impl PendingJoin {
    fn to_message(&self) -> ClientMessage {
        match self {
            PendingJoin::Host(params) => ClientMessageBuilder::create_session(params),
            PendingJoin::View(params) => ClientMessageBuilder::join_session(params),
        }
    }
}

/// The role remembered across a dropped transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Rejoin {
    #[default]
    WasIdle,
    WasHosting(HostParams),
    WasViewing(ViewParams),
}

/// What the driver should do with a requested operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Write this message to the open transport
    Send(ClientMessage),
    /// Held until the transport opens
    Queued,
    /// Preconditions not met; nothing sent
    Rejected,
}

/// Session client state machine.
#[derive(Debug, Default)]
pub struct SessionMachine {
    connection: ConnectionState,
    role: Role,
    rejoin: Rejoin,
    pending: Option<PendingJoin>,
    /// The last create/join actually written, matched against the server reply
    in_flight: Option<PendingJoin>,
    /// Legacy session-less world, re-joined after a reconnect
    legacy_world: Option<(String, String, u32)>,
    self_id: Option<uuid::Uuid>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn rejoin(&self) -> &Rejoin {
        &self.rejoin
    }

    pub fn pending(&self) -> Option<&PendingJoin> {
        self.pending.as_ref()
    }

    /// Id the server assigned to the current transport.
    pub fn self_id(&self) -> Option<uuid::Uuid> {
        self.self_id
    }

    // =========================================================================
    // Transport events
    // =========================================================================

    /// A connection attempt is starting (or the next one is scheduled).
    pub fn on_connecting(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    /// The transport opened. Returns the messages to send, in order.
    ///
    /// A queued request wins over rejoin; otherwise the remembered role is
    /// replayed. A fresh transport never carries over server-side membership,
    /// so the role resets to idle until the server confirms.
    pub fn on_open(&mut self) -> Vec<ClientMessage> {
        self.connection = ConnectionState::Open;
        self.role = Role::Idle;
        self.self_id = None;

        let mut out = Vec::new();
        let request = match self.pending.take() {
            Some(pending) => Some(pending),
            None => match &self.rejoin {
                Rejoin::WasIdle => None,
                Rejoin::WasHosting(params) => Some(PendingJoin::Host(params.clone())),
                Rejoin::WasViewing(params) => Some(PendingJoin::View(params.clone())),
            },
        };

        match request {
            Some(request) => {
                out.push(request.to_message());
                self.in_flight = Some(request);
            }
            None => {
                if let Some((world, name, color)) = &self.legacy_world {
                    out.push(ClientMessageBuilder::join_world(world, name, *color));
                }
            }
        }
        out
    }

    /// The transport closed. `intentional` is true after an explicit disconnect.
    pub fn on_closed(&mut self, intentional: bool) {
        self.role = Role::Idle;
        self.in_flight = None;
        self.self_id = None;
        if intentional {
            self.connection = ConnectionState::Disconnected;
            self.rejoin = Rejoin::WasIdle;
            self.pending = None;
            self.legacy_world = None;
        } else {
            self.connection = ConnectionState::Connecting;
        }
    }

    /// Explicit disconnect: terminal until the next connect.
    pub fn on_disconnect(&mut self) {
        self.on_closed(true);
    }

    /// Fold a server message into the machine state.
    pub fn on_server_message(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::Welcome { id } => self.self_id = Some(*id),
            ServerMessage::SessionCreated { session_code, .. } => {
                let Ok(code) = SessionCode::parse(session_code) else {
                    tracing::warn!(session_code = %session_code, "Server sent an invalid session code");
                    return;
                };
                if let Some(PendingJoin::Host(params)) = self.in_flight.take() {
                    self.rejoin = Rejoin::WasHosting(params);
                }
                self.legacy_world = None;
                self.role = Role::Hosting(code);
            }
            ServerMessage::SessionJoined { session_code, .. } => {
                let Ok(code) = SessionCode::parse(session_code) else {
                    tracing::warn!(session_code = %session_code, "Server sent an invalid session code");
                    return;
                };
                if let Some(PendingJoin::View(params)) = self.in_flight.take() {
                    self.rejoin = Rejoin::WasViewing(ViewParams { code: code.clone(), ..params });
                }
                self.legacy_world = None;
                self.role = Role::Viewing(code);
            }
            ServerMessage::SessionError { code, session_code, .. } => {
                let failed = self.in_flight.take();
                match code.as_str() {
                    "ALREADY_HOSTING" => {
                        if let Some(existing) =
                            session_code.as_deref().and_then(|c| SessionCode::parse(c).ok())
                        {
                            self.role = Role::Hosting(existing);
                        }
                    }
                    // A remembered session that is gone or full is not retried.
                    _ => {
                        if failed.is_some() && self.role == Role::Idle {
                            self.rejoin = Rejoin::WasIdle;
                        }
                    }
                }
            }
            ServerMessage::SessionEnded { .. } => {
                self.role = Role::Idle;
                self.rejoin = Rejoin::WasIdle;
            }
            _ => {}
        }
    }

    // =========================================================================
    // Application requests
    // =========================================================================

    pub fn request_create(&mut self, params: HostParams) -> Outgoing {
        self.request_session(PendingJoin::Host(params))
    }

    /// Join by code. Invalid codes are rejected locally.
    pub fn request_join(&mut self, raw_code: &str, name: &str, color: u32) -> Outgoing {
        let Ok(code) = SessionCode::parse(raw_code) else {
            return Outgoing::Rejected;
        };
        self.request_session(PendingJoin::View(ViewParams {
            code,
            name: name.to_string(),
            color,
        }))
    }

    fn request_session(&mut self, request: PendingJoin) -> Outgoing {
        match self.connection {
            ConnectionState::Disconnected => Outgoing::Rejected,
            ConnectionState::Connecting => {
                self.pending = Some(request);
                Outgoing::Queued
            }
            ConnectionState::Open => {
                let msg = request.to_message();
                self.in_flight = Some(request);
                Outgoing::Send(msg)
            }
        }
    }

    /// Leave the current session and forget it for rejoin purposes.
    pub fn request_leave(&mut self) -> Outgoing {
        self.pending = None;
        self.rejoin = Rejoin::WasIdle;
        if self.connection != ConnectionState::Open || self.role == Role::Idle {
            return Outgoing::Rejected;
        }
        self.role = Role::Idle;
        Outgoing::Send(ClientMessageBuilder::leave_session())
    }

    /// Legacy world join. Only while open and outside a session.
    pub fn request_join_world(&mut self, world: &str, name: &str, color: u32) -> Outgoing {
        if self.connection != ConnectionState::Open || self.role != Role::Idle {
            return Outgoing::Rejected;
        }
        self.legacy_world = Some((world.to_string(), name.to_string(), color));
        Outgoing::Send(ClientMessageBuilder::join_world(world, name, color))
    }

    /// Gate for perishable traffic (`state`, `chat`): open and in a session
    /// or legacy room. Never queued.
    pub fn can_relay(&self) -> bool {
        self.connection == ConnectionState::Open
            && (self.role != Role::Idle || self.legacy_world.is_some())
    }

    pub fn can_chat(&self) -> bool {
        self.connection == ConnectionState::Open && self.role != Role::Idle
    }

    /// Gate for host-only directives.
    pub fn can_direct(&self) -> bool {
        self.connection == ConnectionState::Open && self.role.is_hosting()
    }
}
