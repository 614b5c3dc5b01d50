//! WebSocket session client for the relay
//!
//! - `core`: runtime-free session state machine
//! - `client`: tokio-tungstenite driver with fixed-delay reconnect
//! - `message_builder`: `ClientMessage` construction

mod client;
mod core;
mod events;
mod message_builder;
mod protocol;
mod shared;

pub use client::SessionClient;
pub use self::core::{HostParams, Outgoing, PendingJoin, Rejoin, SessionMachine, ViewParams};
pub use events::SessionEvent;
pub use message_builder::ClientMessageBuilder;
pub use protocol::{ConnectionState, Role};
pub use shared::RECONNECT_DELAY;
