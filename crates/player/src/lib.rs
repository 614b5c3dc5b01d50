//! Worldcast Player crate.
//!
//! Client side of the session relay: a platform-agnostic session state
//! machine and a tokio driver that keeps one relay connection alive,
//! replays the previous role after a drop and publishes a typed event stream.

pub mod config;
pub mod infrastructure;

pub use config::{ClientConfig, ClientError};
pub use infrastructure::websocket::{
    ConnectionState, HostParams, Role, SessionClient, SessionEvent, SessionMachine,
};
