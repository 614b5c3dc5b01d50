//! Worldcast Engine library.
//!
//! The session relay: a WebSocket broker that scopes avatar, playback and chat
//! traffic to code-addressed sessions inside shared world rooms.
//!
//! ## Structure
//!
//! - `stores/` - In-memory session table and room index
//! - `use_cases/` - The serialized relay and its operations
//! - `infrastructure/` - Config, clock, lobby client, liveness timers
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::App;
