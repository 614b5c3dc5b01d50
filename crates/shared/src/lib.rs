//! Worldcast Protocol - Shared types for Engine and Player communication
//!
//! This crate contains the JSON messages exchanged over the relay WebSocket:
//! - `ClientMessage` (Player → Engine)
//! - `ServerMessage` (Engine → Player)
//! - Payload structs embedded in both
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, and uuid
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs** - raw `uuid::Uuid` and `String` in DTOs; the engine
//!    converts at its API boundary

pub mod messages;

pub use messages::{
    CharacterSnapshot, ClientMessage, PeerInfo, PeerSummary, Quat, ServerMessage, Vec3,
};
