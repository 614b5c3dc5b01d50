//! Infrastructure adapters for the player.

pub mod websocket;
