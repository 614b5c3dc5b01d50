//! Infrastructure implementations.
//!
//! Contains port traits and their implementations for everything the relay
//! touches outside its own memory: time, randomness, the lobby store, timers
//! and process configuration.

pub mod clock;
pub mod config;
pub mod liveness;
pub mod lobby;
pub mod ports;
