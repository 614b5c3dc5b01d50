//! Use cases - relay behaviour.
//!
//! `Relay` is the single serialized coordinator. Each module below adds one
//! group of operations to `RelayState`; every operation runs to completion
//! under the relay lock.

pub mod broadcast;
pub mod legacy;
pub mod lifecycle;
pub mod presence;
pub mod relay;
pub mod sync;

pub use relay::{LobbyEvent, Relay, RelayState, SessionOverview};

#[cfg(test)]
pub(crate) mod test_support;
