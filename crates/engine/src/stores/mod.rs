//! In-memory relay state.
//!
//! - `SessionTable` - active sessions keyed by code
//! - `RoomIndex` - connections grouped by world

pub mod room;
pub mod session;

pub use room::RoomIndex;
pub use session::SessionTable;
