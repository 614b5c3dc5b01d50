//! Worldcast domain vocabulary.
//!
//! Pure types shared by the relay engine and the player client: connection
//! identity, session codes, and the session lifecycle rules. Nothing in here
//! touches a socket, a clock, or a random number generator directly; those are
//! injected by the callers.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{Session, DEFAULT_MAX_VIEWERS};
pub use error::{DomainError, SessionError};
pub use ids::ConnectionId;
pub use value_objects::{SessionCode, SESSION_CODE_ALPHABET, SESSION_CODE_LEN};
