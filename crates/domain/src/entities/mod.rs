//! Domain entities

mod session;

pub use session::{Session, DEFAULT_MAX_VIEWERS};
