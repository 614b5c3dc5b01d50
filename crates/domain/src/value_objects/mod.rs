//! Value objects - Immutable objects defined by their attributes

mod session_code;

pub use session_code::{SessionCode, SESSION_CODE_ALPHABET, SESSION_CODE_LEN};
