//! Error types for the domain layer.

use thiserror::Error;

use crate::value_objects::SessionCode;

/// Unified error type for domain value construction
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Session-level failures reported back to the requesting client.
///
/// The `Display` text is what goes out on the wire in `session-error.error`;
/// [`SessionError::code`] is the stable machine-readable classification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session is full")]
    Full,

    /// The connection already hosts `existing`
    #[error("Already hosting a session")]
    AlreadyHosting { existing: SessionCode },
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NotFound => "SESSION_NOT_FOUND",
            SessionError::Full => "SESSION_FULL",
            SessionError::AlreadyHosting { .. } => "ALREADY_HOSTING",
        }
    }

    /// The session code carried by the error, if any.
    pub fn session_code(&self) -> Option<&SessionCode> {
        match self {
            SessionError::AlreadyHosting { existing } => Some(existing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("code cannot be empty");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: code cannot be empty");
    }

    #[test]
    fn session_error_messages_match_wire_text() {
        assert_eq!(SessionError::NotFound.to_string(), "Session not found");
        assert_eq!(SessionError::Full.to_string(), "Session is full");
        assert_eq!(SessionError::Full.code(), "SESSION_FULL");
    }

    #[test]
    fn already_hosting_carries_existing_code() {
        let existing = SessionCode::parse("ABCDEF").unwrap();
        let err = SessionError::AlreadyHosting {
            existing: existing.clone(),
        };
        assert_eq!(err.code(), "ALREADY_HOSTING");
        assert_eq!(err.session_code(), Some(&existing));
        assert_eq!(SessionError::NotFound.session_code(), None);
    }
}
