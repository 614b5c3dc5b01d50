//! Connection and role states shared by the session core and its driver.

use worldcast_domain::SessionCode;

/// Transport state of the session client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport and no reconnect pending
    #[default]
    Disconnected,
    /// Opening a transport, or waiting out the delay before the next attempt
    Connecting,
    /// Transport open; session requests go straight out
    Open,
}

/// What the client is doing in the current transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    Idle,
    Hosting(SessionCode),
    Viewing(SessionCode),
}

impl Role {
    pub fn session_code(&self) -> Option<&SessionCode> {
        match self {
            Role::Idle => None,
            Role::Hosting(code) | Role::Viewing(code) => Some(code),
        }
    }

    pub fn is_hosting(&self) -> bool {
        matches!(self, Role::Hosting(_))
    }
}
