//! Client configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::infrastructure::websocket::RECONNECT_DELAY;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Relay URL must use ws:// or wss://, got {0}://")]
    UnsupportedScheme(String),
}

/// Where to connect and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub url: Url,
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    pub fn new(url: &str) -> Result<Self, ClientError> {
        let url = Url::parse(url.trim())?;
        match url.scheme() {
            "ws" | "wss" => Ok(Self {
                url,
                reconnect_delay: RECONNECT_DELAY,
            }),
            other => Err(ClientError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}
