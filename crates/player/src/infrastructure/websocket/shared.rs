//! Constants and parsing shared by the session client.

use std::time::Duration;

use worldcast_shared::ServerMessage;

/// Fixed delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Outbound queue depth per transport.
pub const OUTBOUND_BUFFER: usize = 64;

/// Event fan-out capacity; slow subscribers observe `Lagged`.
pub const EVENT_BUFFER: usize = 256;

pub fn parse_server_message(text: &str) -> Result<ServerMessage, serde_json::Error> {
    serde_json::from_str(text)
}
