//! Relay configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use worldcast_domain::DEFAULT_MAX_VIEWERS;

/// Seconds between liveness pings.
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_HOST_ABSENCE_GRACE_SECS: u64 = 30 * 60;
pub const DEFAULT_ROOM_EMPTY_GRACE_SECS: u64 = 10 * 60;
pub const DEFAULT_LOBBY_HEARTBEAT_SECS: u64 = 30;
pub const DEFAULT_VIEWER_CAP: u32 = 32;
pub const DEFAULT_CHAT_MAX_CHARS: usize = 500;

/// Everything the relay needs to know about its process environment.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    pub server_host: String,
    pub server_port: u16,
    /// Address advertised to the lobby store for viewers to connect to
    pub public_addr: String,
    /// Base URL of the lobby store; `None` disables lobby calls
    pub lobby_url: Option<String>,
    pub cors_allowed_origins: Option<String>,
    pub ping_interval_secs: u64,
    pub session_sweep_interval_secs: u64,
    pub host_absence_grace_secs: u64,
    pub room_empty_grace_secs: u64,
    pub lobby_heartbeat_secs: u64,
    pub default_max_viewers: u32,
    pub viewer_cap: u32,
    pub chat_max_chars: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            public_addr: "ws://localhost:3000/ws".into(),
            lobby_url: None,
            cors_allowed_origins: None,
            ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
            session_sweep_interval_secs: DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
            host_absence_grace_secs: DEFAULT_HOST_ABSENCE_GRACE_SECS,
            room_empty_grace_secs: DEFAULT_ROOM_EMPTY_GRACE_SECS,
            lobby_heartbeat_secs: DEFAULT_LOBBY_HEARTBEAT_SECS,
            default_max_viewers: DEFAULT_MAX_VIEWERS,
            viewer_cap: DEFAULT_VIEWER_CAP,
            chat_max_chars: DEFAULT_CHAT_MAX_CHARS,
        }
    }
}

impl RelayConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (tests use a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| lookup(key))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let server_port = parse_or(text(&["SERVER_PORT", "PORT"]), "SERVER_PORT", defaults.server_port);

        Self {
            server_host: text(&["SERVER_HOST"]).unwrap_or(defaults.server_host),
            server_port,
            public_addr: text(&["PUBLIC_ADDR"])
                .unwrap_or_else(|| format!("ws://localhost:{server_port}/ws")),
            lobby_url: text(&["LOBBY_URL"]).map(|url| url.trim_end_matches('/').to_string()),
            cors_allowed_origins: text(&["CORS_ALLOWED_ORIGINS"]),
            ping_interval_secs: parse_or(
                text(&["PING_INTERVAL_SECS"]),
                "PING_INTERVAL_SECS",
                defaults.ping_interval_secs,
            ),
            session_sweep_interval_secs: parse_or(
                text(&["SESSION_SWEEP_INTERVAL_SECS"]),
                "SESSION_SWEEP_INTERVAL_SECS",
                defaults.session_sweep_interval_secs,
            ),
            host_absence_grace_secs: parse_or(
                text(&["HOST_ABSENCE_GRACE_SECS"]),
                "HOST_ABSENCE_GRACE_SECS",
                defaults.host_absence_grace_secs,
            ),
            room_empty_grace_secs: parse_or(
                text(&["ROOM_EMPTY_GRACE_SECS"]),
                "ROOM_EMPTY_GRACE_SECS",
                defaults.room_empty_grace_secs,
            ),
            lobby_heartbeat_secs: parse_or(
                text(&["LOBBY_HEARTBEAT_SECS"]),
                "LOBBY_HEARTBEAT_SECS",
                defaults.lobby_heartbeat_secs,
            ),
            default_max_viewers: parse_or(
                text(&["DEFAULT_MAX_VIEWERS"]),
                "DEFAULT_MAX_VIEWERS",
                defaults.default_max_viewers,
            )
            .max(1),
            viewer_cap: parse_or(text(&["VIEWER_CAP"]), "VIEWER_CAP", defaults.viewer_cap).max(1),
            chat_max_chars: parse_or(
                text(&["CHAT_MAX_CHARS"]),
                "CHAT_MAX_CHARS",
                defaults.chat_max_chars,
            ),
        }
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }

    pub fn session_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.session_sweep_interval_secs.max(1))
    }

    pub fn lobby_heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.lobby_heartbeat_secs.max(1))
    }

    pub fn host_absence_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.host_absence_grace_secs as i64)
    }

    pub fn room_empty_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.room_empty_grace_secs as i64)
    }

    /// Requested viewer capacity clamped to `1..=viewer_cap`.
    pub fn clamp_max_viewers(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_max_viewers)
            .clamp(1, self.viewer_cap)
    }
}

fn parse_or<T: FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => match raw.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
                default
            }
        },
        None => default,
    }
}
