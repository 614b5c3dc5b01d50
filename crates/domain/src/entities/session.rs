//! Session entity - a code-scoped sharing context owned by one host.

use chrono::{DateTime, Duration, Utc};

use crate::ids::ConnectionId;
use crate::value_objects::SessionCode;

/// Viewer capacity used when the host does not ask for one.
pub const DEFAULT_MAX_VIEWERS: u32 = 8;

/// Metadata for one active session.
///
/// The world URL and host identity are fixed at creation. The only field a
/// host may change afterwards is the movie-playing flag; host presence is
/// tracked by the relay as the host transport comes and goes.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    code: SessionCode,
    world_url: String,
    host_connection_id: ConnectionId,
    host_name: String,
    foundry_url: Option<String>,
    max_viewers: u32,
    created_at: DateTime<Utc>,
    is_movie_playing: bool,
    host_absent_since: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        code: SessionCode,
        world_url: impl Into<String>,
        host_connection_id: ConnectionId,
        host_name: impl Into<String>,
        foundry_url: Option<String>,
        max_viewers: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            world_url: world_url.into(),
            host_connection_id,
            host_name: host_name.into(),
            foundry_url,
            max_viewers,
            created_at,
            is_movie_playing: false,
            host_absent_since: None,
        }
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn world_url(&self) -> &str {
        &self.world_url
    }

    pub fn host_connection_id(&self) -> ConnectionId {
        self.host_connection_id
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn foundry_url(&self) -> Option<&str> {
        self.foundry_url.as_deref()
    }

    pub fn max_viewers(&self) -> u32 {
        self.max_viewers
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_movie_playing(&self) -> bool {
        self.is_movie_playing
    }

    pub fn host_absent_since(&self) -> Option<DateTime<Utc>> {
        self.host_absent_since
    }

    /// Host authority is scoped to this exact session, not to a role flag.
    pub fn is_hosted_by(&self, connection_id: ConnectionId) -> bool {
        self.host_connection_id == connection_id
    }

    /// Whether one more viewer fits given the current viewer count.
    pub fn has_room_for_viewer(&self, current_viewers: usize) -> bool {
        current_viewers < self.max_viewers as usize
    }

    pub fn set_movie_playing(&mut self, playing: bool) {
        self.is_movie_playing = playing;
    }

    /// Record that the host transport went away. Keeps the earliest timestamp.
    pub fn mark_host_absent(&mut self, now: DateTime<Utc>) {
        if self.host_absent_since.is_none() {
            self.host_absent_since = Some(now);
        }
    }

    /// Whether the host has been gone for at least `grace`.
    ///
    /// The grace window starts at the later of creation and host departure, so
    /// a session is never reaped sooner than `grace` after it was created.
    pub fn host_absence_expired(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        match self.host_absent_since {
            Some(since) => {
                let start = since.max(self.created_at);
                now.signed_duration_since(start) >= grace
            }
            None => false,
        }
    }
}
