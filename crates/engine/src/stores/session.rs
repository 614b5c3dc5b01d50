//! Session table: the authoritative source of session identity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use worldcast_domain::{ConnectionId, Session, SessionCode, SessionError};

use crate::infrastructure::ports::RandomPort;

/// Parameters for a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub world_url: String,
    pub host_connection_id: ConnectionId,
    pub host_name: String,
    pub foundry_url: Option<String>,
    pub max_viewers: u32,
}

/// Active sessions keyed by canonical code.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<SessionCode, Session>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh code and store the session.
    ///
    /// Fails with `AlreadyHosting` (carrying the existing code) when the host
    /// connection already owns a session.
    pub fn create(
        &mut self,
        params: NewSession,
        random: &dyn RandomPort,
        now: DateTime<Utc>,
    ) -> Result<SessionCode, SessionError> {
        if let Some(existing) = self.hosted_by(params.host_connection_id) {
            return Err(SessionError::AlreadyHosting {
                existing: existing.code().clone(),
            });
        }

        let code = loop {
            let candidate = SessionCode::generate(|n| random.gen_index(n));
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(session_code = %candidate, "Session code collision, retrying");
        };

        let session = Session::new(
            code.clone(),
            params.world_url,
            params.host_connection_id,
            params.host_name,
            params.foundry_url,
            params.max_viewers,
            now,
        );
        self.sessions.insert(code.clone(), session);
        Ok(code)
    }

    /// Case-insensitive lookup from raw user input.
    pub fn lookup(&self, raw_code: &str) -> Option<&Session> {
        let code = SessionCode::parse(raw_code).ok()?;
        self.sessions.get(&code)
    }

    pub fn get(&self, code: &SessionCode) -> Option<&Session> {
        self.sessions.get(code)
    }

    pub fn get_mut(&mut self, code: &SessionCode) -> Option<&mut Session> {
        self.sessions.get_mut(code)
    }

    pub fn hosted_by(&self, connection_id: ConnectionId) -> Option<&Session> {
        self.sessions
            .values()
            .find(|session| session.is_hosted_by(connection_id))
    }

    pub fn remove(&mut self, code: &SessionCode) -> Option<Session> {
        self.sessions.remove(code)
    }

    /// The only mutation a host may make after creation.
    pub fn touch_is_movie_playing(&mut self, code: &SessionCode, playing: bool) -> bool {
        match self.sessions.get_mut(code) {
            Some(session) => {
                session.set_movie_playing(playing);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn codes(&self) -> Vec<SessionCode> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
