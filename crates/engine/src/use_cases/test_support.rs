//! Socket-free relay harness: plain mpsc receivers stand in for connections.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use worldcast_domain::ConnectionId;
use worldcast_shared::{ClientMessage, ServerMessage};

use crate::api::connections::Outbound;
use crate::infrastructure::clock::{ManualClock, SequenceRandom};
use crate::infrastructure::config::RelayConfig;

use super::relay::RelayState;

pub(crate) const WORLD: &str = "https://worlds.example/w1";
pub(crate) const OTHER_WORLD: &str = "https://worlds.example/w2";

pub(crate) struct TestRelay {
    pub(crate) state: RelayState,
    pub(crate) clock: Arc<ManualClock>,
    shutdowns: HashMap<ConnectionId, CancellationToken>,
}

impl TestRelay {
    pub(crate) fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    pub(crate) fn with_config(config: RelayConfig) -> Self {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        // A counter keeps generated codes distinct across sessions.
        let picks: Vec<usize> = (0..6 * 64).map(|i| i / 6 + i % 6).collect();
        let state = RelayState::new(config, clock.clone(), Arc::new(SequenceRandom::new(picks)));
        Self {
            state,
            clock,
            shutdowns: HashMap::new(),
        }
    }

    pub(crate) fn connect(&mut self) -> (ConnectionId, mpsc::Receiver<Outbound>) {
        let (tx, mut rx) = mpsc::channel(256);
        let (id, shutdown) = self.state.connect(tx);
        self.shutdowns.insert(id, shutdown);
        match rx.try_recv() {
            Ok(Outbound::Message(ServerMessage::Welcome { id: welcomed })) => {
                assert_eq!(welcomed, id.to_uuid())
            }
            other => panic!("expected welcome, got {other:?}"),
        }
        (id, rx)
    }

    /// Whether the relay has told this connection's transport to go away.
    pub(crate) fn is_shut_down(&self, id: ConnectionId) -> bool {
        self.shutdowns
            .get(&id)
            .is_some_and(CancellationToken::is_cancelled)
    }

    pub(crate) fn advance(&self, by: chrono::Duration) {
        self.clock.advance(by);
    }
}

/// Host `host` creates a session and the code is returned.
pub(crate) fn create(relay: &mut TestRelay, host: ConnectionId, world: &str, max: u32) -> String {
    relay.state.dispatch(
        host,
        ClientMessage::CreateSession {
            world_url: world.into(),
            foundry_url: None,
            name: "Host".into(),
            color: 0xff0000,
            max_viewers: Some(max),
            movie_title: None,
        },
    );
    relay
        .state
        .sessions
        .hosted_by(host)
        .map(|session| session.code().to_string())
        .expect("session created")
}

pub(crate) fn join(relay: &mut TestRelay, viewer: ConnectionId, code: &str) {
    relay.state.dispatch(
        viewer,
        ClientMessage::JoinSession {
            session_code: code.into(),
            name: format!("Viewer-{}", &viewer.to_string()[..4]),
            color: 0x00ff00,
        },
    );
}

/// All queued messages, skipping control frames.
pub(crate) fn drain(rx: &mut mpsc::Receiver<Outbound>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Outbound::Message(msg) = frame {
            out.push(msg);
        }
    }
    out
}

/// All queued frames including pings and closes.
pub(crate) fn drain_frames(rx: &mut mpsc::Receiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        out.push(frame);
    }
    out
}
