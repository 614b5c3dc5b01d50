//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::RelayConfig,
    lobby::lobby_from_config,
    ports::{ClockPort, LobbyPort, RandomPort},
};
use crate::use_cases::Relay;

/// Main application state.
///
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub relay: Arc<Relay>,
    pub config: RelayConfig,
}

impl App {
    pub fn new(
        config: RelayConfig,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
        lobby: Arc<dyn LobbyPort>,
    ) -> Self {
        let relay = Arc::new(Relay::new(config.clone(), clock, random, lobby));
        Self { relay, config }
    }

    /// Production wiring: system clock and randomness, lobby from config.
    pub fn from_config(config: RelayConfig) -> Self {
        let lobby = lobby_from_config(&config);
        Self::new(
            config,
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
            lobby,
        )
    }
}
