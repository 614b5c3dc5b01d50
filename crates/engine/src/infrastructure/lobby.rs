//! Lobby store client.
//!
//! Implements `LobbyPort` over plain JSON POSTs. The relay never awaits these
//! calls while holding its lock; failures are logged by the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use worldcast_domain::SessionCode;

use crate::infrastructure::config::RelayConfig;
use crate::infrastructure::ports::{LobbyError, LobbyHeartbeat, LobbyPort, LobbyRegistration};

/// Client for the lobby discovery store
#[derive(Clone)]
pub struct HttpLobbyClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct EndRequest<'a> {
    code: &'a SessionCode,
}

impl HttpLobbyClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), LobbyError> {
        let response = self
            .client
            .post(format!("{}/sessions/{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LobbyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl LobbyPort for HttpLobbyClient {
    async fn register(&self, registration: LobbyRegistration) -> Result<(), LobbyError> {
        self.post("register", &registration).await
    }

    async fn heartbeat(&self, heartbeat: LobbyHeartbeat) -> Result<(), LobbyError> {
        self.post("heartbeat", &heartbeat).await
    }

    async fn end(&self, code: SessionCode) -> Result<(), LobbyError> {
        self.post("end", &EndRequest { code: &code }).await
    }
}

/// Used when no lobby store is configured.
pub struct NoopLobby;

#[async_trait]
impl LobbyPort for NoopLobby {
    async fn register(&self, _registration: LobbyRegistration) -> Result<(), LobbyError> {
        Ok(())
    }

    async fn heartbeat(&self, _heartbeat: LobbyHeartbeat) -> Result<(), LobbyError> {
        Ok(())
    }

    async fn end(&self, _code: SessionCode) -> Result<(), LobbyError> {
        Ok(())
    }
}

pub fn lobby_from_config(config: &RelayConfig) -> Arc<dyn LobbyPort> {
    match &config.lobby_url {
        Some(url) => {
            tracing::info!(lobby_url = %url, "Lobby store enabled");
            Arc::new(HttpLobbyClient::new(url))
        }
        None => {
            tracing::info!("LOBBY_URL not set, lobby store disabled");
            Arc::new(NoopLobby)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

    async fn spawn_lobby(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let record = |path: &'static str, seen: Seen| {
            move |Json(body): Json<serde_json::Value>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push((path.to_string(), body));
                    status
                }
            }
        };

        let router = Router::new()
            .route("/sessions/register", post(record("register", seen.clone())))
            .route("/sessions/heartbeat", post(record("heartbeat", seen.clone())))
            .route("/sessions/end", post(record("end", seen.clone())));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("http://{addr}/"), seen)
    }

    #[tokio::test]
    async fn register_posts_camel_case_listing() {
        let (url, seen) = spawn_lobby(StatusCode::OK).await;
        let client = HttpLobbyClient::new(&url);

        client
            .register(LobbyRegistration {
                code: SessionCode::parse("K7HQ2X").unwrap(),
                host_name: "Host".into(),
                movie_title: Some("Night".into()),
                world_url: "https://worlds.example/w1".into(),
                public_addr: "ws://relay.example/ws".into(),
                foundry_url: None,
                max_viewers: 4,
            })
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (path, body) = &seen[0];
        assert_eq!(path, "register");
        assert_eq!(body["code"], "K7HQ2X");
        assert_eq!(body["hostName"], "Host");
        assert_eq!(body["movieTitle"], "Night");
        assert_eq!(body["maxViewers"], 4);
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (url, _seen) = spawn_lobby(StatusCode::SERVICE_UNAVAILABLE).await;
        let client = HttpLobbyClient::new(&url);

        let err = client
            .end(SessionCode::parse("K7HQ2X").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::Status(503)));
    }

    #[tokio::test]
    async fn noop_lobby_accepts_everything() {
        let lobby = NoopLobby;
        assert!(lobby
            .heartbeat(LobbyHeartbeat {
                code: SessionCode::parse("K7HQ2X").unwrap(),
                viewer_count: 0,
                is_movie_playing: false,
            })
            .await
            .is_ok());
    }
}
