//! HTTP routes.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::app::App;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/sessions/{code}", get(get_session))
}

async fn health() -> &'static str {
    "OK"
}

/// Public, discovery-safe view of a session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_code: String,
    pub world_url: String,
    pub host_name: String,
    pub foundry_url: Option<String>,
    pub viewer_count: u32,
    pub max_viewers: u32,
    pub is_movie_playing: bool,
}

async fn get_session(
    State(app): State<Arc<App>>,
    Path(code): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let overview = app.relay.overview(&code).await.ok_or(ApiError::NotFound)?;
    let session = overview.session;
    Ok(Json(SessionSummary {
        session_code: session.code().to_string(),
        world_url: session.world_url().to_string(),
        host_name: session.host_name().to_string(),
        foundry_url: session.foundry_url().map(str::to_string),
        viewer_count: overview.viewer_count,
        max_viewers: session.max_viewers(),
        is_movie_playing: session.is_movie_playing(),
    }))
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tokio::sync::mpsc;
    use tower::ServiceExt;
    use worldcast_shared::ClientMessage;

    use crate::infrastructure::clock::{SystemClock, SystemRandom};
    use crate::infrastructure::config::RelayConfig;
    use crate::infrastructure::lobby::NoopLobby;

    fn test_app() -> Arc<App> {
        Arc::new(App::new(
            RelayConfig::default(),
            Arc::new(SystemClock::new()),
            Arc::new(SystemRandom::new()),
            Arc::new(NoopLobby),
        ))
    }

    async fn get_body(app: Arc<App>, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = routes()
            .with_state(app)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (status, body) = get_body(test_app(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let (status, _) = get_body(test_app(), "/api/sessions/ZZZZZZ").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn session_summary_is_case_insensitive() {
        let app = test_app();
        let (tx, mut rx) = mpsc::channel(16);
        let (host, _shutdown) = app.relay.connect(tx).await;
        app.relay
            .handle(
                host,
                ClientMessage::CreateSession {
                    world_url: "https://worlds.example/w1".into(),
                    foundry_url: None,
                    name: "Host".into(),
                    color: 0,
                    max_viewers: Some(4),
                    movie_title: None,
                },
            )
            .await;

        let mut code = None;
        while let Ok(frame) = rx.try_recv() {
            if let crate::api::connections::Outbound::Message(
                worldcast_shared::ServerMessage::SessionCreated { session_code, .. },
            ) = frame
            {
                code = Some(session_code);
            }
        }
        let code = code.unwrap();

        let (status, body) =
            get_body(app, &format!("/api/sessions/{}", code.to_lowercase())).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["sessionCode"], code);
        assert_eq!(json["hostName"], "Host");
        assert_eq!(json["viewerCount"], 0);
        assert_eq!(json["maxViewers"], 4);
        assert_eq!(json["isMoviePlaying"], false);
    }
}
