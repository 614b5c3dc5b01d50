use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};

use worldcast_shared::{ClientMessage, ServerMessage};

use crate::api;
use crate::app::App;
use crate::infrastructure::clock::{SystemClock, SystemRandom};
use crate::infrastructure::config::RelayConfig;
use crate::infrastructure::lobby::NoopLobby;

pub(crate) type TestSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) fn build_test_app(config: RelayConfig) -> Arc<App> {
    Arc::new(App::new(
        config,
        Arc::new(SystemClock::new()),
        Arc::new(SystemRandom::new()),
        Arc::new(NoopLobby),
    ))
}

pub(crate) async fn spawn_ws_server(app: Arc<App>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = api::router(app);

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

/// Connect and consume the `welcome` frame; returns the assigned id.
pub(crate) async fn ws_connect(addr: SocketAddr) -> (TestSocket, uuid::Uuid) {
    let url = format!("ws://{}/ws", addr);
    let (mut ws, _resp) = connect_async(url).await.unwrap();
    let id = match ws_recv_server(&mut ws).await {
        ServerMessage::Welcome { id } => id,
        other => panic!("expected welcome, got {other:?}"),
    };
    (ws, id)
}

pub(crate) async fn ws_send_client(ws: &mut TestSocket, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json.into())).await.unwrap();
}

pub(crate) async fn ws_send_raw(ws: &mut TestSocket, text: &str) {
    ws.send(WsMessage::Text(text.to_string().into()))
        .await
        .unwrap();
}

pub(crate) async fn ws_recv_server(ws: &mut TestSocket) -> ServerMessage {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        match msg {
            WsMessage::Text(text) => {
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            WsMessage::Binary(bin) => {
                let text = String::from_utf8(bin.to_vec()).unwrap();
                return serde_json::from_str::<ServerMessage>(&text).unwrap();
            }
            _ => {}
        }
    }
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut TestSocket,
    timeout: Duration,
    mut predicate: F,
) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut TestSocket,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerMessage) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                panic!("unexpected message: {:?}", msg);
            }
        }
    })
    .await;

    // We only succeed if we timed out without seeing a matching message.
    assert!(result.is_err());
}

pub(crate) fn create_session(world: &str, max_viewers: Option<u32>) -> ClientMessage {
    ClientMessage::CreateSession {
        world_url: world.into(),
        foundry_url: None,
        name: "Host".into(),
        color: 0xff8800,
        max_viewers,
        movie_title: None,
    }
}

pub(crate) fn join_session(code: &str, name: &str) -> ClientMessage {
    ClientMessage::JoinSession {
        session_code: code.into(),
        name: name.into(),
        color: 0x0088ff,
    }
}
