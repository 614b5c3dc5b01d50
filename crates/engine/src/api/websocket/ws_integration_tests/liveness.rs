use futures_util::StreamExt;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::*;

#[tokio::test]
async fn silent_client_is_disconnected_after_two_sweeps() {
    let app = build_test_app(RelayConfig::default());
    let (addr, server) = spawn_ws_server(app.clone()).await;

    // Not reading means the client never answers the ping.
    let (mut silent_ws, _) = ws_connect(addr).await;
    assert_eq!(app.relay.counts().await, (1, 0));

    app.relay.ping_sweep().await;
    app.relay.ping_sweep().await;
    assert_eq!(app.relay.counts().await, (0, 0));

    let closed = tokio::time::timeout(WAIT, async {
        loop {
            match silent_ws.next().await {
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "socket stayed open after the sweep");

    server.abort();
}
