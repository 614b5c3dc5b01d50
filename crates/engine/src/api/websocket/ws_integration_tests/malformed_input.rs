use super::*;

#[tokio::test]
async fn malformed_json_keeps_connection_open() {
    let app = build_test_app(RelayConfig::default());
    let (addr, server) = spawn_ws_server(app).await;

    let (mut ws, _) = ws_connect(addr).await;

    ws_send_raw(&mut ws, "{not json").await;
    ws_send_raw(&mut ws, r#"{"type":"warp-drive","speed":9}"#).await;
    ws_send_raw(&mut ws, r#"{"type":"join-session"}"#).await;

    // Still served afterwards.
    ws_send_client(&mut ws, &create_session(WORLD, None)).await;
    let created = ws_expect_message(&mut ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionCreated { .. })
    })
    .await;
    assert!(matches!(created, ServerMessage::SessionCreated { max_viewers: 8, .. }));

    server.abort();
}

#[tokio::test]
async fn host_only_directives_from_viewers_are_silently_ignored() {
    let app = build_test_app(RelayConfig::default());
    let (addr, server) = spawn_ws_server(app).await;

    let (mut host_ws, _) = ws_connect(addr).await;
    let (mut viewer_ws, _) = ws_connect(addr).await;

    ws_send_client(&mut host_ws, &create_session(WORLD, None)).await;
    let code = match ws_expect_message(&mut host_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionCreated { .. })
    })
    .await
    {
        ServerMessage::SessionCreated { session_code, .. } => session_code,
        _ => unreachable!(),
    };
    ws_send_client(&mut viewer_ws, &join_session(&code, "V")).await;
    let _ = ws_expect_message(&mut viewer_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionJoined { .. })
    })
    .await;

    ws_send_client(
        &mut viewer_ws,
        &ClientMessage::PlaybackSync {
            is_paused: true,
            timestamp: 3.0,
        },
    )
    .await;

    ws_expect_no_message_matching(&mut host_ws, QUIET, |m| {
        matches!(m, ServerMessage::PlaybackSync { .. })
    })
    .await;
    ws_expect_no_message_matching(&mut viewer_ws, QUIET, |m| {
        matches!(m, ServerMessage::SessionError { .. })
    })
    .await;

    server.abort();
}
