use super::*;

fn is_canonical(code: &str) -> bool {
    code.len() == 6
        && code
            .bytes()
            .all(|b| matches!(b, b'A'..=b'H' | b'J'..=b'N' | b'P'..=b'Z' | b'2'..=b'9'))
}

#[tokio::test]
async fn host_viewer_state_and_full_session() {
    let app = build_test_app(RelayConfig::default());
    let (addr, server) = spawn_ws_server(app).await;

    let (mut host_ws, host_id) = ws_connect(addr).await;
    let (mut a_ws, a_id) = ws_connect(addr).await;
    let (mut b_ws, _b_id) = ws_connect(addr).await;

    // Host creates a one-viewer session.
    ws_send_client(&mut host_ws, &create_session(WORLD, Some(1))).await;
    let code = match ws_expect_message(&mut host_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionCreated { .. })
    })
    .await
    {
        ServerMessage::SessionCreated { session_code, .. } => session_code,
        _ => unreachable!(),
    };
    assert!(is_canonical(&code), "{code} is not a valid session code");

    // Viewer A joins.
    ws_send_client(&mut a_ws, &join_session(&code, "A")).await;
    let joined = ws_expect_message(&mut a_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionJoined { .. })
    })
    .await;
    assert!(matches!(
        joined,
        ServerMessage::SessionJoined { ref session_code, ref world_url, .. }
            if *session_code == code && world_url == WORLD
    ));

    // The host is asked for a fresh snapshot for A.
    let request = ws_expect_message(&mut host_ws, WAIT, |m| {
        matches!(m, ServerMessage::RequestFullState { .. })
    })
    .await;
    assert_eq!(
        request,
        ServerMessage::RequestFullState {
            viewer_id: a_id,
            viewer_name: "A".into()
        }
    );

    // Host state reaches A.
    ws_send_client(
        &mut host_ws,
        &ClientMessage::State {
            pos: [1.0, 2.0, 3.0],
            rot: [0.0, 0.0, 0.0, 1.0],
            meta: None,
            color: None,
        },
    )
    .await;
    let state = ws_expect_message(&mut a_ws, WAIT, |m| matches!(m, ServerMessage::State { .. }))
        .await;
    assert!(matches!(
        state,
        ServerMessage::State { from, pos, .. } if from == host_id && pos == [1.0, 2.0, 3.0]
    ));

    // B finds the session full.
    ws_send_client(&mut b_ws, &join_session(&code, "B")).await;
    let error = ws_expect_message(&mut b_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionError { .. })
    })
    .await;
    assert!(matches!(
        error,
        ServerMessage::SessionError { ref error, ref code, .. }
            if error == "Session is full" && code == "SESSION_FULL"
    ));

    // B never sees session traffic.
    ws_send_client(
        &mut host_ws,
        &ClientMessage::Chat {
            message: "welcome".into(),
        },
    )
    .await;
    ws_expect_no_message_matching(&mut b_ws, QUIET, |m| {
        matches!(m, ServerMessage::Chat { .. } | ServerMessage::State { .. })
    })
    .await;

    server.abort();
}

#[tokio::test]
async fn host_leave_ends_session_for_viewers() {
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

    ws_send_client(&mut viewer_ws, &join_session(&code.to_lowercase(), "V")).await;
    let _ = ws_expect_message(&mut viewer_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionJoined { .. })
    })
    .await;

    ws_send_client(&mut host_ws, &ClientMessage::LeaveSession {}).await;
    let ended = ws_expect_message(&mut viewer_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionEnded { .. })
    })
    .await;
    assert_eq!(
        ended,
        ServerMessage::SessionEnded {
            reason: "Host left".into()
        }
    );

    ws_send_client(&mut viewer_ws, &join_session(&code, "V")).await;
    let error = ws_expect_message(&mut viewer_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionError { .. })
    })
    .await;
    assert!(matches!(
        error,
        ServerMessage::SessionError { ref code, .. } if code == "SESSION_NOT_FOUND"
    ));

    server.abort();
}

#[tokio::test]
async fn viewer_transport_close_is_announced_to_host() {
    let app = build_test_app(RelayConfig::default());
    let (addr, server) = spawn_ws_server(app).await;

    let (mut host_ws, _) = ws_connect(addr).await;
    let (mut viewer_ws, viewer_id) = ws_connect(addr).await;

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
    let _ = ws_expect_message(&mut host_ws, WAIT, |m| {
        matches!(m, ServerMessage::Join { .. })
    })
    .await;

    drop(viewer_ws);

    let leave = ws_expect_message(&mut host_ws, WAIT, |m| {
        matches!(m, ServerMessage::Leave { .. })
    })
    .await;
    assert_eq!(leave, ServerMessage::Leave { id: viewer_id });

    server.abort();
}
