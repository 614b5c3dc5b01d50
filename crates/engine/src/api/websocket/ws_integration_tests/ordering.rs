use super::*;

const FRAMES: usize = 50;

#[tokio::test]
async fn state_frames_from_one_host_arrive_in_send_order() {
    let app = build_test_app(RelayConfig::default());
    let (addr, server) = spawn_ws_server(app).await;

    let (mut host_ws, host_id) = ws_connect(addr).await;
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
    ws_send_client(&mut viewer_ws, &join_session(&code, "Viewer")).await;
    ws_expect_message(&mut viewer_ws, WAIT, |m| {
        matches!(m, ServerMessage::SessionJoined { .. })
    })
    .await;

    for i in 0..FRAMES {
        ws_send_client(
            &mut host_ws,
            &ClientMessage::State {
                pos: [i as f64, 0.0, 0.0],
                rot: [0.0, 0.0, 0.0, 1.0],
                meta: None,
                color: None,
            },
        )
        .await;
    }

    let mut seen = Vec::with_capacity(FRAMES);
    while seen.len() < FRAMES {
        match ws_expect_message(&mut viewer_ws, WAIT, |m| {
            matches!(m, ServerMessage::State { .. })
        })
        .await
        {
            ServerMessage::State { from, pos, .. } => {
                assert_eq!(from, host_id);
                seen.push(pos[0] as usize);
            }
            _ => unreachable!(),
        }
    }
    assert_eq!(seen, (0..FRAMES).collect::<Vec<_>>());

    server.abort();
}
