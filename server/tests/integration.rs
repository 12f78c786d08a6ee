//! Integration tests for the Tricker server.
//!
//! These tests start a real server instance and connect via WebSocket
//! to verify end-to-end behavior.

use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tricker_server::config::ServerConfig;
use tricker_shared::config::GameConfig;
use tricker_shared::protocol::{
    ClientMsg, ClientRole, ReadyStatus, ServerMsg, StateMsg, Status, WelcomeMsg,
};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Short rounds so a full round fits in a test.
fn fast_config() -> ServerConfig {
    ServerConfig {
        listen_addr: String::new(),
        rng_seed: Some(12345),
        max_connections: 100,
        game: GameConfig {
            round_time: 3,
            knower_less: 1,
            round_tick_ms: 50,
            move_update_ms: 10,
            ..GameConfig::default()
        },
    }
}

/// Start a test server on a random available port and return the WebSocket URL.
async fn start_test_server() -> String {
    start_test_server_with(fast_config()).await
}

async fn start_test_server_with(mut config: ServerConfig) -> String {
    use tricker_server::game_loop::{run_game_loop, GameBroadcast, GameCommand};
    use tricker_server::ws::AppState;

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // Release the port so the server can bind to it
    config.listen_addr = addr.to_string();
    config.validate().expect("test config is valid");

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<GameBroadcast>(64);

    let app_state = AppState {
        game_tx,
        broadcast_tx: broadcast_tx.clone(),
        connection_semaphore: Arc::new(Semaphore::new(config.max_connections)),
    };

    // Start game loop
    let game_config = config.clone();
    tokio::spawn(async move {
        run_game_loop(game_rx, broadcast_tx, game_config).await;
    });

    // Start HTTP/WebSocket server
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(tricker_server::ws::ws_handler))
        .with_state(app_state);

    tokio::spawn(async move {
        let listener = TcpListener::bind(&config.listen_addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("ws://{}/ws", addr)
}

async fn connect(url: &str, role: ClientRole) -> WsStream {
    let role = match role {
        ClientRole::Player => "player",
        ClientRole::Observer => "observer",
    };
    let (ws, _) = connect_async(format!("{}?role={}", url, role))
        .await
        .expect("Failed to connect");
    ws
}

/// Read the next text message and parse as ServerMsg.
async fn recv_msg(ws: &mut WsStream) -> ServerMsg {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text).expect("Failed to parse server message");
            }
            Some(Ok(_)) => continue, // Skip ping/pong
            Some(Err(e)) => panic!("WebSocket error: {}", e),
            None => panic!("WebSocket closed unexpectedly"),
        }
    }
}

/// Read the next text message with a timeout.
async fn recv_msg_timeout(ws: &mut WsStream, timeout: Duration) -> Option<ServerMsg> {
    tokio::time::timeout(timeout, recv_msg(ws)).await.ok()
}

async fn recv_welcome(ws: &mut WsStream) -> WelcomeMsg {
    match recv_msg(ws).await {
        ServerMsg::Welcome(welcome) => welcome,
        other => panic!("Expected Welcome, got {:?}", other),
    }
}

/// Wait for a state message matching `pred`, skipping others.
async fn wait_for_state(
    ws: &mut WsStream,
    timeout: Duration,
    pred: impl Fn(&StateMsg) -> bool,
) -> Option<StateMsg> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let left = deadline.saturating_duration_since(tokio::time::Instant::now());
        match recv_msg_timeout(ws, left).await? {
            ServerMsg::State(state) if pred(&state) => return Some(state),
            _ => continue,
        }
    }
}

async fn send(ws: &mut WsStream, msg: &ClientMsg) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(Message::Text(json.into())).await.unwrap();
}

/// Connect two players and wait until the game is startable.
async fn two_players(url: &str) -> (WsStream, WsStream) {
    let mut ws1 = connect(url, ClientRole::Player).await;
    let _ = recv_welcome(&mut ws1).await;
    let mut ws2 = connect(url, ClientRole::Player).await;
    let _ = recv_welcome(&mut ws2).await;

    wait_for_state(&mut ws1, Duration::from_secs(1), |s| {
        s.status == Status::Startable
    })
    .await
    .expect("game should become startable");
    (ws1, ws2)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_connect_and_receive_welcome() {
    let url = start_test_server().await;
    let mut ws = connect(&url, ClientRole::Player).await;

    let welcome = recv_welcome(&mut ws).await;
    assert_eq!(welcome.protocol_version, 1);
    assert!(welcome.self_id > 0, "self_id should be positive");
    assert_eq!(welcome.role, ClientRole::Player);
    assert_eq!(welcome.config.num_of_rings, 3);

    // Join is followed by a state with our private view
    let state = wait_for_state(&mut ws, Duration::from_secs(1), |_| true)
        .await
        .expect("state after welcome");
    assert_eq!(state.status, Status::NotMinPlayers);
    assert!(state.player.is_some());
    assert!(state.objects.is_empty());
}

#[tokio::test]
async fn test_multiple_clients_get_unique_ids() {
    let url = start_test_server().await;

    let mut ws1 = connect(&url, ClientRole::Player).await;
    let mut ws2 = connect(&url, ClientRole::Player).await;

    let id1 = recv_welcome(&mut ws1).await.self_id;
    let id2 = recv_welcome(&mut ws2).await.self_id;

    assert_ne!(id1, id2, "Each client should get a unique ID");
}

#[tokio::test]
async fn test_observer_view_has_no_player_fields() {
    let url = start_test_server().await;
    let mut obs = connect(&url, ClientRole::Observer).await;

    let welcome = recv_welcome(&mut obs).await;
    assert_eq!(welcome.role, ClientRole::Observer);

    let state = wait_for_state(&mut obs, Duration::from_secs(1), |_| true)
        .await
        .expect("observer gets state");
    assert!(state.player.is_none());
    assert_eq!(state.status, Status::NotMinPlayers);
}

#[tokio::test]
async fn test_full_round_over_websocket() {
    let url = start_test_server().await;
    let (mut ws1, mut ws2) = two_players(&url).await;

    send(&mut ws1, &ClientMsg::Start).await;
    let started = wait_for_state(&mut ws1, Duration::from_secs(1), |s| {
        s.status == Status::Started
    })
    .await
    .expect("game should start");
    assert_eq!(started.objects.len(), 1 + 3 + 2);

    send(&mut ws1, &ClientMsg::PlayerReady).await;
    send(&mut ws2, &ClientMsg::PlayerReady).await;

    let round1 = wait_for_state(&mut ws1, Duration::from_secs(1), |s| {
        s.status == Status::RoundStarted
    })
    .await
    .expect("round should start for player 1");
    let round2 = wait_for_state(&mut ws2, Duration::from_secs(1), |s| {
        s.status == Status::RoundStarted
    })
    .await
    .expect("round should start for player 2");

    // Exactly one side sees the target
    let p1 = round1.player.unwrap();
    let p2 = round2.player.unwrap();
    assert_ne!(p1.knower, p2.knower);
    let (knower, guesser) = if p1.knower { (p1, p2) } else { (p2, p1) };
    assert!(knower.target.is_some());
    assert!(guesser.target.is_none());
    assert!(round1.target.is_none());

    send(&mut ws1, &ClientMsg::MoveTo { point: [0.0, 0.0] }).await;

    // 3 ticks of 50ms end the round
    let end = wait_for_state(&mut ws1, Duration::from_secs(2), |s| {
        s.status == Status::RoundEnd
    })
    .await
    .expect("round should end");
    assert!(end.target.is_some(), "target is revealed at round end");
    assert_eq!(end.round, 1);
    assert_eq!(end.time_left, 0);
    assert_eq!(end.player.unwrap().status, ReadyStatus::NotReady);
}

#[tokio::test]
async fn test_third_player_is_ignored() {
    let url = start_test_server().await;
    let (_ws1, _ws2) = two_players(&url).await;

    let mut ws3 = connect(&url, ClientRole::Player).await;
    let _ = recv_welcome(&mut ws3).await;

    // Not registered anywhere, so no state reaches this connection
    let msg = recv_msg_timeout(&mut ws3, Duration::from_millis(300)).await;
    assert!(msg.is_none(), "third player should get no state: {:?}", msg);
}

#[tokio::test]
async fn test_player_disconnect_returns_to_lobby() {
    let url = start_test_server().await;
    let (mut ws1, mut ws2) = two_players(&url).await;

    send(&mut ws1, &ClientMsg::Start).await;
    wait_for_state(&mut ws2, Duration::from_secs(1), |s| {
        s.status == Status::Started
    })
    .await
    .expect("game should start");

    ws1.close(None).await.unwrap();

    let lobby = wait_for_state(&mut ws2, Duration::from_secs(1), |s| {
        s.status == Status::NotMinPlayers
    })
    .await
    .expect("remaining player should see not_min_players");
    assert!(lobby.objects.is_empty());
    assert_eq!(lobby.score, [0, 0]);
}

#[tokio::test]
async fn test_malformed_messages_close_connection() {
    let url = start_test_server().await;
    let mut ws = connect(&url, ClientRole::Player).await;
    let _ = recv_welcome(&mut ws).await;

    for _ in 0..5 {
        ws.send(Message::Text("not json".into())).await.unwrap();
    }

    let closed = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .unwrap_or(false);
    assert!(closed, "server should close after repeated malformed messages");
}

#[tokio::test]
async fn test_connection_limit_rejects_extra_clients() {
    let mut config = fast_config();
    config.max_connections = 1;
    let url = start_test_server_with(config).await;

    let mut ws1 = connect(&url, ClientRole::Player).await;
    let _ = recv_welcome(&mut ws1).await;

    let second = connect_async(format!("{}?role=player", url)).await;
    assert!(second.is_err(), "second connection should be refused");
}
