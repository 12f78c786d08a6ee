use anyhow::Context;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tower_http::cors::CorsLayer;
use tricker_server::config::{ServerConfig, BROADCAST_CAPACITY, COMMAND_CHANNEL_CAPACITY};
use tricker_server::game_loop::{run_game_loop, GameBroadcast, GameCommand};
use tricker_server::ws::{ws_handler, AppState};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json")) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = ServerConfig::from_env().context("failed to read server configuration")?;
    config
        .validate()
        .context("invalid server configuration")?;

    let listen_addr = config.listen_addr.clone();
    let max_connections = config.max_connections;

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(COMMAND_CHANNEL_CAPACITY);
    let (broadcast_tx, _) = broadcast::channel::<GameBroadcast>(BROADCAST_CAPACITY);

    // Spawn game loop
    let bc_tx = broadcast_tx.clone();
    tokio::spawn(async move {
        run_game_loop(game_rx, bc_tx, config).await;
    });

    // Axum app
    let app_state = AppState {
        game_tx,
        broadcast_tx,
        connection_semaphore: Arc::new(Semaphore::new(max_connections)),
    };
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    tracing::info!("Starting Tricker server on {}", listen_addr);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", listen_addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
