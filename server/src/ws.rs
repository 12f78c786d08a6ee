use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, OwnedSemaphorePermit, Semaphore};

use crate::game_loop::{GameBroadcast, GameCommand};
use crate::protocol::{ClientMsg, ClientRole, ServerMsg};

/// Messages above this size close the connection.
pub const MAX_MESSAGE_SIZE: usize = 1024;
/// Malformed messages tolerated before the connection is closed.
pub const MAX_PARSE_ERRORS: u32 = 5;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
    pub connection_semaphore: Arc<Semaphore>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(default)]
    pub role: Option<ClientRole>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(app_state): State<AppState>,
) -> Response {
    let Ok(permit) = app_state.connection_semaphore.clone().try_acquire_owned() else {
        tracing::warn!("Connection limit reached, rejecting client");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    let role = params.role.unwrap_or(ClientRole::Player);

    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, app_state, role, permit))
        .into_response()
}

async fn handle_socket(
    socket: WebSocket,
    app_state: AppState,
    role: ClientRole,
    _permit: OwnedSemaphorePermit,
) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before joining so the state broadcast of our own join is seen
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::Join {
            role,
            response: resp_tx,
        })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Join command");
        return;
    }

    let (my_id, welcome) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    tracing::info!(connection = my_id, ?role, "connected");

    let Ok(welcome_json) = serde_json::to_string(&ServerMsg::Welcome(welcome)) else {
        tracing::error!(connection = my_id, "Failed to serialize welcome");
        leave(&app_state, my_id).await;
        return;
    };
    if sink.send(Message::Text(welcome_json.into())).await.is_err() {
        leave(&app_state, my_id).await;
        return;
    }

    let mut parse_errors = 0u32;

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(msg) => {
                                if app_state
                                    .game_tx
                                    .send(GameCommand::Client { id: my_id, msg })
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            Err(e) => {
                                parse_errors += 1;
                                tracing::debug!(connection = my_id, error = %e, "unparseable client message");
                                if parse_errors >= MAX_PARSE_ERRORS {
                                    tracing::warn!(connection = my_id, "too many malformed messages, closing");
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection = my_id, error = %e, "websocket error");
                        break;
                    }
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(GameBroadcast::State(snapshot)) => {
                        // Not registered as observer (e.g. joined a full game)
                        let Some(view) = snapshot.view(my_id) else {
                            continue;
                        };
                        let json = serde_json::to_string(&ServerMsg::State(view.clone()));
                        if let Ok(json) = json {
                            if sink.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Connection {} lagged by {} messages", my_id, n);
                        // Every state message is complete, the next one catches up
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    leave(&app_state, my_id).await;
    tracing::info!(connection = my_id, "disconnected");
}

async fn leave(app_state: &AppState, id: u32) {
    let _ = app_state.game_tx.send(GameCommand::Leave { id }).await;
}
