use crate::config::{ServerConfig, TICK_CHANNEL_CAPACITY};
use crate::player::ConnectionId;
use crate::rules::{GameEvent, Tricker};
use crate::scheduler::{ScheduledTick, TokioScheduler};
use crate::session::{Observer, Session};
use crate::state::{Game, Snapshot};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tricker_shared::protocol::{ClientMsg, ClientRole, WelcomeMsg, PROTOCOL_VERSION};

/// Commands from client connections to the game loop
pub enum GameCommand {
    Join {
        role: ClientRole,
        response: oneshot::Sender<(ConnectionId, WelcomeMsg)>,
    },
    Leave {
        id: ConnectionId,
    },
    Client {
        id: ConnectionId,
        msg: ClientMsg,
    },
}

/// Broadcasts from game loop to all clients
#[derive(Debug, Clone)]
pub enum GameBroadcast {
    State(Arc<Snapshot>),
}

/// Publishes snapshots on the broadcast channel.
pub struct BroadcastObserver {
    tx: broadcast::Sender<GameBroadcast>,
}

impl Observer for BroadcastObserver {
    fn notify(&mut self, snapshot: Snapshot) {
        // No receivers just means nobody is connected
        let _ = self.tx.send(GameBroadcast::State(Arc::new(snapshot)));
    }
}

impl From<ClientMsg> for GameEvent {
    fn from(msg: ClientMsg) -> Self {
        match msg {
            ClientMsg::Start => GameEvent::Start,
            ClientMsg::PlayerReady => GameEvent::PlayerReady,
            ClientMsg::MoveTo { point } => GameEvent::MoveTo { point },
        }
    }
}

/// Run the main game loop. Owns all game state.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    server_config: ServerConfig,
) {
    let (tick_tx, mut tick_rx) = mpsc::channel::<ScheduledTick>(TICK_CHANNEL_CAPACITY);

    let rng = match server_config.rng_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let rules = Tricker::new(server_config.game.clone());
    let game = Game::new(server_config.game.clone(), rng);
    let mut session = Session::new(
        rules,
        game,
        TokioScheduler::new(tick_tx),
        BroadcastObserver { tx: broadcast_tx },
    );
    tracing::info!(game_type = session.rules().game_type(), "game loop started");

    let mut next_connection_id: ConnectionId = 1;

    loop {
        tokio::select! {
            Some(tick) = tick_rx.recv() => {
                session.tick(tick);
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    GameCommand::Join { role, response } => {
                        let id = next_connection_id;
                        next_connection_id += 1;

                        let welcome = WelcomeMsg {
                            protocol_version: PROTOCOL_VERSION,
                            server_version: env!("CARGO_PKG_VERSION").to_string(),
                            self_id: id,
                            role,
                            config: session.rules().config().clone(),
                        };
                        if response.send((id, welcome)).is_err() {
                            tracing::warn!(connection = id, "client went away before welcome");
                            continue;
                        }

                        let event = match role {
                            ClientRole::Player => GameEvent::AddPlayer,
                            ClientRole::Observer => GameEvent::AddObserver,
                        };
                        session.dispatch(event, Some(id));
                    }
                    GameCommand::Leave { id } => {
                        session.dispatch(GameEvent::Disconnect, Some(id));
                        tracing::info!("Connection {} left", id);
                    }
                    GameCommand::Client { id, msg } => {
                        session.dispatch(msg.into(), Some(id));
                    }
                }
            }
        }
    }

    tracing::info!("Game loop ended");
}
