//! Tricker game rules.
//!
//! [`Tricker`] is the event dispatcher: it validates every event against the
//! current phase, mutates the [`Game`] it is handed and reports back through
//! a [`Host`]. It holds configuration only, one instance serves any number of
//! games.

use crate::movement::{self, MoveTick, MovementSimulator};
use crate::player::{ConnectionId, Role};
use crate::scheduler::{ScheduledTick, Scheduler, TaskKind};
use crate::scoring::{apply_round_score, has_winner};
use crate::state::{Game, GamePatch};
use crate::timer::{ClockTick, RoundTimer};
use rand::Rng;
use tricker_shared::config::GameConfig;
use tricker_shared::protocol::{ReadyStatus, Status};

pub const GAME_TYPE: &str = "Tricker";

/// Everything the dispatcher reacts to. Connection-originated events are
/// paired with their origin by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    AddPlayer,
    AddObserver,
    Start,
    PlayerReady,
    NewRound,
    MoveTo { point: [f64; 2] },
    RoundOver,
    End,
    Disconnect,
}

/// What the rules need from whoever runs the game.
pub trait Host: Scheduler {
    /// Broadcast the current state to every observer.
    fn notify(&mut self, game: &Game);

    /// Queue a follow-up event. It is handled after the current one, on the
    /// same execution context.
    fn trigger(&mut self, event: GameEvent);
}

#[derive(Debug, Clone)]
pub struct Tricker {
    config: GameConfig,
    timer: RoundTimer,
    movement: MovementSimulator,
}

impl Tricker {
    pub fn new(config: GameConfig) -> Self {
        Self {
            timer: RoundTimer::new(&config),
            movement: MovementSimulator::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn game_type(&self) -> &'static str {
        GAME_TYPE
    }

    /// Put a fresh game into the lobby.
    pub fn init(&self, game: &mut Game) {
        game.apply(GamePatch {
            status: Some(Status::NotMinPlayers),
            round: Some(1),
            score: Some([0, 0]),
            knower: Some(None),
            revealed_target: Some(None),
            round_points: Some([0, 0]),
            time_left: Some(0),
        });
        game.clear_objects();
    }

    pub fn handle_event<H: Host>(
        &self,
        event: GameEvent,
        game: &mut Game,
        origin: Option<ConnectionId>,
        host: &mut H,
    ) {
        tracing::debug!(?event, ?origin, status = ?game.status, "event");

        let handled = match event {
            GameEvent::AddPlayer => self.add_player(game, origin, host),
            GameEvent::AddObserver => self.add_observer(game, origin, host),
            GameEvent::Start => self.start(game, host),
            GameEvent::PlayerReady => self.player_ready(game, origin, host),
            GameEvent::NewRound => self.new_round(game, host),
            GameEvent::MoveTo { point } => self.move_to(game, origin, point, host),
            GameEvent::RoundOver => self.round_over(game, host),
            GameEvent::End => self.end(game, host),
            GameEvent::Disconnect => self.disconnect(game, origin, host),
        };

        if !handled {
            tracing::debug!(?event, ?origin, status = ?game.status, "event dropped");
        }
    }

    /// Apply a tick from a scheduled task. Ticks from tasks that have since
    /// been replaced or cancelled are ignored.
    pub fn handle_tick<H: Host>(&self, tick: ScheduledTick, game: &mut Game, host: &mut H) {
        match tick.kind {
            TaskKind::RoundClock => {
                if game.round_timer != Some(tick.handle) {
                    tracing::debug!(?tick, "stale round clock tick");
                    return;
                }
                let clock = self.timer.tick(game, host);
                host.notify(game);
                match clock {
                    ClockTick::Running { remaining } => {
                        tracing::trace!(remaining, "round clock");
                    }
                    ClockTick::Expired => host.trigger(GameEvent::RoundOver),
                }
            }
            TaskKind::Movement(id) => {
                let current = game.player(id).and_then(|p| p.movement);
                if current != Some(tick.handle) {
                    tracing::debug!(?tick, "stale movement tick");
                    return;
                }
                if let MoveTick::Moved { .. } = self.movement.tick(game, id, host) {
                    host.notify(game);
                }
            }
        }
    }

    fn add_player<H: Host>(&self, game: &mut Game, origin: Option<ConnectionId>, host: &mut H) -> bool {
        let Some(id) = origin else {
            return false;
        };
        if game.players.len() >= self.config.max_players || game.player(id).is_some() {
            return false;
        }

        game.add_player(id);
        tracing::info!(player = id, players = game.players.len(), "player joined");

        let count = game.players.len();
        if count >= self.config.min_players && game.status == Status::NotMinPlayers {
            game.apply(GamePatch {
                status: Some(Status::Startable),
                ..Default::default()
            });
        } else if count < self.config.min_players
            && matches!(game.status, Status::Startable | Status::Started)
        {
            game.apply(GamePatch {
                status: Some(Status::NotMinPlayers),
                ..Default::default()
            });
        }

        host.notify(game);
        true
    }

    fn add_observer<H: Host>(&self, game: &mut Game, origin: Option<ConnectionId>, host: &mut H) -> bool {
        let Some(id) = origin else {
            return false;
        };
        game.register_observer(id);
        tracing::info!(observer = id, "observer joined");
        host.notify(game);
        true
    }

    fn start<H: Host>(&self, game: &mut Game, host: &mut H) -> bool {
        if game.players.len() < self.config.min_players {
            return false;
        }

        self.timer.stop(game, host);
        self.movement.stop_all(game, host);
        game.reset();

        for (seat, player) in game.players.iter_mut().enumerate() {
            player.index = Some(seat);
            player.role = Role::Guesser;
            player.time_left = 0;
        }
        game.populate_objects();

        game.apply(GamePatch {
            status: Some(Status::Started),
            time_left: Some(0),
            ..Default::default()
        });
        tracing::info!("game started");
        host.notify(game);
        true
    }

    fn player_ready<H: Host>(&self, game: &mut Game, origin: Option<ConnectionId>, host: &mut H) -> bool {
        if !matches!(
            game.status,
            Status::Started | Status::WaitingRoundStart | Status::RoundEnd
        ) {
            return false;
        }
        let Some(player) = origin.and_then(|id| game.player_mut(id)) else {
            return false;
        };
        player.readiness = ReadyStatus::Ready;

        if game.all_ready() {
            host.trigger(GameEvent::NewRound);
        } else {
            game.apply(GamePatch {
                status: Some(Status::WaitingRoundStart),
                ..Default::default()
            });
            host.notify(game);
        }
        true
    }

    fn new_round<H: Host>(&self, game: &mut Game, host: &mut H) -> bool {
        if game.players.len() < self.config.min_players || game.rings.is_empty() {
            return false;
        }

        let field = self.config.field;
        for (seat, player) in game.players.iter_mut().enumerate() {
            player.round_reset(seat, field);
        }

        // Seat 0 starts as knower, then the role alternates every round
        let knower_seat = if game.round == 1 {
            0
        } else {
            match game.knower_seat() {
                Some(0) => 1,
                _ => 0,
            }
        };
        for (seat, player) in game.players.iter_mut().enumerate() {
            player.role = if seat == knower_seat {
                Role::Knower
            } else {
                Role::Guesser
            };
        }

        let target = game.rng.gen_range(0..game.rings.len());
        game.target = Some(target);
        game.players[knower_seat].target = Some(target);

        game.apply(GamePatch {
            knower: Some(Some(knower_seat)),
            revealed_target: Some(None),
            round_points: Some([0, 0]),
            ..Default::default()
        });

        self.timer.start(game, host);

        game.apply(GamePatch {
            status: Some(Status::RoundStarted),
            ..Default::default()
        });
        tracing::info!(round = game.round, knower = knower_seat, "round started");
        host.notify(game);
        true
    }

    fn move_to<H: Host>(
        &self,
        game: &mut Game,
        origin: Option<ConnectionId>,
        point: [f64; 2],
        host: &mut H,
    ) -> bool {
        if game.status != Status::RoundStarted || !point.iter().all(|v| v.is_finite()) {
            return false;
        }
        let Some(id) = origin else {
            return false;
        };
        match game.player(id) {
            Some(player) if player.time_left > 0 => {}
            _ => return false,
        }
        self.movement.move_to(game, id, point, host)
    }

    fn round_over<H: Host>(&self, game: &mut Game, host: &mut H) -> bool {
        // A second signal for the same round finds the phase already moved on
        if game.status != Status::RoundStarted {
            return false;
        }

        self.timer.stop(game, host);
        self.movement.stop_all(game, host);

        if apply_round_score(game).is_none() {
            tracing::error!("round over without knower, guesser and target");
            debug_assert!(false, "round over without knower, guesser and target");
        }

        game.apply(GamePatch {
            revealed_target: Some(game.target),
            ..Default::default()
        });

        if let Some(seat) = has_winner(game) {
            tracing::info!(winner = seat, score = ?game.score, "game won");
            host.trigger(GameEvent::End);
        } else {
            game.apply(GamePatch {
                status: Some(Status::RoundEnd),
                ..Default::default()
            });
            host.notify(game);
            game.round += 1;
        }
        true
    }

    fn end<H: Host>(&self, game: &mut Game, host: &mut H) -> bool {
        if game.status == Status::GameEnd {
            return false;
        }
        self.timer.stop(game, host);
        self.movement.stop_all(game, host);
        for player in game.players.iter_mut() {
            player.readiness = ReadyStatus::NotReady;
        }
        game.apply(GamePatch {
            status: Some(Status::GameEnd),
            ..Default::default()
        });
        host.notify(game);
        true
    }

    fn disconnect<H: Host>(&self, game: &mut Game, origin: Option<ConnectionId>, host: &mut H) -> bool {
        if let Some(id) = origin {
            game.unregister_observer(id);
            if let Some(mut player) = game.remove_player(id) {
                movement::stop(&mut player, host);
                tracing::info!(player = id, "player left");
            }
        }

        if game.players.len() < self.config.min_players {
            self.timer.stop(game, host);
            self.movement.stop_all(game, host);
            game.clear_objects();
            game.target = None;
            for player in game.players.iter_mut() {
                player.role = Role::Guesser;
                player.readiness = ReadyStatus::NotReady;
                player.target = None;
                player.index = None;
                player.time_left = 0;
            }
            game.apply(GamePatch {
                status: Some(Status::NotMinPlayers),
                round: Some(1),
                score: Some([0, 0]),
                knower: Some(None),
                revealed_target: Some(None),
                round_points: Some([0, 0]),
                time_left: Some(0),
            });
        }

        host.notify(game);
        true
    }
}
