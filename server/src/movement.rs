use crate::player::{step_towards, ConnectionId, Player};
use crate::scheduler::{Scheduler, TaskKind};
use crate::state::Game;
use std::time::Duration;
use tricker_shared::config::GameConfig;

/// Result of one movement tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTick {
    /// The body moved one step; `arrived` when it is now on the destination
    Moved { arrived: bool },
    /// Nothing moved and the task has stopped
    Stopped,
}

/// Moves player bodies towards a clicked point, one step per period.
#[derive(Debug, Clone)]
pub struct MovementSimulator {
    period: Duration,
}

impl MovementSimulator {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            period: Duration::from_millis(config.move_update_ms),
        }
    }

    /// Start moving a player. A running movement of the same player is
    /// replaced. Returns false if the connection has no player.
    pub fn move_to(
        &self,
        game: &mut Game,
        id: ConnectionId,
        point: [f64; 2],
        scheduler: &mut impl Scheduler,
    ) -> bool {
        let Some(player) = game.player_mut(id) else {
            return false;
        };
        stop(player, scheduler);
        player.destination = Some([point[0].floor(), point[1].floor()]);
        player.movement = Some(scheduler.schedule(self.period, TaskKind::Movement(id)));
        true
    }

    pub fn tick(
        &self,
        game: &mut Game,
        id: ConnectionId,
        scheduler: &mut impl Scheduler,
    ) -> MoveTick {
        let Game { players, rings, .. } = game;
        let Some(player) = players.iter_mut().find(|p| p.id == id) else {
            return MoveTick::Stopped;
        };
        let Some(dest) = player.destination else {
            stop(player, scheduler);
            return MoveTick::Stopped;
        };

        if player.body.pos == dest || player.time_left == 0 {
            stop(player, scheduler);
            return MoveTick::Stopped;
        }

        let [x, y] = player.body.pos;
        player.body.pos = [step_towards(x, dest[0]), step_towards(y, dest[1])];
        player.body.inside = rings.iter().any(|ring| ring.is_inside(&player.body));

        let arrived = player.body.pos == dest;
        if arrived {
            stop(player, scheduler);
        }
        MoveTick::Moved { arrived }
    }

    /// Stop every player's movement, e.g. when a round ends.
    pub fn stop_all(&self, game: &mut Game, scheduler: &mut impl Scheduler) {
        for player in game.players.iter_mut() {
            stop(player, scheduler);
        }
    }
}

pub fn stop(player: &mut Player, scheduler: &mut impl Scheduler) {
    if let Some(handle) = player.movement.take() {
        scheduler.cancel(handle);
    }
    player.destination = None;
}
