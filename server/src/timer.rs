use crate::scheduler::{Scheduler, TaskKind};
use crate::state::{Game, GamePatch};
use std::time::Duration;
use tricker_shared::config::GameConfig;

/// Result of one round clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Running { remaining: u32 },
    /// The countdown hit zero and the clock has stopped itself
    Expired,
}

/// Round countdown. The guesser's budget mirrors the countdown; the knower
/// gets `knower_less` seconds less.
#[derive(Debug, Clone)]
pub struct RoundTimer {
    round_time: u32,
    knower_less: u32,
    period: Duration,
}

impl RoundTimer {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            round_time: config.round_time,
            knower_less: config.knower_less,
            period: Duration::from_millis(config.round_tick_ms),
        }
    }

    pub fn start(&self, game: &mut Game, scheduler: &mut impl Scheduler) {
        self.stop(game, scheduler);
        game.countdown = self.round_time;
        self.sync_budgets(game);
        game.round_timer = Some(scheduler.schedule(self.period, TaskKind::RoundClock));
    }

    pub fn stop(&self, game: &mut Game, scheduler: &mut impl Scheduler) {
        if let Some(handle) = game.round_timer.take() {
            scheduler.cancel(handle);
        }
    }

    pub fn tick(&self, game: &mut Game, scheduler: &mut impl Scheduler) -> ClockTick {
        game.countdown = game.countdown.saturating_sub(1);
        self.sync_budgets(game);

        if game.countdown == 0 {
            self.stop(game, scheduler);
            ClockTick::Expired
        } else {
            ClockTick::Running {
                remaining: game.countdown,
            }
        }
    }

    fn sync_budgets(&self, game: &mut Game) {
        let time = game.countdown;
        let knower_time = time.saturating_sub(self.knower_less);
        for player in game.players.iter_mut() {
            player.time_left = if player.is_knower() { knower_time } else { time };
        }
        game.apply(GamePatch {
            time_left: Some(time),
            ..Default::default()
        });
    }
}
