//! Serialized execution context of one game.
//!
//! Every mutation of a [`Game`] goes through [`Session::dispatch`] or
//! [`Session::tick`]. Events the rules trigger themselves are queued and
//! drained before either call returns, so a follow-up event never races
//! another external event.

use std::collections::VecDeque;
use std::time::Duration;

use crate::player::ConnectionId;
use crate::rules::{GameEvent, Host, Tricker};
use crate::scheduler::{ScheduledTick, Scheduler, TaskHandle, TaskKind};
use crate::state::{Game, Snapshot};

/// Receives a snapshot whenever the rules broadcast.
pub trait Observer {
    fn notify(&mut self, snapshot: Snapshot);
}

/// Keeps every snapshot. Useful for tests and replays.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub snapshots: Vec<Snapshot>,
}

impl Observer for RecordingObserver {
    fn notify(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }
}

pub struct Session<S, O> {
    pub game: Game,
    rules: Tricker,
    scheduler: S,
    observer: O,
    pending: VecDeque<GameEvent>,
}

impl<S: Scheduler, O: Observer> Session<S, O> {
    pub fn new(rules: Tricker, mut game: Game, scheduler: S, observer: O) -> Self {
        rules.init(&mut game);
        Self {
            game,
            rules,
            scheduler,
            observer,
            pending: VecDeque::new(),
        }
    }

    pub fn rules(&self) -> &Tricker {
        &self.rules
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Handle an external event and everything it triggers.
    pub fn dispatch(&mut self, event: GameEvent, origin: Option<ConnectionId>) {
        let mut host = SessionHost {
            scheduler: &mut self.scheduler,
            observer: &mut self.observer,
            pending: &mut self.pending,
        };
        self.rules.handle_event(event, &mut self.game, origin, &mut host);
        self.drain();
    }

    /// Apply a scheduler tick and everything it triggers.
    pub fn tick(&mut self, tick: ScheduledTick) {
        let mut host = SessionHost {
            scheduler: &mut self.scheduler,
            observer: &mut self.observer,
            pending: &mut self.pending,
        };
        self.rules.handle_tick(tick, &mut self.game, &mut host);
        self.drain();
    }

    fn drain(&mut self) {
        while let Some(event) = self.pending.pop_front() {
            let mut host = SessionHost {
                scheduler: &mut self.scheduler,
                observer: &mut self.observer,
                pending: &mut self.pending,
            };
            self.rules.handle_event(event, &mut self.game, None, &mut host);
        }
    }
}

struct SessionHost<'a, S, O> {
    scheduler: &'a mut S,
    observer: &'a mut O,
    pending: &'a mut VecDeque<GameEvent>,
}

impl<S: Scheduler, O: Observer> Scheduler for SessionHost<'_, S, O> {
    fn schedule(&mut self, every: Duration, kind: TaskKind) -> TaskHandle {
        self.scheduler.schedule(every, kind)
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.scheduler.cancel(handle);
    }
}

impl<S: Scheduler, O: Observer> Host for SessionHost<'_, S, O> {
    fn notify(&mut self, game: &Game) {
        self.observer.notify(game.snapshot());
    }

    fn trigger(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }
}
