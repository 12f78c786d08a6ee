//! Cancellable periodic tasks.
//!
//! A scheduled task never touches game state itself: every period it emits a
//! [`ScheduledTick`] that the session applies on its own serialized context.
//! Ticks carry the handle of the task that produced them so a tick that was
//! already queued when its task got cancelled can be recognised and dropped.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::player::ConnectionId;

/// Identifies one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskHandle(pub u64);

/// What a periodic task drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// The round countdown
    RoundClock,
    /// Movement of the player with this connection id
    Movement(ConnectionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTick {
    pub handle: TaskHandle,
    pub kind: TaskKind,
}

pub trait Scheduler {
    /// Start a task that ticks every `every`, first tick after one period.
    fn schedule(&mut self, every: Duration, kind: TaskKind) -> TaskHandle;

    /// Stop a task. Cancelling an unknown or finished task is a no-op.
    fn cancel(&mut self, handle: TaskHandle);
}

/// Scheduler backed by tokio intervals feeding a channel.
pub struct TokioScheduler {
    tick_tx: mpsc::Sender<ScheduledTick>,
    tasks: HashMap<TaskHandle, JoinHandle<()>>,
    next_handle: u64,
}

impl TokioScheduler {
    pub fn new(tick_tx: mpsc::Sender<ScheduledTick>) -> Self {
        Self {
            tick_tx,
            tasks: HashMap::new(),
            next_handle: 1,
        }
    }

    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, every: Duration, kind: TaskKind) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;

        let tx = self.tick_tx.clone();
        let join = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + every;
            let mut interval = tokio::time::interval_at(start, every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(ScheduledTick { handle, kind }).await.is_err() {
                    break;
                }
            }
        });

        self.tasks.insert(handle, join);
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        if let Some(join) = self.tasks.remove(&handle) {
            join.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, join) in self.tasks.drain() {
            join.abort();
        }
    }
}

/// Scheduler that never fires on its own. Tests and simulations pull ticks
/// out of it explicitly.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    active: BTreeMap<TaskHandle, (Duration, TaskKind)>,
    next_handle: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, handle: TaskHandle) -> bool {
        self.active.contains_key(&handle)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// The tick the active task of `kind` would emit next, if one is running.
    pub fn tick_for(&self, kind: TaskKind) -> Option<ScheduledTick> {
        self.active
            .iter()
            .find(|(_, (_, k))| *k == kind)
            .map(|(&handle, &(_, kind))| ScheduledTick { handle, kind })
    }

    pub fn period(&self, handle: TaskHandle) -> Option<Duration> {
        self.active.get(&handle).map(|(every, _)| *every)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, every: Duration, kind: TaskKind) -> TaskHandle {
        self.next_handle += 1;
        let handle = TaskHandle(self.next_handle);
        self.active.insert(handle, (every, kind));
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.active.remove(&handle);
    }
}
