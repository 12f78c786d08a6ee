use crate::geometry::GeometryObject;
use crate::scheduler::TaskHandle;
use tricker_shared::protocol::ReadyStatus;

/// Host-assigned id of a WebSocket connection.
pub type ConnectionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sees the target ring, has less time
    Knower,
    Guesser,
}

/// A seated participant. Observers that are not players have no `Player`.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnectionId,
    pub role: Role,
    pub body: GeometryObject,
    /// Sum of all round points, may go negative
    pub total_points: i32,
    /// Result of the last scored round: -1, 0 or 1
    pub round_points: i32,
    pub readiness: ReadyStatus,
    /// Seconds this player may still move in the current round
    pub time_left: u32,
    /// Target ring index. Only ever set on the knower.
    pub target: Option<usize>,
    /// Seat in the game, assigned when the game starts
    pub index: Option<usize>,
    pub winner: bool,
    pub movement: Option<TaskHandle>,
    /// Where the running movement task is heading
    pub destination: Option<[f64; 2]>,
}

impl Player {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            role: Role::Guesser,
            body: GeometryObject::player_body(),
            total_points: 0,
            round_points: 0,
            readiness: ReadyStatus::NotReady,
            time_left: 0,
            target: None,
            index: None,
            winner: false,
            movement: None,
            destination: None,
        }
    }

    pub fn is_knower(&self) -> bool {
        self.role == Role::Knower
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == ReadyStatus::Ready
    }

    /// Put the player back on its seat's start spot for a new round.
    pub fn round_reset(&mut self, seat: usize, field: [f64; 2]) {
        self.body.pos = start_position(seat, field);
        self.body.inside = false;
        self.round_points = 0;
        self.readiness = ReadyStatus::NotReady;
        self.target = None;
    }

    pub fn reset_all(&mut self, seat: usize, field: [f64; 2]) {
        self.round_reset(seat, field);
        self.total_points = 0;
        self.winner = false;
    }
}

/// Start spot of a seat: seats are spread along a horizontal line just
/// above the middle of the field.
pub fn start_position(seat: usize, field: [f64; 2]) -> [f64; 2] {
    let [w, h] = field;
    [
        (w / 3.0 + w / 3.0 * seat as f64).ceil(),
        (h / 2.0 - 20.0).ceil(),
    ]
}

/// One movement step along a single axis. Far away the step is a fifth of
/// the remaining distance, within 5 units it is 1, so a player slows down
/// near the goal and never overshoots it.
pub fn step_towards(here: f64, to: f64) -> f64 {
    let diff = to - here;
    let abs = diff.abs();
    if abs == 0.0 {
        return here;
    }
    let step = if abs <= 5.0 { 1.0 } else { (abs / 5.0).ceil() };
    // Non-integral leftovers below 1 are closed in one step
    let step = step.min(abs);
    if diff > 0.0 {
        here + step
    } else {
        here - step
    }
}
