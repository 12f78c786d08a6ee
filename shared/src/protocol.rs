use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::GameConfig;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "state")]
    State(StateMsg),
}

/// How a connection takes part in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    Player,
    Observer,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub self_id: u32,
    pub role: ClientRole,
    pub config: GameConfig,
}

/// Game phase as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotMinPlayers,
    Startable,
    Started,
    WaitingRoundStart,
    RoundStarted,
    RoundEnd,
    GameEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReadyStatus {
    NotReady,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Background,
    Ring,
    Player,
}

/// Full game state, rendered from scratch by the client on every message.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StateMsg {
    pub status: Status,
    pub round: u32,
    pub score: [i32; 2],
    /// Seat of the knower in the current round
    pub knower: Option<usize>,
    /// Target ring, only set once the round is over
    pub target: Option<usize>,
    pub round_points: [i32; 2],
    pub time_left: u32,
    pub objects: Vec<ObjectWire>,
    /// Only present on a player's own view
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub player: Option<PlayerView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ObjectWire {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub pos: [f64; 2],
    pub dim: [f64; 2],
    pub radius: f64,
    pub inside: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub time_left: u32,
    pub status: ReadyStatus,
    pub knower: bool,
    /// Target ring, only ever sent to the knower
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub target: Option<usize>,
    pub index: Option<usize>,
    pub winner: bool,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "player_ready")]
    PlayerReady,
    #[serde(rename = "move_to")]
    MoveTo { point: [f64; 2] },
}
