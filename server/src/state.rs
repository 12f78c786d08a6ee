use crate::geometry::{ring_layout, GeometryObject};
use crate::player::{ConnectionId, Player};
use crate::scheduler::TaskHandle;
use rand_chacha::ChaCha8Rng;
use tricker_shared::config::GameConfig;
use tricker_shared::protocol::{ObjectWire, PlayerView, StateMsg, Status};

/// Entry in the render list. Player bodies are resolved at snapshot time so
/// the list never holds stale copies of moving objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneObject {
    Background,
    Ring(usize),
    /// Body of the player in this seat
    Player(usize),
}

/// Shallow update of the shared game state: every `Some` field replaces
/// the current value, every `None` field leaves it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamePatch {
    pub status: Option<Status>,
    pub round: Option<u32>,
    pub score: Option<[i32; 2]>,
    pub knower: Option<Option<usize>>,
    pub revealed_target: Option<Option<usize>>,
    pub round_points: Option<[i32; 2]>,
    pub time_left: Option<u32>,
}

/// Per-match aggregate. Owned by exactly one session.
pub struct Game {
    pub config: GameConfig,
    pub status: Status,
    pub round: u32,
    pub score: [i32; 2],
    /// Seat of the current knower
    pub knower: Option<usize>,
    /// Target ring of the current round. Never serialized directly.
    pub target: Option<usize>,
    /// Target shown to everyone once the round is over
    pub revealed_target: Option<usize>,
    pub round_points: [i32; 2],
    pub time_left: u32,
    pub rings: Vec<GeometryObject>,
    pub background: GeometryObject,
    pub objects: Vec<SceneObject>,
    pub players: Vec<Player>,
    pub observers: Vec<ConnectionId>,
    pub round_timer: Option<TaskHandle>,
    /// Remaining seconds of the running round clock
    pub countdown: u32,
    pub rng: ChaCha8Rng,
}

impl Game {
    pub fn new(config: GameConfig, rng: ChaCha8Rng) -> Self {
        let background = GeometryObject::background(config.field);
        Self {
            config,
            status: Status::NotMinPlayers,
            round: 1,
            score: [0, 0],
            knower: None,
            target: None,
            revealed_target: None,
            round_points: [0, 0],
            time_left: 0,
            rings: Vec::new(),
            background,
            objects: Vec::new(),
            players: Vec::new(),
            observers: Vec::new(),
            round_timer: None,
            countdown: 0,
            rng,
        }
    }

    pub fn apply(&mut self, patch: GamePatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(round) = patch.round {
            self.round = round;
        }
        if let Some(score) = patch.score {
            self.score = score;
        }
        if let Some(knower) = patch.knower {
            self.knower = knower;
        }
        if let Some(target) = patch.revealed_target {
            self.revealed_target = target;
        }
        if let Some(round_points) = patch.round_points {
            self.round_points = round_points;
        }
        if let Some(time_left) = patch.time_left {
            self.time_left = time_left;
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: ConnectionId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: ConnectionId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn seat_of(&self, id: ConnectionId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn register_observer(&mut self, id: ConnectionId) {
        if !self.observers.contains(&id) {
            self.observers.push(id);
        }
    }

    pub fn unregister_observer(&mut self, id: ConnectionId) {
        self.observers.retain(|&o| o != id);
    }

    /// Seat players in joining order and register them as observers.
    pub fn add_player(&mut self, id: ConnectionId) {
        self.players.push(Player::new(id));
        self.register_observer(id);
    }

    pub fn remove_player(&mut self, id: ConnectionId) -> Option<Player> {
        let seat = self.seat_of(id)?;
        Some(self.players.remove(seat))
    }

    pub fn all_ready(&self) -> bool {
        self.players.iter().all(Player::is_ready)
    }

    pub fn knower_seat(&self) -> Option<usize> {
        self.players.iter().position(Player::is_knower)
    }

    pub fn guesser_seat(&self) -> Option<usize> {
        self.players.iter().position(|p| !p.is_knower())
    }

    /// Full match reset: round counter, score and every player.
    pub fn reset(&mut self) {
        self.apply(GamePatch {
            round: Some(1),
            score: Some([0, 0]),
            round_points: Some([0, 0]),
            knower: Some(None),
            revealed_target: Some(None),
            ..Default::default()
        });
        self.target = None;
        let field = self.config.field;
        for (seat, player) in self.players.iter_mut().enumerate() {
            player.reset_all(seat, field);
        }
    }

    /// Instantiate the rings and rebuild the render list.
    pub fn populate_objects(&mut self) {
        self.rings = ring_layout(&self.config);
        self.objects = std::iter::once(SceneObject::Background)
            .chain((0..self.rings.len()).map(SceneObject::Ring))
            .chain((0..self.players.len()).map(SceneObject::Player))
            .collect();
    }

    pub fn clear_objects(&mut self) {
        self.objects.clear();
        self.rings.clear();
    }

    /// Mirror players' points into the shared score fields.
    pub fn sync_score(&mut self) {
        let mut score = [0; 2];
        let mut round_points = [0; 2];
        for (seat, player) in self.players.iter().take(2).enumerate() {
            score[seat] = player.total_points;
            round_points[seat] = player.round_points;
        }
        self.apply(GamePatch {
            score: Some(score),
            round_points: Some(round_points),
            ..Default::default()
        });
    }

    fn object_wire(&self, object: SceneObject) -> Option<ObjectWire> {
        let geo = match object {
            SceneObject::Background => &self.background,
            SceneObject::Ring(i) => self.rings.get(i)?,
            SceneObject::Player(seat) => &self.players.get(seat)?.body,
        };
        Some(ObjectWire {
            kind: geo.kind,
            pos: geo.pos,
            dim: geo.dim,
            radius: geo.radius,
            inside: geo.inside,
        })
    }

    /// State as seen by a connection. Players get their private view, which
    /// for the knower includes the target ring.
    pub fn view_for(&self, id: ConnectionId) -> StateMsg {
        let player = self.player(id).map(|p| PlayerView {
            time_left: p.time_left,
            status: p.readiness,
            knower: p.is_knower(),
            target: if p.is_knower() { p.target } else { None },
            index: p.index,
            winner: p.winner,
        });

        StateMsg {
            status: self.status,
            round: self.round,
            score: self.score,
            knower: self.knower,
            target: self.revealed_target,
            round_points: self.round_points,
            time_left: self.time_left,
            objects: self
                .objects
                .iter()
                .filter_map(|&o| self.object_wire(o))
                .collect(),
            player,
        }
    }

    /// Views for every registered observer, in registration order.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            views: self
                .observers
                .iter()
                .map(|&id| (id, self.view_for(id)))
                .collect(),
        }
    }
}

/// One broadcast: a view per observer.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub views: Vec<(ConnectionId, StateMsg)>,
}

impl Snapshot {
    pub fn view(&self, id: ConnectionId) -> Option<&StateMsg> {
        self.views.iter().find(|(o, _)| *o == id).map(|(_, v)| v)
    }
}
