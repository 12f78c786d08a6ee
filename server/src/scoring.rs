//! Round scoring and the win condition.

use crate::geometry::GeometryObject;
use crate::state::Game;

/// Where a player body ended a round, relative to the rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Target,
    /// Index of a non-target ring
    Other(usize),
    Outside,
}

/// Target ring is checked first, then the other rings in order.
pub fn locate(rings: &[GeometryObject], target: usize, body: &GeometryObject) -> Location {
    if rings.get(target).is_some_and(|ring| ring.is_inside(body)) {
        return Location::Target;
    }
    rings
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != target)
        .find(|(_, ring)| ring.is_inside(body))
        .map_or(Location::Outside, |(i, _)| Location::Other(i))
}

/// Points for (knower, guesser) given where both ended the round.
pub fn score_round(knower: Location, guesser: Location) -> (i32, i32) {
    use Location::*;
    match (knower, guesser) {
        (Target, Target) => (0, 1),
        (Target, Other(_)) => (1, -1),
        (Target, Outside) => (1, 0),
        (Other(_), Target) => (-1, 1),
        (Other(k), Other(g)) if k == g => (0, -1),
        (Other(_), Other(_)) => (-1, -1),
        (Other(_), Outside) => (-1, 0),
        (Outside, Target) => (0, 1),
        (Outside, Other(_)) => (0, -1),
        (Outside, Outside) => (0, 0),
    }
}

/// Score the finished round: adds the deltas to both players' totals,
/// records them as round points and mirrors both into the game score.
/// Returns the (knower, guesser) deltas, or `None` when there is no
/// complete round to score.
pub fn apply_round_score(game: &mut Game) -> Option<(i32, i32)> {
    let target = game.target?;
    let knower_seat = game.knower_seat()?;
    let guesser_seat = game.guesser_seat()?;

    let knower_loc = locate(&game.rings, target, &game.players[knower_seat].body);
    let guesser_loc = locate(&game.rings, target, &game.players[guesser_seat].body);
    let (knower_delta, guesser_delta) = score_round(knower_loc, guesser_loc);

    tracing::debug!(
        ?knower_loc,
        ?guesser_loc,
        knower_delta,
        guesser_delta,
        "round scored"
    );

    let knower = &mut game.players[knower_seat];
    knower.total_points += knower_delta;
    knower.round_points = knower_delta;
    let guesser = &mut game.players[guesser_seat];
    guesser.total_points += guesser_delta;
    guesser.round_points = guesser_delta;

    game.sync_score();
    Some((knower_delta, guesser_delta))
}

/// Check the win condition and flag the winner. Seat 0 is checked first, so
/// when both seats qualify at once seat 0 wins.
pub fn has_winner(game: &mut Game) -> Option<usize> {
    if game.players.len() < 2 {
        return None;
    }
    let win = game.config.win_points;
    let lose = game.config.lose_points;
    let p0 = game.players[0].total_points;
    let p1 = game.players[1].total_points;

    let seat = if p0 >= win || p1 <= lose {
        0
    } else if p1 >= win || p0 <= lose {
        1
    } else {
        return None;
    };
    game.players[seat].winner = true;
    Some(seat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Role;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tricker_shared::config::GameConfig;

    fn test_game() -> Game {
        let mut game = Game::new(GameConfig::default(), ChaCha8Rng::seed_from_u64(7));
        game.add_player(1);
        game.add_player(2);
        game.populate_objects();
        game
    }

    fn body_at(pos: [f64; 2]) -> GeometryObject {
        let mut body = GeometryObject::player_body();
        body.pos = pos;
        body
    }

    #[test]
    fn full_scoring_table() {
        use Location::*;
        let cases = [
            (Target, Target, (0, 1)),
            (Target, Other(1), (1, -1)),
            (Target, Outside, (1, 0)),
            (Other(1), Target, (-1, 1)),
            (Other(1), Other(1), (0, -1)),
            (Other(1), Other(2), (-1, -1)),
            (Other(2), Outside, (-1, 0)),
            (Outside, Target, (0, 1)),
            (Outside, Other(2), (0, -1)),
            (Outside, Outside, (0, 0)),
        ];
        for (knower, guesser, expected) in cases {
            assert_eq!(
                score_round(knower, guesser),
                expected,
                "knower {:?}, guesser {:?}",
                knower,
                guesser
            );
        }
    }

    #[test]
    fn locate_prefers_target_then_other_rings() {
        let game = test_game();
        let rings = &game.rings;
        assert_eq!(locate(rings, 1, &body_at([125.0, 325.0])), Location::Target);
        assert_eq!(
            locate(rings, 1, &body_at([375.0, 325.0])),
            Location::Other(2)
        );
        assert_eq!(locate(rings, 1, &body_at([250.0, 105.0])), Location::Other(0));
        assert_eq!(locate(rings, 1, &body_at([10.0, 10.0])), Location::Outside);
    }

    #[test]
    fn apply_round_score_updates_totals_and_mirrors() {
        let mut game = test_game();
        game.players[0].role = Role::Knower;
        game.players[1].role = Role::Guesser;
        game.target = Some(0);
        game.players[0].body.pos = [250.0, 105.0];
        game.players[1].body.pos = [125.0, 325.0];

        assert_eq!(apply_round_score(&mut game), Some((1, -1)));
        assert_eq!(game.players[0].total_points, 1);
        assert_eq!(game.players[1].total_points, -1);
        assert_eq!(game.score, [1, -1]);
        assert_eq!(game.round_points, [1, -1]);
    }

    #[test]
    fn guesser_in_seat_zero_is_mirrored_in_seat_order() {
        let mut game = test_game();
        game.players[0].role = Role::Guesser;
        game.players[1].role = Role::Knower;
        game.target = Some(2);
        game.players[0].body.pos = [375.0, 325.0];
        game.players[1].body.pos = [0.0, 0.0];

        assert_eq!(apply_round_score(&mut game), Some((0, 1)));
        assert_eq!(game.score, [1, 0]);
        assert_eq!(game.round_points, [1, 0]);
    }

    #[test]
    fn no_target_no_score() {
        let mut game = test_game();
        game.players[0].role = Role::Knower;
        assert_eq!(apply_round_score(&mut game), None);
        assert_eq!(game.score, [0, 0]);
    }

    #[test]
    fn winner_by_reaching_win_points() {
        let mut game = test_game();
        game.players[0].total_points = 2;
        game.players[1].total_points = -1;
        assert_eq!(has_winner(&mut game), Some(0));
        assert!(game.players[0].winner);
        assert!(!game.players[1].winner);
    }

    #[test]
    fn winner_by_opponent_losing() {
        let mut game = test_game();
        game.players[0].total_points = -2;
        game.players[1].total_points = 0;
        assert_eq!(has_winner(&mut game), Some(1));
        assert!(game.players[1].winner);
    }

    #[test]
    fn seat_zero_wins_when_both_qualify() {
        let mut game = test_game();
        game.players[0].total_points = 2;
        game.players[1].total_points = -2;
        assert_eq!(has_winner(&mut game), Some(0));
        assert!(!game.players[1].winner);
    }

    #[test]
    fn mirrored_scores_give_seat_one() {
        let mut game = test_game();
        game.players[0].total_points = -2;
        game.players[1].total_points = 2;
        assert_eq!(has_winner(&mut game), Some(1));
    }

    #[test]
    fn no_winner_in_between() {
        let mut game = test_game();
        game.players[0].total_points = 1;
        game.players[1].total_points = -1;
        assert_eq!(has_winner(&mut game), None);
        assert!(game.players.iter().all(|p| !p.winner));
    }
}
