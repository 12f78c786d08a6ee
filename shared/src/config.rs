use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("field dimensions must be finite and > 0")]
    Field,
    #[error("num_of_rings must be >= 2 (got {0})")]
    TooFewRings(usize),
    #[error("ring_radius must be finite and > 0")]
    RingRadius,
    #[error("rings {0} and {1} overlap")]
    OverlappingRings(usize, usize),
    #[error("ring {0} does not fit inside the field")]
    RingOutsideField(usize),
    #[error("round_time must be > knower_less ({round_time} <= {knower_less})")]
    RoundTime { round_time: u32, knower_less: u32 },
    #[error("win_points must be > 0 and lose_points < 0")]
    Thresholds,
    #[error("only two-player games are supported (min {min}, max {max})")]
    PlayerCount { min: usize, max: usize },
    #[error("{0} must be > 0")]
    Interval(&'static str),
    #[error("{0}")]
    Invalid(String),
}

/// Gameplay configuration, shared with clients in the welcome message.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Playing field (width, height)
    pub field: [f64; 2],
    pub num_of_rings: usize,
    pub ring_radius: f64,
    /// Seconds the guesser has in a round
    pub round_time: u32,
    /// Seconds less the knower has than the guesser
    pub knower_less: u32,
    pub win_points: i32,
    pub lose_points: i32,
    pub max_players: usize,
    pub min_players: usize,
    /// How often a moving player's position is updated (milliseconds)
    pub move_update_ms: u64,
    /// Length of one round clock tick (milliseconds)
    pub round_tick_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            field: [500.0, 500.0],
            num_of_rings: 3,
            ring_radius: 50.0,
            round_time: 15,
            knower_less: 5,
            win_points: 2,
            lose_points: -2,
            max_players: 2,
            min_players: 2,
            move_update_ms: 100,
            round_tick_ms: 1000,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [w, h] = self.field;
        if !w.is_finite() || !h.is_finite() || w <= 0.0 || h <= 0.0 {
            return Err(ConfigError::Field);
        }
        if self.num_of_rings < 2 {
            return Err(ConfigError::TooFewRings(self.num_of_rings));
        }
        if !self.ring_radius.is_finite() || self.ring_radius <= 0.0 {
            return Err(ConfigError::RingRadius);
        }
        if self.round_time <= self.knower_less {
            return Err(ConfigError::RoundTime {
                round_time: self.round_time,
                knower_less: self.knower_less,
            });
        }
        if self.win_points <= 0 || self.lose_points >= 0 {
            return Err(ConfigError::Thresholds);
        }
        if self.min_players != 2 || self.max_players != 2 {
            return Err(ConfigError::PlayerCount {
                min: self.min_players,
                max: self.max_players,
            });
        }
        if self.move_update_ms == 0 {
            return Err(ConfigError::Interval("move_update_ms"));
        }
        if self.round_tick_ms == 0 {
            return Err(ConfigError::Interval("round_tick_ms"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_game_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn knower_handicap_must_leave_time() {
        let config = GameConfig {
            round_time: 5,
            knower_less: 5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::RoundTime {
                round_time: 5,
                knower_less: 5
            })
        );
    }

    #[test]
    fn single_ring_invalid() {
        let config = GameConfig {
            num_of_rings: 1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TooFewRings(1)));
    }

    #[test]
    fn three_player_game_invalid() {
        let config = GameConfig {
            max_players: 3,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PlayerCount { max: 3, .. })
        ));
    }

    #[test]
    fn config_serializes_camel_case() {
        let json = serde_json::to_string(&GameConfig::default()).unwrap();
        assert!(json.contains("\"numOfRings\":3"));
        assert!(json.contains("\"knowerLess\":5"));
    }
}
