use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::geometry::validate_layout;
use tricker_shared::config::{ConfigError, GameConfig};

pub const COMMAND_CHANNEL_CAPACITY: usize = 256;
pub const TICK_CHANNEL_CAPACITY: usize = 256;
pub const BROADCAST_CAPACITY: usize = 64;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Seed for target ring selection. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
    pub max_connections: usize,
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:9002".to_string(),
            rng_seed: None,
            max_connections: 64,
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `TRICKER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`ServerConfig::from_env`], reading variables through `lookup`.
    /// A variable that is set but does not parse is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(addr) = lookup("TRICKER_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(seed) = parse_var(&lookup, "TRICKER_RNG_SEED")? {
            config.rng_seed = Some(seed);
        }
        if let Some(max) = parse_var(&lookup, "TRICKER_MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        if let Some(secs) = parse_var(&lookup, "TRICKER_ROUND_TIME")? {
            config.game.round_time = secs;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid(format!("listen_addr: {}", e)))?;
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be > 0".to_string(),
            ));
        }
        self.game.validate()?;
        validate_layout(&self.game)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("{}={:?}: {}", key, raw, e)))
        })
        .transpose()
}
