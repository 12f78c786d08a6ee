//! Tricker server library.
//!
//! Authoritative rules engine for Tricker, a two-player guessing game: the
//! knower sees which ring is the target, the guesser has to read the
//! knower's movements and get there too. This crate holds the rules and the
//! tokio/axum host that runs them.

pub mod config;
pub mod game_loop;
pub mod geometry;
pub mod movement;
pub mod player;
pub mod protocol;
pub mod rules;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod state;
pub mod timer;
pub mod ws;
