//! Wire protocol and gameplay configuration shared by the Tricker server
//! and its clients. Types derive `ts_rs::TS` so the browser renderer can
//! import generated TypeScript definitions.

pub mod config;
pub mod protocol;
