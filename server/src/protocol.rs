//! Wire types live in the shared crate so clients compile against the same
//! definitions.

pub use tricker_shared::protocol::*;
