//! Public runtime API surface.

pub mod errors;
pub mod handle;

pub use errors::{OracleError, Result, RuntimeError};
pub use handle::{Connection, LobbyHandle};
