//! Errors returned by the session coordinator.

use duelist_wire::WireError;
use thiserror::Error;

/// A rejected handshake or push.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Both player slots are already taken.
    #[error("match is full")]
    MatchFull,
    /// Push carried an index that was never handed out.
    #[error("unknown player index {0}")]
    UnknownPlayer(u32),
    #[error("malformed message: {0}")]
    Wire(#[from] WireError),
    /// A thread panicked while holding the match lock.
    #[error("match state lock poisoned")]
    StatePoisoned,
}
