//! Error types for supervisor operations.

use thiserror::Error;

/// Errors reported synchronously for supervisor API misuse.
///
/// Transport faults are never surfaced this way; they are recovered through
/// scheduled reconnection and only show up in the status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupervisorError {
    /// `start` was called while the supervisor is already running.
    #[error("supervisor already started")]
    AlreadyStarted,

    /// `stop` was called while the supervisor is not running.
    #[error("supervisor not started")]
    NotStarted,
}
