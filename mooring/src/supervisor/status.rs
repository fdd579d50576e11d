//! Caller-visible connection status.

use crate::transport::TransportError;

/// Read-only snapshot of the supervised connection.
///
/// `is_connected` is true exactly while the live attempt holds an open
/// registration, and then `current_id` names the identity the server
/// confirmed. Teardown clears both in the same synchronous stretch that
/// destroys the underlying handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Whether the current attempt has an open registration.
    pub is_connected: bool,
    /// Most recent transport fault, cleared by a successful open.
    pub last_error: Option<TransportError>,
    /// Identity confirmed by the signaling server for the live attempt.
    pub current_id: Option<String>,
}
