//! Signaling transport seam.
//!
//! The supervisor drives a peer transport through this capability set: create
//! a handle registered under a fresh identity, observe its lifecycle events,
//! destroy it. Implementations wrap a real signaling client; tests script
//! one. The wire protocol behind the seam is out of scope here.

use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::Endpoint;
use crate::identity::SignalingIdentity;

/// Transport-level failures observed by the supervisor.
///
/// Never fatal: the supervisor records the most recent fault in its status
/// snapshot and retries with bounded backoff.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The signaling server could not be reached.
    #[error("signaling server unreachable: {reason}")]
    Unreachable {
        /// Transport-reported detail.
        reason: String,
    },

    /// The server refused the attempted registration.
    #[error("registration rejected: {reason}")]
    Rejected {
        /// Transport-reported detail.
        reason: String,
    },

    /// The transport failed after the handle was created.
    #[error("transport fault: {reason}")]
    Fault {
        /// Transport-reported detail.
        reason: String,
    },
}

/// Lifecycle events a signaling handle reports to its supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleEvent {
    /// Registration confirmed; the server knows this handle as `id`.
    Open {
        /// Identity confirmed by the signaling server.
        id: String,
    },

    /// The link to the signaling server was lost.
    Disconnected,

    /// The transport reported a failure.
    Error(TransportError),

    /// The handle was closed explicitly.
    Closed,
}

/// Sink a handle delivers its events into.
///
/// Every event is tagged with the identity of the attempt that produced it,
/// so deliveries from a superseded attempt can be discarded regardless of
/// arrival order.
pub type EventSink = mpsc::UnboundedSender<(SignalingIdentity, HandleEvent)>;

/// One attempt to join the signaling transport under a given identity.
pub trait SignalingHandle {
    /// Tear the handle down.
    ///
    /// Idempotent. Events a handle emits after this call are discarded by
    /// the supervisor, since a new attempt may already be in flight under a
    /// different identity.
    fn destroy(&self);
}

/// Factory for signaling connection attempts.
pub trait SignalingTransport: Clone {
    /// Handle type produced by this transport.
    type Handle: SignalingHandle + 'static;

    /// Create a handle registered under `identity` against `endpoint`.
    ///
    /// Lifecycle events must be delivered through `events`, tagged with
    /// `identity`. A synchronous failure here is recovered exactly like a
    /// transport fault: the supervisor schedules a retry.
    fn create(
        &self,
        identity: &SignalingIdentity,
        endpoint: &Endpoint,
        events: EventSink,
    ) -> Result<Self::Handle, TransportError>;
}
