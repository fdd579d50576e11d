//! Resilient supervision of a single signaling connection.
//!
//! # Overview
//!
//! A [`Supervisor`] owns at most one live handle onto a signaling transport.
//! It watches the handle's lifecycle events, classifies failures, and
//! recovers the connection with bounded exponential backoff:
//!
//! - **Faults reconnect**: transport errors and unsolicited disconnects
//!   schedule a delayed re-attempt under a freshly generated identity.
//! - **One timer, ever**: overlapping faults never arm a second timer, and
//!   `stop` cancels a pending one before it can do any work.
//! - **Explicit close parks**: a `Closed` event resets status without
//!   scheduling a reconnect; the environment observer's online transition is
//!   the only way back.
//!
//! # Backoff
//!
//! The k-th scheduled reconnect since the last successful open waits
//! `min(base_delay * 2^k, max_delay)` (defaults: 3 s base, 30 s ceiling).
//! A successful open resets the streak.
//!
//! # Structure
//!
//! The transition table lives in a pure state machine consumed by a driver
//! task; the driver performs the actual effects (creating handles, arming
//! the sleep, invoking the instance callback) so the policy stays testable
//! in isolation.

/// Supervisor public API and background driver
pub mod core;

/// Lifecycle state machine
pub(crate) mod machine;

/// Supervision counters and timing
pub mod metrics;

/// Caller-visible connection status
pub mod status;

// Re-export main types
pub use self::core::{InstanceCallback, Supervisor};
pub use metrics::SupervisorMetrics;
pub use status::ConnectionStatus;
