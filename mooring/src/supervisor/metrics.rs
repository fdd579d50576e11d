//! Supervision counters and timing.

use std::time::Duration;

/// Observability counters for one supervisor.
///
/// Purely informational; no supervision decision reads these back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorMetrics {
    /// Connection attempts started, including the initial one.
    pub connection_attempts: u64,

    /// Attempts that reached an open registration.
    pub connections_established: u64,

    /// Faults observed: transport errors, disconnects, failed creations.
    pub transport_faults: u64,

    /// Reconnections scheduled through the backoff timer.
    pub reconnects_scheduled: u64,

    /// Events discarded because their attempt was superseded.
    pub stale_events_discarded: u64,

    /// Time of the last successful open (None if never connected).
    pub last_connected_at: Option<Duration>,

    /// Time of the last observed fault (None if no faults).
    pub last_fault_at: Option<Duration>,

    /// Delay armed for the most recently scheduled reconnect.
    pub current_backoff: Duration,
}

impl SupervisorMetrics {
    /// Create a zeroed metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a connection attempt.
    pub(crate) fn record_attempt(&mut self) {
        self.connection_attempts += 1;
    }

    /// Record a successful open at a specific time.
    pub(crate) fn record_established_at(&mut self, now: Duration) {
        self.connections_established += 1;
        self.last_connected_at = Some(now);
    }

    /// Record an observed fault at a specific time.
    pub(crate) fn record_fault_at(&mut self, now: Duration) {
        self.transport_faults += 1;
        self.last_fault_at = Some(now);
    }

    /// Record a scheduled reconnect and the delay it was armed with.
    pub(crate) fn record_reconnect_scheduled(&mut self, delay: Duration) {
        self.reconnects_scheduled += 1;
        self.current_backoff = delay;
    }

    /// Record a discarded event from a superseded attempt.
    pub(crate) fn record_stale_event(&mut self) {
        self.stale_events_discarded += 1;
    }
}
