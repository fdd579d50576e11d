//! Lifecycle state machine for the connection supervisor.
//!
//! This is a pure implementation with no I/O dependencies: events go in,
//! actions come out, and the driver performs the actual effects. Keeping the
//! whole transition table in one dispatch path makes the reconnect policy
//! testable without a transport, a timer, or a runtime.

use std::time::Duration;

use crate::config::RetryPolicy;
use crate::error::SupervisorError;
use crate::identity::SignalingIdentity;
use crate::supervisor::status::ConnectionStatus;
use crate::transport::{HandleEvent, TransportError};

/// Lifecycle states of the supervised connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Not started, or parked after an explicit close.
    Idle,
    /// Attempt created, waiting for its open confirmation.
    Connecting,
    /// Open registration confirmed.
    Connected,
    /// Link lost, reconnect not yet scheduled.
    Disconnected,
    /// Fault observed, reconnect not yet scheduled.
    Faulted,
    /// Exactly one reconnect timer armed.
    ReconnectPending,
    /// Stopped by the caller; terminal until the next start.
    Stopped,
}

/// Effects the driver must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    /// Create a new attempt under a freshly generated identity.
    SpawnAttempt,
    /// Destroy the currently tracked handle, if any.
    DestroyHandle,
    /// Arm the single reconnect timer for the given delay.
    ArmTimer(Duration),
    /// Disarm the reconnect timer.
    CancelTimer,
    /// Invoke the instance-available callback.
    NotifyOpen,
}

/// Transition table and owned state for one supervisor.
///
/// All mutable supervision state lives in explicit fields here, mutated only
/// by the transition methods below.
#[derive(Debug)]
pub(crate) struct Machine {
    state: State,
    status: ConnectionStatus,
    current: Option<SignalingIdentity>,
    attempt_count: u32,
    timer_armed: bool,
    policy: RetryPolicy,
}

impl Machine {
    /// Create an idle machine governed by the given retry policy.
    pub(crate) fn new(policy: RetryPolicy) -> Self {
        Self {
            state: State::Idle,
            status: ConnectionStatus::default(),
            current: None,
            attempt_count: 0,
            timer_armed: false,
            policy,
        }
    }

    pub(crate) fn state(&self) -> State {
        self.state
    }

    pub(crate) fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub(crate) fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub(crate) fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    /// Whether `identity` belongs to the attempt currently being tracked.
    pub(crate) fn is_current(&self, identity: &SignalingIdentity) -> bool {
        self.current.as_ref() == Some(identity)
    }

    /// Begin supervision. Valid from `Idle` and `Stopped` only.
    pub(crate) fn on_start(&mut self) -> Result<Vec<Action>, SupervisorError> {
        match self.state {
            State::Idle | State::Stopped => {
                self.reset();
                self.state = State::Idle;
                Ok(vec![Action::SpawnAttempt])
            }
            _ => Err(SupervisorError::AlreadyStarted),
        }
    }

    /// Record the identity of a freshly created attempt.
    pub(crate) fn begin_attempt(&mut self, identity: SignalingIdentity) {
        self.current = Some(identity);
        self.state = State::Connecting;
    }

    /// Handle creation failed synchronously; recovered like a transport
    /// fault.
    pub(crate) fn on_create_failed(&mut self, error: TransportError) -> Vec<Action> {
        let mut actions = Vec::new();
        self.current = None;
        self.status.last_error = Some(error);
        if !self.timer_armed {
            self.state = State::Faulted;
        }
        self.schedule_reconnect(&mut actions);
        actions
    }

    /// Dispatch one event from the handle created under `identity`.
    ///
    /// Events from superseded attempts are discarded without touching any
    /// state: delivery order after a teardown is not guaranteed, and a new
    /// attempt may already be in flight under a different identity.
    pub(crate) fn on_handle_event(
        &mut self,
        identity: &SignalingIdentity,
        event: HandleEvent,
    ) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state == State::Stopped || !self.is_current(identity) {
            return actions;
        }

        match event {
            HandleEvent::Open { id } => {
                // A timer should not be pending on this path; disarming it
                // anyway keeps the single-timer invariant unconditional.
                if self.timer_armed {
                    self.timer_armed = false;
                    actions.push(Action::CancelTimer);
                }
                self.attempt_count = 0;
                self.status = ConnectionStatus {
                    is_connected: true,
                    last_error: None,
                    current_id: Some(id),
                };
                self.state = State::Connected;
                actions.push(Action::NotifyOpen);
            }
            HandleEvent::Disconnected => {
                // current_id stays until the handle is actually torn down.
                self.status.is_connected = false;
                if !self.timer_armed {
                    self.state = State::Disconnected;
                }
                self.schedule_reconnect(&mut actions);
            }
            HandleEvent::Error(error) => {
                self.status.last_error = Some(error);
                if !self.timer_armed {
                    self.state = State::Faulted;
                }
                self.schedule_reconnect(&mut actions);
            }
            HandleEvent::Closed => {
                // An explicit close is not a fault: reset and park, recovery
                // comes through the network-restoration path only. Whether a
                // close should ever reconnect automatically is a product
                // question; the asymmetry is kept as observed. A timer armed
                // by an earlier fault must not resurrect a closed connection.
                if self.timer_armed {
                    self.timer_armed = false;
                    actions.push(Action::CancelTimer);
                }
                self.status = ConnectionStatus::default();
                self.current = None;
                self.state = State::Idle;
                actions.push(Action::DestroyHandle);
            }
        }
        actions
    }

    /// The armed reconnect timer fired.
    ///
    /// Tears down the stale attempt and requests a fresh one. A fire after
    /// cancellation or stop is a no-op.
    pub(crate) fn on_timer_fired(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.state == State::Stopped || !self.timer_armed {
            return actions;
        }
        self.timer_armed = false;
        self.status.is_connected = false;
        self.status.current_id = None;
        self.current = None;
        actions.push(Action::DestroyHandle);
        actions.push(Action::SpawnAttempt);
        actions
    }

    /// The environment observer reported a transition to online.
    ///
    /// A second, event-driven path into `Connecting`: when no attempt is in
    /// flight and none is connected, reconnect immediately, independent of
    /// the backoff timer. The failure streak is considered stale.
    pub(crate) fn on_network_online(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        match self.state {
            State::Connecting | State::Connected | State::Stopped => return actions,
            State::Idle | State::Disconnected | State::Faulted | State::ReconnectPending => {}
        }
        if self.timer_armed {
            self.timer_armed = false;
            actions.push(Action::CancelTimer);
        }
        self.attempt_count = 0;
        self.status.is_connected = false;
        self.status.current_id = None;
        self.current = None;
        actions.push(Action::DestroyHandle);
        actions.push(Action::SpawnAttempt);
        actions
    }

    /// Stop supervision at the caller's request. Terminal until `on_start`.
    pub(crate) fn on_stop(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.timer_armed {
            actions.push(Action::CancelTimer);
        }
        actions.push(Action::DestroyHandle);
        self.reset();
        self.state = State::Stopped;
        actions
    }

    fn reset(&mut self) {
        self.status = ConnectionStatus::default();
        self.current = None;
        self.attempt_count = 0;
        self.timer_armed = false;
    }

    /// Schedule one reconnect attempt with exponential backoff.
    ///
    /// Idempotent: a second fault while a timer is armed must not arm a
    /// second one.
    fn schedule_reconnect(&mut self, actions: &mut Vec<Action>) {
        if self.timer_armed || self.state == State::Stopped {
            return;
        }
        let delay = self.policy.delay_for(self.attempt_count);
        self.attempt_count += 1;
        self.timer_armed = true;
        self.state = State::ReconnectPending;
        actions.push(Action::ArmTimer(delay));
    }
}
