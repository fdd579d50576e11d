//! # Mooring
//!
//! Resilient supervision of a single signaling connection.
//!
//! A [`Supervisor`] keeps one registration alive against a peer signaling
//! service: it creates a connection attempt under a fresh identity, observes
//! the attempt's lifecycle events, and recovers from faults with bounded
//! exponential backoff while guaranteeing that at most one reconnect timer
//! is ever pending and that caller-initiated teardown always wins over
//! scheduled work.
//!
//! The crate is built around trait seams so every collaborator can be
//! substituted in tests:
//!
//! - [`SignalingTransport`]: the peer transport (create / events / destroy)
//! - [`EnvironmentObserver`]: ambient conditions and the online watch
//! - [`Providers`]: time, task spawning, and randomness
//!
//! Everything runs on one thread: shared state is `Rc<RefCell<..>>`, the
//! driver is a `spawn_local` task, and no locking exists anywhere.
//!
//! ```ignore
//! use mooring::{ConnectionConfig, Mode, SharedEnvironment, Supervisor, TokioProviders};
//!
//! let env = SharedEnvironment::new(Default::default());
//! let mut supervisor = Supervisor::new(TokioProviders::new(), transport, env.clone());
//! supervisor.on_instance_available(|handle, snapshot| {
//!     // wire application channels onto the live handle
//! });
//! supervisor.start(ConnectionConfig::new("cam7", Mode::Production))?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Connection configuration and endpoint resolution.
pub mod config;
/// Verbosity-gated diagnostics.
pub mod diag;
/// Ambient environment observation.
pub mod env;
/// Error types for supervisor operations.
pub mod error;
/// Per-attempt signaling identity generation.
pub mod identity;
/// Provider bundle for time, tasks, and randomness.
pub mod providers;
/// Random number generation provider abstraction.
pub mod random;
/// Supervision of the signaling connection.
pub mod supervisor;
/// Task spawning abstraction.
pub mod task;
/// Time provider abstraction.
pub mod time;
/// Signaling transport seam.
pub mod transport;

// Public API exports
pub use config::{ConnectionConfig, Endpoint, Mode, RetryPolicy};
pub use diag::{DiagLog, Severity};
pub use env::{EnvSnapshot, EnvironmentObserver, Os, SharedEnvironment, Viewport};
pub use error::SupervisorError;
pub use identity::SignalingIdentity;
pub use providers::{Providers, TokioProviders};
pub use random::{RandomProvider, TokioRandomProvider};
pub use supervisor::{ConnectionStatus, InstanceCallback, Supervisor, SupervisorMetrics};
pub use task::{TaskProvider, TokioTaskProvider};
pub use time::{TimeError, TimeProvider, TokioTimeProvider};
pub use transport::{
    EventSink, HandleEvent, SignalingHandle, SignalingTransport, TransportError,
};
