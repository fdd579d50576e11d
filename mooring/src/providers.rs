//! Provider bundle trait for simplified type parameters.
//!
//! Carrying three provider type parameters through every struct and function
//! gets noisy; [`Providers`] bundles them into one. Accessor methods expose
//! the individual providers while preserving concrete types at compile time.

use crate::random::{RandomProvider, TokioRandomProvider};
use crate::task::{TaskProvider, TokioTaskProvider};
use crate::time::{TimeProvider, TokioTimeProvider};

/// Bundle of provider types for a runtime environment.
///
/// Production code uses [`TokioProviders`]; tests mix deterministic
/// implementations with the Tokio task provider.
pub trait Providers: Clone + 'static {
    /// Time provider type for sleeps and timestamps.
    type Time: TimeProvider + Clone + 'static;

    /// Task provider type for spawning local tasks.
    type Task: TaskProvider + Clone + 'static;

    /// Random provider type for identity token generation.
    type Random: RandomProvider + Clone + 'static;

    /// Get the time provider instance.
    fn time(&self) -> &Self::Time;

    /// Get the task provider instance.
    fn task(&self) -> &Self::Task;

    /// Get the random provider instance.
    fn random(&self) -> &Self::Random;
}

/// Production providers using the Tokio runtime.
#[derive(Clone, Debug, Default)]
pub struct TokioProviders {
    time: TokioTimeProvider,
    task: TokioTaskProvider,
    random: TokioRandomProvider,
}

impl TokioProviders {
    /// Create a new production providers bundle.
    pub fn new() -> Self {
        Self {
            time: TokioTimeProvider::new(),
            task: TokioTaskProvider::new(),
            random: TokioRandomProvider::new(),
        }
    }
}

impl Providers for TokioProviders {
    type Time = TokioTimeProvider;
    type Task = TokioTaskProvider;
    type Random = TokioRandomProvider;

    fn time(&self) -> &Self::Time {
        &self.time
    }

    fn task(&self) -> &Self::Task {
        &self.task
    }

    fn random(&self) -> &Self::Random {
        &self.random
    }
}
