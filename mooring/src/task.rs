//! Task spawning abstraction for single-threaded execution.

use std::future::Future;

/// Provider for spawning local tasks in a single-threaded context.
///
/// The supervisor's driver runs as a background task on the same thread as
/// its caller; this trait abstracts how that task is spawned so alternative
/// schedulers can be substituted.
pub trait TaskProvider: Clone {
    /// Spawn a named task that runs on the current thread.
    ///
    /// The task must be executed with `spawn_local` semantics to maintain
    /// single-threaded execution guarantees.
    fn spawn_task<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + 'static;
}

/// Production task provider backed by `tokio::task::spawn_local`.
///
/// Requires a `LocalSet` (or local runtime) context.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTaskProvider;

impl TokioTaskProvider {
    /// Create a new production task provider.
    pub fn new() -> Self {
        Self
    }
}

impl TaskProvider for TokioTaskProvider {
    fn spawn_task<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + 'static,
    {
        tracing::trace!("spawning local task: {}", name);
        tokio::task::spawn_local(future)
    }
}
