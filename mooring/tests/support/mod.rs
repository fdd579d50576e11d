//! Shared test fixtures: a hand-advanced time provider, a scripted
//! signaling transport, and a provider bundle mixing both with the real
//! task provider.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use async_trait::async_trait;
use mooring::{
    Endpoint, EventSink, HandleEvent, Providers, SignalingHandle, SignalingIdentity,
    SignalingTransport, TimeError, TimeProvider, TokioRandomProvider, TokioTaskProvider,
    TransportError,
};

/// Run a future on a current-thread runtime inside a `LocalSet`, which the
/// supervisor's `spawn_local`-based driver requires.
pub fn run<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build current-thread runtime");
    let local = tokio::task::LocalSet::new();
    runtime.block_on(local.run_until(future))
}

/// Let the driver task drain its queues and re-park.
pub async fn pump() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Manual time
// =============================================================================

struct Sleeper {
    deadline: Duration,
    waker: Option<Waker>,
    completed: bool,
}

#[derive(Default)]
struct ManualTimeCore {
    now: Duration,
    sleepers: Vec<Sleeper>,
    requested: Vec<Duration>,
}

/// Deterministic time provider advanced explicitly by the test body.
///
/// Every `sleep` registers a deadline and parks until `advance` moves the
/// clock past it; requested durations are recorded in call order so tests
/// can assert the exact backoff ladder.
#[derive(Clone, Default)]
pub struct ManualTimeProvider {
    core: Rc<RefCell<ManualTimeCore>>,
}

impl ManualTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock, waking every sleep whose deadline has passed.
    pub fn advance(&self, delta: Duration) {
        let wakers: Vec<Waker> = {
            let mut core = self.core.borrow_mut();
            core.now += delta;
            let now = core.now;
            core.sleepers
                .iter_mut()
                .filter(|sleeper| !sleeper.completed && sleeper.deadline <= now)
                .filter_map(|sleeper| {
                    sleeper.completed = true;
                    sleeper.waker.take()
                })
                .collect()
        };
        for waker in wakers {
            waker.wake();
        }
    }

    /// Durations passed to `sleep`, in request order.
    pub fn requested_sleeps(&self) -> Vec<Duration> {
        self.core.borrow().requested.clone()
    }
}

#[async_trait(?Send)]
impl TimeProvider for ManualTimeProvider {
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        let index = {
            let mut core = self.core.borrow_mut();
            let deadline = core.now + duration;
            core.requested.push(duration);
            core.sleepers.push(Sleeper {
                deadline,
                waker: None,
                completed: false,
            });
            core.sleepers.len() - 1
        };
        ManualSleep {
            core: self.core.clone(),
            index,
        }
        .await;
        Ok(())
    }

    fn now(&self) -> Duration {
        self.core.borrow().now
    }
}

struct ManualSleep {
    core: Rc<RefCell<ManualTimeCore>>,
    index: usize,
}

impl Future for ManualSleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut core = self.core.borrow_mut();
        let now = core.now;
        let sleeper = &mut core.sleepers[self.index];
        if sleeper.completed || sleeper.deadline <= now {
            sleeper.completed = true;
            Poll::Ready(())
        } else {
            sleeper.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

// =============================================================================
// Scripted transport
// =============================================================================

struct AttemptRecord {
    identity: SignalingIdentity,
    endpoint: Endpoint,
    events: EventSink,
    destroyed: Rc<Cell<u32>>,
}

#[derive(Default)]
struct MockTransportCore {
    attempts: Vec<AttemptRecord>,
    fail_next: Option<TransportError>,
}

/// Scripted transport recording every successful creation and its teardown
/// count. Event senders are retained, so a test can keep emitting from a
/// handle long after the supervisor tore it down.
#[derive(Clone, Default)]
pub struct MockTransport {
    core: Rc<RefCell<MockTransportCore>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created so far.
    pub fn created(&self) -> usize {
        self.core.borrow().attempts.len()
    }

    /// Identity the `index`-th handle was created under.
    pub fn identity(&self, index: usize) -> SignalingIdentity {
        self.core.borrow().attempts[index].identity.clone()
    }

    /// Endpoint the `index`-th handle was created against.
    pub fn endpoint(&self, index: usize) -> Endpoint {
        self.core.borrow().attempts[index].endpoint.clone()
    }

    /// How many times `destroy` was invoked on the `index`-th handle.
    pub fn destroy_count(&self, index: usize) -> u32 {
        self.core.borrow().attempts[index].destroyed.get()
    }

    /// Make the next `create` call fail with `error`.
    pub fn fail_next_create(&self, error: TransportError) {
        self.core.borrow_mut().fail_next = Some(error);
    }

    /// Emit an event from the `index`-th handle, tagged with its identity.
    pub fn emit(&self, index: usize, event: HandleEvent) {
        let (identity, events) = {
            let core = self.core.borrow();
            let attempt = &core.attempts[index];
            (attempt.identity.clone(), attempt.events.clone())
        };
        let _ = events.send((identity, event));
    }

    /// Emit an `Open` event echoing the `index`-th handle's identity.
    pub fn open(&self, index: usize) {
        let id = self.identity(index).as_str().to_string();
        self.emit(index, HandleEvent::Open { id });
    }
}

/// Handle produced by [`MockTransport`]; counts its own teardowns.
pub struct MockHandle {
    destroyed: Rc<Cell<u32>>,
}

impl SignalingHandle for MockHandle {
    fn destroy(&self) {
        self.destroyed.set(self.destroyed.get() + 1);
    }
}

impl SignalingTransport for MockTransport {
    type Handle = MockHandle;

    fn create(
        &self,
        identity: &SignalingIdentity,
        endpoint: &Endpoint,
        events: EventSink,
    ) -> Result<MockHandle, TransportError> {
        let mut core = self.core.borrow_mut();
        if let Some(error) = core.fail_next.take() {
            return Err(error);
        }
        let destroyed = Rc::new(Cell::new(0));
        core.attempts.push(AttemptRecord {
            identity: identity.clone(),
            endpoint: endpoint.clone(),
            events,
            destroyed: destroyed.clone(),
        });
        Ok(MockHandle { destroyed })
    }
}

// =============================================================================
// Provider bundle
// =============================================================================

/// Providers bundle for tests: manual time, real local task spawning, real
/// randomness.
#[derive(Clone)]
pub struct TestProviders {
    time: ManualTimeProvider,
    task: TokioTaskProvider,
    random: TokioRandomProvider,
}

impl TestProviders {
    pub fn new(time: ManualTimeProvider) -> Self {
        Self {
            time,
            task: TokioTaskProvider::new(),
            random: TokioRandomProvider::new(),
        }
    }
}

impl Providers for TestProviders {
    type Time = ManualTimeProvider;
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
