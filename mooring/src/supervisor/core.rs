//! Supervisor public API and its background driver.
//!
//! The supervisor owns at most one signaling handle at a time. Its public
//! surface runs on the caller's thread; a background driver task waits on
//! handle events, the armed reconnect timer, and the environment's online
//! watch, and executes whatever actions the state machine emits. All shared
//! state lives in `Rc<RefCell<..>>` cells mutated from one thread only, with
//! borrows released before every await point and before every call into
//! foreign code.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::{ConnectionConfig, Endpoint, RetryPolicy};
use crate::diag::DiagLog;
use crate::env::{EnvSnapshot, EnvironmentObserver};
use crate::error::SupervisorError;
use crate::identity::SignalingIdentity;
use crate::providers::Providers;
use crate::supervisor::machine::{Action, Machine, State};
use crate::supervisor::metrics::SupervisorMetrics;
use crate::supervisor::status::ConnectionStatus;
use crate::task::TaskProvider;
use crate::time::TimeProvider;
use crate::transport::{HandleEvent, SignalingHandle, SignalingTransport};

/// Callback invoked once per successful open with the live handle and a
/// fresh environment snapshot.
pub type InstanceCallback<H> = Rc<dyn Fn(Rc<H>, EnvSnapshot)>;

/// State shared between the supervisor facade and its driver task.
struct Shared<H> {
    machine: Machine,
    handle: Option<Rc<H>>,
    metrics: SupervisorMetrics,
    /// Delay the reconnect timer should currently be armed with.
    timer_delay: Option<Duration>,
    /// Bumped on every arm or cancel so the driver rebuilds its sleep.
    timer_generation: u64,
}

impl<H> Shared<H> {
    fn new(machine: Machine) -> Self {
        Self {
            machine,
            handle: None,
            metrics: SupervisorMetrics::new(),
            timer_delay: None,
            timer_generation: 0,
        }
    }
}

/// Everything the driver needs to execute machine actions.
struct DriverCtx<P, T, E>
where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    shared: Rc<RefCell<Shared<T::Handle>>>,
    providers: P,
    transport: T,
    env: E,
    events_tx: mpsc::UnboundedSender<(SignalingIdentity, HandleEvent)>,
    on_instance: Option<InstanceCallback<T::Handle>>,
    diag: DiagLog,
    identity_prefix: String,
    endpoint: Endpoint,
}

/// Supervisor for a single signaling connection.
///
/// Owns the connection handle exclusively: callers observe [`status`] and use
/// the handle passed to the instance callback, but only the supervisor tears
/// it down.
///
/// # Lifecycle
///
/// ```text
/// Idle ──start──► Connecting ──open──► Connected
///                     ▲                   │
///                     │ timer fires       │ error / disconnect
///                     │                   ▼
///               ReconnectPending ◄── Faulted / Disconnected
///
/// stop() from anywhere ──► Stopped (pending timer cancelled)
/// ```
///
/// An explicit `Closed` event parks the machine instead of scheduling a
/// reconnect; only a network-restoration report from the environment
/// observer revives it.
///
/// [`status`]: Supervisor::status
pub struct Supervisor<P, T, E>
where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    providers: P,
    transport: T,
    env: E,
    shared: Rc<RefCell<Shared<T::Handle>>>,
    on_instance: Option<InstanceCallback<T::Handle>>,
    shutdown_tx: Option<mpsc::UnboundedSender<()>>,
    driver: Option<JoinHandle<()>>,
    diag: DiagLog,
}

impl<P, T, E> Supervisor<P, T, E>
where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    /// Create a supervisor. No attempt is made until [`Supervisor::start`].
    pub fn new(providers: P, transport: T, env: E) -> Self {
        Self {
            providers,
            transport,
            env,
            shared: Rc::new(RefCell::new(Shared::new(Machine::new(
                RetryPolicy::default(),
            )))),
            on_instance: None,
            shutdown_tx: None,
            driver: None,
            diag: DiagLog::default(),
        }
    }

    /// Register the instance-available callback.
    ///
    /// Invoked once per successful open with the live handle and a fresh
    /// environment snapshot. Replaces any previously registered callback.
    /// The handle may be used freely but must not be torn down by the
    /// callback; teardown belongs to the supervisor.
    pub fn on_instance_available<F>(&mut self, callback: F)
    where
        F: Fn(Rc<T::Handle>, EnvSnapshot) + 'static,
    {
        self.on_instance = Some(Rc::new(callback));
    }

    /// Whether the supervisor is currently running.
    pub fn is_running(&self) -> bool {
        self.driver.is_some()
    }

    /// Read-only snapshot of the supervised connection.
    pub fn status(&self) -> ConnectionStatus {
        self.shared.borrow().machine.status().clone()
    }

    /// Observability counters for this supervisor.
    pub fn metrics(&self) -> SupervisorMetrics {
        self.shared.borrow().metrics.clone()
    }

    /// Begin supervision with the given configuration.
    ///
    /// Creates the first attempt synchronously and spawns the background
    /// driver. Calling this while already running is a programming error
    /// reported as [`SupervisorError::AlreadyStarted`].
    pub fn start(&mut self, config: ConnectionConfig) -> Result<(), SupervisorError> {
        if self.driver.is_some() {
            return Err(SupervisorError::AlreadyStarted);
        }

        self.diag = DiagLog::new(config.verbose_logging);

        // A fresh cell per run: a driver from a previous run that has not
        // drained its shutdown signal yet keeps the old cell and cannot
        // touch this one.
        self.shared = Rc::new(RefCell::new(Shared::new(Machine::new(
            config.retry.clone(),
        ))));
        let initial = self.shared.borrow_mut().machine.on_start()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let online_rx = self.env.watch_online();

        let ctx = DriverCtx {
            shared: self.shared.clone(),
            providers: self.providers.clone(),
            transport: self.transport.clone(),
            env: self.env.clone(),
            events_tx,
            on_instance: self.on_instance.clone(),
            diag: self.diag,
            identity_prefix: config.identity_prefix.clone(),
            endpoint: config.endpoint(),
        };

        self.diag.info(&format!(
            "starting supervision of {}:{}{}",
            ctx.endpoint.host, ctx.endpoint.port, ctx.endpoint.path
        ));
        apply_actions(&ctx, initial);

        let driver = self
            .providers
            .task()
            .spawn_task("connection_supervisor", drive(ctx, events_rx, shutdown_rx, online_rx));
        self.shutdown_tx = Some(shutdown_tx);
        self.driver = Some(driver);
        Ok(())
    }

    /// Stop supervision.
    ///
    /// Cancels any pending reconnect timer and destroys the handle before
    /// returning: work scheduled by the timer can never run afterwards.
    /// Calling this while not running is a programming error reported as
    /// [`SupervisorError::NotStarted`].
    pub fn stop(&mut self) -> Result<(), SupervisorError> {
        let driver = self.driver.take().ok_or(SupervisorError::NotStarted)?;

        let doomed = {
            let mut shared = self.shared.borrow_mut();
            let actions = shared.machine.on_stop();
            let mut doomed = None;
            for action in actions {
                match action {
                    Action::CancelTimer => {
                        shared.timer_delay = None;
                        shared.timer_generation += 1;
                    }
                    Action::DestroyHandle => {
                        doomed = shared.handle.take();
                    }
                    // on_stop emits no other actions
                    _ => {}
                }
            }
            doomed
        };
        if let Some(handle) = doomed {
            handle.destroy();
        }

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        drop(driver);

        self.diag.info("supervision stopped");
        Ok(())
    }
}

impl<P, T, E> Drop for Supervisor<P, T, E>
where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Background driver loop.
///
/// Waits on the shutdown signal, handle events, online transitions, and the
/// armed reconnect sleep. The machine's timer decisions are mirrored through
/// a generation counter: any arm or cancel bumps it, and the loop rebuilds
/// its local sleep before the next wait, so a cancelled timer can never fire.
async fn drive<P, T, E>(
    ctx: DriverCtx<P, T, E>,
    mut events_rx: mpsc::UnboundedReceiver<(SignalingIdentity, HandleEvent)>,
    mut shutdown_rx: mpsc::UnboundedReceiver<()>,
    mut online_rx: watch::Receiver<bool>,
) where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    let mut sleep: Option<Pin<Box<dyn Future<Output = ()>>>> = None;
    let mut sleep_generation: u64 = 0;
    let mut env_alive = true;

    loop {
        {
            let shared = ctx.shared.borrow();
            if shared.timer_generation != sleep_generation {
                sleep_generation = shared.timer_generation;
                sleep = shared
                    .timer_delay
                    .map(|delay| arm_sleep(ctx.providers.time().clone(), delay));
            }
        }
        let timer_active = sleep.is_some();

        tokio::select! {
            _ = shutdown_rx.recv() => break,

            event = events_rx.recv() => match event {
                Some((identity, event)) => handle_event(&ctx, identity, event),
                None => break,
            },

            changed = online_rx.changed(), if env_alive => match changed {
                Ok(()) => {
                    if *online_rx.borrow_and_update() {
                        handle_online(&ctx);
                    }
                }
                Err(_) => env_alive = false,
            },

            _ = wait_armed(&mut sleep), if timer_active => {
                sleep = None;
                handle_timer_fired(&ctx);
            }
        }
    }
}

/// Await the armed sleep, or park forever when none is armed.
async fn wait_armed(slot: &mut Option<Pin<Box<dyn Future<Output = ()>>>>) {
    match slot {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

/// Build the one-shot reconnect sleep from an owned time provider.
fn arm_sleep<T>(time: T, delay: Duration) -> Pin<Box<dyn Future<Output = ()>>>
where
    T: TimeProvider + 'static,
{
    Box::pin(async move {
        let _ = time.sleep(delay).await;
    })
}

/// Dispatch one event delivered by a handle.
fn handle_event<P, T, E>(ctx: &DriverCtx<P, T, E>, identity: SignalingIdentity, event: HandleEvent)
where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    let actions = {
        let mut shared = ctx.shared.borrow_mut();
        if shared.machine.state() == State::Stopped {
            return;
        }
        if !shared.machine.is_current(&identity) {
            shared.metrics.record_stale_event();
            drop(shared);
            ctx.diag
                .info(&format!("discarding event from superseded attempt {}", identity));
            return;
        }

        match &event {
            HandleEvent::Open { id } => {
                ctx.diag.info(&format!("registration open as {}", id));
            }
            HandleEvent::Disconnected => {
                ctx.diag.warn("disconnected from signaling server");
                let now = ctx.providers.time().now();
                shared.metrics.record_fault_at(now);
            }
            HandleEvent::Error(error) => {
                ctx.diag.error(&format!("transport error: {}", error));
                let now = ctx.providers.time().now();
                shared.metrics.record_fault_at(now);
            }
            HandleEvent::Closed => {
                ctx.diag.info("handle closed");
            }
        }

        shared.machine.on_handle_event(&identity, event)
    };
    apply_actions(ctx, actions);
}

/// The environment observer reported a transition to online.
fn handle_online<P, T, E>(ctx: &DriverCtx<P, T, E>)
where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    let actions = ctx.shared.borrow_mut().machine.on_network_online();
    if !actions.is_empty() {
        ctx.diag.info("network restored, reconnecting");
    }
    apply_actions(ctx, actions);
}

/// The armed reconnect sleep completed.
fn handle_timer_fired<P, T, E>(ctx: &DriverCtx<P, T, E>)
where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    let actions = {
        let mut shared = ctx.shared.borrow_mut();
        shared.timer_delay = None;
        shared.machine.on_timer_fired()
    };
    apply_actions(ctx, actions);
}

/// Execute machine actions.
///
/// Uses a worklist because spawning an attempt can fail and emit follow-up
/// actions. No `RefCell` borrow is held across a call into the transport,
/// a handle, or the instance callback.
fn apply_actions<P, T, E>(ctx: &DriverCtx<P, T, E>, actions: Vec<Action>)
where
    P: Providers,
    T: SignalingTransport + 'static,
    E: EnvironmentObserver + 'static,
{
    let mut queue: VecDeque<Action> = actions.into();
    while let Some(action) = queue.pop_front() {
        match action {
            Action::SpawnAttempt => {
                let identity =
                    SignalingIdentity::generate(&ctx.identity_prefix, ctx.providers.random());
                ctx.diag
                    .info(&format!("initializing attempt with identity {}", identity));
                {
                    let mut shared = ctx.shared.borrow_mut();
                    shared.machine.begin_attempt(identity.clone());
                    shared.metrics.record_attempt();
                }

                match ctx
                    .transport
                    .create(&identity, &ctx.endpoint, ctx.events_tx.clone())
                {
                    Ok(handle) => {
                        ctx.shared.borrow_mut().handle = Some(Rc::new(handle));
                    }
                    Err(error) => {
                        ctx.diag
                            .error(&format!("attempt creation failed: {}", error));
                        let follow_up = {
                            let mut shared = ctx.shared.borrow_mut();
                            let now = ctx.providers.time().now();
                            shared.metrics.record_fault_at(now);
                            shared.machine.on_create_failed(error)
                        };
                        queue.extend(follow_up);
                    }
                }
            }
            Action::DestroyHandle => {
                let doomed = ctx.shared.borrow_mut().handle.take();
                if let Some(handle) = doomed {
                    ctx.diag.info("destroying stale handle");
                    handle.destroy();
                }
            }
            Action::ArmTimer(delay) => {
                {
                    let mut shared = ctx.shared.borrow_mut();
                    shared.timer_delay = Some(delay);
                    shared.timer_generation += 1;
                    shared.metrics.record_reconnect_scheduled(delay);
                }
                ctx.diag.warn(&format!(
                    "attempting to reconnect in {} seconds",
                    delay.as_secs_f64()
                ));
            }
            Action::CancelTimer => {
                let mut shared = ctx.shared.borrow_mut();
                shared.timer_delay = None;
                shared.timer_generation += 1;
            }
            Action::NotifyOpen => {
                let handle = ctx.shared.borrow().handle.clone();
                {
                    let mut shared = ctx.shared.borrow_mut();
                    let now = ctx.providers.time().now();
                    shared.metrics.record_established_at(now);
                }
                if let (Some(callback), Some(handle)) = (&ctx.on_instance, handle) {
                    callback(handle, ctx.env.snapshot());
                }
            }
        }
    }
}
