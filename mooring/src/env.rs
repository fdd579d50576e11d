//! Ambient environment observation.
//!
//! The supervisor never measures its surroundings itself. A collaborator
//! reports them: snapshots are forwarded verbatim in the instance-available
//! callback, and the online watch drives the network-restoration reconnect
//! path after an explicit close.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::watch;

/// Operating system reported by the environment observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    MacOs,
    /// Linux distributions.
    Linux,
    /// Apple iOS.
    Ios,
    /// Android.
    Android,
    /// Could not be determined.
    #[default]
    Unknown,
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Width of the viewport.
    pub width: u32,
    /// Height of the viewport.
    pub height: u32,
}

/// Snapshot of ambient runtime conditions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvSnapshot {
    /// Operating system the owning surface runs on.
    pub os: Os,
    /// Whether the network currently reports online.
    pub network_online: bool,
    /// Whether the user is idle.
    pub idle: bool,
    /// Current viewport dimensions.
    pub viewport: Viewport,
    /// Whether the owning surface is mounted.
    pub mounted: bool,
}

/// Collaborator reporting ambient conditions on demand.
pub trait EnvironmentObserver: Clone {
    /// Current snapshot of the observed environment.
    fn snapshot(&self) -> EnvSnapshot;

    /// Subscribe to online-state transitions.
    ///
    /// The receiver's current value is the present online state; only later
    /// sends mark it changed.
    fn watch_online(&self) -> watch::Receiver<bool>;
}

/// Caller-owned observer fed by explicit setters.
///
/// One instance per supervisor owner. There is deliberately no process-wide
/// environment singleton; owners construct, share, and drop this like any
/// other value.
#[derive(Clone)]
pub struct SharedEnvironment {
    state: Rc<RefCell<EnvSnapshot>>,
    online_tx: Rc<watch::Sender<bool>>,
}

impl SharedEnvironment {
    /// Create an observer reporting `initial` until a setter changes it.
    pub fn new(initial: EnvSnapshot) -> Self {
        let (online_tx, _) = watch::channel(initial.network_online);
        Self {
            state: Rc::new(RefCell::new(initial)),
            online_tx: Rc::new(online_tx),
        }
    }

    /// Record a network-status transition.
    pub fn set_online(&self, online: bool) {
        self.state.borrow_mut().network_online = online;
        self.online_tx.send_replace(online);
    }

    /// Record user idleness.
    pub fn set_idle(&self, idle: bool) {
        self.state.borrow_mut().idle = idle;
    }

    /// Record viewport dimensions.
    pub fn set_viewport(&self, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
    }

    /// Record whether the owning surface is mounted.
    pub fn set_mounted(&self, mounted: bool) {
        self.state.borrow_mut().mounted = mounted;
    }

    /// Record the operating system report.
    pub fn set_os(&self, os: Os) {
        self.state.borrow_mut().os = os;
    }
}

impl EnvironmentObserver for SharedEnvironment {
    fn snapshot(&self) -> EnvSnapshot {
        self.state.borrow().clone()
    }

    fn watch_online(&self) -> watch::Receiver<bool> {
        self.online_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_are_reflected_in_snapshots() {
        let env = SharedEnvironment::new(EnvSnapshot::default());

        env.set_online(true);
        env.set_idle(true);
        env.set_viewport(Viewport {
            width: 1280,
            height: 720,
        });
        env.set_mounted(true);
        env.set_os(Os::Linux);

        let snapshot = env.snapshot();
        assert!(snapshot.network_online);
        assert!(snapshot.idle);
        assert_eq!(snapshot.viewport.width, 1280);
        assert_eq!(snapshot.viewport.height, 720);
        assert!(snapshot.mounted);
        assert_eq!(snapshot.os, Os::Linux);
    }

    #[test]
    fn online_watch_observes_transitions() {
        let env = SharedEnvironment::new(EnvSnapshot::default());
        let mut watch = env.watch_online();

        assert!(!*watch.borrow_and_update());

        env.set_online(true);
        assert!(watch.has_changed().unwrap());
        assert!(*watch.borrow_and_update());
    }

    #[test]
    fn snapshots_serialize_round_trip() {
        let snapshot = EnvSnapshot {
            os: Os::Android,
            network_online: true,
            idle: false,
            viewport: Viewport {
                width: 390,
                height: 844,
            },
            mounted: true,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: EnvSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
