//! Network and update status, and the connection's pause/resume driver
//!
//! Signals from any source funnel through [`ConnectivityCoordinator::observe`].
//! Only real flips reach listeners, and only `online` flips reach attached
//! connections: going offline suspends them, coming back resumes them.

mod probes;

pub use probes::{NetworkProbe, UpdateProbe, VersionDocument};

use crate::connection::ConnectionControl;
use crate::models::{ConnectivitySignal, ConnectivitySnapshot};
use chrono::Utc;
use futures::{Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

pub type ConnectivityHandler = Arc<dyn Fn(ConnectivitySnapshot) + Send + Sync>;

pub struct ConnectivityCoordinator {
    snapshot: RwLock<ConnectivitySnapshot>,
    listeners: RwLock<Vec<ConnectivityHandler>>,
    controls: RwLock<Vec<Arc<dyn ConnectionControl>>>,
    /// Serialises `observe` and `attach` so controls see flips in order
    observe_lock: Mutex<()>,
    /// Held while listeners run so they see flips in order
    dispatch_lock: Mutex<()>,
}

impl Default for ConnectivityCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityCoordinator {
    /// Starts online with no pending update
    pub fn new() -> Self {
        Self::with_snapshot(ConnectivitySnapshot::initial())
    }

    pub fn with_snapshot(snapshot: ConnectivitySnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            listeners: RwLock::new(Vec::new()),
            controls: RwLock::new(Vec::new()),
            observe_lock: Mutex::new(()),
            dispatch_lock: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        *self.snapshot.read()
    }

    /// Listeners run synchronously inside `observe` and must not call it
    ///
    /// They may call [`attach`](Self::attach) and [`detach`](Self::detach);
    /// the snapshot is already updated and controls already driven by then.
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(ConnectivitySnapshot) + Send + Sync + 'static,
    {
        self.listeners.write().push(Arc::new(handler));
    }

    /// Apply one signal; returns whether the snapshot changed
    pub fn observe(&self, signal: ConnectivitySignal) -> bool {
        let serial = self.observe_lock.lock();

        let current = self.snapshot();
        let Some(next) = current.apply(signal, Utc::now()) else {
            trace!(?signal, "Connectivity signal changes nothing");
            return false;
        };
        *self.snapshot.write() = next;

        info!(
            online = next.online,
            update_available = next.update_available,
            ?signal,
            "Connectivity changed"
        );

        if current.online != next.online {
            let controls = self.controls.read().clone();
            for control in controls {
                if next.online {
                    control.resume();
                } else {
                    control.suspend();
                }
            }
        }

        let _dispatch = self.dispatch_lock.lock();
        drop(serial);

        let listeners = self.listeners.read().clone();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(next))).is_err() {
                warn!("Connectivity listener panicked");
            }
        }

        true
    }

    /// Drive `control` from now on; returns `false` if it was already attached
    ///
    /// A control attached while offline is suspended straight away.
    pub fn attach(&self, control: Arc<dyn ConnectionControl>) -> bool {
        let _serial = self.observe_lock.lock();
        let id = control.control_id();

        let mut controls = self.controls.write();
        if controls.iter().any(|c| c.control_id() == id) {
            debug!(control_id = %id, "Control already attached");
            return false;
        }

        if !self.snapshot().online {
            control.suspend();
        }
        controls.push(control);
        debug!(control_id = %id, "Control attached");
        true
    }

    pub fn detach(&self, id: Uuid) -> bool {
        let _serial = self.observe_lock.lock();
        let mut controls = self.controls.write();
        let before = controls.len();
        controls.retain(|c| c.control_id() != id);
        controls.len() != before
    }

    /// Feed a signal source into [`observe`](Self::observe) on a background task
    pub fn watch<S>(self: &Arc<Self>, signals: S) -> JoinHandle<()>
    where
        S: Stream<Item = ConnectivitySignal> + Send + 'static,
    {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut signals = Box::pin(signals);
            while let Some(signal) = signals.next().await {
                coordinator.observe(signal);
            }
            debug!("Connectivity source ended");
        })
    }
}

impl std::fmt::Debug for ConnectivityCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityCoordinator")
            .field("snapshot", &self.snapshot())
            .field("controls", &self.controls.read().len())
            .finish()
    }
}
