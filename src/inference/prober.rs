//! Availability prober.
//!
//! Polls the endpoint's model listing on a fixed interval and publishes a
//! tri-state connectivity signal. Probes are fire-and-forget: a tick never
//! waits for, skips, or coalesces with an earlier probe, and whichever probe
//! finishes last decides the published state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::client::InferenceClient;

/// Interval between scheduled probes.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(30);

// ─── ConnectivityState ───────────────────────────────────────────────────────

/// Whether the inference endpoint is reachable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectivityState {
    /// No probe has completed yet.
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectivityState {
    pub fn from_probe(ok: bool) -> Self {
        if ok {
            ConnectivityState::Connected
        } else {
            ConnectivityState::Disconnected
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectivityState::Connected
    }

    /// Short status text for an indicator.
    pub fn label(self) -> &'static str {
        match self {
            ConnectivityState::Unknown => "Checking connection...",
            ConnectivityState::Connected => "Connected",
            ConnectivityState::Disconnected => "Disconnected",
        }
    }
}

// ─── Probe ───────────────────────────────────────────────────────────────────

/// A single reachability check. Implementations must not fail: every fault
/// is reported as `false`.
pub trait Probe: Send + Sync + 'static {
    fn probe(&self) -> impl Future<Output = bool> + Send;
}

impl Probe for InferenceClient {
    fn probe(&self) -> impl Future<Output = bool> + Send {
        InferenceClient::probe(self)
    }
}

// ─── AvailabilityProber ──────────────────────────────────────────────────────

/// Schedules probes once started. See [`ProberHandle`] for the running side.
pub struct AvailabilityProber<P> {
    probe: Arc<P>,
    interval: Duration,
}

impl<P: Probe> AvailabilityProber<P> {
    pub fn new(probe: P) -> Self {
        Self::with_interval(probe, PROBE_INTERVAL)
    }

    pub fn with_interval(probe: P, interval: Duration) -> Self {
        Self {
            probe: Arc::new(probe),
            interval,
        }
    }

    /// Start probing: once immediately, then every interval until the
    /// returned handle is stopped or dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> ProberHandle {
        let (tx, rx) = watch::channel(ConnectivityState::Unknown);
        let recheck = Arc::new(Notify::new());

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "availability prober started");

        let task = tokio::spawn(run_schedule(
            self.probe,
            self.interval,
            Arc::new(tx),
            Arc::clone(&recheck),
        ));

        ProberHandle {
            state: rx,
            recheck,
            task,
        }
    }
}

/// Tick loop. Runs until aborted by the handle.
async fn run_schedule<P: Probe>(
    probe: Arc<P>,
    interval: Duration,
    tx: Arc<watch::Sender<ConnectivityState>>,
    recheck: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = recheck.notified() => {
                tracing::debug!("manual recheck requested");
            }
        }
        spawn_probe(Arc::clone(&probe), Arc::clone(&tx));
    }
}

/// Run one probe on its own task and publish its result when it resolves.
fn spawn_probe<P: Probe>(probe: Arc<P>, tx: Arc<watch::Sender<ConnectivityState>>) {
    tokio::spawn(async move {
        let next = ConnectivityState::from_probe(probe.probe().await);
        let changed = tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            tracing::info!(state = ?next, "connectivity changed");
        }
    });
}

// ─── ProberHandle ────────────────────────────────────────────────────────────

/// Read side of a running prober.
///
/// The state can only change through completed probes; this handle exposes
/// no way to write it. Dropping the handle stops scheduling, same as
/// [`stop`](ProberHandle::stop). Probes already in flight are not cancelled
/// and still publish when they finish.
pub struct ProberHandle {
    state: watch::Receiver<ConnectivityState>,
    recheck: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ProberHandle {
    /// Latest published state.
    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    /// A receiver that is notified whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.clone()
    }

    /// Fire an extra probe right away. The regular schedule is unaffected.
    pub fn check_now(&self) {
        self.recheck.notify_one();
    }

    /// Stop scheduling further probes.
    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for ProberHandle {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("availability prober stopped");
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
