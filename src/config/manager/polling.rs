//! Polling configuration manager
//!
//! One background task asks the source for changes at a fixed interval. Fetch, fingerprint,
//! apply and report run strictly in sequence on that task.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::{panic_message, ManagerState};
use crate::common::{ErrorKind, Result};
use crate::config::defaults::{APPLY_FAILURE_CODE, RELOAD_FAILURE_CODE};
use crate::config::source::{ConfigSource, FailureCause};
use crate::config::target::ConfigTarget;
use crate::config::value::Fingerprint;

/// Signals shared between the manager and its task
#[derive(Default)]
struct Control {
    stop: AtomicBool,
    wake: Notify,
}

/// State carried by the polling task
///
/// Handed back when the task exits so the manager can be started again.
struct Poller {
    source: Box<dyn ConfigSource>,
    target: Arc<dyn ConfigTarget>,
    fingerprint: Option<Fingerprint>,
}

impl Poller {
    async fn run(mut self, interval: Duration, control: Arc<Control>) -> Self {
        debug!("Configuration polling started, interval {:?}", interval);

        loop {
            self.poll_once().await;

            if control.stop.load(Ordering::SeqCst) {
                break;
            }

            if interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                // Either the interval passed or stop woke us; the flag tells which
                let _ = tokio::time::timeout(interval, control.wake.notified()).await;
            }

            if control.stop.load(Ordering::SeqCst) {
                break;
            }
        }

        debug!("Configuration polling stopped");
        self
    }

    /// One iteration; never fails and never unwinds
    async fn poll_once(&mut self) {
        let outcome = AssertUnwindSafe(self.poll()).catch_unwind().await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => match e.kind() {
                ErrorKind::Structural => {
                    error!("Invalid configuration: {}", e);
                    self.source
                        .report_failure(RELOAD_FAILURE_CODE, &e.to_string(), Some(&e as &FailureCause))
                        .await;
                }
                ErrorKind::Transport => {
                    error!("Error reading configuration: {}", e);
                }
                _ => {
                    error!("Unexpected error polling configuration: {}", e);
                }
            },
            Err(panic) => {
                error!("Configuration poll panicked: {}", panic_message(panic.as_ref()));
            }
        }
    }

    async fn poll(&mut self) -> Result<()> {
        if !self.source.needs_reload().await {
            return Ok(());
        }

        let config = self.source.reload().await?;

        let fingerprint = Fingerprint::of(&config);
        let changed = Fingerprint::changed(self.fingerprint.as_ref(), fingerprint.as_ref());

        // Recorded even if the target rejects it; a rejected configuration is not retried
        // until its content changes
        self.fingerprint = fingerprint;

        if !changed {
            debug!("Configuration unchanged, not applying");
            return Ok(());
        }

        match self.target.apply(config).await {
            Ok(()) => {
                match &self.fingerprint {
                    Some(fingerprint) => info!("Applied configuration {}", fingerprint),
                    None => info!("Applied configuration"),
                }
                self.source.report_success().await;
            }
            Err(e) => {
                error!("Configuration rejected by target: {}", e);
                self.source
                    .report_failure(APPLY_FAILURE_CODE, &e.to_string(), Some(&*e))
                    .await;
            }
        }

        Ok(())
    }
}

/// Polls a source from a background task
pub struct PollingConfigManager {
    poller: Option<Poller>,
    interval: Duration,
    control: Arc<Control>,
    task: Option<JoinHandle<Poller>>,
    state: ManagerState,
}

impl PollingConfigManager {
    /// Create a new manager
    pub fn new(
        source: Box<dyn ConfigSource>,
        target: Arc<dyn ConfigTarget>,
        interval: Duration,
    ) -> Self {
        Self {
            poller: Some(Poller {
                source,
                target,
                fingerprint: None,
            }),
            interval,
            control: Arc::new(Control::default()),
            task: None,
            state: ManagerState::Idle,
        }
    }

    /// Spawn the polling task
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&mut self) {
        let poller = match self.poller.take() {
            Some(poller) => poller,
            None => {
                warn!("Configuration polling already running");
                return;
            }
        };

        info!(
            "Starting configuration polling of {} source every {:?}",
            poller.source.source_type(),
            self.interval
        );

        // A fresh control block keeps a stale wake permit from cutting the first wait short
        self.control = Arc::new(Control::default());
        self.task = Some(tokio::spawn(poller.run(self.interval, self.control.clone())));
        self.state = ManagerState::Running;
    }

    /// Stop the polling task and wait for it to exit
    ///
    /// If the wait is cancelled the manager stays `Stopping` and a later call resumes it.
    pub async fn stop(&mut self) {
        let task = match self.task.as_mut() {
            Some(task) => task,
            None => return,
        };

        self.control.stop.store(true, Ordering::SeqCst);
        self.control.wake.notify_one();
        self.state = ManagerState::Stopping;

        let joined = task.await;
        self.task = None;

        match joined {
            Ok(poller) => self.poller = Some(poller),
            Err(e) => error!("Configuration polling task failed: {}", e),
        }

        info!("Configuration polling stopped");
        self.state = ManagerState::Stopped;
    }

    /// Poll interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current lifecycle state
    pub fn state(&self) -> ManagerState {
        self.state
    }
}

impl fmt::Debug for PollingConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingConfigManager")
            .field("interval", &self.interval)
            .field("state", &self.state)
            .finish()
    }
}
