//! Shared test fixtures
//!
//! Scripted sources, recording targets and a throwaway HTTP server.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;

use config_courier::common::{ConfigureError, Result, TargetError};
use config_courier::config::{ConfigSource, ConfigTarget, ConfigValue, FailureCause};

/// What a scripted source does on one poll
pub enum Step {
    /// Report nothing new
    Nothing,
    /// Offer a value
    Value(ConfigValue),
    /// Offer a value whose reload fails
    Fail(ConfigureError),
}

/// Source replaying a fixed script, then reporting nothing new forever
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    pending: Option<Result<ConfigValue>>,
    reports: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let source = Self {
            steps: steps.into(),
            pending: None,
            reports: reports.clone(),
        };
        (source, reports)
    }
}

#[async_trait]
impl ConfigSource for ScriptedSource {
    async fn needs_reload(&mut self) -> bool {
        match self.steps.pop_front() {
            None | Some(Step::Nothing) => false,
            Some(Step::Value(value)) => {
                self.pending = Some(Ok(value));
                true
            }
            Some(Step::Fail(e)) => {
                self.pending = Some(Err(e));
                true
            }
        }
    }

    async fn reload(&mut self) -> Result<ConfigValue> {
        self.pending
            .take()
            .unwrap_or_else(|| Err(ConfigureError::Other("reload without a pending value".to_string())))
    }

    async fn report_success(&mut self) {
        self.reports.lock().unwrap().push("success".to_string());
    }

    async fn report_failure(&mut self, code: &str, _message: &str, _cause: Option<&FailureCause>) {
        self.reports.lock().unwrap().push(format!("failure:{}", code));
    }
}

/// Target recording every configuration it is offered
#[derive(Default)]
pub struct RecordingTarget {
    applied: Mutex<Vec<ConfigValue>>,
    reject: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl RecordingTarget {
    /// Target rejecting the first `count` configurations
    pub fn rejecting(count: usize) -> Self {
        let target = Self::default();
        target.reject.store(count, Ordering::SeqCst);
        target
    }

    /// Every configuration offered, accepted or not
    pub fn applied(&self) -> Vec<ConfigValue> {
        self.applied.lock().unwrap().clone()
    }

    pub fn apply_count(&self) -> usize {
        self.applied.lock().unwrap().len()
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigTarget for RecordingTarget {
    async fn apply(&self, config: ConfigValue) -> std::result::Result<(), TargetError> {
        self.applied.lock().unwrap().push(config);

        let rejected = self
            .reject
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err("configuration refused by test target".into());
        }
        Ok(())
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Wait until `condition` holds, failing the test after a few seconds
pub async fn eventually<F: Fn() -> bool>(what: &str, condition: F) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

/// Serve `router` on an ephemeral loopback port
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    serve_on(listener, router)
}

/// Serve `router` on an already bound listener
pub fn serve_on(listener: TcpListener, router: Router) -> SocketAddr {
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A loopback port nothing is listening on, yet
pub fn reserve_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
