//! Fixed-interval runner for background tasks.
//!
//! One spawned loop per started timer: sleep for the interval, run the task to
//! completion, repeat. A run is never interrupted; stopping only prevents the
//! next one. Loops of the same timer share a run lock, so a restart while a
//! run is still in flight waits for it instead of overlapping. Failures are counted and logged with escalating severity but
//! never stop the loop.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Mutex as RunLock};
use tracing::{debug, error, warn};

use crate::error::{SyncError, SyncResult};

/// Work executed on every tick of an [`IntervalTimer`].
#[async_trait]
pub trait PeriodicTask: Send + Sync + 'static {
    async fn run(&self) -> SyncResult<()>;
}

/// Calls a [`PeriodicTask`] every `interval` until stopped.
pub struct IntervalTimer {
    interval: Duration,
    error_threshold: u32,
    failures: Arc<AtomicU32>,
    run_lock: Arc<RunLock<()>>,
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl IntervalTimer {
    pub fn new(interval: Duration, error_threshold: u32) -> Self {
        Self {
            interval,
            error_threshold,
            failures: Arc::new(AtomicU32::new(0)),
            run_lock: Arc::new(RunLock::new(())),
            stop_tx: Mutex::new(None),
        }
    }

    /// Spawn the loop on the current tokio runtime.
    pub fn start<T: PeriodicTask>(&self, task: Arc<T>) -> SyncResult<()> {
        let mut stop_tx = self.stop_tx.lock().expect("lock poisoned");
        if stop_tx.is_some() {
            return Err(SyncError::AlreadyStarted);
        }
        let (tx, rx) = oneshot::channel();
        tokio::spawn(run_loop(
            task,
            self.interval,
            self.error_threshold,
            Arc::clone(&self.failures),
            Arc::clone(&self.run_lock),
            rx,
        ));
        *stop_tx = Some(tx);
        debug!(interval_ms = self.interval.as_millis() as u64, "interval timer started");
        Ok(())
    }

    /// Prevent further runs. A run already in progress completes.
    pub fn stop(&self) -> SyncResult<()> {
        let tx = self
            .stop_tx
            .lock()
            .expect("lock poisoned")
            .take()
            .ok_or(SyncError::NotStarted)?;
        // The loop may already be gone if the runtime shut down.
        let _ = tx.send(());
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.stop_tx.lock().expect("lock poisoned").is_some()
    }

    /// Failures since the last successful run.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn error_threshold(&self) -> u32 {
        self.error_threshold
    }
}

impl std::fmt::Debug for IntervalTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalTimer")
            .field("interval", &self.interval)
            .field("error_threshold", &self.error_threshold)
            .field("started", &self.is_started())
            .field("consecutive_failures", &self.consecutive_failures())
            .finish()
    }
}

async fn run_loop<T: PeriodicTask>(
    task: Arc<T>,
    interval: Duration,
    error_threshold: u32,
    failures: Arc<AtomicU32>,
    run_lock: Arc<RunLock<()>>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let _running = run_lock.lock().await;
        match task.run().await {
            Ok(()) => failures.store(0, Ordering::Relaxed),
            Err(e) => {
                let count = failures.fetch_add(1, Ordering::Relaxed) + 1;
                if count >= error_threshold {
                    error!(consecutive_failures = count, error = %e, "periodic task failed");
                } else {
                    warn!(consecutive_failures = count, error = %e, "periodic task failed");
                }
            }
        }
    }
    debug!("interval timer stopped");
}
