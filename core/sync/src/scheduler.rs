//! Self-scheduling synchronization with bounded retries.
//!
//! The scheduler is an explicit Idle/Scheduled/Running state machine run
//! by a single driver task. A failed automatic attempt is retried
//! immediately; only a successful attempt waits a full interval. Once the
//! retry budget is spent, autosync disables itself and the terminal
//! failure is published on the status channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;
use glossvault_common::Result;

/// Scheduler configuration. Immutable after construction.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Whether `start_sync` arms the automatic driver.
    pub auto_sync: bool,
    /// Delay between successful automatic attempts.
    pub sync_interval: Duration,
    /// Consecutive automatic failures tolerated before autosync disables
    /// itself. The budget covers retries: one initial attempt plus
    /// `max_retries` immediate retries.
    pub max_retries: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval: Duration::from_secs(300),
            max_retries: 3,
        }
    }
}

/// Observable scheduler state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// No automatic sync armed.
    Idle,
    /// A timer is armed for the next automatic attempt.
    Scheduled,
    /// A sync pass is in flight.
    Running,
    /// Autosync disabled itself after exhausting the retry budget.
    Failed { attempts: u32, reason: String },
}

struct Driver {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Owner of the autosync driver task and the manual-sync entry point.
///
/// At most one driver task exists per scheduler; automatic and manual
/// attempts are serialized through a shared gate so overlapping triggers
/// queue instead of running concurrently.
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    options: SyncOptions,
    status_tx: watch::Sender<SyncStatus>,
    gate: Arc<Mutex<()>>,
    driver: Mutex<Option<Driver>>,
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>, options: SyncOptions) -> Self {
        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            engine,
            options,
            status_tx,
            gate: Arc::new(Mutex::new(())),
            driver: Mutex::new(None),
        }
    }

    /// Subscribe to scheduler state changes.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Arm the automatic sync driver.
    ///
    /// No-op when `auto_sync` is disabled, and idempotent while a driver
    /// is already armed or running: repeated calls never create a second
    /// timer.
    pub async fn start_sync(&self) {
        if !self.options.auto_sync {
            debug!("Autosync disabled by options; start_sync is a no-op");
            return;
        }

        let mut driver = self.driver.lock().await;
        if driver.as_ref().is_some_and(|d| !d.handle.is_finished()) {
            debug!("Autosync already armed");
            return;
        }

        info!(
            "Starting autosync (interval {:?}, retry budget {})",
            self.options.sync_interval, self.options.max_retries
        );
        let _ = self.status_tx.send(SyncStatus::Scheduled);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_driver(
            self.engine.clone(),
            self.options.clone(),
            self.status_tx.clone(),
            self.gate.clone(),
            cancel.clone(),
        ));
        *driver = Some(Driver { handle, cancel });
    }

    /// Disarm autosync: cancels a pending timer and aborts an in-flight
    /// automatic attempt. Safe to call repeatedly.
    pub async fn stop_sync(&self) {
        if let Some(driver) = self.driver.lock().await.take() {
            info!("Stopping autosync");
            driver.cancel.cancel();
            let _ = driver.handle.await;
        }
        let _ = self.status_tx.send(SyncStatus::Idle);
    }

    /// Run one sync pass now, regardless of scheduler state.
    ///
    /// Manual passes bypass retry counting; they share the overlap gate
    /// with the driver, so a pass already in flight finishes first.
    pub async fn sync(&self) -> Result<()> {
        let _guard = self.gate.lock().await;
        self.engine.sync().await
    }
}

/// Driver loop: immediate first attempt, interval after success, immediate
/// retry on failure until the budget is spent.
async fn run_driver(
    engine: Arc<SyncEngine>,
    options: SyncOptions,
    status_tx: watch::Sender<SyncStatus>,
    gate: Arc<Mutex<()>>,
    cancel: CancellationToken,
) {
    let mut retry_count: u32 = 0;

    loop {
        // Running is published only once the gate is held, so an attempt
        // queued behind a manual pass still reads as Scheduled.
        let result = {
            let _guard = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Autosync cancelled while waiting for the sync gate");
                    return;
                }
                guard = gate.lock() => guard,
            };
            let _ = status_tx.send(SyncStatus::Running);
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Autosync attempt cancelled in flight");
                    return;
                }
                result = engine.sync() => result,
            }
        };

        match result {
            Ok(()) => {
                retry_count = 0;
                let _ = status_tx.send(SyncStatus::Scheduled);
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(options.sync_interval) => {}
                }
            }
            Err(e) => {
                if retry_count >= options.max_retries {
                    let attempts = retry_count + 1;
                    warn!("Autosync disabled after {} failed attempts: {}", attempts, e);
                    let _ = status_tx.send(SyncStatus::Failed {
                        attempts,
                        reason: e.to_string(),
                    });
                    return;
                }
                retry_count += 1;
                warn!(
                    "Sync attempt failed (retry {} of {}): {}",
                    retry_count, options.max_retries, e
                );
                let _ = status_tx.send(SyncStatus::Scheduled);
            }
        }
    }
}
