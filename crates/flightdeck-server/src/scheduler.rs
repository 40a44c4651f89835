//! Background cleanup of expired tokens and their chat memory.
//!
//! A single periodic task queries the user store for principals whose
//! persisted token expiry has passed and deletes each one's conversation
//! thread. Each user is processed independently: one failed deletion never
//! aborts the rest of the batch, and a failure to enumerate expired users
//! aborts only that tick.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use flightdeck_core::config::CleanupConfig;
use flightdeck_token::Clock;

use crate::store::{SessionMemoryStore, StoreError, UserStore, chat_thread_id};

/// Counts reported by one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupRun {
    /// Users found with an expired persisted token.
    pub found: usize,
    /// Memory threads successfully cleaned (absent threads count).
    pub cleaned: usize,
}

struct RunningJob {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Periodic cleanup scheduler.
///
/// `start` and `stop` are idempotent and may be called from different
/// tasks. Overlapping or repeated runs are tolerated: thread deletion is
/// idempotent, so cleanup is at-least-once.
pub struct CleanupScheduler {
    config: CleanupConfig,
    users: Arc<dyn UserStore>,
    memory: Arc<dyn SessionMemoryStore>,
    clock: Arc<dyn Clock>,
    running: Mutex<Option<RunningJob>>,
}

impl CleanupScheduler {
    pub fn new(
        config: CleanupConfig,
        users: Arc<dyn UserStore>,
        memory: Arc<dyn SessionMemoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            users,
            memory,
            clock,
            running: Mutex::new(None),
        }
    }

    /// Start the periodic task. Calling while already running logs a
    /// warning and does nothing.
    pub fn start(&self) {
        let mut running = self.running.lock().expect("scheduler state lock poisoned");
        if running.as_ref().is_some_and(|job| !job.handle.is_finished()) {
            tracing::warn!("cleanup scheduler is already running");
            return;
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let interval = self.config.interval();
        let users = Arc::clone(&self.users);
        let memory = Arc::clone(&self.memory);
        let clock = Arc::clone(&self.clock);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // An interval yields immediately once; consume it so the first
            // cleanup happens one full interval after start.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let result =
                            cleanup_pass(users.as_ref(), memory.as_ref(), clock.now()).await;
                        if let Err(err) = result {
                            tracing::error!(error = %err, "error during token cleanup");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        *running = Some(RunningJob { shutdown, handle });
        tracing::info!(
            job = %self.config.job_name,
            "cleanup scheduler started (runs every {} minutes)",
            self.config.interval_minutes
        );
    }

    /// Stop the periodic task. Prevents further runs without blocking on
    /// (or interrupting) a run already in flight. Idempotent.
    pub fn stop(&self) {
        let mut running = self.running.lock().expect("scheduler state lock poisoned");
        let Some(job) = running.take() else {
            return;
        };
        let _ = job.shutdown.send(true);
        tracing::info!("cleanup scheduler stopped");
    }

    /// Whether the periodic task is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .expect("scheduler state lock poisoned")
            .as_ref()
            .is_some_and(|job| !job.handle.is_finished())
    }

    /// One cleanup pass: find users with expired persisted tokens and
    /// delete each one's chat memory thread.
    ///
    /// An enumeration failure aborts the pass; a per-user deletion failure
    /// is logged and skipped.
    pub async fn run_once(&self) -> Result<CleanupRun, StoreError> {
        cleanup_pass(self.users.as_ref(), self.memory.as_ref(), self.clock.now()).await
    }
}

async fn cleanup_pass(
    users: &dyn UserStore,
    memory: &dyn SessionMemoryStore,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<CleanupRun, StoreError> {
    tracing::info!("running token cleanup task");

    let expired = users.find_expired(now).await?;
    if expired.is_empty() {
        tracing::info!("no expired tokens found");
        return Ok(CleanupRun::default());
    }

    tracing::info!("found {} users with expired tokens", expired.len());

    let mut cleaned = 0;
    for user in &expired {
        let thread_id = chat_thread_id(user.id);
        match memory.delete_thread(&thread_id).await {
            Ok(_) => {
                tracing::debug!(email = %user.email, "cleaned up memory for user");
                cleaned += 1;
            }
            Err(err) => {
                tracing::warn!(
                    email = %user.email,
                    error = %err,
                    "error cleaning up memory for user"
                );
            }
        }
    }

    tracing::info!(
        "successfully cleaned up {cleaned} of {} expired tokens",
        expired.len()
    );
    Ok(CleanupRun {
        found: expired.len(),
        cleaned,
    })
}
