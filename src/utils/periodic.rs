//! Periodic background tasks with structural cancellation
//!
//! A [`PeriodicTask`] runs an async tick function on a fixed interval until its
//! [`CancellationToken`] is cancelled. Start and stop are explicit: the owner keeps
//! the task handle and joins it on shutdown.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Handle to a spawned periodic task
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn a task that calls `tick` every `period` until `token` is cancelled.
    ///
    /// The first tick fires one full period after spawning, not immediately.
    /// A tick in progress always runs to completion before cancellation is observed.
    pub fn spawn<F, Fut>(
        name: impl Into<String>,
        period: Duration,
        token: CancellationToken,
        mut tick: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Periodic task '{}' cancelled", task_name);
                        break;
                    }
                    _ = interval.tick() => {
                        tick().await;
                    }
                }
            }
        });

        debug!("Started periodic task '{}' every {:?}", name, period);
        Self { name, handle }
    }

    /// Task name, for logging
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the task to exit. Call after cancelling its token.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!("Periodic task '{}' ended abnormally: {}", self.name, e);
        }
    }
}
