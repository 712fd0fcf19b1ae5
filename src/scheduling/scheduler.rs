use std::{sync::Arc, time::Duration};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{models::NotificationStatus, storage::NotificationStorage};

use super::dispatcher::NotificationDispatcher;

/// Outcome counts of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    /// Items whose processing returned an error or panicked.
    pub errored: usize,
}

/// Periodically fetches due notifications and hands them to the dispatcher one by one.
pub struct NotificationScheduler<S: NotificationStorage> {
    storage: Arc<S>,
    dispatcher: Arc<NotificationDispatcher<S>>,
    interval: Duration,
}

impl<S: NotificationStorage> NotificationScheduler<S> {
    pub fn new(
        storage: Arc<S>,
        dispatcher: Arc<NotificationDispatcher<S>>,
        interval: Duration,
    ) -> Self {
        Self {
            storage,
            dispatcher,
            interval,
        }
    }

    /// Runs the polling loop in the background until the returned handle is shut down.
    ///
    /// Ticks never overlap. When a tick outlasts the interval, the timer fires
    /// missed meanwhile are dropped and the next tick comes one interval later.
    pub fn start(self) -> anyhow::Result<SchedulerHandle> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("Notification scheduler requires a running tokio runtime")?;

        log::info!(
            "Starting notification scheduler. [interval = {:?}]",
            self.interval
        );

        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();
        let task = runtime.spawn(async move { self.run(task_cancellation_token).await });

        Ok(SchedulerHandle {
            task,
            cancellation_token,
        })
    }

    /// One polling pass. Fails only when the due notifications cannot be fetched;
    /// per-item failures are logged and counted in the report.
    pub async fn tick(&self, now: DateTime<Utc>) -> anyhow::Result<TickReport> {
        log::info!("Checking for due notifications. [now = {now}]");

        let due = self
            .storage
            .fetch_due(now)
            .await
            .context("Could not fetch due notifications")?;

        if due.is_empty() {
            log::info!("No pending notifications");
            return Ok(TickReport::default());
        }

        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };

        for notification in due {
            let id = notification.id;
            let dispatcher = Arc::clone(&self.dispatcher);
            let outcome =
                tokio::spawn(async move { dispatcher.process(&notification).await }).await;

            match outcome {
                Ok(Ok(NotificationStatus::Sent)) => report.sent += 1,
                Ok(Ok(_)) => report.failed += 1,
                Ok(Err(error)) => {
                    log::error!("Error trying to process notification {id}: {error:#}");
                    report.errored += 1;
                }
                Err(error) => {
                    log::error!("Processing of notification {id} was aborted: {error}");
                    report.errored += 1;
                }
            }
        }

        log::info!(
            "Tick finished. [due = {}, sent = {}, failed = {}, errored = {}]",
            report.due,
            report.sent,
            report.failed,
            report.errored
        );

        Ok(report)
    }

    async fn run(self, cancellation_token: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    log::info!("Notification scheduler shutting down");
                    break;
                }
                _ = interval.tick() => {
                    let started = Instant::now();
                    if let Err(error) = self.tick(Utc::now()).await {
                        log::error!("Notification scheduler tick failed: {error:#}");
                    }

                    if started.elapsed() >= self.interval {
                        log::warn!(
                            "Tick took {:?}, longer than the interval. Skipping missed ticks.",
                            started.elapsed()
                        );
                        interval.reset();
                    }
                }
            }
        }
    }
}

pub struct SchedulerHandle {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl SchedulerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop, letting an in-flight tick run to completion.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.cancellation_token.cancel();
        self.task
            .await
            .context("Notification scheduler task did not finish cleanly")?;

        Ok(())
    }
}
