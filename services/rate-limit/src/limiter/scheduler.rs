use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::RateLimitConfig;
use crate::notification::{NotificationDispatcher, NotificationRequest};
use crate::reporter::ErrorReporter;

use super::builder::SnapshotBuilder;
use super::cache::RateLimitCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Starting,
    Running,
}

impl SchedulerState {
    fn as_u8(self) -> u8 {
        match self {
            SchedulerState::Stopped => 0,
            SchedulerState::Starting => 1,
            SchedulerState::Running => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SchedulerState::Starting,
            2 => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }
}

/// What a single refresh cycle ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Published {
        organizations: usize,
        notifications_scheduled: usize,
        notifications_failed: usize,
    },
    /// Building failed; the previous snapshot stays in place.
    Failed,
    /// Another cycle was still in flight.
    Skipped,
    /// The scheduler was stopped while the cycle ran; its result was dropped.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    pub interval: Duration,
    pub warning_threshold_percent: Option<u8>,
}

impl From<&RateLimitConfig> for RefreshSettings {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            interval: config.refresh_interval(),
            warning_threshold_percent: config.warning_threshold_percent,
        }
    }
}

/// Drives the snapshot builder at startup and on a fixed interval.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    builder: SnapshotBuilder,
    cache: Arc<RateLimitCache>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    reporter: Arc<dyn ErrorReporter>,
    interval: Duration,
    state: AtomicU8,
    ready: AtomicBool,
    // Bumped by every stop so cycles started earlier can tell their result is stale.
    epoch: AtomicU64,
    cycle_guard: Mutex<()>,
    shutdown: watch::Sender<bool>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(
        builder: SnapshotBuilder,
        cache: Arc<RateLimitCache>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        reporter: Arc<dyn ErrorReporter>,
        interval: Duration,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(SchedulerInner {
                builder,
                cache,
                dispatcher,
                reporter,
                interval,
                state: AtomicU8::new(SchedulerState::Stopped.as_u8()),
                ready: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                cycle_guard: Mutex::new(()),
                shutdown,
                task: std::sync::Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// True once the first build was attempted, whatever its outcome, and until `stop`.
    pub fn readiness(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    /// Runs one refresh before becoming ready, then refreshes on every interval tick.
    pub async fn start(&self) {
        let inner = &self.inner;
        if inner
            .state
            .compare_exchange(
                SchedulerState::Stopped.as_u8(),
                SchedulerState::Starting.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            warn!(state = ?self.state(), "rate limiter already started");
            return;
        }

        info!(
            interval_ms = inner.interval.as_millis() as u64,
            "rate limiter starting"
        );
        inner.shutdown.send_replace(false);
        let mut shutdown = inner.shutdown.subscribe();

        let epoch = inner.epoch.load(Ordering::SeqCst);
        // A cycle from before a stop may still hold the guard; wait for it
        // instead of skipping the initial build.
        {
            let _guard = inner.cycle_guard.lock().await;
            self.run_cycle().await;
        }

        // stop() may have run while the initial refresh was in flight.
        if inner
            .state
            .compare_exchange(
                SchedulerState::Starting.as_u8(),
                SchedulerState::Running.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
            || inner.epoch.load(Ordering::SeqCst) != epoch
        {
            debug!("rate limiter stopped during startup");
            return;
        }
        inner.ready.store(true, Ordering::SeqCst);

        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(scheduler.inner.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately and the initial refresh already ran.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.changed() => break,
                }
                // A restart reuses the channel, so a stale loop also checks its epoch.
                if *shutdown.borrow() || scheduler.inner.epoch.load(Ordering::SeqCst) != epoch {
                    break;
                }

                info!("interval triggered, updating rate-limit cache");
                scheduler.refresh().await;
            }

            debug!("rate limiter refresh loop exited");
        });

        if let Ok(mut task) = inner.task.lock() {
            *task = Some(handle);
        }
    }

    /// Stops future refreshes. A cycle already in flight runs to completion but
    /// neither publishes its snapshot nor schedules its notifications.
    pub fn stop(&self) {
        let inner = &self.inner;
        inner.ready.store(false, Ordering::SeqCst);
        inner.epoch.fetch_add(1, Ordering::SeqCst);
        inner
            .state
            .store(SchedulerState::Stopped.as_u8(), Ordering::SeqCst);
        inner.shutdown.send_replace(true);

        // Dropping the handle detaches the loop; it exits on the shutdown signal.
        if let Ok(mut task) = inner.task.lock() {
            task.take();
        }
        info!("rate limiter stopped");
    }

    /// Runs one refresh cycle unless another one is still in flight.
    pub async fn refresh(&self) -> CycleOutcome {
        let inner = &self.inner;
        let Ok(_guard) = inner.cycle_guard.try_lock() else {
            warn!("previous rate-limit refresh still running, skipping");
            return CycleOutcome::Skipped;
        };

        self.run_cycle().await
    }

    /// Builds, publishes and dispatches. Callers hold `cycle_guard`.
    async fn run_cycle(&self) -> CycleOutcome {
        let inner = &self.inner;
        let epoch = inner.epoch.load(Ordering::SeqCst);
        let output = match inner.builder.build(Utc::now()).await {
            Ok(output) => output,
            Err(err) => {
                error!(error = %err, "failed to update rate-limit cache");
                inner.reporter.report("rate-limit refresh", &err);
                return CycleOutcome::Failed;
            }
        };

        if !self.accepts_results(epoch) {
            info!("rate limiter stopped while refreshing, discarding result");
            return CycleOutcome::Discarded;
        }

        if output.snapshot.is_empty() {
            warn!("built an empty rate-limit map, every query will answer unknown");
        }
        let organizations = output.snapshot.organization_count();
        let targets = output.snapshot.target_count();
        inner.cache.publish(output.snapshot);
        info!(organizations, targets, "built a new rate-limit map");

        let (scheduled, failed) = self.dispatch(&output.notifications).await;

        CycleOutcome::Published {
            organizations,
            notifications_scheduled: scheduled,
            notifications_failed: failed,
        }
    }

    fn accepts_results(&self, epoch: u64) -> bool {
        self.inner.epoch.load(Ordering::SeqCst) == epoch
            && self.state() != SchedulerState::Stopped
    }

    async fn dispatch(&self, notifications: &[NotificationRequest]) -> (usize, usize) {
        if notifications.is_empty() {
            return (0, 0);
        }

        let dispatcher = &self.inner.dispatcher;
        let results = join_all(
            notifications
                .iter()
                .map(|notification| dispatcher.schedule(notification)),
        )
        .await;

        let mut failed = 0usize;
        for (notification, result) in notifications.iter().zip(results) {
            if let Err(err) = result {
                failed += 1;
                error!(
                    organization_id = %notification.organization_id(),
                    template = notification.kind().as_str(),
                    error = %err,
                    "failed to schedule rate-limit notification"
                );
                self.inner.reporter.report("rate-limit notification", &err);
            }
        }

        let scheduled = notifications.len() - failed;
        info!(scheduled, failed, "scheduled rate-limit notifications");
        (scheduled, failed)
    }
}
