use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::RateLimitConfig;
use crate::notification::{HttpEmailDispatcher, NotificationDispatcher};
use crate::reporter::{ErrorReporter, TracingReporter};
use crate::sources::{HttpUsageEstimator, OwnershipStore, UsageSource};
use crate::storage::OwnershipDatabase;

use super::builder::SnapshotBuilder;
use super::cache::RateLimitCache;
use super::decision::{EntityKind, LimitKind, RateLimitDecision};
use super::scheduler::{CycleOutcome, RefreshScheduler, RefreshSettings};

/// Query surface of the rate limiter, backed by a periodically refreshed cache.
#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<RateLimitCache>,
    scheduler: RefreshScheduler,
}

impl RateLimiter {
    pub fn new(
        ownership: Arc<dyn OwnershipStore>,
        usage: Arc<dyn UsageSource>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        reporter: Arc<dyn ErrorReporter>,
        settings: RefreshSettings,
    ) -> Self {
        let cache = Arc::new(RateLimitCache::new());
        let builder = SnapshotBuilder::new(ownership, usage)
            .with_warning_threshold(settings.warning_threshold_percent);
        let scheduler = RefreshScheduler::new(
            builder,
            Arc::clone(&cache),
            dispatcher,
            reporter,
            settings.interval,
        );

        Self { cache, scheduler }
    }

    /// Wires the SQLite ownership store and the HTTP usage/email clients from `config`.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        let ownership = OwnershipDatabase::new(&config.ownership_db_path).with_context(|| {
            format!(
                "failed to open ownership database {}",
                config.ownership_db_path.display()
            )
        })?;
        let usage = HttpUsageEstimator::new(
            config.usage_estimator_endpoint.clone(),
            config.request_timeout(),
        )
        .context("failed to build usage estimator client")?;
        let emails =
            HttpEmailDispatcher::new(config.emails_endpoint.clone(), config.request_timeout())
                .context("failed to build email dispatcher client")?;

        Ok(Self::new(
            Arc::new(ownership),
            Arc::new(usage),
            Arc::new(emails),
            Arc::new(TracingReporter),
            RefreshSettings::from(config),
        ))
    }

    pub fn check_limit(
        &self,
        entity_id: &str,
        entity_kind: EntityKind,
        limit_kind: LimitKind,
    ) -> RateLimitDecision {
        match limit_kind {
            LimitKind::OperationsReporting => self.cache.query(entity_id, entity_kind),
            LimitKind::Unsupported => RateLimitDecision::UNKNOWN,
        }
    }

    pub fn get_retention(&self, target_id: &str) -> u32 {
        self.cache.retention_for(target_id)
    }

    pub fn readiness(&self) -> bool {
        self.scheduler.readiness()
    }

    pub async fn start(&self) {
        self.scheduler.start().await;
    }

    pub fn stop(&self) {
        self.scheduler.stop();
    }

    pub async fn refresh(&self) -> CycleOutcome {
        self.scheduler.refresh().await
    }

    pub fn cache(&self) -> &Arc<RateLimitCache> {
        &self.cache
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }
}
