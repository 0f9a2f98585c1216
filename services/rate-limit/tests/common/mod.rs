#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use edge_rate_limit::limiter::TargetId;
use edge_rate_limit::{
    DispatchError, ErrorReporter, JobReference, NotificationDispatcher, NotificationKey,
    NotificationRequest, OwnershipRecord, OwnershipStore, RateLimiter, RefreshSettings,
    SourceFetchError, UsageSource, UsageWindow,
};

pub fn record(target: &str, organization: &str, limit: i64, retention: u32) -> OwnershipRecord {
    OwnershipRecord {
        target: target.to_string(),
        organization: organization.to_string(),
        org_name: format!("{organization} inc"),
        owner_email: format!("owner@{organization}.io"),
        monthly_limit: limit,
        retention_days: retention,
    }
}

pub fn acme(limit: i64) -> OwnershipRecord {
    OwnershipRecord {
        target: "t1".to_string(),
        organization: "o1".to_string(),
        org_name: "Acme".to_string(),
        owner_email: "a@acme.io".to_string(),
        monthly_limit: limit,
        retention_days: 7,
    }
}

#[derive(Default)]
pub struct FakeOwnership {
    records: Mutex<Vec<OwnershipRecord>>,
    failing: AtomicBool,
}

impl FakeOwnership {
    pub fn new(records: Vec<OwnershipRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_records(&self, records: Vec<OwnershipRecord>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl OwnershipStore for FakeOwnership {
    async fn fetch_all(&self) -> Result<Vec<OwnershipRecord>, SourceFetchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceFetchError::Ownership("database offline".into()));
        }
        Ok(self.records.lock().unwrap().clone())
    }
}

/// Usage source that can fail, or hold requests until released.
#[derive(Default)]
pub struct FakeUsage {
    counts: Mutex<HashMap<TargetId, i64>>,
    failing: AtomicBool,
    blocked: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
    pub calls: AtomicUsize,
}

impl FakeUsage {
    pub fn new(pairs: &[(&str, i64)]) -> Self {
        let usage = Self::default();
        usage.set_counts(pairs);
        usage
    }

    pub fn set_counts(&self, pairs: &[(&str, i64)]) {
        *self.counts.lock().unwrap() = pairs
            .iter()
            .map(|(target, count)| (target.to_string(), *count))
            .collect();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }
}

#[async_trait]
impl UsageSource for FakeUsage {
    async fn estimate(
        &self,
        _window: &UsageWindow,
    ) -> Result<HashMap<TargetId, i64>, SourceFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.blocked.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceFetchError::UsageUnreachable("connection refused".into()));
        }
        Ok(self.counts.lock().unwrap().clone())
    }
}

/// Dispatcher that deduplicates by key like the email queue does.
#[derive(Default)]
pub struct FakeDispatcher {
    calls: Mutex<Vec<NotificationRequest>>,
    delivered: Mutex<HashSet<NotificationKey>>,
    failing: AtomicBool,
    failing_organizations: Mutex<HashSet<String>>,
}

impl FakeDispatcher {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Rejects only the notifications addressed to `organization`.
    pub fn fail_for(&self, organization: &str) {
        self.failing_organizations
            .lock()
            .unwrap()
            .insert(organization.to_string());
    }

    pub fn calls(&self) -> Vec<NotificationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn delivered(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }

    pub fn delivered_to(&self, organization: &str) -> bool {
        self.calls()
            .iter()
            .filter(|call| call.organization_id() == organization)
            .any(|call| self.delivered.lock().unwrap().contains(&call.key))
    }
}

#[async_trait]
impl NotificationDispatcher for FakeDispatcher {
    async fn schedule(&self, request: &NotificationRequest) -> Result<JobReference, DispatchError> {
        self.calls.lock().unwrap().push(request.clone());
        let rejected = self
            .failing_organizations
            .lock()
            .unwrap()
            .contains(request.organization_id());
        if rejected || self.failing.load(Ordering::SeqCst) {
            return Err(DispatchError::Unreachable("queue offline".into()));
        }
        self.delivered.lock().unwrap().insert(request.key.clone());
        Ok(JobReference {
            job: request.key.to_string(),
        })
    }
}

#[derive(Default)]
pub struct CountingReporter {
    reports: Mutex<Vec<String>>,
}

impl CountingReporter {
    pub fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }

    pub fn sources(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorReporter for CountingReporter {
    fn report(&self, source: &str, _error: &(dyn Error + 'static)) {
        self.reports.lock().unwrap().push(source.to_string());
    }
}

pub struct Harness {
    pub ownership: Arc<FakeOwnership>,
    pub usage: Arc<FakeUsage>,
    pub dispatcher: Arc<FakeDispatcher>,
    pub reporter: Arc<CountingReporter>,
    pub limiter: RateLimiter,
}

impl Harness {
    pub fn new(records: Vec<OwnershipRecord>, usage: &[(&str, i64)]) -> Self {
        Self::with_interval(records, usage, Duration::from_secs(3600))
    }

    pub fn with_interval(
        records: Vec<OwnershipRecord>,
        usage: &[(&str, i64)],
        interval: Duration,
    ) -> Self {
        let ownership = Arc::new(FakeOwnership::new(records));
        let usage = Arc::new(FakeUsage::new(usage));
        let dispatcher = Arc::new(FakeDispatcher::default());
        let reporter = Arc::new(CountingReporter::default());

        let limiter = RateLimiter::new(
            ownership.clone(),
            usage.clone(),
            dispatcher.clone(),
            reporter.clone(),
            RefreshSettings {
                interval,
                warning_threshold_percent: None,
            },
        );

        Self {
            ownership,
            usage,
            dispatcher,
            reporter,
            limiter,
        }
    }
}
