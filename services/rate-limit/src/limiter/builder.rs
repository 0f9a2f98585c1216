use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::notification::{NotificationRequest, TemplateKind};
use crate::sources::{OwnershipStore, SourceFetchError, UsageSource};
use crate::telemetry;

use super::snapshot::{OrganizationCacheEntry, Snapshot};
use super::window::UsageWindow;

/// Result of one successful build: the snapshot to publish and the notifications to schedule.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub window: UsageWindow,
    pub snapshot: Snapshot,
    pub notifications: Vec<NotificationRequest>,
}

#[derive(Clone)]
pub struct SnapshotBuilder {
    ownership: Arc<dyn OwnershipStore>,
    usage: Arc<dyn UsageSource>,
    warning_threshold_percent: Option<u8>,
}

impl SnapshotBuilder {
    pub fn new(ownership: Arc<dyn OwnershipStore>, usage: Arc<dyn UsageSource>) -> Self {
        Self {
            ownership,
            usage,
            warning_threshold_percent: None,
        }
    }

    pub fn with_warning_threshold(mut self, percent: Option<u8>) -> Self {
        self.warning_threshold_percent = percent;
        self
    }

    /// Builds the snapshot for the calendar month containing `now`.
    ///
    /// A failure of either source aborts the build; nothing is returned to publish.
    pub async fn build(&self, now: DateTime<Utc>) -> Result<BuildOutput, SourceFetchError> {
        let window = UsageWindow::containing(now);
        info!(
            start = %window.start_rfc3339(),
            end = %window.end_rfc3339(),
            "calculating rate-limit information"
        );

        let (records, usage) =
            tokio::try_join!(self.ownership.fetch_all(), self.usage.estimate(&window))?;
        debug!(
            targets = records.len(),
            targets_with_usage = usage.len(),
            "fetched rate-limit inputs"
        );

        let snapshot = Snapshot::from_records(&records, &usage);
        let notifications = self.notifications_for(&snapshot, &window);

        Ok(BuildOutput {
            window,
            snapshot,
            notifications,
        })
    }

    /// Every limited organization gets an exceeded notification on every build.
    /// Deduplication across builds is left to the dispatcher's key.
    fn notifications_for(
        &self,
        snapshot: &Snapshot,
        window: &UsageWindow,
    ) -> Vec<NotificationRequest> {
        let mut organizations: Vec<_> = snapshot.organizations().collect();
        organizations.sort_by(|(a, _), (b, _)| a.cmp(b));

        let mut notifications = Vec::new();
        for (organization_id, entry) in organizations {
            let kind = if entry.operations.limited {
                info!(
                    organization_id = %organization_id,
                    org_name = %entry.org_name,
                    current = entry.operations.current,
                    quota = entry.operations.quota,
                    "organization is being rate-limited for operations"
                );
                telemetry::record_limited_organization(organization_id, &entry.org_name);
                TemplateKind::RateLimitExceeded
            } else if self.approaching_limit(entry) {
                debug!(
                    organization_id = %organization_id,
                    current = entry.operations.current,
                    quota = entry.operations.quota,
                    "organization is approaching its operations limit"
                );
                TemplateKind::RateLimitWarning
            } else {
                continue;
            };

            notifications.push(NotificationRequest::for_organization(
                kind,
                organization_id,
                entry,
                window,
            ));
        }

        notifications
    }

    fn approaching_limit(&self, entry: &OrganizationCacheEntry) -> bool {
        let Some(threshold) = self.warning_threshold_percent else {
            return false;
        };
        let operations = &entry.operations;
        operations.quota > 0
            && !operations.limited
            && i128::from(operations.current) * 100
                >= i128::from(operations.quota) * i128::from(threshold)
    }
}
