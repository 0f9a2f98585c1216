use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::decision::{EntityKind, RateLimitDecision};
use super::{OrganizationId, TargetId};

/// One target as read from the ownership store, with the limits of its organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub target: TargetId,
    pub organization: OrganizationId,
    pub org_name: String,
    pub owner_email: String,
    pub monthly_limit: i64,
    pub retention_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationCacheEntry {
    pub org_name: String,
    pub org_email: String,
    pub operations: RateLimitDecision,
    pub retention_days: u32,
}

/// Immutable view of every organization's decision for one billing window.
///
/// Both maps are built together; every organization reachable through
/// `target_orgs` has an entry in `organizations`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    target_orgs: HashMap<TargetId, OrganizationId>,
    organizations: HashMap<OrganizationId, OrganizationCacheEntry>,
}

impl Snapshot {
    /// Folds ownership records and per-target usage into per-organization decisions.
    ///
    /// Usage of all targets of an organization is summed; targets absent from `usage`
    /// count as zero. The quota and retention come from the first record seen for the
    /// organization.
    pub fn from_records(records: &[OwnershipRecord], usage: &HashMap<TargetId, i64>) -> Self {
        let mut target_orgs = HashMap::with_capacity(records.len());
        let mut organizations: HashMap<OrganizationId, OrganizationCacheEntry> = HashMap::new();

        for record in records {
            target_orgs.insert(record.target.clone(), record.organization.clone());

            let entry = organizations
                .entry(record.organization.clone())
                .or_insert_with(|| OrganizationCacheEntry {
                    org_name: record.org_name.clone(),
                    org_email: record.owner_email.clone(),
                    operations: RateLimitDecision::evaluate(0, record.monthly_limit),
                    retention_days: record.retention_days,
                });

            let used = usage.get(&record.target).copied().unwrap_or(0);
            entry.operations.current = entry.operations.current.saturating_add(used);
        }

        for entry in organizations.values_mut() {
            entry.operations =
                RateLimitDecision::evaluate(entry.operations.current, entry.operations.quota);
        }

        Self {
            target_orgs,
            organizations,
        }
    }

    pub fn organization_for(&self, target: &str) -> Option<&OrganizationId> {
        self.target_orgs.get(target)
    }

    pub fn entry(&self, organization: &str) -> Option<&OrganizationCacheEntry> {
        self.organizations.get(organization)
    }

    pub fn resolve(&self, entity_id: &str, kind: EntityKind) -> Option<&OrganizationCacheEntry> {
        let organization = match kind {
            EntityKind::Organization => entity_id,
            EntityKind::Target => self.organization_for(entity_id)?.as_str(),
        };
        self.entry(organization)
    }

    pub fn organizations(
        &self,
    ) -> impl Iterator<Item = (&OrganizationId, &OrganizationCacheEntry)> {
        self.organizations.iter()
    }

    pub fn organization_count(&self) -> usize {
        self.organizations.len()
    }

    pub fn target_count(&self) -> usize {
        self.target_orgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty() && self.target_orgs.is_empty()
    }
}
