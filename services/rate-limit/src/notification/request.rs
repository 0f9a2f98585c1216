use serde::{Deserialize, Serialize};

use crate::limiter::{OrganizationCacheEntry, UsageWindow};

use super::key::NotificationKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TemplateKind {
    #[serde(rename = "rate-limit-exceeded")]
    RateLimitExceeded,
    #[serde(rename = "rate-limit-warning")]
    RateLimitWarning,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::RateLimitExceeded => "rate-limit-exceeded",
            TemplateKind::RateLimitWarning => "rate-limit-warning",
        }
    }
}

/// Billing period in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPeriod {
    pub start: i64,
    pub end: i64,
}

impl From<&UsageWindow> for NotificationPeriod {
    fn from(window: &UsageWindow) -> Self {
        Self {
            start: window.start_millis(),
            end: window.end_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationContext {
    pub id: String,
    pub name: String,
    pub limit: i64,
    pub usage: i64,
    pub period: NotificationPeriod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTemplate {
    pub id: TemplateKind,
    pub organization: OrganizationContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub key: NotificationKey,
    pub email: String,
    pub template: NotificationTemplate,
}

impl NotificationRequest {
    pub fn for_organization(
        kind: TemplateKind,
        organization_id: &str,
        entry: &OrganizationCacheEntry,
        window: &UsageWindow,
    ) -> Self {
        let period = NotificationPeriod::from(window);
        let key = NotificationKey::derive(kind, organization_id, period, entry.operations.quota);

        Self {
            key,
            email: entry.org_email.clone(),
            template: NotificationTemplate {
                id: kind,
                organization: OrganizationContext {
                    id: organization_id.to_string(),
                    name: entry.org_name.clone(),
                    limit: entry.operations.quota,
                    usage: entry.operations.current,
                    period,
                },
            },
        }
    }

    pub fn kind(&self) -> TemplateKind {
        self.template.id
    }

    pub fn organization_id(&self) -> &str {
        &self.template.organization.id
    }
}
