use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::request::{NotificationPeriod, TemplateKind};

/// Deduplication key handed to the email service.
///
/// The key is a SHA-256 digest over, in order: the template kind, the length-prefixed
/// organization id, the period start and end (epoch milliseconds, big endian) and the
/// limit (big endian). The hex digest is prefixed with the template kind. The limit is
/// part of the key so that changing an organization's limit within a month allows a
/// fresh notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationKey(String);

impl NotificationKey {
    pub fn derive(
        kind: TemplateKind,
        organization: &str,
        period: NotificationPeriod,
        limit: i64,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update((organization.len() as u64).to_be_bytes());
        hasher.update(organization.as_bytes());
        hasher.update(period.start.to_be_bytes());
        hasher.update(period.end.to_be_bytes());
        hasher.update(limit.to_be_bytes());

        Self(format!("{}:{:x}", kind.as_str(), hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
