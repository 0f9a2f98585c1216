use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitDecision {
    pub current: i64,
    pub quota: i64,
    pub limited: bool,
}

impl RateLimitDecision {
    /// Returned for anything the cache cannot resolve. Callers must not enforce it.
    pub const UNKNOWN: RateLimitDecision = RateLimitDecision {
        current: -1,
        quota: -1,
        limited: false,
    };

    /// A quota of zero means unlimited.
    pub fn evaluate(current: i64, quota: i64) -> Self {
        Self {
            current,
            quota,
            limited: quota > 0 && current > quota,
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Organization,
    Target,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Organization => "organization",
            EntityKind::Target => "target",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only operations reporting is tracked; every other kind answers with the unknown decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitKind {
    #[serde(rename = "operations-reporting")]
    OperationsReporting,
    #[serde(other)]
    Unsupported,
}
