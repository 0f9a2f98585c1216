use std::collections::HashMap;

use async_trait::async_trait;

use crate::limiter::{OwnershipRecord, TargetId, UsageWindow};

pub mod error;
pub mod usage;

pub use error::SourceFetchError;
pub use usage::HttpUsageEstimator;

/// Read access to the organization/target/limit records.
#[async_trait]
pub trait OwnershipStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<OwnershipRecord>, SourceFetchError>;
}

/// Per-target operation counts for a billing window. Targets without usage may be absent.
#[async_trait]
pub trait UsageSource: Send + Sync {
    async fn estimate(&self, window: &UsageWindow)
        -> Result<HashMap<TargetId, i64>, SourceFetchError>;
}
