pub mod builder;
pub mod cache;
pub mod decision;
pub mod scheduler;
pub mod service;
pub mod snapshot;
pub mod window;

pub use builder::{BuildOutput, SnapshotBuilder};
pub use cache::RateLimitCache;
pub use decision::{EntityKind, LimitKind, RateLimitDecision};
pub use scheduler::{CycleOutcome, RefreshScheduler, RefreshSettings, SchedulerState};
pub use service::RateLimiter;
pub use snapshot::{OrganizationCacheEntry, OwnershipRecord, Snapshot};
pub use window::UsageWindow;

pub type TargetId = String;
pub type OrganizationId = String;

/// Retention reported for targets that are not part of the current snapshot.
pub const DEFAULT_RETENTION_DAYS: u32 = 30;
