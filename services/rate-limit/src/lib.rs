pub mod api;
pub mod config;
pub mod limiter;
pub mod notification;
pub mod reporter;
pub mod sources;
pub mod storage;
pub mod telemetry;

pub use api::{create_router, ApiState, CheckLimitRequest, ErrorResponse, RetentionRequest};
pub use config::RateLimitConfig;
pub use limiter::{
    CycleOutcome, EntityKind, LimitKind, OwnershipRecord, RateLimitCache, RateLimitDecision,
    RateLimiter, RefreshScheduler, RefreshSettings, SchedulerState, Snapshot, SnapshotBuilder,
    UsageWindow, DEFAULT_RETENTION_DAYS,
};
pub use notification::{
    DispatchError, HttpEmailDispatcher, JobReference, NotificationDispatcher, NotificationKey,
    NotificationRequest, TemplateKind,
};
pub use reporter::{ErrorReporter, TracingReporter};
pub use sources::{HttpUsageEstimator, OwnershipStore, SourceFetchError, UsageSource};
pub use storage::{OwnershipDatabase, StorageError};
