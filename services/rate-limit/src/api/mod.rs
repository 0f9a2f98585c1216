use std::sync::Arc;

pub mod handlers;
pub mod router;
pub mod types;

pub use handlers::*;
pub use router::create_router;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::RateLimitConfig;
use crate::limiter::RateLimiter;

pub struct ApiState {
    pub limiter: RateLimiter,
    pub config: Arc<RateLimitConfig>,
    pub metrics: Option<PrometheusHandle>,
}

impl ApiState {
    pub fn new(limiter: RateLimiter, config: RateLimitConfig) -> Self {
        Self {
            limiter,
            config: Arc::new(config),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
