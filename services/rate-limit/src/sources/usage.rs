use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::limiter::{TargetId, UsageWindow};

use super::{SourceFetchError, UsageSource};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateRequest {
    start_time: String,
    end_time: String,
}

/// Client for the usage estimator's operations estimate.
pub struct HttpUsageEstimator {
    http_client: Client,
    base_url: String,
}

impl HttpUsageEstimator {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent("edge-rate-limit/0.1.0")
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UsageSource for HttpUsageEstimator {
    #[instrument(skip(self, window), fields(start = %window.start, end = %window.end))]
    async fn estimate(
        &self,
        window: &UsageWindow,
    ) -> Result<HashMap<TargetId, i64>, SourceFetchError> {
        let url = format!("{}/estimate-operations", self.base_url);
        let payload = EstimateRequest {
            start_time: window.start_rfc3339(),
            end_time: window.end_rfc3339(),
        };

        let response = self.http_client.post(&url).json(&payload).send().await?;
        let status = response.status();

        if status.is_success() {
            let operations: HashMap<TargetId, i64> = response
                .json()
                .await
                .map_err(|err| SourceFetchError::InvalidResponse(err.to_string()))?;
            debug!(targets = operations.len(), "fetched usage estimate");
            Ok(operations)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_string());
            Err(SourceFetchError::UsageRejected { status, message })
        }
    }
}
