use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::DispatchError;
use super::request::NotificationRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    pub job: String,
}

/// Enqueues notification requests.
///
/// Implementations must not deliver twice for the same [`NotificationRequest::key`];
/// the refresh cycle relies on this and schedules every limited organization again on
/// every cycle.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn schedule(&self, request: &NotificationRequest) -> Result<JobReference, DispatchError>;
}

/// Schedules notifications through the email service's HTTP API.
pub struct HttpEmailDispatcher {
    http_client: Client,
    base_url: String,
}

impl HttpEmailDispatcher {
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
impl NotificationDispatcher for HttpEmailDispatcher {
    #[instrument(
        skip(self, request),
        fields(key = %request.key, organization = %request.organization_id())
    )]
    async fn schedule(&self, request: &NotificationRequest) -> Result<JobReference, DispatchError> {
        let url = format!("{}/schedule", self.base_url);
        let response = self.http_client.post(&url).json(request).send().await?;
        let status = response.status();

        if status.is_success() {
            let job: JobReference = response
                .json()
                .await
                .map_err(|err| DispatchError::InvalidResponse(err.to_string()))?;
            debug!(job = %job.job, "scheduled notification");
            Ok(job)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_string());
            Err(DispatchError::Rejected { status, message })
        }
    }
}
