use serde::{Deserialize, Serialize};

use crate::limiter::{EntityKind, LimitKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckLimitRequest {
    pub id: String,
    pub entity_type: EntityKind,
    #[serde(rename = "type")]
    pub limit_type: LimitKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRequest {
    pub target_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionResponse {
    pub retention: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub details: Option<serde_json::Value>,
}
