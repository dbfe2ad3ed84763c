use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request counters by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "total": 12,
    "pending": 2,
    "approved": 8,
    "denied": 2
}))]
pub struct RequestStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub denied: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "2025-07-10T09:30:00Z", format = "date-time", value_type = String)]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
