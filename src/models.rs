use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub score: i32,
    pub response_count: i64,
}

#[derive(Debug, Clone)]
pub struct DistributionSnapshot {
    pub version: String,
    pub buckets: Vec<ScoreBucket>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl DistributionSnapshot {
    pub fn total_responses(&self) -> i64 {
        self.buckets.iter().map(|b| b.response_count).sum()
    }
}

#[derive(Debug, Clone)]
pub struct SurveyResult {
    pub results_token: Uuid,
    pub email: String,
    pub version: String,
    pub score: i32,
    pub completed_at: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct PercentileSummary {
    pub version: String,
    pub score: i32,
    pub percentile: Option<u8>,
    pub total_responses: i64,
    pub refreshed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
