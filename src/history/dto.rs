use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One completed scan as persisted. Optionals mirror the scan result
/// shape so older rows without extended macros still deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScanHistoryEntry {
    pub analysis_id: Uuid,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: Option<f64>,
    pub sugar: Option<f64>,
    pub sodium: Option<f64>,
    pub confidence: f64,
    pub portion_size: Option<String>,
    pub weight_grams: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}
