use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScanError;

use super::dto::NutritionProfile;

pub const NUTRITION_PATH: &str = "/api/nutrition-data";

const DATA_SOURCE: &str = "usda";
const DEFAULT_PORTION: &str = "100g";
const DEFAULT_WEIGHT_GRAMS: f64 = 100.0;

#[derive(Debug, Serialize)]
struct NutritionRequest<'a> {
    #[serde(rename = "foodName")]
    food_name: &'a str,
    #[serde(rename = "dataSource")]
    data_source: &'a str,
}

/// Wire shape of the nutrition endpoint. Every numeric field is optional
/// on the wire; normalization happens in `lookup`.
#[derive(Debug, Deserialize)]
struct NutritionResponse {
    #[serde(default)]
    calories: f64,
    #[serde(default)]
    protein: f64,
    #[serde(default)]
    carbs: f64,
    #[serde(default)]
    fat: f64,
    fiber: Option<f64>,
    sugar: Option<f64>,
    sodium: Option<f64>,
    portion_size: Option<String>,
    weight_grams: Option<f64>,
}

/// Single-shot wrapper around the nutrition-database endpoint.
#[derive(Debug, Clone)]
pub struct NutritionClient {
    http: reqwest::Client,
    base_url: String,
}

impl NutritionClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Look up macros for an identified food name, normalized to a
    /// reference portion.
    pub async fn lookup(&self, food_name: &str) -> Result<NutritionProfile, ScanError> {
        let url = format!("{}{}", self.base_url, NUTRITION_PATH);
        let response = self
            .http
            .post(&url)
            .json(&NutritionRequest {
                food_name,
                data_source: DATA_SOURCE,
            })
            .send()
            .await
            .map_err(ScanError::from_transport)?;

        if !response.status().is_success() {
            return Err(ScanError::Analysis(format!(
                "nutrition service returned {}",
                response.status()
            )));
        }

        let body: NutritionResponse = response
            .json()
            .await
            .map_err(|e| ScanError::Analysis(format!("malformed nutrition response: {e}")))?;

        let profile = NutritionProfile {
            calories: body.calories,
            protein: body.protein,
            carbs: body.carbs,
            fat: body.fat,
            fiber: body.fiber.unwrap_or(0.0),
            sugar: body.sugar.unwrap_or(0.0),
            sodium: body.sodium.unwrap_or(0.0),
            portion_size: body
                .portion_size
                .unwrap_or_else(|| DEFAULT_PORTION.to_string()),
            weight_grams: body.weight_grams.unwrap_or(DEFAULT_WEIGHT_GRAMS),
        };
        debug!(%food_name, calories = profile.calories, "nutrition looked up");
        Ok(profile)
    }
}
