use bytes::Bytes;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Below this confidence the UI shows an "uncertain" warning.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// An in-memory image as produced by a camera frame grab or a file upload.
/// Owned exclusively by whoever produced it until handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct RawCapture {
    pub bytes: Bytes,
    pub content_type: String,
}

impl RawCapture {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// What the vision service saw in the photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodIdentification {
    #[serde(rename = "foodName")]
    pub food_name: String,
    /// In [0, 1]; close to 1.0 means high certainty.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<IdentificationDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentificationDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_portion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<Vec<String>>,
}

/// Macro values normalized to a reference portion. Missing numerics are
/// already defaulted to 0 and the portion label to "100g" by the lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionProfile {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
    pub portion_size: String,
    pub weight_grams: f64,
}

/// A secondary candidate identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodCandidate {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// The flat record the presentation layer consumes: identification merged
/// with nutrition. Immutable once produced; replaced wholesale by the next
/// scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub analysis_id: Uuid,
    pub name: String,
    pub confidence: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_grams: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<FoodCandidate>>,
    #[serde(with = "time::serde::rfc3339")]
    pub scanned_at: OffsetDateTime,
}

impl ScanResult {
    /// Merge an identification with its nutrition lookup. Both the live
    /// path and the simulation build results through here, so the two
    /// paths cannot diverge in shape.
    pub fn merge(identification: FoodIdentification, nutrition: NutritionProfile) -> Self {
        Self {
            analysis_id: Uuid::new_v4(),
            name: identification.food_name,
            confidence: identification.confidence,
            calories: nutrition.calories,
            protein: nutrition.protein,
            carbs: nutrition.carbs,
            fat: nutrition.fat,
            fiber: Some(nutrition.fiber),
            sugar: Some(nutrition.sugar),
            sodium: Some(nutrition.sodium),
            portion_size: Some(nutrition.portion_size),
            weight_grams: Some(nutrition.weight_grams),
            alternatives: None,
            scanned_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_confident(&self) -> bool {
        self.confidence >= LOW_CONFIDENCE_THRESHOLD
    }
}
