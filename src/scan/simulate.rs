use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use crate::error::ScanError;

use super::backend::{BackendMode, FoodAnalysisBackend, ScanProgress, ScanStage};
use super::dto::{
    FoodIdentification, IdentificationDetails, NutritionProfile, RawCapture, ScanResult,
};

struct Fixture {
    name: &'static str,
    confidence: f64,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    fiber: f64,
    sugar: f64,
    sodium: f64,
    portion_size: &'static str,
    weight_grams: f64,
    preparation_method: Option<&'static str>,
}

/// Synthetic catalogue of common American foods with USDA-style values.
const FIXTURES: &[Fixture] = &[
    Fixture {
        name: "Grilled Chicken Breast",
        confidence: 0.95,
        calories: 165.0,
        protein: 31.0,
        carbs: 0.0,
        fat: 3.6,
        fiber: 0.0,
        sugar: 0.0,
        sodium: 74.0,
        portion_size: "100g",
        weight_grams: 100.0,
        preparation_method: Some("grilled"),
    },
    Fixture {
        name: "Avocado Toast",
        confidence: 0.89,
        calories: 234.0,
        protein: 6.0,
        carbs: 16.0,
        fat: 18.0,
        fiber: 7.0,
        sugar: 2.0,
        sodium: 156.0,
        portion_size: "1 slice",
        weight_grams: 85.0,
        preparation_method: Some("toasted"),
    },
    Fixture {
        name: "Greek Yogurt Bowl",
        confidence: 0.92,
        calories: 150.0,
        protein: 20.0,
        carbs: 8.0,
        fat: 4.0,
        fiber: 0.0,
        sugar: 6.0,
        sodium: 65.0,
        portion_size: "1 cup",
        weight_grams: 170.0,
        preparation_method: None,
    },
    Fixture {
        name: "Caesar Salad",
        confidence: 0.85,
        calories: 187.0,
        protein: 7.0,
        carbs: 8.0,
        fat: 15.0,
        fiber: 3.0,
        sugar: 3.0,
        sodium: 470.0,
        portion_size: "1 serving",
        weight_grams: 120.0,
        preparation_method: None,
    },
    Fixture {
        name: "Hamburger",
        confidence: 0.93,
        calories: 540.0,
        protein: 25.0,
        carbs: 40.0,
        fat: 31.0,
        fiber: 3.0,
        sugar: 4.0,
        sodium: 1040.0,
        portion_size: "1 burger",
        weight_grams: 150.0,
        preparation_method: Some("grilled"),
    },
    Fixture {
        name: "Banana",
        confidence: 0.97,
        calories: 89.0,
        protein: 1.1,
        carbs: 23.0,
        fat: 0.3,
        fiber: 2.6,
        sugar: 12.0,
        sodium: 1.0,
        portion_size: "1 medium",
        weight_grams: 100.0,
        preparation_method: None,
    },
    Fixture {
        name: "Salmon Fillet",
        confidence: 0.91,
        calories: 208.0,
        protein: 22.0,
        carbs: 0.0,
        fat: 12.0,
        fiber: 0.0,
        sugar: 0.0,
        sodium: 59.0,
        portion_size: "100g",
        weight_grams: 100.0,
        preparation_method: Some("baked"),
    },
    Fixture {
        name: "Pizza Slice",
        confidence: 0.88,
        calories: 285.0,
        protein: 12.0,
        carbs: 36.0,
        fat: 10.0,
        fiber: 2.0,
        sugar: 4.0,
        sodium: 640.0,
        portion_size: "1 slice",
        weight_grams: 107.0,
        preparation_method: Some("baked"),
    },
    Fixture {
        name: "Apple",
        confidence: 0.96,
        calories: 52.0,
        protein: 0.3,
        carbs: 14.0,
        fat: 0.2,
        fiber: 2.4,
        sugar: 10.0,
        sodium: 1.0,
        portion_size: "1 medium",
        weight_grams: 100.0,
        preparation_method: None,
    },
    Fixture {
        name: "Protein Smoothie",
        confidence: 0.82,
        calories: 320.0,
        protein: 25.0,
        carbs: 35.0,
        fat: 8.0,
        fiber: 4.0,
        sugar: 28.0,
        sodium: 180.0,
        portion_size: "1 cup",
        weight_grams: 240.0,
        preparation_method: Some("blended"),
    },
];

/// Deterministic stand-in for the two remote services. Lets the whole
/// pipeline run offline while producing results the presentation layer
/// cannot tell apart from the live path.
pub struct SimulatedBackend;

impl SimulatedBackend {
    /// Stable per-input seed: the same capture always maps to the same
    /// fixture and jitter.
    fn seed(capture: &RawCapture) -> u64 {
        capture
            .bytes
            .iter()
            .fold(capture.len() as u64, |acc, b| {
                acc.wrapping_mul(31).wrapping_add(*b as u64)
            })
    }
}

#[async_trait]
impl FoodAnalysisBackend for SimulatedBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Simulated
    }

    async fn analyze(
        &self,
        capture: &RawCapture,
        progress: &ScanProgress,
    ) -> Result<ScanResult, ScanError> {
        progress.enter(ScanStage::Simulating);

        let seed = Self::seed(capture);
        let fixture = &FIXTURES[(seed % FIXTURES.len() as u64) as usize];

        let mut rng = StdRng::seed_from_u64(seed);
        let jitter: f64 = rng.gen_range(-0.05..=0.05);
        let confidence = (fixture.confidence + jitter).clamp(0.6, 1.0);

        debug!(food = fixture.name, confidence, "simulated identification");

        let identification = FoodIdentification {
            food_name: fixture.name.to_string(),
            confidence,
            details: Some(IdentificationDetails {
                estimated_portion: Some(fixture.portion_size.to_string()),
                preparation_method: fixture.preparation_method.map(str::to_string),
                additional_items: None,
            }),
        };
        let nutrition = NutritionProfile {
            calories: fixture.calories,
            protein: fixture.protein,
            carbs: fixture.carbs,
            fat: fixture.fat,
            fiber: fixture.fiber,
            sugar: fixture.sugar,
            sodium: fixture.sodium,
            portion_size: fixture.portion_size.to_string(),
            weight_grams: fixture.weight_grams,
        };
        Ok(ScanResult::merge(identification, nutrition))
    }
}
