use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScanConfig;
use crate::error::ScanError;

use super::dto::{RawCapture, ScanResult};
use super::encode::encode;
use super::nutrition::NutritionClient;
use super::vision::VisionClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Simulated,
    Live,
}

impl FromStr for BackendMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simulated" => Ok(BackendMode::Simulated),
            "live" => Ok(BackendMode::Live),
            other => anyhow::bail!("unknown scan backend '{other}', expected simulated or live"),
        }
    }
}

/// Where the orchestrator currently is. Exactly one stage at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    #[default]
    Idle,
    Validating,
    Simulating,
    Encoding,
    Recognizing,
    LookingUp,
    Succeeded,
    Failed,
}

/// Shared stage tracker the backend reports into while a scan runs.
#[derive(Debug, Default)]
pub struct ScanProgress {
    stage: Mutex<ScanStage>,
}

impl ScanProgress {
    pub fn enter(&self, stage: ScanStage) {
        debug!(?stage, "scan stage");
        *self.stage.lock().unwrap_or_else(|e| e.into_inner()) = stage;
    }

    pub fn current(&self) -> ScanStage {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The analysis strategy behind the orchestrator. Selected once at
/// startup and injected; the pipeline never consults the environment.
#[async_trait]
pub trait FoodAnalysisBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// Turn a validated capture into a merged scan result, reporting each
    /// stage into `progress`. Implementations never retry internally.
    async fn analyze(
        &self,
        capture: &RawCapture,
        progress: &ScanProgress,
    ) -> Result<ScanResult, ScanError>;
}

/// Real path: encode the image, identify it remotely, look up nutrition.
pub struct LiveBackend {
    vision: VisionClient,
    nutrition: NutritionClient,
}

impl LiveBackend {
    pub fn new(config: &ScanConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            vision: VisionClient::new(http.clone(), &config.vision_api_url),
            nutrition: NutritionClient::new(http, &config.nutrition_api_url),
        })
    }

    pub fn from_clients(vision: VisionClient, nutrition: NutritionClient) -> Self {
        Self { vision, nutrition }
    }
}

#[async_trait]
impl FoodAnalysisBackend for LiveBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    async fn analyze(
        &self,
        capture: &RawCapture,
        progress: &ScanProgress,
    ) -> Result<ScanResult, ScanError> {
        progress.enter(ScanStage::Encoding);
        let encoded = encode(capture).await?;

        progress.enter(ScanStage::Recognizing);
        let identification = self.vision.identify(&encoded).await?;

        progress.enter(ScanStage::LookingUp);
        let nutrition = self.nutrition.lookup(&identification.food_name).await?;

        Ok(ScanResult::merge(identification, nutrition))
    }
}
