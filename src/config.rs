use serde::Deserialize;

use crate::scan::backend::BackendMode;

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub backend: BackendMode,
    pub vision_api_url: String,
    pub nutrition_api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub scan: ScanConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let scan = ScanConfig {
            backend: std::env::var("SCAN_BACKEND")
                .unwrap_or_else(|_| "simulated".into())
                .parse()?,
            vision_api_url: std::env::var("VISION_API_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            nutrition_api_url: std::env::var("NUTRITION_API_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            timeout_secs: std::env::var("SCAN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        };
        Ok(Self { database_url, scan })
    }
}
