use serde::Serialize;
use tracing::debug;

use crate::error::ScanError;

use super::dto::FoodIdentification;
use super::encode::EncodedImage;

pub const ANALYZE_PATH: &str = "/api/analyze-food";

/// Instruction payload sent with every image. Pins down the exact output
/// shape and biases recognition toward foods common in the American diet.
const ANALYSIS_PROMPT: &str = r#"Analyze this food image and identify the food items. Return a JSON response with:
{
  "foodName": "primary food item name",
  "confidence": 0.95,
  "details": {
    "estimated_portion": "description",
    "preparation_method": "if visible",
    "additional_items": ["list of other items if multiple"]
  }
}

Be specific about the food type (e.g., "grilled chicken breast" not just "chicken").
Focus on foods common in American diet."#;

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    image: &'a str,
    prompt: &'a str,
}

/// Single-shot wrapper around the food-recognition endpoint. Retry
/// policy, if any, belongs to the caller.
#[derive(Debug, Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    base_url: String,
}

impl VisionClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub async fn identify(&self, image: &EncodedImage) -> Result<FoodIdentification, ScanError> {
        let url = format!("{}{}", self.base_url, ANALYZE_PATH);
        let response = self
            .http
            .post(&url)
            .json(&AnalyzeRequest {
                image: image.as_str(),
                prompt: ANALYSIS_PROMPT,
            })
            .send()
            .await
            .map_err(ScanError::from_transport)?;

        if !response.status().is_success() {
            return Err(ScanError::Analysis(format!(
                "food analysis service returned {}",
                response.status()
            )));
        }

        let identification: FoodIdentification = response
            .json()
            .await
            .map_err(|e| ScanError::Analysis(format!("malformed analysis response: {e}")))?;

        debug!(
            food = %identification.food_name,
            confidence = identification.confidence,
            "food identified"
        );
        Ok(identification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanErrorKind;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn encoded() -> EncodedImage {
        let capture = super::super::dto::RawCapture::new(&b"fake jpeg"[..], "image/jpeg");
        super::super::encode::encode(&capture).await.unwrap()
    }

    #[tokio::test]
    async fn parses_successful_identification() {
        let router = Router::new().route(
            ANALYZE_PATH,
            post(|| async {
                Json(json!({
                    "foodName": "Caesar Salad",
                    "confidence": 0.85,
                    "details": {
                        "estimated_portion": "1 serving",
                        "additional_items": ["croutons"]
                    }
                }))
            }),
        );
        let base = spawn_stub(router).await;

        let client = VisionClient::new(reqwest::Client::new(), &base);
        let identification = client.identify(&encoded().await).await.unwrap();
        assert_eq!(identification.food_name, "Caesar Salad");
        assert_eq!(identification.confidence, 0.85);
        let details = identification.details.unwrap();
        assert_eq!(details.estimated_portion.as_deref(), Some("1 serving"));
    }

    #[tokio::test]
    async fn non_success_status_is_analysis_error() {
        let router = Router::new().route(
            ANALYZE_PATH,
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base = spawn_stub(router).await;

        let client = VisionClient::new(reqwest::Client::new(), &base);
        let err = client.identify(&encoded().await).await.unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::Analysis);
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_analysis_error() {
        let router = Router::new().route(ANALYZE_PATH, post(|| async { "not json" }));
        let base = spawn_stub(router).await;

        let client = VisionClient::new(reqwest::Client::new(), &base);
        let err = client.identify(&encoded().await).await.unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::Analysis);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        // Bind a listener to reserve a port, then drop it so nothing answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = VisionClient::new(reqwest::Client::new(), format!("http://{addr}"));
        let err = client.identify(&encoded().await).await.unwrap_err();
        assert_eq!(err.kind(), ScanErrorKind::Network);
    }
}
