//! Vehicle image inference API client
//!
//! Posts one image as base64 JSON and decodes the `{success, data, error}`
//! envelope into a verified [`InferredVehicle`].

use crate::error::IntakeError;
use crate::models::{FileCandidate, InferenceEnvelope, InferredVehicle};
use crate::services::image_decoder::DataUriDecoder;
use crate::types::InferenceService;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("carlot-intake/", env!("CARGO_PKG_VERSION"));
const SERVICE: &str = "inference";

/// Inference client errors
#[derive(Debug, Error)]
pub enum InferenceClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Invalid API token")]
    Unauthorized,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<InferenceClientError> for IntakeError {
    fn from(e: InferenceClientError) -> Self {
        match e {
            InferenceClientError::ParseError(message) => IntakeError::MalformedResponse {
                service: SERVICE,
                message,
            },
            other => IntakeError::Collaborator {
                service: SERVICE,
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InferenceRequest<'a> {
    image: String,
    mime_type: String,
    file_name: &'a str,
}

/// HTTP inference client
pub struct HttpInferenceClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpInferenceClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceClientError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one image and decode the envelope
    pub async fn analyze(&self, image: &FileCandidate) -> Result<InferredVehicle, IntakeError> {
        let body = InferenceRequest {
            image: general_purpose::STANDARD.encode(image.data()),
            mime_type: DataUriDecoder::detect_mime(image),
            file_name: image.name(),
        };

        tracing::debug!(
            file = %image.name(),
            bytes = image.size_bytes(),
            endpoint = %self.endpoint,
            "Requesting vehicle inference"
        );

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InferenceClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(InferenceClientError::Unauthorized.into());
        }

        let text = response
            .text()
            .await
            .map_err(|e| InferenceClientError::NetworkError(e.to_string()))?;

        let parsed = InferenceEnvelope::parse(&text);
        if !status.is_success() {
            // A failure status only surfaces the body's own message, never its payload
            return Err(match parsed {
                Ok(InferenceEnvelope {
                    success: false,
                    error: Some(message),
                    ..
                }) => IntakeError::Collaborator {
                    service: SERVICE,
                    message,
                },
                _ => InferenceClientError::ApiError(status.as_u16(), text).into(),
            });
        }

        let vehicle = parsed?.into_vehicle()?;
        tracing::info!(
            make = %vehicle.make,
            model = %vehicle.model,
            year = vehicle.year,
            confidence = vehicle.confidence,
            "Vehicle inference successful"
        );
        Ok(vehicle)
    }
}

#[async_trait::async_trait]
impl InferenceService for HttpInferenceClient {
    async fn infer(&self, image: &FileCandidate) -> Result<InferredVehicle, IntakeError> {
        self.analyze(image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpInferenceClient::new(
            "http://localhost:3000/api/analyze-car",
            None,
            Duration::from_secs(30),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_error_mapping() {
        let err: IntakeError = InferenceClientError::ParseError("eof".to_string()).into();
        assert!(matches!(err, IntakeError::MalformedResponse { service: "inference", .. }));

        let err: IntakeError = InferenceClientError::Unauthorized.into();
        assert_eq!(err.to_string(), "Invalid API token");
        assert!(!err.is_client_side());
    }

    #[test]
    fn test_request_wire_shape() {
        let body = InferenceRequest {
            image: "AQID".to_string(),
            mime_type: "image/png".to_string(),
            file_name: "car.png",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mimeType"], "image/png");
        assert_eq!(json["fileName"], "car.png");
    }
}
