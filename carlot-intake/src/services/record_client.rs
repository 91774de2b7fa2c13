//! Vehicle record creation API client

use crate::error::IntakeError;
use crate::models::{CreateAck, CreateVehicleRequest};
use crate::types::RecordService;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("carlot-intake/", env!("CARGO_PKG_VERSION"));
const SERVICE: &str = "records";

/// Record client errors
#[derive(Debug, Error)]
pub enum RecordClientError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Invalid API token")]
    Unauthorized,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<RecordClientError> for IntakeError {
    fn from(e: RecordClientError) -> Self {
        match e {
            RecordClientError::ParseError(message) => IntakeError::MalformedResponse {
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

/// HTTP record-creation client
pub struct HttpRecordClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpRecordClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RecordClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RecordClientError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_token,
        })
    }

    pub async fn create_vehicle(
        &self,
        request: &CreateVehicleRequest,
    ) -> Result<CreateAck, RecordClientError> {
        tracing::debug!(
            make = %request.car_data.make,
            model = %request.car_data.model,
            images = request.images.len(),
            "Creating vehicle record"
        );

        let mut builder = self.http_client.post(&self.endpoint).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RecordClientError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RecordClientError::Unauthorized);
        }

        let text = response
            .text()
            .await
            .map_err(|e| RecordClientError::NetworkError(e.to_string()))?;

        let parsed = serde_json::from_str::<CreateAck>(&text);
        if !status.is_success() {
            // Only a rejection envelope is trusted on a failure status
            return match parsed {
                Ok(ack) if !ack.success => Ok(ack),
                _ => Err(RecordClientError::ApiError(status.as_u16(), text)),
            };
        }

        parsed.map_err(|e| RecordClientError::ParseError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RecordService for HttpRecordClient {
    async fn create(&self, request: &CreateVehicleRequest) -> Result<CreateAck, IntakeError> {
        Ok(self.create_vehicle(request).await?)
    }
}
