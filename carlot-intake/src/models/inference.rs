//! Structured result of the image-understanding service
//!
//! Responses are decoded and checked before anything reaches the form: a
//! payload with a missing field, a non-integer year or a confidence outside
//! 0.0-1.0 is a malformed response, never a silently coerced value.

use crate::error::IntakeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SERVICE: &str = "inference";

/// Vehicle details extracted from a photo
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InferredVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub body_type: String,
    pub fuel_type: String,
    pub price: f64,
    pub mileage: u64,
    pub transmission: String,
    pub description: String,
    /// Model confidence, 0.0-1.0
    pub confidence: f64,
}

impl InferredVehicle {
    /// Confidence rounded to the nearest whole percent
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }

    /// One-line summary used in the success notice
    pub fn summary(&self) -> String {
        format!(
            "Detected {} {} {} with {}% confidence",
            self.year,
            self.make,
            self.model,
            self.confidence_percent()
        )
    }

    /// Verified decode of the `data` object of an inference response
    pub fn from_json(value: Value) -> Result<Self, IntakeError> {
        let raw: RawInferredVehicle = serde_json::from_value(value).map_err(malformed)?;
        raw.verify()
    }
}

/// Wire envelope: `{ "success": bool, "data": {...}, "error": "..." }`
///
/// Older deployments spell the flag `sucess`; both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceEnvelope {
    #[serde(alias = "sucess")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl InferenceEnvelope {
    /// Decode a raw response body
    pub fn parse(body: &str) -> Result<Self, IntakeError> {
        serde_json::from_str(body).map_err(malformed)
    }

    /// Unwrap into a verified vehicle or the service's own failure
    pub fn into_vehicle(self) -> Result<InferredVehicle, IntakeError> {
        if !self.success {
            return Err(IntakeError::Collaborator {
                service: SERVICE,
                message: self
                    .error
                    .unwrap_or_else(|| "Failed to process car image".to_string()),
            });
        }

        match self.data {
            Some(data) => InferredVehicle::from_json(data),
            None => Err(IntakeError::MalformedResponse {
                service: SERVICE,
                message: "success without data".to_string(),
            }),
        }
    }
}

fn malformed(e: serde_json::Error) -> IntakeError {
    IntakeError::MalformedResponse {
        service: SERVICE,
        message: e.to_string(),
    }
}

/// Numbers arrive either as JSON numbers or numeric strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    fn as_f64(&self) -> Option<f64> {
        let value: Option<f64> = match self {
            Numeric::Int(i) => Some(*i as f64),
            Numeric::Float(f) => Some(*f),
            Numeric::Text(s) => s.trim().parse().ok(),
        };
        value.filter(|v| v.is_finite())
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Int(i) => Some(*i),
            Numeric::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Numeric::Float(_) => None,
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInferredVehicle {
    make: String,
    model: String,
    year: Numeric,
    color: String,
    body_type: String,
    fuel_type: String,
    price: Numeric,
    mileage: Numeric,
    transmission: String,
    description: String,
    confidence: f64,
}

impl RawInferredVehicle {
    fn verify(self) -> Result<InferredVehicle, IntakeError> {
        let field_error = |field: &str, detail: String| IntakeError::MalformedResponse {
            service: SERVICE,
            message: format!("{}: {}", field, detail),
        };

        let year = self
            .year
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| field_error("year", format!("{:?} is not an integer year", self.year)))?;

        let price = self
            .price
            .as_f64()
            .ok_or_else(|| field_error("price", format!("{:?} is not a number", self.price)))?;

        let mileage = self
            .mileage
            .as_i64()
            .and_then(|m| u64::try_from(m).ok())
            .ok_or_else(|| {
                field_error("mileage", format!("{:?} is not a non-negative integer", self.mileage))
            })?;

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(field_error(
                "confidence",
                format!("{} is outside 0.0-1.0", self.confidence),
            ));
        }

        Ok(InferredVehicle {
            make: self.make,
            model: self.model,
            year,
            color: self.color,
            body_type: self.body_type,
            fuel_type: self.fuel_type,
            price,
            mileage,
            transmission: self.transmission,
            description: self.description,
            confidence: self.confidence,
        })
    }
}
