//! Record-creation request and response

use crate::models::{EncodedImage, NormalizedVehicle};
use serde::{Deserialize, Serialize};

/// Payload for the record service: `{ "carData": {...}, "images": [...] }`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub car_data: NormalizedVehicle,
    pub images: Vec<EncodedImage>,
}

/// Record service acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAck {
    pub success: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a submission that reached the record service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub success: bool,
    /// Human-readable reason when `success` is false
    pub message: Option<String>,
}

impl SubmissionOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VehicleStatus;

    #[test]
    fn test_request_wire_shape() {
        let request = CreateVehicleRequest {
            car_data: NormalizedVehicle {
                make: "Toyota".to_string(),
                model: "Camry".to_string(),
                year: 2022,
                price: 27500.0,
                mileage: 12000,
                color: "Silver".to_string(),
                fuel_type: "Hybrid".to_string(),
                transmission: "Automatic".to_string(),
                body_type: "Sedan".to_string(),
                seats: None,
                description: "Well kept hybrid sedan".to_string(),
                status: VehicleStatus::Available,
                featured: false,
            },
            images: vec![EncodedImage::from_data_uri("data:image/png;base64,AAAA")],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["carData"]["fuelType"], "Hybrid");
        assert_eq!(json["carData"]["status"], "AVAILABLE");
        assert!(json["carData"].get("seats").is_none());
        assert_eq!(json["images"][0], "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_ack_tolerates_missing_optionals() {
        let ack: CreateAck = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(ack.success);
        assert!(ack.id.is_none());
    }
}
