//! Vehicle form state
//!
//! The form holds every value as the operator sees it. Numeric-looking fields
//! (year, price, mileage, seats) stay display strings while editing, so a
//! half-typed value is never an error until submission.

use crate::error::IntakeError;
use crate::models::InferredVehicle;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fuel type options offered by the form
pub const FUEL_TYPES: &[&str] = &["Petrol", "Diesel", "Electric", "Hybrid", "Plug-in Hybrid"];

/// Transmission options offered by the form
pub const TRANSMISSIONS: &[&str] = &["Automatic", "Manual", "Semi-Automatic"];

/// Body type options offered by the form
pub const BODY_TYPES: &[&str] = &[
    "SUV",
    "Sedan",
    "Hatchback",
    "Convertible",
    "Coupe",
    "Wagon",
    "Pickup",
];

/// Listing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    #[default]
    Available,
    Unavailable,
    Sold,
}

impl VehicleStatus {
    pub const ALL: [VehicleStatus; 3] = [
        VehicleStatus::Available,
        VehicleStatus::Unavailable,
        VehicleStatus::Sold,
    ];

    /// Wire value ("AVAILABLE")
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::Unavailable => "UNAVAILABLE",
            VehicleStatus::Sold => "SOLD",
        }
    }

    /// Display label ("Available")
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::Unavailable => "Unavailable",
            VehicleStatus::Sold => "Sold",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(VehicleStatus::Available),
            "UNAVAILABLE" => Ok(VehicleStatus::Unavailable),
            "SOLD" => Ok(VehicleStatus::Sold),
            _ => Err(()),
        }
    }
}

/// Addressable form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VehicleField {
    Make,
    Model,
    Year,
    Price,
    Mileage,
    Color,
    FuelType,
    Transmission,
    BodyType,
    Seats,
    Description,
    Status,
    Featured,
}

impl VehicleField {
    pub const ALL: [VehicleField; 13] = [
        VehicleField::Make,
        VehicleField::Model,
        VehicleField::Year,
        VehicleField::Price,
        VehicleField::Mileage,
        VehicleField::Color,
        VehicleField::FuelType,
        VehicleField::Transmission,
        VehicleField::BodyType,
        VehicleField::Seats,
        VehicleField::Description,
        VehicleField::Status,
        VehicleField::Featured,
    ];

    /// Key used on the wire and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            VehicleField::Make => "make",
            VehicleField::Model => "model",
            VehicleField::Year => "year",
            VehicleField::Price => "price",
            VehicleField::Mileage => "mileage",
            VehicleField::Color => "color",
            VehicleField::FuelType => "fuelType",
            VehicleField::Transmission => "transmission",
            VehicleField::BodyType => "bodyType",
            VehicleField::Seats => "seats",
            VehicleField::Description => "description",
            VehicleField::Status => "status",
            VehicleField::Featured => "featured",
        }
    }
}

impl std::fmt::Display for VehicleField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for VehicleField {
    type Err = IntakeError;

    /// Accepts `fuelType`, `fuel_type` and `fuel-type` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        VehicleField::ALL
            .into_iter()
            .find(|field| field.key().to_ascii_lowercase() == wanted)
            .ok_or_else(|| {
                IntakeError::Common(carlot_common::Error::InvalidInput(format!(
                    "Unknown field: {}",
                    s
                )))
            })
    }
}

/// Canonical record being edited
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub make: String,
    pub model: String,
    pub year: String,
    pub price: String,
    pub mileage: String,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    /// Empty means "not provided"
    pub seats: String,
    pub description: String,
    pub status: VehicleStatus,
    pub featured: bool,
}

impl FormState {
    /// Empty defaults: blank text, status Available, not featured
    pub fn new() -> Self {
        Self::default()
    }

    /// Display value of a field
    pub fn get(&self, field: VehicleField) -> String {
        match field {
            VehicleField::Status => self.status.as_str().to_string(),
            VehicleField::Featured => self.featured.to_string(),
            text => self.text(text).map(str::to_string).unwrap_or_default(),
        }
    }

    fn text(&self, field: VehicleField) -> Option<&str> {
        let value = match field {
            VehicleField::Make => &self.make,
            VehicleField::Model => &self.model,
            VehicleField::Year => &self.year,
            VehicleField::Price => &self.price,
            VehicleField::Mileage => &self.mileage,
            VehicleField::Color => &self.color,
            VehicleField::FuelType => &self.fuel_type,
            VehicleField::Transmission => &self.transmission,
            VehicleField::BodyType => &self.body_type,
            VehicleField::Seats => &self.seats,
            VehicleField::Description => &self.description,
            VehicleField::Status | VehicleField::Featured => return None,
        };
        Some(value.as_str())
    }

    /// Store an operator edit
    ///
    /// Text fields accept anything. Status and featured must parse.
    pub fn set(&mut self, field: VehicleField, value: &str) -> Result<(), IntakeError> {
        let invalid = || IntakeError::InvalidFieldValue {
            field,
            value: value.to_string(),
        };

        match field {
            VehicleField::Status => {
                self.status = value.parse().map_err(|_| invalid())?;
            }
            VehicleField::Featured => {
                self.featured = match value.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" | "on" => true,
                    "false" | "no" | "0" | "off" => false,
                    _ => return Err(invalid()),
                };
            }
            VehicleField::Make => self.make = value.to_string(),
            VehicleField::Model => self.model = value.to_string(),
            VehicleField::Year => self.year = value.to_string(),
            VehicleField::Price => self.price = value.to_string(),
            VehicleField::Mileage => self.mileage = value.to_string(),
            VehicleField::Color => self.color = value.to_string(),
            VehicleField::FuelType => self.fuel_type = value.to_string(),
            VehicleField::Transmission => self.transmission = value.to_string(),
            VehicleField::BodyType => self.body_type = value.to_string(),
            VehicleField::Seats => self.seats = value.to_string(),
            VehicleField::Description => self.description = value.to_string(),
        }

        Ok(())
    }

    /// Overwrite every field the inference service maps
    ///
    /// Seats, status and featured are not produced by inference and keep
    /// their current values.
    pub fn prefill(&mut self, inferred: &InferredVehicle) {
        self.make = inferred.make.clone();
        self.model = inferred.model.clone();
        self.year = inferred.year.to_string();
        self.color = inferred.color.clone();
        self.body_type = inferred.body_type.clone();
        self.fuel_type = inferred.fuel_type.clone();
        self.price = inferred.price.to_string();
        self.mileage = inferred.mileage.to_string();
        self.transmission = inferred.transmission.clone();
        self.description = inferred.description.clone();
    }
}

/// Record with numeric coercions applied, as sent to the record service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: u64,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    pub description: String,
    pub status: VehicleStatus,
    pub featured: bool,
}
