//! Field and whole-record validation for the intake form
//!
//! Fields are held as display strings while editing; this is the only place
//! they are coerced to numbers.
//!
//! # Rules
//! - make, model, color, fuel type, transmission, body type: non-empty after trim
//! - year: integer, 1900 ≤ year ≤ current year + 1
//! - price: finite number
//! - mileage: non-negative integer
//! - seats: optional, non-negative integer when present
//! - description: at least 10 characters as typed, whitespace included
//!
//! # Example
//! ```rust,ignore
//! let validator = FormValidator::new();
//! match validator.validate(&form) {
//!     Ok(record) => submit(record),
//!     Err(errors) => show_inline(errors.get(VehicleField::Year)),
//! }
//! ```

use crate::models::{FormState, NormalizedVehicle, VehicleField};
use chrono::Datelike;
use serde::Serialize;

/// Oldest model year accepted
pub const MIN_YEAR: i32 = 1900;

/// Minimum description length, in characters
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Inline error attached to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: VehicleField,
    pub message: String,
}

/// All field errors of one validation pass, in field order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message for one field, if it failed
    pub fn get(&self, field: VehicleField) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Record a failed check and fall back to an empty value
    fn collect<T: Default>(&mut self, field: VehicleField, checked: Result<T, String>) -> T {
        checked.unwrap_or_else(|message| {
            self.errors.push(FieldError { field, message });
            T::default()
        })
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Form validator
///
/// The upper year bound moves with the calendar, so the current year is
/// captured at construction.
#[derive(Debug, Clone, Copy)]
pub struct FormValidator {
    current_year: i32,
}

impl Default for FormValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl FormValidator {
    pub fn new() -> Self {
        Self {
            current_year: chrono::Local::now().year(),
        }
    }

    /// Validator pinned to a given calendar year
    pub fn with_current_year(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn max_year(&self) -> i32 {
        self.current_year + 1
    }

    /// Check one field (on-blur use)
    ///
    /// Returns the inline message, or `None` when the field is acceptable.
    /// Status and featured are typed and always valid.
    pub fn validate_field(&self, form: &FormState, field: VehicleField) -> Option<String> {
        match field {
            VehicleField::Make
            | VehicleField::Model
            | VehicleField::Color
            | VehicleField::FuelType
            | VehicleField::Transmission
            | VehicleField::BodyType => required_text(&form.get(field), field).err(),
            VehicleField::Year => self.parse_year(&form.year).err(),
            VehicleField::Price => parse_price(&form.price).err(),
            VehicleField::Mileage => parse_mileage(&form.mileage).err(),
            VehicleField::Seats => parse_seats(&form.seats).err(),
            VehicleField::Description => check_description(&form.description).err(),
            VehicleField::Status | VehicleField::Featured => None,
        }
    }

    /// Whole-record validation
    ///
    /// Every field is checked; all failures are returned together.
    pub fn validate(&self, form: &FormState) -> Result<NormalizedVehicle, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let e = &mut errors;

        let make = e.collect(VehicleField::Make, required_text(&form.make, VehicleField::Make));
        let model = e.collect(VehicleField::Model, required_text(&form.model, VehicleField::Model));
        let year = e.collect(VehicleField::Year, self.parse_year(&form.year));
        let price = e.collect(VehicleField::Price, parse_price(&form.price));
        let mileage = e.collect(VehicleField::Mileage, parse_mileage(&form.mileage));
        let color = e.collect(VehicleField::Color, required_text(&form.color, VehicleField::Color));
        let fuel_type = e.collect(
            VehicleField::FuelType,
            required_text(&form.fuel_type, VehicleField::FuelType),
        );
        let transmission = e.collect(
            VehicleField::Transmission,
            required_text(&form.transmission, VehicleField::Transmission),
        );
        let body_type = e.collect(
            VehicleField::BodyType,
            required_text(&form.body_type, VehicleField::BodyType),
        );
        let seats = e.collect(VehicleField::Seats, parse_seats(&form.seats));
        let description = e.collect(VehicleField::Description, check_description(&form.description));

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NormalizedVehicle {
            make,
            model,
            year,
            price,
            mileage,
            color,
            fuel_type,
            transmission,
            body_type,
            seats,
            description,
            status: form.status,
            featured: form.featured,
        })
    }

    fn parse_year(&self, raw: &str) -> Result<i32, String> {
        let year: i32 = raw
            .trim()
            .parse()
            .map_err(|_| "Valid year required".to_string())?;
        if year < MIN_YEAR || year > self.max_year() {
            return Err("Valid year required".to_string());
        }
        Ok(year)
    }
}

fn field_label(field: VehicleField) -> &'static str {
    match field {
        VehicleField::Make => "Make",
        VehicleField::Model => "Model",
        VehicleField::Color => "Color",
        VehicleField::FuelType => "Fuel type",
        VehicleField::Transmission => "Transmission",
        VehicleField::BodyType => "Body type",
        VehicleField::Price => "Price",
        VehicleField::Mileage => "Mileage",
        _ => "Field",
    }
}

fn required_text(raw: &str, field: VehicleField) -> Result<String, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(format!("{} is required", field_label(field)));
    }
    Ok(value.to_string())
}

fn parse_price(raw: &str) -> Result<f64, String> {
    let value = required_text(raw, VehicleField::Price)?;
    value
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| "Valid price required".to_string())
}

fn parse_mileage(raw: &str) -> Result<u64, String> {
    let value = required_text(raw, VehicleField::Mileage)?;
    value
        .parse::<u64>()
        .map_err(|_| "Valid mileage required".to_string())
}

fn parse_seats(raw: &str) -> Result<Option<u32>, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<u32>()
        .map(Some)
        .map_err(|_| "Valid seat count required".to_string())
}

fn check_description(raw: &str) -> Result<String, String> {
    if raw.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(format!(
            "Description must be at least {} characters",
            MIN_DESCRIPTION_CHARS
        ));
    }
    Ok(raw.to_string())
}
