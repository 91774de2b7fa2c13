//! Test fixtures: vehicles, files and form contents

use carlot_intake::models::{FileCandidate, InferredVehicle, VehicleField};
use carlot_intake::workflow::IntakeSession;

/// Calendar year the validators are pinned to
pub const TEST_YEAR: i32 = 2026;

/// The inference answer used across scenarios
pub fn camry() -> InferredVehicle {
    InferredVehicle {
        make: "Toyota".to_string(),
        model: "Camry".to_string(),
        year: 2022,
        color: "Silver".to_string(),
        body_type: "Sedan".to_string(),
        fuel_type: "Hybrid".to_string(),
        price: 27500.0,
        mileage: 12000,
        transmission: "Automatic".to_string(),
        description: "Well kept hybrid sedan, one owner".to_string(),
        confidence: 0.87,
    }
}

/// Candidate of `size` zero bytes declared as PNG
pub fn candidate(name: &str, size: usize) -> FileCandidate {
    FileCandidate::new(name, "image/png", vec![0u8; size])
}

/// Candidate with a real PNG signature
pub fn png_candidate(name: &str) -> FileCandidate {
    let mut png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0u8; 24]);
    FileCandidate::new(name, "image/png", png)
}

/// Fill every required field with a valid value
pub fn fill_valid_form(session: &mut IntakeSession) {
    let values = [
        (VehicleField::Make, "Honda"),
        (VehicleField::Model, "Civic"),
        (VehicleField::Year, "2020"),
        (VehicleField::Price, "18500"),
        (VehicleField::Mileage, "42000"),
        (VehicleField::Color, "Blue"),
        (VehicleField::FuelType, "Petrol"),
        (VehicleField::Transmission, "Manual"),
        (VehicleField::BodyType, "Hatchback"),
        (VehicleField::Description, "Clean title, new tyres"),
    ];
    for (field, value) in values {
        session.set_field(field, value).unwrap();
    }
}
