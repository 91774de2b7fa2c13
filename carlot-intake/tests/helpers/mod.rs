//! Test Helper Utilities
//!
//! Shared utilities for testing carlot-intake

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

// Re-export commonly used items
pub use fixtures::{camry, candidate, fill_valid_form, png_candidate, TEST_YEAR};
pub use mocks::{
    Harness, LatencyDecoder, MockInference, MockRecords, RecordingNavigator, RecordingNotifier,
};
