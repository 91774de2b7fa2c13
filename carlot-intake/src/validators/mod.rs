//! Form validation
//!
//! Submission is gated on [`FormValidator::validate`]; single fields can be
//! checked on blur with [`FormValidator::validate_field`].

pub mod form_validator;

pub use form_validator::{
    FieldError, FormValidator, ValidationErrors, MIN_DESCRIPTION_CHARS, MIN_YEAR,
};
