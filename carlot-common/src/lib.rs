//! # Carlot Common Library
//!
//! Shared code for the Carlot inventory tools including:
//! - Error types
//! - Event types (CarlotEvent enum) and the EventBus
//! - TOML configuration loading and write-back

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
