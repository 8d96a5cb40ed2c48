//! Squeeze Common - shared plumbing for the squeeze screening tools.
//!
//! This crate provides:
//! - Configuration types and modular loading
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod config_loader;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{Config, DataConfig, ObservabilityConfig};
pub use error::{Error, Result, ResultExt};
pub use validation::{Validate, ValidationError, ValidationResult, Violations};
