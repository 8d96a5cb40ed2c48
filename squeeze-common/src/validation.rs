//! Configuration validation.
//!
//! Every configuration section implements [`Validate`]. Sections collect all
//! violations through a [`Violations`] accumulator so a caller sees the full
//! list in one pass instead of fixing fields one at a time.

use thiserror::Error;

use crate::config::{Config, ObservabilityConfig};

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {value} (must be greater than 0)")]
    NonPositive { field: String, value: f64 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration conflict: {reason}")]
    Conflict { reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Flatten into the individual violations.
    pub fn violations(&self) -> Vec<&ValidationError> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(|e| e.violations()).collect(),
            other => vec![other],
        }
    }

    /// Field names touched by this error (conflicts carry none).
    pub fn fields(&self) -> Vec<&str> {
        self.violations()
            .into_iter()
            .filter_map(|e| match e {
                Self::NonPositive { field, .. } | Self::InvalidValue { field, .. } => {
                    Some(field.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

/// Accumulates violations across a configuration section.
#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<ValidationError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an arbitrary violation.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Merge the outcome of a nested section.
    pub fn merge(&mut self, result: ValidationResult<()>) {
        if let Err(e) = result {
            match e {
                ValidationError::Multiple(inner) => self.errors.extend(inner),
                other => self.errors.push(other),
            }
        }
    }

    /// Require a count (cap, target, limit) to be at least 1.
    pub fn positive_count(&mut self, field: &str, value: usize) {
        if value == 0 {
            self.errors.push(ValidationError::NonPositive {
                field: field.into(),
                value: 0.0,
            });
        }
    }

    /// Require a finite amount strictly greater than zero.
    pub fn positive_amount(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.errors.push(ValidationError::NonPositive {
                field: field.into(),
                value,
            });
        }
    }

    /// Require a finite threshold that is zero or greater.
    pub fn non_negative(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value < 0.0 {
            self.errors.push(ValidationError::InvalidValue {
                field: field.into(),
                reason: format!("{} must be a finite number >= 0", value),
            });
        }
    }

    /// Require a fraction in `(0, 1]`.
    pub fn fraction(&mut self, field: &str, value: f64) {
        if !value.is_finite() || value <= 0.0 || value > 1.0 {
            self.errors.push(ValidationError::InvalidValue {
                field: field.into(),
                reason: format!("{} must be in (0, 1]", value),
            });
        }
    }

    /// Require a finite number (any sign).
    pub fn finite(&mut self, field: &str, value: f64) {
        if !value.is_finite() {
            self.errors.push(ValidationError::InvalidValue {
                field: field.into(),
                reason: "must be a finite number".into(),
            });
        }
    }

    /// Finish: none, one bare error, or `Multiple`.
    pub fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            v.push(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            v.push(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        v.finish()
    }
}

impl Validate for Config {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.merge(self.observability.validate());

        if let Some(path) = &self.data.universe_path {
            if path.trim().is_empty() {
                v.push(ValidationError::InvalidValue {
                    field: "data.universe_path".into(),
                    reason: "must not be blank when set".into(),
                });
            }
        }

        v.finish()
    }
}
