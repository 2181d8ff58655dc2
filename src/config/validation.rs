//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and enumerated options
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::HostConfig;

/// Compatibility modes understood by the dev server.
pub const COMPATIBILITY_MODES: &[&str] = &["none", "auto", "min", "max", "always", "esm"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a host configuration, collecting every problem found.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.base_path.trim().is_empty() {
        errors.push(ValidationError::new("base_path", "must not be empty"));
    }

    if !COMPATIBILITY_MODES.contains(&config.esm.compatibility.as_str()) {
        errors.push(ValidationError::new(
            "esm.compatibility",
            format!(
                "unknown mode '{}', expected one of {}",
                config.esm.compatibility,
                COMPATIBILITY_MODES.join(", ")
            ),
        ));
    }

    for ext in &config.esm.file_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            errors.push(ValidationError::new(
                "esm.file_extensions",
                format!("'{ext}' must start with a dot"),
            ));
        }
    }

    if config.dev_server.command.trim().is_empty() {
        errors.push(ValidationError::new("dev_server.command", "must not be empty"));
    }

    if config.dev_server.hostname.trim().is_empty() {
        errors.push(ValidationError::new("dev_server.hostname", "must not be empty"));
    }

    if config.dev_server.poll_base_delay_ms == 0 {
        errors.push(ValidationError::new("dev_server.poll_base_delay_ms", "must be > 0"));
    }

    if config.dev_server.poll_max_delay_ms < config.dev_server.poll_base_delay_ms {
        errors.push(ValidationError::new(
            "dev_server.poll_max_delay_ms",
            "must be >= poll_base_delay_ms",
        ));
    }

    if let Some(template) = &config.snapshot.path_template {
        if !template.contains("{suite}") {
            errors.push(ValidationError::new(
                "snapshot.path_template",
                "must contain the {suite} placeholder",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
