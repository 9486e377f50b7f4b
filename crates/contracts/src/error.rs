//! Layered error definitions
//!
//! Categorized by source: config / source / sync / record

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum PipelineError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Source Errors =====
    /// Camera source error (open/start/stream)
    #[error("source error for '{serial}': {message}")]
    Source { serial: String, message: String },

    // ===== Recording Errors =====
    /// Recorder write error
    #[error("recorder '{recorder}' error: {message}")]
    Record { recorder: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create camera source error
    pub fn source(serial: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            serial: serial.into(),
            message: message.into(),
        }
    }

    /// Create recorder error
    pub fn record(recorder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Record {
            recorder: recorder.into(),
            message: message.into(),
        }
    }
}
