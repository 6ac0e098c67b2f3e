//! Error types for Trailcast

use thiserror::Error;

/// Main error type for Trailcast
#[derive(Error, Debug)]
pub enum TrailcastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather provider errors (transport, status, payload)
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// No configured zone has this key
    #[error("Unknown zone '{key}'")]
    UnknownZone { key: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl TrailcastError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unknown_zone<S: Into<String>>(key: S) -> Self {
        Self::UnknownZone { key: key.into() }
    }

    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TrailcastError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            TrailcastError::Api { .. } => {
                "Weather data is unavailable right now. Please try again later.".to_string()
            }
            TrailcastError::Validation { message } => format!("Invalid input: {message}"),
            TrailcastError::UnknownZone { key } => format!("No zone named '{key}'"),
            TrailcastError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            TrailcastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            TrailcastError::General { message } => message.clone(),
        }
    }
}
