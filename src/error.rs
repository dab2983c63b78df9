//! Error types and handling for the `nearby` application

use thiserror::Error;

/// Main error type for the `nearby` application
#[derive(Error, Debug)]
pub enum NearbyError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport failures and non-success HTTP statuses from Overpass
    #[error("Network error: {message}")]
    Network { message: String },

    /// Response bodies that are not valid Overpass JSON
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// The location provider could not produce a search origin
    #[error("Location unavailable: {message}")]
    LocationUnavailable { message: String },

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

impl NearbyError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn location_unavailable<S: Into<String>>(message: S) -> Self {
        Self::LocationUnavailable {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            NearbyError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            NearbyError::Network { .. } => {
                "Unable to reach the Overpass API. Please check your internet connection."
                    .to_string()
            }
            NearbyError::Parse { .. } => {
                "The Overpass API returned an unexpected response.".to_string()
            }
            NearbyError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            NearbyError::LocationUnavailable { .. } => {
                "Could not get current location.".to_string()
            }
            NearbyError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            NearbyError::General { message } => message.clone(),
        }
    }
}

impl From<serde_json::Error> for NearbyError {
    fn from(err: serde_json::Error) -> Self {
        NearbyError::parse(err.to_string())
    }
}
