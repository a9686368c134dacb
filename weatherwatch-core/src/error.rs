//! Error taxonomy for upstream lookups.

use std::fmt;

use thiserror::Error;

/// The upstream endpoint a request was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Geocoding,
    Current,
    Forecast,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Geocoding => "geocoding",
            Endpoint::Current => "current weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WeatherError {
    /// The location string matched nothing upstream.
    #[error("location '{location}' not found")]
    NotFound { location: String },

    /// Non-2xx status, transport failure or timeout.
    #[error("{endpoint} service unavailable: {reason}")]
    ServiceUnavailable { endpoint: Endpoint, reason: String },

    /// The payload was missing fields we rely on.
    #[error("malformed {endpoint} response: {reason}")]
    MalformedResponse { endpoint: Endpoint, reason: String },
}

impl WeatherError {
    pub fn not_found(location: impl Into<String>) -> Self {
        Self::NotFound { location: location.into() }
    }

    pub fn unavailable(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        Self::ServiceUnavailable { endpoint, reason: reason.into() }
    }

    pub fn malformed(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        Self::MalformedResponse { endpoint, reason: reason.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Text shown to the user in the error state.
    ///
    /// Malformed payloads read the same as an unavailable service.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { location } => {
                format!("Location \"{location}\" not found. Check the spelling and try again.")
            }
            Self::ServiceUnavailable { endpoint, .. }
            | Self::MalformedResponse { endpoint, .. } => {
                match endpoint {
                    Endpoint::Forecast => {
                        "Forecast unavailable right now. Please try again later.".to_string()
                    }
                    Endpoint::Current => {
                        "Weather service unavailable. Check your connection and try again."
                            .to_string()
                    }
                    Endpoint::Geocoding => "Location search unavailable.".to_string(),
                }
            }
        }
    }
}
