//! Unified error types for the hourmeter core library.
//!
//! The engine itself never fails: ticks, acknowledgments and input updates
//! are infallible. Errors only arise at the edges, when loading
//! configuration, resolving external signal names, or talking to the
//! persisted store.
//!
//! # Example
//!
//! ```rust
//! use hourmeter_core::error::{HourmeterError, Result};
//!
//! fn check_interval(ms: u64) -> Result<()> {
//!     if ms == 0 {
//!         return Err(HourmeterError::ConfigValidationError(
//!             "engine.tick_interval_ms: must be greater than 0".into(),
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The unified error type for all hourmeter operations.
#[derive(Debug, Error)]
pub enum HourmeterError {
    // =========================================================================
    // SIGNAL RESOLUTION ERRORS
    // =========================================================================
    /// A timer name did not match any known timer.
    #[error("Unknown timer: '{0}'. Expected one of 'machine', 'spindle', 'running'.")]
    UnknownTimer(String),

    /// An alarm name did not match any alarm-bearing timer.
    #[error("Unknown alarm: '{0}'. Expected one of 'machine', 'spindle'.")]
    UnknownAlarm(String),

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration sources could not be read or deserialized.
    #[error("Failed to parse configuration: {0}")]
    ConfigParseError(String),

    /// The configuration was parsed but contains invalid values.
    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // =========================================================================
    // PERSISTENCE & I/O ERRORS
    // =========================================================================
    /// An error occurred while persisting or reading counters.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// The persisted state could not be encoded or decoded.
    #[error("State encoding error: {0}")]
    StateEncoding(#[from] serde_json::Error),

    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A specialized [`Result`] type for hourmeter operations.
pub type Result<T> = std::result::Result<T, HourmeterError>;

/// Short alias for [`HourmeterError`].
pub type Error = HourmeterError;

impl HourmeterError {
    /// Returns `true` if this error came from resolving a signal name.
    #[inline]
    #[must_use]
    pub const fn is_lookup_error(&self) -> bool {
        matches!(self, Self::UnknownTimer(_) | Self::UnknownAlarm(_))
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigParseError(_) | Self::ConfigValidationError(_)
        )
    }

    /// Returns `true` if this error is related to I/O or persistence.
    #[inline]
    #[must_use]
    pub const fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::PersistenceError(_) | Self::StateEncoding(_) | Self::IoError(_)
        )
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::UnknownTimer(_) | Self::UnknownAlarm(_) => 404,
            Self::ConfigParseError(_) | Self::ConfigValidationError(_) => 422,
            Self::PersistenceError(_) | Self::StateEncoding(_) | Self::IoError(_) => 500,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTimer(_) => "UNKNOWN_TIMER",
            Self::UnknownAlarm(_) => "UNKNOWN_ALARM",
            Self::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            Self::ConfigValidationError(_) => "CONFIG_VALIDATION_ERROR",
            Self::PersistenceError(_) => "PERSISTENCE_ERROR",
            Self::StateEncoding(_) => "STATE_ENCODING_ERROR",
            Self::IoError(_) => "IO_ERROR",
        }
    }
}

impl From<::config::ConfigError> for HourmeterError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::ConfigParseError(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
