//! Error types for the ripple simulation
//!
//! Only initialization and loading can fail. Once the frame loop is running
//! every simulation pass is defined for all field states, so nothing inside
//! the steady-state loop returns an error.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the simulation core
#[derive(Debug, Error)]
pub enum RippleError {
    /// A configuration value cannot produce a valid simulation
    ///
    /// Reported once at construction, never per frame.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required asset could not be fetched or decoded
    #[error("failed to load asset '{name}': {reason}")]
    AssetLoad {
        /// Asset name as registered with the loader
        name: String,
        /// Human-readable failure reason
        reason: String,
    },

    /// An asset fetch did not complete before the loader timeout
    #[error("asset '{name}' did not load within {timeout:?}")]
    AssetTimeout {
        /// First asset still pending when the timeout expired
        name: String,
        /// Configured timeout
        timeout: Duration,
    },

    /// GPU adapter, device or allocation failure
    #[error("GPU error: {0}")]
    Gpu(String),

    /// A field upload did not match the grid size
    #[error("field has {actual} texels, expected {expected}")]
    FieldSize {
        /// Texel count required by the grid resolution
        expected: usize,
        /// Texel count supplied
        actual: usize,
    },

    /// A state transition was requested from the wrong state
    #[error("invalid state transition: {0}")]
    InvalidState(&'static str),
}

/// Result alias used throughout the crate
pub type RippleResult<T> = Result<T, RippleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_error_names_asset() {
        let err = RippleError::AssetLoad {
            name: "tiles.jpg".to_string(),
            reason: "not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("tiles.jpg"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn test_field_size_message() {
        let err = RippleError::FieldSize {
            expected: 16,
            actual: 4,
        };
        assert_eq!(err.to_string(), "field has 4 texels, expected 16");
    }
}
