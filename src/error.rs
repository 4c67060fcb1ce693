//! Error types for the feature extraction engine
//!
//! Numeric degeneracy (silence, too-short buffers, flat autocorrelation) is
//! not an error: every analysis function answers it with a typed default.
//! `AnalysisError` is reserved for contract violations by the caller.

use std::fmt;

/// Errors that can occur during audio analysis
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters (empty channel list, zero sample rate, bad FFT size)
    InvalidInput(String),

    /// Numerical error (non-finite samples, overflow)
    NumericalError(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}
