//! Error types shared by every fallible operation in this crate.

use thiserror::Error;

/// Errors produced by the algebra, rotation and geodesy routines.
///
/// Iterative inversions (ECEF to geodetic, Mercator to geodetic) never produce an error for
/// finite input; they return their best estimate once their iteration cap is reached.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Operand shapes are incompatible (vector length or matrix shape).
    #[error("dimension mismatch in {operation}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// The operation that rejected its operands.
        operation: &'static str,
        /// The dimension the operation required.
        expected: usize,
        /// The dimension it was given.
        found: usize,
    },

    /// The input is mathematically undefined for the operation.
    #[error("domain error: {0}")]
    Domain(String),
}

impl Error {
    pub(crate) fn dimension_mismatch(operation: &'static str, expected: usize, found: usize) -> Self {
        Error::DimensionMismatch {
            operation,
            expected,
            found,
        }
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Error::Domain(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
