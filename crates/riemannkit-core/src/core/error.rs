//! Error types for manifold operations and numerical routines.
//!
//! Every fallible operation in the crate reports a [`ManifoldError`]. The
//! coarse [`ErrorKind`] classification is what callers (and the conformance
//! harness) match on when deciding whether a failure is acceptable.

use thiserror::Error;

/// Errors that can occur during manifold operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManifoldError {
    /// Point is not on the manifold.
    #[error("Point is not on the manifold: {reason}")]
    InvalidPoint {
        /// Description of why the point is invalid
        reason: String,
    },

    /// Vector is not in the tangent space.
    #[error("Vector is not in the tangent space: {reason}")]
    InvalidTangent {
        /// Description of why the tangent vector is invalid
        reason: String,
    },

    /// Input violates a mathematical precondition.
    ///
    /// Raised, for instance, when a real matrix logarithm is requested for a
    /// matrix with a non-positive real eigenvalue, or when weights are negative.
    #[error("Domain error: {reason}")]
    DomainError {
        /// Description of the violated precondition
        reason: String,
    },

    /// Dimension mismatch between arrays.
    ///
    /// Detected before any computation starts.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions
        expected: String,
        /// Actual dimensions
        actual: String,
    },

    /// Numerical failure (singular system, non-finite values).
    #[error("Numerical instability detected: {reason}")]
    NumericalError {
        /// Description of the numerical issue
        reason: String,
    },

    /// A required capability was not supplied.
    ///
    /// Generic algorithms report this when the concrete manifold or metric
    /// does not provide the seam they rely on (e.g. `local_metric`).
    #[error("Feature not implemented: {feature}")]
    NotImplemented {
        /// Name of the unimplemented feature
        feature: String,
    },
}

/// Coarse failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorKind {
    /// Mathematical precondition violated (includes invalid points/vectors).
    Domain,
    /// Array or weight lengths do not match.
    DimensionMismatch,
    /// A required seam is missing.
    NotImplemented,
    /// Numerical breakdown.
    Numerical,
}

impl ManifoldError {
    /// Create an InvalidPoint error with a custom reason.
    pub fn invalid_point<S: Into<String>>(reason: S) -> Self {
        Self::InvalidPoint {
            reason: reason.into(),
        }
    }

    /// Create an InvalidTangent error with a custom reason.
    pub fn invalid_tangent<S: Into<String>>(reason: S) -> Self {
        Self::InvalidTangent {
            reason: reason.into(),
        }
    }

    /// Create a DomainError with a custom reason.
    pub fn domain_error<S: Into<String>>(reason: S) -> Self {
        Self::DomainError {
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a NumericalError with a custom reason.
    pub fn numerical_error<S: Into<String>>(reason: S) -> Self {
        Self::NumericalError {
            reason: reason.into(),
        }
    }

    /// Create a NotImplemented error for a specific feature.
    pub fn not_implemented<S: Into<String>>(feature: S) -> Self {
        Self::NotImplemented {
            feature: feature.into(),
        }
    }

    /// Create an error for an invalid algorithm parameter.
    pub fn invalid_parameter<S: Into<String>>(reason: S) -> Self {
        Self::DomainError {
            reason: reason.into(),
        }
    }

    /// Returns the failure category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPoint { .. } | Self::InvalidTangent { .. } | Self::DomainError { .. } => {
                ErrorKind::Domain
            }
            Self::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
            Self::NumericalError { .. } => ErrorKind::Numerical,
        }
    }
}

/// Result type alias for operations that can produce ManifoldError.
pub type Result<T> = std::result::Result<T, ManifoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ManifoldError::invalid_point("determinant is negative");
        assert!(matches!(err, ManifoldError::InvalidPoint { .. }));
        assert_eq!(
            err.to_string(),
            "Point is not on the manifold: determinant is negative"
        );

        let err = ManifoldError::dimension_mismatch("(3, 3)", "(4, 4)");
        assert!(matches!(err, ManifoldError::DimensionMismatch { .. }));
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: expected (3, 3), got (4, 4)"
        );
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            ManifoldError::invalid_point("not unit norm"),
            ManifoldError::invalid_tangent("not orthogonal to point"),
            ManifoldError::domain_error("negative eigenvalue"),
            ManifoldError::dimension_mismatch("square matrix", "rectangular matrix"),
            ManifoldError::numerical_error("eigenvalue computation failed"),
            ManifoldError::not_implemented("parallel transport"),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ManifoldError::invalid_point("x").kind(), ErrorKind::Domain);
        assert_eq!(ManifoldError::invalid_tangent("x").kind(), ErrorKind::Domain);
        assert_eq!(ManifoldError::invalid_parameter("x").kind(), ErrorKind::Domain);
        assert_eq!(
            ManifoldError::dimension_mismatch(1, 2).kind(),
            ErrorKind::DimensionMismatch
        );
        assert_eq!(
            ManifoldError::not_implemented("local_metric").kind(),
            ErrorKind::NotImplemented
        );
        assert_eq!(
            ManifoldError::numerical_error("singular").kind(),
            ErrorKind::Numerical
        );
    }
}
