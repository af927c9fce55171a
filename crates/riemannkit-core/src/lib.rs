//! Manifold interface, numerics and statistics for Riemannian geometry.
//!
//! This crate provides the [`Manifold`](manifold::Manifold) capability trait
//! and the generic algorithms written against it. Concrete manifolds live in
//! `riemannkit-manifolds`.
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy shared by every operation
//! - [`types`]: Scalar trait and nalgebra aliases
//! - [`manifold`]: The manifold capability trait
//! - [`numerical`]: Matrix logarithm, normality test, real/complex
//!   embeddings, epsilon bookkeeping and the Fréchet derivative of `expm`
//! - [`geometry`]: Metric manifolds, Christoffel symbols and curvature
//! - [`statistics`]: Fréchet means, medians and variances
//! - `conformance` (feature `test-utils`): Contract checks for manifold
//!   implementations

pub mod core;
pub mod geometry;
pub mod numerical;
pub mod statistics;
pub mod utils;

pub use crate::core::{error, manifold, types};

#[cfg(any(test, feature = "test-utils"))]
pub use utils::{conformance, test_manifolds};

// Re-export commonly used items at the crate root
pub use error::{ErrorKind, ManifoldError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use riemannkit_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{ErrorKind, ManifoldError, Result};
    pub use crate::geometry::{
        DefaultMetric, FiniteDifference, GeodesicSolver, Metric, MetricManifold,
    };
    pub use crate::manifold::{Manifold, Point, TangentVector};
    pub use crate::numerical::{
        complexify, eigen_safe, expm, expm_frechet, expm_frechet_with_buffer, is_normal,
        log_safe, realify, PadeBuffer, Tensor3, Tensor4,
    };
    pub use crate::statistics::{
        mean, mean_and_std, mean_and_var, mean_from, median, median_from, var, var_about,
        ConvergenceTolerance, CyclicProximalPointEstimation, GeodesicInterpolation,
        GeodesicInterpolationWithinRadius, GradientDescentEstimation, MeanEstimator,
        MedianEstimator, WeightKind, Weights, WeiszfeldEstimation,
    };
    pub use crate::types::{DMatrix, DVector, SMatrix, SVector, Scalar};
}
