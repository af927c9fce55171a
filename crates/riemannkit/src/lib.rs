//! Riemannian geometry numerics and Fréchet statistics.
//!
//! Re-exports the manifold interface and generic algorithms of
//! [`riemannkit_core`] together with the concrete manifolds of
//! [`riemannkit_manifolds`].
//!
//! # Example
//!
//! ```rust,ignore
//! use riemannkit::prelude::*;
//!
//! let sphere = Sphere::new(3)?;
//! let points = vec![
//!     DVector::from_vec(vec![1.0, 0.0, 0.0]),
//!     DVector::from_vec(vec![0.0, 1.0, 0.0]),
//! ];
//! let y = mean(&sphere, &points, None, &GradientDescentEstimation::new())?;
//! ```

pub use nalgebra;
pub use riemannkit_manifolds as manifolds;

pub use riemannkit_core::{error, geometry, manifold, numerical, statistics, types};
pub use riemannkit_core::{ErrorKind, ManifoldError, Result};
pub use riemannkit_manifolds::{
    Euclidean, EuclideanMetric, PoincareHalfPlaneMetric, Sphere, SphericalCoordinatesMetric,
};

#[cfg(feature = "test-utils")]
pub use riemannkit_core::conformance;

/// Everything from [`riemannkit_core::prelude`] plus the concrete manifolds.
pub mod prelude {
    pub use riemannkit_core::prelude::*;
    pub use riemannkit_manifolds::{
        Euclidean, EuclideanMetric, PoincareHalfPlaneMetric, Sphere, SphericalCoordinatesMetric,
    };
}
