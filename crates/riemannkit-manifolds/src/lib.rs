//! RiemannKit Manifolds - Concrete manifolds and chart metrics.
//!
//! This crate provides the manifolds the generic algorithms of
//! `riemannkit-core` are exercised against:
//!
//! - [`Euclidean`]: R^n, flat, with exact exp/log/transport
//! - [`Sphere`]: the unit sphere S^{n-1} with its closed-form geometry
//! - [`metrics`]: the canonical metric plus two metrics defined on a
//!   two-dimensional chart (hyperbolic half-plane and round sphere in
//!   spherical coordinates) that go through the metric-tensor machinery

pub mod euclidean;
pub mod metrics;
pub mod sphere;

// Re-export main manifolds for convenience
pub use euclidean::Euclidean;
pub use metrics::{EuclideanMetric, PoincareHalfPlaneMetric, SphericalCoordinatesMetric};
pub use sphere::Sphere;
