//! Metrics to attach to the manifolds of this crate.
//!
//! [`EuclideanMetric`] is the metric [`Euclidean`] and [`Sphere`] implement
//! natively; attaching it with
//! [`MetricManifold::with_default_metric`](riemannkit_core::geometry::MetricManifold::with_default_metric)
//! makes every operation delegate to the closed forms.
//!
//! The other two metrics live on a two-dimensional coordinate chart (a
//! [`Euclidean`] space of dimension 2) and drive the generic,
//! metric-tensor-based machinery: Christoffel symbols, curvature and the
//! geodesic ODE.
//!
//! # Example
//!
//! ```rust,ignore
//! use riemannkit_core::geometry::{GeodesicSolver, MetricManifold};
//! use riemannkit_manifolds::{Euclidean, PoincareHalfPlaneMetric};
//!
//! let chart = Euclidean::new(2)?;
//! let hyperbolic = MetricManifold::new(chart, PoincareHalfPlaneMetric)
//!     .with_geodesic_solver(GeodesicSolver::default());
//! let k = hyperbolic.gaussian_curvature(&DVector::from_vec(vec![0.0, 1.0]))?;
//! assert!((k + 1.0).abs() < 1e-5);
//! ```

use crate::{euclidean::Euclidean, sphere::Sphere};
use num_traits::Float;
use riemannkit_core::{
    error::{ManifoldError, Result},
    geometry::{DefaultMetric, Metric},
    types::{DMatrix, DVector, Scalar},
};

/// The canonical (flat, or embedded) metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EuclideanMetric;

impl<T: Scalar> Metric<T, Euclidean> for EuclideanMetric {
    fn name(&self) -> &str {
        "Euclidean"
    }

    fn local_metric(&self, manifold: &Euclidean, point: &DVector<T>) -> Result<DMatrix<T>> {
        if point.len() != manifold.dim() {
            return Err(ManifoldError::dimension_mismatch(manifold.dim(), point.len()));
        }
        Ok(DMatrix::identity(point.len(), point.len()))
    }
}

impl DefaultMetric<Euclidean> for EuclideanMetric {}

/// The sphere is embedded, so no single chart covers it and `local_metric`
/// stays unimplemented; the metric is only usable as the default.
impl<T: Scalar> Metric<T, Sphere> for EuclideanMetric {
    fn name(&self) -> &str {
        "Euclidean"
    }
}

impl DefaultMetric<Sphere> for EuclideanMetric {}

fn check_chart<T: Scalar>(manifold: &Euclidean, point: &DVector<T>) -> Result<()> {
    if manifold.dim() != 2 {
        return Err(ManifoldError::domain_error(format!(
            "chart metric needs a 2-dimensional chart, got dimension {}",
            manifold.dim()
        )));
    }
    if point.len() != 2 {
        return Err(ManifoldError::dimension_mismatch(2, point.len()));
    }
    Ok(())
}

/// Hyperbolic metric on the upper half-plane, `g = I / y²` at `(x, y)`.
///
/// Gaussian curvature −1. Geodesics are vertical lines and half-circles
/// centred on the real axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoincareHalfPlaneMetric;

impl<T: Scalar> Metric<T, Euclidean> for PoincareHalfPlaneMetric {
    fn name(&self) -> &str {
        "PoincareHalfPlane"
    }

    /// # Errors
    ///
    /// `DomainError` outside the upper half-plane (`y <= 0`).
    fn local_metric(&self, manifold: &Euclidean, point: &DVector<T>) -> Result<DMatrix<T>> {
        check_chart(manifold, point)?;
        let y = point[1];
        if y <= T::zero() {
            return Err(ManifoldError::domain_error(format!(
                "half-plane metric requires y > 0, got y = {y}"
            )));
        }
        Ok(DMatrix::identity(2, 2) / (y * y))
    }
}

/// Round unit-sphere metric in spherical coordinates `(θ, φ)`,
/// `g = diag(1, sin²θ)`.
///
/// Gaussian curvature +1. The chart degenerates at the poles (`sin θ = 0`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SphericalCoordinatesMetric;

impl SphericalCoordinatesMetric {
    /// Maps chart coordinates `(θ, φ)` to the embedded unit vector.
    pub fn embed<T: Scalar>(&self, point: &DVector<T>) -> Result<DVector<T>> {
        if point.len() != 2 {
            return Err(ManifoldError::dimension_mismatch(2, point.len()));
        }
        let (theta, phi) = (point[0], point[1]);
        let s = <T as Float>::sin(theta);
        Ok(DVector::from_vec(vec![
            s * <T as Float>::cos(phi),
            s * <T as Float>::sin(phi),
            <T as Float>::cos(theta),
        ]))
    }
}

impl<T: Scalar> Metric<T, Euclidean> for SphericalCoordinatesMetric {
    fn name(&self) -> &str {
        "SphericalCoordinates"
    }

    /// # Errors
    ///
    /// `DomainError` at the poles, where the metric is singular.
    fn local_metric(&self, manifold: &Euclidean, point: &DVector<T>) -> Result<DMatrix<T>> {
        check_chart(manifold, point)?;
        let s = <T as Float>::sin(point[0]);
        if <T as Float>::abs(s) <= T::EPSILON {
            return Err(ManifoldError::domain_error(
                "spherical coordinates are singular at the poles",
            ));
        }
        Ok(DMatrix::from_diagonal(&DVector::from_vec(vec![T::one(), s * s])))
    }
}
