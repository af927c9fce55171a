//! Core manifold trait and associated types.
//!
//! This module defines the capability set every concrete manifold exposes to
//! the generic algorithms of this crate: the statistical estimators, the
//! metric-manifold machinery and the conformance harness.
//!
//! # Mathematical Background
//!
//! A Riemannian manifold (M, g) consists of:
//! - A smooth manifold M
//! - A Riemannian metric g that assigns an inner product to each tangent space
//!
//! Key concepts:
//! - **Tangent space**: T_p M is the linear approximation of M at point p
//! - **Exponential map**: exp_p: T_p M → M follows the geodesic with initial velocity X
//! - **Logarithmic map**: log_p: M → T_p M, the (local) inverse of exp_p
//! - **Retraction**: A smooth map R_p: T_p M → M that approximates the exponential map
//! - **Parallel transport**: Moving vectors along curves while preserving angles

use crate::{
    error::{ManifoldError, Result},
    types::Scalar,
};
use nalgebra::{allocator::Allocator, Const, DefaultAllocator, Dim, OVector};
use num_traits::Float;
use rand::RngCore;
use std::fmt::Debug;

/// Type alias for manifold points.
pub type Point<T, D> = OVector<T, D>;
/// Type alias for tangent vectors.
pub type TangentVector<T, D> = OVector<T, D>;

/// Trait for Riemannian manifolds.
///
/// Points and tangent vectors are represented as vectors of length
/// [`representation_size`](Manifold::representation_size). A manifold owns no
/// mutable state: it is constructed once and only queried afterwards.
///
/// Only the primitives are required; everything else has a default in terms of
/// them:
///
/// | required | defaulted |
/// |----------|-----------|
/// | `exp`, `log`, `inner_product` | `norm`, `distance`, `exp_scaled` |
/// | `is_point_on_manifold`, `is_vector_in_tangent_space` | `check_point`, `check_vector` |
/// | `project_tangent` | `parallel_transport` (by projection) |
/// | `random_point`, `random_tangent` | `retract`, `inverse_retract` (exp / log) |
///
/// # Type Parameters
///
/// - `T`: The scalar type (f32 or f64)
/// - `D`: The dimension type of the representation
///
/// # Example
///
/// ```rust,ignore
/// use riemannkit_core::prelude::*;
///
/// /// Unit sphere S^{n-1} = {x ∈ ℝⁿ : ||x|| = 1}
/// impl<T: Scalar> Manifold<T, Dyn> for Sphere {
///     fn exp(&self, p: &DVector<T>, v: &DVector<T>) -> Result<DVector<T>> {
///         let n = v.norm();
///         Ok(p * n.cos() + v * (n.sin() / n))
///     }
///     // ...
/// }
/// ```
pub trait Manifold<T, D>: Debug + Send + Sync
where
    T: Scalar,
    D: Dim,
    DefaultAllocator: Allocator<D>,
{
    /// Returns a human-readable name for the manifold.
    fn name(&self) -> &str;

    /// Returns the intrinsic dimension of the manifold.
    ///
    /// For example, the sphere S^{n-1} embedded in R^n has dimension n-1.
    fn dimension(&self) -> usize;

    /// Returns the length of the vectors representing points and tangent vectors.
    fn representation_size(&self) -> usize;

    /// Checks if a point lies on the manifold within a given tolerance.
    fn is_point_on_manifold(&self, point: &Point<T, D>, tol: T) -> bool;

    /// Checks if a vector is in the tangent space at a given point.
    fn is_vector_in_tangent_space(
        &self,
        point: &Point<T, D>,
        vector: &TangentVector<T, D>,
        tol: T,
    ) -> bool;

    /// Returns an `InvalidPoint` error if `point` is not on the manifold.
    fn check_point(&self, point: &Point<T, D>) -> Result<()> {
        if point.len() != self.representation_size() {
            return Err(ManifoldError::dimension_mismatch(
                self.representation_size(),
                point.len(),
            ));
        }
        if !self.is_point_on_manifold(point, T::MANIFOLD_TOLERANCE) {
            return Err(ManifoldError::invalid_point(format!(
                "point rejected by {}",
                self.name()
            )));
        }
        Ok(())
    }

    /// Returns an `InvalidTangent` error if `vector` is not tangent at `point`.
    fn check_vector(&self, point: &Point<T, D>, vector: &TangentVector<T, D>) -> Result<()> {
        if vector.len() != self.representation_size() {
            return Err(ManifoldError::dimension_mismatch(
                self.representation_size(),
                vector.len(),
            ));
        }
        if !self.is_vector_in_tangent_space(point, vector, T::ORTHOGONALITY_TOLERANCE) {
            return Err(ManifoldError::invalid_tangent(format!(
                "vector rejected by {}",
                self.name()
            )));
        }
        Ok(())
    }

    /// Returns the zero vector of the tangent space at `point`.
    fn zero_tangent_vector(&self, point: &Point<T, D>) -> TangentVector<T, D> {
        TangentVector::<T, D>::zeros_generic(point.shape_generic().0, Const::<1>)
    }

    /// Projects an ambient vector onto the tangent space at `point`.
    fn project_tangent(
        &self,
        point: &Point<T, D>,
        vector: &TangentVector<T, D>,
    ) -> Result<TangentVector<T, D>>;

    /// Computes the Riemannian inner product ⟨u,v⟩_p.
    fn inner_product(
        &self,
        point: &Point<T, D>,
        u: &TangentVector<T, D>,
        v: &TangentVector<T, D>,
    ) -> Result<T>;

    /// Computes the norm of a tangent vector, sqrt(⟨v,v⟩_p).
    fn norm(&self, point: &Point<T, D>, vector: &TangentVector<T, D>) -> Result<T> {
        self.inner_product(point, vector, vector)
            .map(|ip| <T as Float>::sqrt(<T as Float>::max(ip, T::zero())))
    }

    /// Exponential map exp_p(v).
    fn exp(&self, point: &Point<T, D>, tangent: &TangentVector<T, D>) -> Result<Point<T, D>>;

    /// Exponential map along a scaled vector, exp_p(t·v).
    fn exp_scaled(
        &self,
        point: &Point<T, D>,
        tangent: &TangentVector<T, D>,
        t: T,
    ) -> Result<Point<T, D>> {
        self.exp(point, &(tangent * t))
    }

    /// Logarithmic map log_p(q).
    fn log(&self, point: &Point<T, D>, other: &Point<T, D>) -> Result<TangentVector<T, D>>;

    /// Geodesic distance d(p, q).
    ///
    /// Uses the norm of the logarithmic map by default.
    fn distance(&self, x: &Point<T, D>, y: &Point<T, D>) -> Result<T> {
        let log = self.log(x, y)?;
        self.norm(x, &log)
    }

    /// Retraction R_p(v). Defaults to the exponential map.
    fn retract(&self, point: &Point<T, D>, tangent: &TangentVector<T, D>) -> Result<Point<T, D>> {
        self.exp(point, tangent)
    }

    /// Inverse retraction. Defaults to the logarithmic map.
    fn inverse_retract(
        &self,
        point: &Point<T, D>,
        other: &Point<T, D>,
    ) -> Result<TangentVector<T, D>> {
        self.log(point, other)
    }

    /// Transports `vector` from the tangent space at `from` to the one at `to`.
    ///
    /// The default implementation uses vector transport by projection,
    /// which is not an isometry in general.
    fn parallel_transport(
        &self,
        _from: &Point<T, D>,
        to: &Point<T, D>,
        vector: &TangentVector<T, D>,
    ) -> Result<TangentVector<T, D>> {
        self.project_tangent(to, vector)
    }

    /// Returns an orthonormal basis of the tangent space at `point`.
    fn orthonormal_basis(&self, _point: &Point<T, D>) -> Result<Vec<TangentVector<T, D>>> {
        Err(ManifoldError::not_implemented(format!(
            "orthonormal_basis for {}",
            self.name()
        )))
    }

    /// Lowers the index of a tangent vector (X ↦ X♭).
    ///
    /// Covectors share the tangent-vector representation; for embedded
    /// manifolds with the induced metric this is the identity.
    fn flat(&self, _point: &Point<T, D>, vector: &TangentVector<T, D>) -> Result<TangentVector<T, D>> {
        Ok(vector.clone())
    }

    /// Raises the index of a covector (ξ ↦ ξ♯), inverse of [`flat`](Manifold::flat).
    fn sharp(&self, _point: &Point<T, D>, covector: &TangentVector<T, D>) -> Result<TangentVector<T, D>> {
        Ok(covector.clone())
    }

    /// Generates a random point on the manifold.
    fn random_point(&self, rng: &mut dyn RngCore) -> Point<T, D>;

    /// Generates a random tangent vector at a given point.
    fn random_tangent(
        &self,
        point: &Point<T, D>,
        rng: &mut dyn RngCore,
    ) -> Result<TangentVector<T, D>>;

    /// Approximate equality of two points in their representation:
    /// `‖p − q‖ ≤ max(atol, rtol·max(‖p‖, ‖q‖))`.
    fn is_approx_point(&self, p: &Point<T, D>, q: &Point<T, D>, atol: T, rtol: T) -> bool {
        let scale = <T as Float>::max(p.norm(), q.norm());
        (p - q).norm() <= <T as Float>::max(atol, rtol * scale)
    }

    /// Approximate equality of two tangent vectors at `point`.
    fn is_approx_vector(
        &self,
        _point: &Point<T, D>,
        u: &TangentVector<T, D>,
        v: &TangentVector<T, D>,
        atol: T,
        rtol: T,
    ) -> bool {
        let scale = <T as Float>::max(u.norm(), v.norm());
        (u - v).norm() <= <T as Float>::max(atol, rtol * scale)
    }

    /// Checks if the manifold is flat (zero curvature).
    fn is_flat(&self) -> bool {
        false
    }
}
