//! Two reference manifolds with closed-form geometry: flat `Rⁿ` and the unit
//! sphere in `Rⁿ`.
//!
//! The estimators and the conformance harness are tested against them here,
//! and downstream crates reach them through the `test-utils` feature. The
//! sphere deliberately keeps the trait's default `parallel_transport`
//! (projection, not an isometry) and `orthonormal_basis` (`NotImplemented`),
//! so harness tests can observe failing and accepted checks.

#![cfg(any(test, feature = "test-utils"))]

use crate::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    types::{DVector, Scalar},
};
use nalgebra::Dyn;
use num_traits::Float;
use rand::{Rng, RngCore};

/// Entries uniform in `[-1, 1)`.
fn sample_cube<T: Scalar>(dim: usize, rng: &mut dyn RngCore) -> DVector<T> {
    DVector::from_fn(dim, |_, _| <T as Scalar>::from_f64(rng.gen_range(-1.0..1.0)))
}

/// `Rⁿ` with the dot product.
#[derive(Debug, Clone, Copy)]
pub struct TestEuclideanManifold {
    dim: usize,
}

impl TestEuclideanManifold {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl<T: Scalar> Manifold<T, Dyn> for TestEuclideanManifold {
    fn name(&self) -> &str {
        "TestEuclidean"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn representation_size(&self) -> usize {
        self.dim
    }

    fn is_point_on_manifold(&self, point: &DVector<T>, _tol: T) -> bool {
        point.len() == self.dim
    }

    fn is_vector_in_tangent_space(&self, _point: &DVector<T>, vector: &DVector<T>, _tol: T) -> bool {
        vector.len() == self.dim
    }

    fn project_tangent(&self, _point: &DVector<T>, vector: &DVector<T>) -> Result<DVector<T>> {
        Ok(vector.clone())
    }

    fn inner_product(&self, _point: &DVector<T>, u: &DVector<T>, v: &DVector<T>) -> Result<T> {
        Ok(u.dot(v))
    }

    fn exp(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>> {
        Ok(point + tangent)
    }

    fn log(&self, point: &DVector<T>, other: &DVector<T>) -> Result<DVector<T>> {
        Ok(other - point)
    }

    fn orthonormal_basis(&self, _point: &DVector<T>) -> Result<Vec<DVector<T>>> {
        Ok((0..self.dim).map(|i| DVector::from_fn(self.dim, |r, _| if r == i { T::one() } else { T::zero() })).collect())
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> DVector<T> {
        sample_cube(self.dim, rng)
    }

    fn random_tangent(&self, _point: &DVector<T>, rng: &mut dyn RngCore) -> Result<DVector<T>> {
        Ok(sample_cube(self.dim, rng))
    }

    fn is_flat(&self) -> bool {
        true
    }
}

/// Unit sphere in `Rⁿ` (`n` is the ambient dimension).
#[derive(Debug, Clone, Copy)]
pub struct TestSphereManifold {
    ambient: usize,
}

impl TestSphereManifold {
    pub fn new(ambient: usize) -> Self {
        Self { ambient }
    }
}

impl<T: Scalar> Manifold<T, Dyn> for TestSphereManifold {
    fn name(&self) -> &str {
        "TestSphere"
    }

    fn dimension(&self) -> usize {
        self.ambient - 1
    }

    fn representation_size(&self) -> usize {
        self.ambient
    }

    fn is_point_on_manifold(&self, point: &DVector<T>, tol: T) -> bool {
        point.len() == self.ambient && <T as Float>::abs(point.norm_squared() - T::one()) < tol
    }

    fn is_vector_in_tangent_space(&self, point: &DVector<T>, vector: &DVector<T>, tol: T) -> bool {
        vector.len() == self.ambient && <T as Float>::abs(point.dot(vector)) < tol
    }

    fn project_tangent(&self, point: &DVector<T>, vector: &DVector<T>) -> Result<DVector<T>> {
        Ok(vector - point * point.dot(vector))
    }

    fn inner_product(&self, _point: &DVector<T>, u: &DVector<T>, v: &DVector<T>) -> Result<T> {
        Ok(u.dot(v))
    }

    fn exp(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>> {
        let theta = tangent.norm();
        if theta < T::EPSILON {
            return Ok(point + tangent);
        }
        Ok(point * <T as Float>::cos(theta) + tangent * (<T as Float>::sin(theta) / theta))
    }

    fn log(&self, point: &DVector<T>, other: &DVector<T>) -> Result<DVector<T>> {
        let theta = self.distance(point, other)?;
        let normal = other - point * point.dot(other);
        let sin_theta = normal.norm();
        if sin_theta < T::EPSILON {
            if point.dot(other) < T::zero() {
                return Err(ManifoldError::domain_error("logarithm of antipodal points"));
            }
            return Ok(DVector::zeros(self.ambient));
        }
        Ok(normal * (theta / sin_theta))
    }

    /// `2·atan2(‖x − y‖, ‖x + y‖)`, accurate for close and for nearly
    /// antipodal points.
    fn distance(&self, x: &DVector<T>, y: &DVector<T>) -> Result<T> {
        let two = T::one() + T::one();
        Ok(two * <T as Float>::atan2((x - y).norm(), (x + y).norm()))
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> DVector<T> {
        loop {
            let v = sample_cube::<T>(self.ambient, rng);
            let r = v.norm();
            if r > <T as Scalar>::from_f64(1e-3) {
                return v / r;
            }
        }
    }

    fn random_tangent(&self, point: &DVector<T>, rng: &mut dyn RngCore) -> Result<DVector<T>> {
        self.project_tangent(point, &sample_cube(self.ambient, rng))
    }
}
