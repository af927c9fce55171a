//! Euclidean space R^n with its canonical metric.
//!
//! Geodesics are straight lines, so exp, log and parallel transport are
//! exact. Euclidean space also serves as the coordinate chart the metrics in
//! [`crate::metrics`] are defined on.

use nalgebra::Dyn;
use num_traits::Float;
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use riemannkit_core::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    types::{DVector, Scalar},
};

/// The Euclidean space R^n.
///
/// # Mathematical Properties
///
/// - **Dimension**: n
/// - **Tangent space**: T_x R^n = R^n
/// - **Exponential map**: exp_x(v) = x + v
/// - **Logarithmic map**: log_x(y) = y − x
/// - **Parallel transport**: the identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Euclidean {
    dim: usize,
}

impl Euclidean {
    /// Creates R^n.
    ///
    /// # Errors
    /// Returns `DomainError` if `dim` is zero.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(ManifoldError::invalid_parameter(
                "Euclidean space requires dimension >= 1",
            ));
        }
        Ok(Self { dim })
    }

    /// The dimension n.
    pub fn dim(&self) -> usize {
        self.dim
    }

    fn gaussian<T: Scalar>(&self, rng: &mut dyn RngCore) -> DVector<T> {
        DVector::from_fn(self.dim, |_, _| {
            let val: f64 = StandardNormal.sample(&mut *rng);
            <T as Scalar>::from_f64(val)
        })
    }
}

impl<T: Scalar> Manifold<T, Dyn> for Euclidean {
    fn name(&self) -> &str {
        "Euclidean"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn representation_size(&self) -> usize {
        self.dim
    }

    fn is_point_on_manifold(&self, point: &DVector<T>, _tol: T) -> bool {
        point.len() == self.dim && point.iter().all(|&x| <T as Float>::is_finite(x))
    }

    fn is_vector_in_tangent_space(&self, point: &DVector<T>, vector: &DVector<T>, _tol: T) -> bool {
        point.len() == self.dim && vector.len() == self.dim
    }

    fn project_tangent(&self, _point: &DVector<T>, vector: &DVector<T>) -> Result<DVector<T>> {
        Ok(vector.clone())
    }

    fn inner_product(&self, _point: &DVector<T>, u: &DVector<T>, v: &DVector<T>) -> Result<T> {
        if u.len() != v.len() {
            return Err(ManifoldError::dimension_mismatch(u.len(), v.len()));
        }
        Ok(u.dot(v))
    }

    fn exp(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>> {
        if point.len() != tangent.len() {
            return Err(ManifoldError::dimension_mismatch(point.len(), tangent.len()));
        }
        Ok(point + tangent)
    }

    fn log(&self, point: &DVector<T>, other: &DVector<T>) -> Result<DVector<T>> {
        if point.len() != other.len() {
            return Err(ManifoldError::dimension_mismatch(point.len(), other.len()));
        }
        Ok(other - point)
    }

    fn distance(&self, x: &DVector<T>, y: &DVector<T>) -> Result<T> {
        if x.len() != y.len() {
            return Err(ManifoldError::dimension_mismatch(x.len(), y.len()));
        }
        Ok((y - x).norm())
    }

    fn parallel_transport(
        &self,
        _from: &DVector<T>,
        _to: &DVector<T>,
        vector: &DVector<T>,
    ) -> Result<DVector<T>> {
        Ok(vector.clone())
    }

    fn orthonormal_basis(&self, _point: &DVector<T>) -> Result<Vec<DVector<T>>> {
        Ok((0..self.dim)
            .map(|i| DVector::from_fn(self.dim, |j, _| if i == j { T::one() } else { T::zero() }))
            .collect())
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> DVector<T> {
        self.gaussian(rng)
    }

    fn random_tangent(&self, _point: &DVector<T>, rng: &mut dyn RngCore) -> Result<DVector<T>> {
        Ok(self.gaussian(rng))
    }

    fn is_flat(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_euclidean_creation() {
        let e = Euclidean::new(3).unwrap();
        assert_eq!(<Euclidean as Manifold<f64, Dyn>>::dimension(&e), 3);
        assert_eq!(e.dim(), 3);
        assert!(matches!(
            Euclidean::new(0),
            Err(ManifoldError::DomainError { .. })
        ));
    }

    #[test]
    fn test_exp_log_distance() {
        let e = Euclidean::new(2).unwrap();
        let p = DVector::from_vec(vec![1.0, -2.0]);
        let q = DVector::from_vec(vec![4.0, 2.0]);
        let v = e.log(&p, &q).unwrap();
        assert_eq!(v, DVector::from_vec(vec![3.0, 4.0]));
        assert_eq!(e.exp(&p, &v).unwrap(), q);
        assert_relative_eq!(e.distance(&p, &q).unwrap(), 5.0);
        assert_eq!(e.exp_scaled(&p, &v, 0.5).unwrap(), DVector::from_vec(vec![2.5, 0.0]));
    }

    #[test]
    fn test_length_mismatch() {
        let e = Euclidean::new(2).unwrap();
        let p = DVector::from_vec(vec![1.0, 0.0]);
        let v = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        assert!(matches!(e.exp(&p, &v), Err(ManifoldError::DimensionMismatch { .. })));
        assert!(matches!(e.log(&p, &v), Err(ManifoldError::DimensionMismatch { .. })));
        assert!(!e.is_point_on_manifold(&v, 1e-10));
    }

    #[test]
    fn test_basis_is_standard() {
        let e = Euclidean::new(3).unwrap();
        let p = DVector::<f64>::zeros(3);
        let basis = e.orthonormal_basis(&p).unwrap();
        assert_eq!(basis.len(), 3);
        for (i, b) in basis.iter().enumerate() {
            assert_eq!(b[i], 1.0);
            assert_eq!(b.sum(), 1.0);
        }
    }

    #[test]
    fn test_random_generation_is_seeded() {
        let e = Euclidean::new(4).unwrap();
        let p: DVector<f64> = e.random_point(&mut StdRng::seed_from_u64(5));
        let q: DVector<f64> = e.random_point(&mut StdRng::seed_from_u64(5));
        assert_eq!(p, q);
        assert_eq!(p.len(), 4);
    }
}
