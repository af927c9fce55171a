//! Sphere manifold S^{n-1} = {x in R^n : ||x|| = 1}
//!
//! The unit sphere with the metric inherited from R^n. All operations the
//! generic algorithms rely on have closed forms: geodesics are great
//! circles, and parallel transport along them is a rotation in the plane
//! spanned by the two endpoints.

use nalgebra::Dyn;
use num_traits::Float;
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use riemannkit_core::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    types::{DVector, Scalar},
};

/// The unit sphere S^{n-1} in R^n.
///
/// Points satisfy ||x|| = 1, and the tangent space at x consists of all
/// vectors orthogonal to x.
///
/// # Mathematical Properties
///
/// - **Dimension**: n-1 (for sphere in R^n)
/// - **Tangent space**: T_x S^{n-1} = {v in R^n : x^T v = 0}
/// - **Riemannian metric**: Inherited from Euclidean space (canonical metric)
/// - **Exponential map**: exp_x(v) = cos(||v||) x + sin(||v||) v/||v||
/// - **Logarithmic map**: log_x(y) = θ (y - cos(θ)x) / ||y - cos(θ)x||
/// - **Distance**: θ = 2 atan2(||x - y||, ||x + y||)
/// - **Retraction**: R_x(v) = (x + v) / ||x + v||
///
/// The logarithm and parallel transport are undefined between antipodal
/// points and report a `DomainError` there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sphere {
    /// Ambient dimension (n)
    ambient_dim: usize,
}

impl Sphere {
    /// Creates a new sphere S^{n-1} embedded in R^n.
    ///
    /// # Errors
    /// Returns a `DomainError` if `ambient_dim` < 2
    pub fn new(ambient_dim: usize) -> Result<Self> {
        if ambient_dim < 2 {
            return Err(ManifoldError::invalid_parameter(
                "Sphere requires ambient dimension >= 2",
            ));
        }
        Ok(Self { ambient_dim })
    }

    /// Returns the ambient dimension (n)
    pub fn ambient_dimension(&self) -> usize {
        self.ambient_dim
    }

    /// Computes the exponential map at point x in direction v.
    ///
    /// This moves along a great circle from x in direction v.
    pub fn exp_map<T: Scalar>(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>> {
        self.check_lengths(point, tangent)?;
        let tangent_norm = tangent.norm();

        if tangent_norm < T::EPSILON {
            // First order: exp_x(v) ≈ x + v, renormalized.
            return Ok((point + tangent).normalize());
        }

        let cos_norm = <T as Float>::cos(tangent_norm);
        let sin_norm = <T as Float>::sin(tangent_norm);
        Ok(point * cos_norm + tangent * (sin_norm / tangent_norm))
    }

    /// Computes the logarithmic map from point x to point y.
    ///
    /// # Errors
    /// `DomainError` if the points are antipodal.
    pub fn log_map<T: Scalar>(&self, point: &DVector<T>, other: &DVector<T>) -> Result<DVector<T>> {
        self.check_lengths(point, other)?;
        if (point + other).norm() <= T::EPSILON {
            return Err(ManifoldError::domain_error(
                "logarithm between antipodal points is not unique",
            ));
        }
        let theta = self.angle(point, other);
        let direction = other - point * point.dot(other);
        let direction_norm = direction.norm();
        if theta < T::EPSILON || direction_norm < T::EPSILON {
            return Ok(DVector::zeros(point.len()));
        }
        Ok(direction * (theta / direction_norm))
    }

    /// The great-circle angle between two unit vectors.
    fn angle<T: Scalar>(&self, x: &DVector<T>, y: &DVector<T>) -> T {
        let two = <T as Scalar>::from_f64(2.0);
        two * <T as Float>::atan2((x - y).norm(), (x + y).norm())
    }

    fn check_lengths<T: Scalar>(&self, a: &DVector<T>, b: &DVector<T>) -> Result<()> {
        if a.len() != self.ambient_dim {
            return Err(ManifoldError::dimension_mismatch(self.ambient_dim, a.len()));
        }
        if b.len() != self.ambient_dim {
            return Err(ManifoldError::dimension_mismatch(self.ambient_dim, b.len()));
        }
        Ok(())
    }

    fn gaussian<T: Scalar>(&self, rng: &mut dyn RngCore) -> DVector<T> {
        DVector::from_fn(self.ambient_dim, |_, _| {
            let val: f64 = StandardNormal.sample(&mut *rng);
            <T as Scalar>::from_f64(val)
        })
    }
}

impl<T> Manifold<T, Dyn> for Sphere
where
    T: Scalar,
{
    fn name(&self) -> &str {
        "Sphere"
    }

    fn dimension(&self) -> usize {
        self.ambient_dim - 1
    }

    fn representation_size(&self) -> usize {
        self.ambient_dim
    }

    fn is_point_on_manifold(&self, point: &DVector<T>, tolerance: T) -> bool {
        if point.len() != self.ambient_dim {
            return false;
        }
        <T as Float>::abs(point.norm_squared() - T::one()) < tolerance
    }

    fn is_vector_in_tangent_space(&self, point: &DVector<T>, vector: &DVector<T>, tolerance: T) -> bool {
        if point.len() != self.ambient_dim || vector.len() != self.ambient_dim {
            return false;
        }
        <T as Float>::abs(point.dot(vector)) < tolerance
    }

    fn project_tangent(&self, point: &DVector<T>, vector: &DVector<T>) -> Result<DVector<T>> {
        self.check_lengths(point, vector)?;
        // v - <v,x>x
        Ok(vector - point * point.dot(vector))
    }

    fn inner_product(&self, _point: &DVector<T>, u: &DVector<T>, v: &DVector<T>) -> Result<T> {
        self.check_lengths(u, v)?;
        Ok(u.dot(v))
    }

    fn exp(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>> {
        self.exp_map(point, tangent)
    }

    fn log(&self, point: &DVector<T>, other: &DVector<T>) -> Result<DVector<T>> {
        self.log_map(point, other)
    }

    fn distance(&self, x: &DVector<T>, y: &DVector<T>) -> Result<T> {
        self.check_lengths(x, y)?;
        Ok(self.angle(x, y))
    }

    fn retract(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>> {
        self.check_lengths(point, tangent)?;
        Ok((point + tangent).normalize())
    }

    /// Inverse of the projection retraction, `y / <x, y> - x`.
    ///
    /// Defined on the open hemisphere centred at `x`.
    fn inverse_retract(&self, point: &DVector<T>, other: &DVector<T>) -> Result<DVector<T>> {
        self.check_lengths(point, other)?;
        let c = point.dot(other);
        if c <= T::EPSILON {
            return Err(ManifoldError::domain_error(
                "inverse retraction requires <x, y> > 0",
            ));
        }
        Ok(other / c - point)
    }

    /// Transport along the minimizing geodesic:
    /// `P(v) = v - <y, v> / (1 + <x, y>) (x + y)`.
    fn parallel_transport(&self, from: &DVector<T>, to: &DVector<T>, vector: &DVector<T>) -> Result<DVector<T>> {
        self.check_lengths(from, to)?;
        self.check_lengths(from, vector)?;
        let denominator = T::one() + from.dot(to);
        if denominator <= T::EPSILON {
            return Err(ManifoldError::domain_error(
                "parallel transport between antipodal points is not unique",
            ));
        }
        Ok(vector - (from + to) * (to.dot(vector) / denominator))
    }

    /// Gram–Schmidt on the coordinate axes, skipping the axis most aligned
    /// with the point.
    fn orthonormal_basis(&self, point: &DVector<T>) -> Result<Vec<DVector<T>>> {
        if point.len() != self.ambient_dim {
            return Err(ManifoldError::dimension_mismatch(self.ambient_dim, point.len()));
        }
        let mut axes: Vec<usize> = (0..self.ambient_dim).collect();
        axes.sort_by(|&i, &j| {
            <T as Float>::abs(point[i])
                .partial_cmp(&<T as Float>::abs(point[j]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut basis: Vec<DVector<T>> = Vec::with_capacity(self.ambient_dim - 1);
        for &axis in axes.iter().take(self.ambient_dim - 1) {
            let mut v = DVector::zeros(self.ambient_dim);
            v[axis] = T::one();
            // Two passes keep the result orthogonal to working precision.
            for _ in 0..2 {
                v -= point * point.dot(&v);
                for b in &basis {
                    v -= b * b.dot(&v);
                }
            }
            let norm = v.norm();
            if norm < <T as Float>::sqrt(T::EPSILON) {
                return Err(ManifoldError::numerical_error(
                    "degenerate axis in tangent basis construction",
                ));
            }
            basis.push(v / norm);
        }
        Ok(basis)
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> DVector<T> {
        // Normalized Gaussian vectors are uniform on the sphere.
        loop {
            let point: DVector<T> = self.gaussian(rng);
            let norm = point.norm();
            if norm > T::EPSILON {
                return point / norm;
            }
        }
    }

    fn random_tangent(&self, point: &DVector<T>, rng: &mut dyn RngCore) -> Result<DVector<T>> {
        let v = self.gaussian(rng);
        self.project_tangent(point, &v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn e(n: usize, i: usize) -> DVector<f64> {
        let mut v = DVector::zeros(n);
        v[i] = 1.0;
        v
    }

    #[test]
    fn test_sphere_creation() {
        let sphere = Sphere::new(3).unwrap();
        assert_eq!(<Sphere as Manifold<f64, Dyn>>::dimension(&sphere), 2);
        assert_eq!(<Sphere as Manifold<f64, Dyn>>::representation_size(&sphere), 3);
        assert_eq!(sphere.ambient_dimension(), 3);

        assert!(Sphere::new(1).is_err());
    }

    #[test]
    fn test_point_on_manifold() {
        let sphere = Sphere::new(3).unwrap();
        assert!(sphere.is_point_on_manifold(&e(3, 0), 1e-10));
        let not_on_sphere = DVector::from_vec(vec![2.0, 0.0, 0.0]);
        assert!(!sphere.is_point_on_manifold(&not_on_sphere, 1e-10));
        assert!(!sphere.is_point_on_manifold(&e(4, 0), 1e-10));
    }

    #[test]
    fn test_tangent_projection() {
        let sphere = Sphere::new(3).unwrap();
        let point = e(3, 0);
        let vector = DVector::from_vec(vec![0.5, 1.0, 0.0]);

        let projected = sphere.project_tangent(&point, &vector).unwrap();
        assert!(sphere.is_vector_in_tangent_space(&point, &projected, 1e-12));
        assert_relative_eq!(projected, e(3, 1), epsilon = 1e-12);
    }

    #[test]
    fn test_exp_log_maps() {
        let sphere = Sphere::new(3).unwrap();
        let point = e(3, 0);
        let tangent = DVector::from_vec(vec![0.0, 0.5, 0.0]);

        let q = sphere.exp(&point, &tangent).unwrap();
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.5f64.sin(), epsilon = 1e-12);

        let back = sphere.log(&point, &q).unwrap();
        assert_relative_eq!(back, tangent, epsilon = 1e-12);

        // Half a great circle lands on the antipode.
        let half_turn = DVector::from_vec(vec![0.0, 0.0, PI]);
        assert_relative_eq!(sphere.exp(&point, &half_turn).unwrap(), -&point, epsilon = 1e-12);
    }

    #[test]
    fn test_log_of_antipodal_points_is_a_domain_error() {
        let sphere = Sphere::new(3).unwrap();
        let p = e(3, 2);
        assert!(matches!(
            sphere.log(&p, &(-&p)),
            Err(ManifoldError::DomainError { .. })
        ));
        assert_relative_eq!(sphere.distance(&p, &(-&p)).unwrap(), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_log_of_nearby_points_is_accurate() {
        let sphere = Sphere::new(3).unwrap();
        let p = e(3, 0);
        let v = DVector::from_vec(vec![0.0, 1e-9, -2e-9]);
        let q = sphere.exp(&p, &v).unwrap();
        assert_relative_eq!(sphere.log(&p, &q).unwrap(), v, epsilon = 1e-20, max_relative = 1e-6);
        assert_eq!(sphere.log(&p, &p).unwrap(), DVector::zeros(3));
    }

    #[test]
    fn test_retraction_inverse() {
        let sphere = Sphere::new(3).unwrap();
        let point = e(3, 0);
        let v = DVector::from_vec(vec![0.0, 0.3, -0.4]);
        let q = sphere.retract(&point, &v).unwrap();
        assert_relative_eq!(q.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(sphere.inverse_retract(&point, &q).unwrap(), v, epsilon = 1e-12);
        assert_relative_eq!(sphere.retract(&point, &DVector::zeros(3)).unwrap(), point);

        let behind = DVector::from_vec(vec![-1.0, 0.0, 0.0]);
        assert!(sphere.inverse_retract(&point, &behind).is_err());
    }

    #[test]
    fn test_distance() {
        let sphere = Sphere::new(3).unwrap();
        let distance = sphere.distance(&e(3, 0), &e(3, 1)).unwrap();
        assert_relative_eq!(distance, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_transport() {
        let sphere = Sphere::new(3).unwrap();
        let from = e(3, 0);
        let to = e(3, 1);

        // The normal of the great circle is left untouched.
        let normal = e(3, 2);
        let transported = sphere.parallel_transport(&from, &to, &normal).unwrap();
        assert_relative_eq!(transported, normal, epsilon = 1e-12);

        // The geodesic velocity is carried to the velocity at the endpoint.
        let velocity = e(3, 1);
        let transported = sphere.parallel_transport(&from, &to, &velocity).unwrap();
        assert_relative_eq!(transported, -&from, epsilon = 1e-12);

        assert!(matches!(
            sphere.parallel_transport(&from, &(-&from), &normal),
            Err(ManifoldError::DomainError { .. })
        ));
    }

    #[test]
    fn test_orthonormal_basis() {
        let sphere = Sphere::new(4).unwrap();
        let p = DVector::from_vec(vec![0.5, -0.5, 0.5, 0.5]);
        let basis = sphere.orthonormal_basis(&p).unwrap();
        assert_eq!(basis.len(), 3);
        for (i, bi) in basis.iter().enumerate() {
            assert_relative_eq!(bi.dot(&p), 0.0, epsilon = 1e-14);
            for (j, bj) in basis.iter().enumerate() {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(bi.dot(bj), expected, epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_random_generation() {
        let sphere = Sphere::new(3).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        let point: DVector<f64> = sphere.random_point(&mut rng);
        assert!(sphere.is_point_on_manifold(&point, 1e-12));

        let tangent = sphere.random_tangent(&point, &mut rng).unwrap();
        assert!(sphere.is_vector_in_tangent_space(&point, &tangent, 1e-12));
    }
}
