//! Fréchet variance and standard deviation.
//!
//! `var = c · Σ wᵢ d(m, xᵢ)²` where `m` is a mean and `c` the correction
//! factor of the weights (see [`Weights::correction_factor`]).

use super::{check_sample, mean, resolve_weights, GradientDescentEstimation, Weights};
use crate::{
    error::Result,
    manifold::{Manifold, Point},
    types::Scalar,
};
use nalgebra::{allocator::Allocator, DefaultAllocator, Dim};
use num_traits::Float;

/// Variance of `points` about a given `mean`.
pub fn var_about<T, D, M>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    mean: &Point<T, D>,
    corrected: bool,
) -> Result<T>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    let weights = resolve_weights(weights, points.len())?;
    check_sample(points, &weights)?;
    let c = weights.correction_factor(corrected)?;
    let mut total = T::zero();
    for (x, &w) in points.iter().zip(weights.values()) {
        if w > T::zero() {
            let d = manifold.distance(mean, x)?;
            total += w * d * d;
        }
    }
    Ok(total * c)
}

/// Standard deviation of `points` about a given `mean`.
pub fn std_about<T, D, M>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    mean: &Point<T, D>,
    corrected: bool,
) -> Result<T>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    var_about(manifold, points, weights, mean, corrected).map(<T as Float>::sqrt)
}

/// Variance of `points` about their mean, estimated by gradient descent.
pub fn var<T, D, M>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    corrected: bool,
) -> Result<T>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    let weights = resolve_weights(weights, points.len())?;
    let m = mean(manifold, points, Some(&weights), &GradientDescentEstimation::default())?;
    var_about(manifold, points, Some(&weights), &m, corrected)
}

/// Standard deviation of `points` about their mean.
pub fn std<T, D, M>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    corrected: bool,
) -> Result<T>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    var(manifold, points, weights, corrected).map(<T as Float>::sqrt)
}

#[cfg(test)]
mod tests {
    use super::{std_about, var, var_about};
    use crate::error::ManifoldError;
    use crate::statistics::Weights;
    use crate::test_manifolds::{TestEuclideanManifold, TestSphereManifold};
    use crate::types::DVector;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_variance_matches_textbook() {
        let m = TestEuclideanManifold::new(1);
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let points: Vec<DVector<f64>> = values.iter().map(|&v| DVector::from_vec(vec![v])).collect();
        assert_relative_eq!(var(&m, &points, None, false).unwrap(), 4.0, epsilon = 1e-9);
        assert_relative_eq!(var(&m, &points, None, true).unwrap(), 32.0 / 7.0, epsilon = 1e-9);
        let center = DVector::from_vec(vec![5.0]);
        assert_relative_eq!(std_about(&m, &points, None, &center, false).unwrap(), 2.0);
    }

    #[test]
    fn test_frequency_weights_equal_repetition() {
        let m = TestEuclideanManifold::new(1);
        let points: Vec<DVector<f64>> = [1.0, 3.0].iter().map(|&v| DVector::from_vec(vec![v])).collect();
        let w = Weights::frequency(vec![1.0, 3.0]).unwrap();
        let repeated: Vec<DVector<f64>> = [1.0, 3.0, 3.0, 3.0]
            .iter()
            .map(|&v| DVector::from_vec(vec![v]))
            .collect();
        assert_relative_eq!(
            var(&m, &points, Some(&w), true).unwrap(),
            var(&m, &repeated, None, true).unwrap(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_plain_weights_reject_correction() {
        let m = TestEuclideanManifold::new(1);
        let points = vec![DVector::from_vec(vec![0.0]), DVector::from_vec(vec![1.0])];
        let w = Weights::plain(vec![1.0, 1.0]).unwrap();
        let center = DVector::from_vec(vec![0.5]);
        assert!(matches!(
            var_about(&m, &points, Some(&w), &center, true),
            Err(ManifoldError::DomainError { .. })
        ));
        assert_relative_eq!(var_about(&m, &points, Some(&w), &center, false).unwrap(), 0.25);
    }

    #[test]
    fn test_sphere_variance_uses_geodesic_distance() {
        let m = TestSphereManifold::new(3);
        let points = vec![
            DVector::from_vec(vec![1.0, 0.0, 0.0]),
            DVector::from_vec(vec![0.0, 1.0, 0.0]),
        ];
        let s = 0.5f64.sqrt();
        let center = DVector::from_vec(vec![s, s, 0.0]);
        let expected = (std::f64::consts::FRAC_PI_4).powi(2);
        assert_relative_eq!(
            var_about(&m, &points, None, &center, false).unwrap(),
            expected,
            epsilon = 1e-12
        );
    }
}
