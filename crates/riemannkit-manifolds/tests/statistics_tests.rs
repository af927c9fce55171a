//! Fréchet statistics on the concrete manifolds.

use approx::assert_relative_eq;
use nalgebra::DVector;
use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use riemannkit_core::{
    error::ManifoldError,
    manifold::Manifold,
    statistics::{
        mean, mean_and_var, median, var, var_about, CyclicProximalPointEstimation, GeodesicInterpolation,
        GeodesicInterpolationWithinRadius, GradientDescentEstimation, WeiszfeldEstimation, Weights,
    },
};
use riemannkit_manifolds::{Euclidean, Sphere};

fn vectors(rows: &[&[f64]]) -> Vec<DVector<f64>> {
    rows.iter().map(|r| DVector::from_column_slice(r)).collect()
}

#[test_log::test]
fn test_euclidean_triangle() {
    let m = Euclidean::new(3).unwrap();
    let points = vectors(&[&[0.0, 0.0, 0.0], &[2.0, 0.0, 0.0], &[0.0, 2.0, 0.0]]);
    let expected = DVector::from_vec(vec![2.0 / 3.0, 2.0 / 3.0, 0.0]);

    let (y, v) = mean_and_var(&m, &points, None, &GeodesicInterpolation::new(), false).unwrap();
    assert_relative_eq!(y, expected, epsilon = 1e-12);
    // Mean squared distance to the mean: (8/9 + 20/9 + 20/9) / 3.
    assert_relative_eq!(v, 16.0 / 9.0, epsilon = 1e-12);

    let y = mean(&m, &points, None, &GradientDescentEstimation::new()).unwrap();
    assert_relative_eq!(y, expected, epsilon = 1e-7);
}

/// Points at angle `alpha` from the north pole, spread evenly in longitude.
fn ring(alpha: f64, count: usize) -> Vec<DVector<f64>> {
    (0..count)
        .map(|k| {
            let phi = 2.0 * std::f64::consts::PI * k as f64 / count as f64;
            DVector::from_vec(vec![alpha.sin() * phi.cos(), alpha.sin() * phi.sin(), alpha.cos()])
        })
        .collect()
}

#[test_log::test]
fn test_sphere_mean_and_median_of_a_symmetric_ring() {
    let m = Sphere::new(3).unwrap();
    let north = DVector::from_vec(vec![0.0, 0.0, 1.0]);
    let points = ring(0.6, 5);

    let y = mean(&m, &points, None, &GradientDescentEstimation::new()).unwrap();
    assert_relative_eq!(y, north, epsilon = 1e-7);

    let y = median(&m, &points, None, &WeiszfeldEstimation::new()).unwrap();
    assert_relative_eq!(y, north, epsilon = 1e-6);

    let cpp = CyclicProximalPointEstimation::new().with_stop_iter(20_000).with_shuffle_seed(1);
    let y = median(&m, &points, None, &cpp).unwrap();
    // The proximal steps shrink like 1/i, so convergence is sublinear.
    assert!(m.distance(&y, &north).unwrap() < 5e-2);

    assert_relative_eq!(var(&m, &points, None, false).unwrap(), 0.36, epsilon = 1e-10);
}

#[test]
fn test_sphere_interpolation_is_close_to_the_mean() {
    let m = Sphere::new(3).unwrap();
    let mut rng = StdRng::seed_from_u64(17);
    let base = DVector::from_vec(vec![1.0, 0.0, 0.0]);
    let points: Vec<DVector<f64>> = (0..40)
        .map(|_| {
            let v = m.random_tangent(&base, &mut rng).unwrap();
            m.exp(&base, &(v * 0.05)).unwrap()
        })
        .collect();

    let exact = mean(&m, &points, None, &GradientDescentEstimation::new().with_stop_iter(500)).unwrap();
    let approx = mean(&m, &points, None, &GeodesicInterpolation::new().with_shuffle_seed(4)).unwrap();
    assert!(m.distance(&exact, &approx).unwrap() < 1e-2);

    let within = GeodesicInterpolationWithinRadius::new(std::f64::consts::FRAC_PI_2)
        .unwrap()
        .with_shuffle_seed(4);
    let refined = mean(&m, &points, None, &within).unwrap();
    assert!(m.distance(&approx, &refined).unwrap() < 1e-12);

    // A tiny radius forces the gradient-descent refinement.
    let strict = GeodesicInterpolationWithinRadius::new(1e-3).unwrap();
    let refined = mean(&m, &points, None, &strict).unwrap();
    assert!(m.distance(&exact, &refined).unwrap() < 1e-6);
}

#[test]
fn test_weighted_sphere_variance() {
    let m = Sphere::new(3).unwrap();
    let points = vectors(&[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]]);
    let center = m.exp(&points[0], &DVector::from_vec(vec![0.0, 0.5, 0.0])).unwrap();
    let w = Weights::frequency(vec![3.0, 1.0]).unwrap();
    let d1 = 0.5;
    let d2 = std::f64::consts::FRAC_PI_2 - 0.5;
    let expected = (3.0 * d1 * d1 + d2 * d2) / 3.0;
    assert_relative_eq!(
        var_about(&m, &points, Some(&w), &center, true).unwrap(),
        expected,
        epsilon = 1e-12
    );
}

#[test]
fn test_antipodal_samples_surface_domain_errors() {
    let m = Sphere::new(3).unwrap();
    let points = vectors(&[&[0.0, 0.0, 1.0], &[0.0, 0.0, -1.0]]);
    assert!(matches!(
        mean(&m, &points, None, &GeodesicInterpolation::new()),
        Err(ManifoldError::DomainError { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_euclidean_interpolation_is_the_weighted_average(
        raw in prop::collection::vec((prop::collection::vec(-10.0f64..10.0, 3), 0.1f64..5.0), 1..12)
    ) {
        let m = Euclidean::new(3).unwrap();
        let points: Vec<DVector<f64>> = raw.iter().map(|(p, _)| DVector::from_column_slice(p)).collect();
        let w = Weights::analytic(raw.iter().map(|(_, w)| *w).collect()).unwrap();
        let total: f64 = w.values().iter().sum();
        let expected = points
            .iter()
            .zip(w.values())
            .fold(DVector::zeros(3), |acc, (p, wi)| acc + p * *wi) / total;
        let y = mean(&m, &points, Some(&w), &GeodesicInterpolation::new()).unwrap();
        prop_assert!((y - expected).norm() < 1e-9);
    }
}
