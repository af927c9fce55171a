//! Integration tests for the Fréchet statistics.
//!
//! The estimators are exercised on a statically sized plane (checking that
//! they are generic over the representation dimension and the scalar type)
//! and on the circle, where geodesics wrap around.

use approx::assert_relative_eq;
use nalgebra::{Dyn, U2};
use num_traits::Float;
use rand::{Rng, RngCore};
use riemannkit_core::{
    error::{ManifoldError, Result},
    manifold::Manifold,
    statistics::{
        self, mean, mean_and_std, mean_and_var, median, median_from, var, CyclicProximalPointEstimation,
        GeodesicInterpolation, GeodesicInterpolationWithinRadius, GradientDescentEstimation,
        WeiszfeldEstimation, Weights,
    },
    types::{DVector, SVector, Scalar},
};
use ::std::f64::consts::PI;

/// The Euclidean plane with points stored in fixed-size vectors.
#[derive(Debug)]
struct Plane;

impl<T: Scalar> Manifold<T, U2> for Plane {
    fn name(&self) -> &str {
        "Plane"
    }

    fn dimension(&self) -> usize {
        2
    }

    fn representation_size(&self) -> usize {
        2
    }

    fn is_point_on_manifold(&self, _point: &SVector<T, 2>, _tol: T) -> bool {
        true
    }

    fn is_vector_in_tangent_space(&self, _point: &SVector<T, 2>, _vector: &SVector<T, 2>, _tol: T) -> bool {
        true
    }

    fn project_tangent(&self, _point: &SVector<T, 2>, vector: &SVector<T, 2>) -> Result<SVector<T, 2>> {
        Ok(*vector)
    }

    fn inner_product(&self, _point: &SVector<T, 2>, u: &SVector<T, 2>, v: &SVector<T, 2>) -> Result<T> {
        Ok(u.dot(v))
    }

    fn exp(&self, point: &SVector<T, 2>, tangent: &SVector<T, 2>) -> Result<SVector<T, 2>> {
        Ok(point + tangent)
    }

    fn log(&self, point: &SVector<T, 2>, other: &SVector<T, 2>) -> Result<SVector<T, 2>> {
        Ok(other - point)
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> SVector<T, 2> {
        SVector::from_fn(|_, _| <T as Scalar>::from_f64(rng.gen::<f64>()))
    }

    fn random_tangent(&self, _point: &SVector<T, 2>, rng: &mut dyn RngCore) -> Result<SVector<T, 2>> {
        Ok(SVector::from_fn(|_, _| <T as Scalar>::from_f64(rng.gen::<f64>() - 0.5)))
    }
}

/// The unit circle, points given by their angle in `(−π, π]`.
#[derive(Debug)]
struct Circle;

fn wrap(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

impl Manifold<f64, Dyn> for Circle {
    fn name(&self) -> &str {
        "Circle"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn representation_size(&self) -> usize {
        1
    }

    fn is_point_on_manifold(&self, point: &DVector<f64>, _tol: f64) -> bool {
        point.len() == 1 && point[0] > -PI && point[0] <= PI
    }

    fn is_vector_in_tangent_space(&self, _point: &DVector<f64>, vector: &DVector<f64>, _tol: f64) -> bool {
        vector.len() == 1
    }

    fn project_tangent(&self, _point: &DVector<f64>, vector: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(vector.clone())
    }

    fn inner_product(&self, _point: &DVector<f64>, u: &DVector<f64>, v: &DVector<f64>) -> Result<f64> {
        Ok(u[0] * v[0])
    }

    fn exp(&self, point: &DVector<f64>, tangent: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(DVector::from_element(1, wrap(point[0] + tangent[0])))
    }

    fn log(&self, point: &DVector<f64>, other: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(DVector::from_element(1, wrap(other[0] - point[0])))
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> DVector<f64> {
        DVector::from_element(1, wrap(rng.gen::<f64>() * 2.0 * PI))
    }

    fn random_tangent(&self, _point: &DVector<f64>, rng: &mut dyn RngCore) -> Result<DVector<f64>> {
        Ok(DVector::from_element(1, rng.gen::<f64>() - 0.5))
    }
}

fn angles(values: &[f64]) -> Vec<DVector<f64>> {
    values.iter().map(|&a| DVector::from_element(1, a)).collect()
}

fn triangle<T: Scalar>() -> Vec<SVector<T, 2>> {
    [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]]
        .iter()
        .map(|&[x, y]| SVector::<T, 2>::new(<T as Scalar>::from_f64(x), <T as Scalar>::from_f64(y)))
        .collect()
}

#[test_log::test]
fn test_static_plane_mean_and_variance() {
    let points = triangle::<f64>();
    let (y, v) = mean_and_var(&Plane, &points, None, &GeodesicInterpolation::new(), false).unwrap();
    assert_relative_eq!(y, SVector::<f64, 2>::new(2.0 / 3.0, 2.0 / 3.0), epsilon = 1e-12);
    assert_relative_eq!(v, 16.0 / 9.0, epsilon = 1e-12);

    assert_relative_eq!(var(&Plane, &points, None, false).unwrap(), 16.0 / 9.0, epsilon = 1e-9);
    assert_relative_eq!(statistics::std(&Plane, &points, None, true).unwrap(), (8.0f64 / 3.0).sqrt(), epsilon = 1e-9);
}

#[test]
fn test_single_precision() {
    let points = triangle::<f32>();
    let y = mean(&Plane, &points, None, &GradientDescentEstimation::new()).unwrap();
    // Gradient descent stops at a relative step of sqrt(f32::EPSILON).
    assert_relative_eq!(y, SVector::<f32, 2>::new(2.0 / 3.0, 2.0 / 3.0), epsilon = 1e-3);
    let (_, s) = mean_and_std(&Plane, &points, None, &GeodesicInterpolation::new(), false).unwrap();
    assert_relative_eq!(s, (16.0f32 / 9.0).sqrt(), epsilon = 1e-5);
}

#[test_log::test]
fn test_circle_mean_across_the_cut() {
    let points = angles(&[3.0, -3.0]);
    let y = mean(&Circle, &points, None, &GradientDescentEstimation::new()).unwrap();
    assert!(wrap(y[0] - PI).abs() < 1e-6, "mean {} is not at π", y[0]);

    let y = mean(&Circle, &points, None, &GeodesicInterpolation::new()).unwrap();
    assert!(wrap(y[0] - PI).abs() < 1e-12);
}

#[test]
fn test_circle_weighted_mean() {
    let points = angles(&[0.5, -0.5, 1.0]);
    let w = Weights::analytic(vec![1.0, 1.0, 2.0]).unwrap();
    let y = mean(&Circle, &points, Some(&w), &GeodesicInterpolation::new()).unwrap();
    assert_relative_eq!(y[0], 0.5, epsilon = 1e-12);
    let y = mean(&Circle, &points, Some(&w), &GradientDescentEstimation::new()).unwrap();
    assert_relative_eq!(y[0], 0.5, epsilon = 1e-6);
}

#[test]
fn test_circle_median() {
    let points = angles(&[0.1, 0.2, 1.5]);
    let start = DVector::from_element(1, 0.3);
    let w = Weights::uniform(points.len()).unwrap();
    let weiszfeld = median_from(&Circle, &points, Some(&w), &start, &WeiszfeldEstimation::new()).unwrap();
    assert_relative_eq!(weiszfeld[0], 0.2, epsilon = 1e-6);

    let cpp = median(
        &Circle,
        &angles(&[0.1, 0.2, 0.3]),
        None,
        &CyclicProximalPointEstimation::new().with_stop_iter(10_000),
    )
    .unwrap();
    assert_relative_eq!(cpp[0], 0.2, epsilon = 1e-3);
}

#[test]
fn test_within_radius_matches_interpolation_when_clustered() {
    let points = angles(&[0.1, 0.2, 0.4]);
    let estimator = GeodesicInterpolationWithinRadius::new(PI / 2.0).unwrap();
    let y = mean(&Circle, &points, None, &estimator).unwrap();
    assert_relative_eq!(y[0], 0.7 / 3.0, epsilon = 1e-12);
}

#[test_log::test]
fn test_every_entry_point_rejects_mismatched_weights() {
    let points = triangle::<f64>();
    let w = Weights::uniform(4).unwrap();
    let is_mismatch = |e: ManifoldError| matches!(e, ManifoldError::DimensionMismatch { .. });

    assert!(is_mismatch(mean(&Plane, &points, Some(&w), &GeodesicInterpolation::new()).unwrap_err()));
    assert!(is_mismatch(mean(&Plane, &points, Some(&w), &GradientDescentEstimation::new()).unwrap_err()));
    let within = GeodesicInterpolationWithinRadius::new(1.0).unwrap();
    assert!(is_mismatch(mean(&Plane, &points, Some(&w), &within).unwrap_err()));
    assert!(is_mismatch(median(&Plane, &points, Some(&w), &WeiszfeldEstimation::new()).unwrap_err()));
    assert!(is_mismatch(median(&Plane, &points, Some(&w), &CyclicProximalPointEstimation::new()).unwrap_err()));
    assert!(is_mismatch(var(&Plane, &points, Some(&w), false).unwrap_err()));
    assert!(is_mismatch(statistics::std(&Plane, &points, Some(&w), false).unwrap_err()));
    assert!(is_mismatch(
        mean_and_var(&Plane, &points, Some(&w), &GeodesicInterpolation::new(), false).unwrap_err()
    ));
    assert!(is_mismatch(
        mean_and_std(&Plane, &points, Some(&w), &GradientDescentEstimation::new(), true).unwrap_err()
    ));
}

#[test]
fn test_empty_sample_with_weights_is_a_length_mismatch() {
    let points: Vec<SVector<f64, 2>> = Vec::new();
    let w = Weights::uniform(2).unwrap();
    let is_mismatch = |e: ManifoldError| matches!(e, ManifoldError::DimensionMismatch { .. });

    assert!(is_mismatch(mean(&Plane, &points, Some(&w), &GeodesicInterpolation::new()).unwrap_err()));
    assert!(is_mismatch(mean(&Plane, &points, Some(&w), &GradientDescentEstimation::new()).unwrap_err()));
    assert!(is_mismatch(median(&Plane, &points, Some(&w), &WeiszfeldEstimation::new()).unwrap_err()));
    assert!(is_mismatch(median(&Plane, &points, Some(&w), &CyclicProximalPointEstimation::new()).unwrap_err()));
    assert!(is_mismatch(var(&Plane, &points, Some(&w), true).unwrap_err()));
    assert!(is_mismatch(
        mean_and_var(&Plane, &points, Some(&w), &GeodesicInterpolation::new(), false).unwrap_err()
    ));

    // Without weights there is nothing to compare against.
    assert!(matches!(
        mean(&Plane, &points, None, &GeodesicInterpolation::new()),
        Err(ManifoldError::DomainError { .. })
    ));
}

#[test]
fn test_float_is_generic() {
    // The estimators only rely on `Scalar`; f32 and f64 agree to f32 precision.
    let y64 = mean(&Plane, &triangle::<f64>(), None, &GeodesicInterpolation::new()).unwrap();
    let y32 = mean(&Plane, &triangle::<f32>(), None, &GeodesicInterpolation::new()).unwrap();
    assert!(Float::abs(y64[0] as f32 - y32[0]) < 1e-6);
}
