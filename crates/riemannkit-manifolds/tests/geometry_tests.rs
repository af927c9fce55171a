//! Curvature and geodesics of the chart metrics, checked against closed
//! forms.

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use riemannkit_core::{
    error::ManifoldError,
    geometry::{FiniteDifference, GeodesicSolver, MetricManifold},
    manifold::Manifold,
};
use riemannkit_manifolds::{
    Euclidean, EuclideanMetric, PoincareHalfPlaneMetric, Sphere, SphericalCoordinatesMetric,
};

fn chart() -> Euclidean {
    Euclidean::new(2).unwrap()
}

fn half_plane(solver: GeodesicSolver) -> MetricManifold<Euclidean, PoincareHalfPlaneMetric> {
    MetricManifold::new(chart(), PoincareHalfPlaneMetric).with_geodesic_solver(solver)
}

fn spherical(solver: GeodesicSolver) -> MetricManifold<Euclidean, SphericalCoordinatesMetric> {
    MetricManifold::new(chart(), SphericalCoordinatesMetric).with_geodesic_solver(solver)
}

fn v2(x: f64, y: f64) -> DVector<f64> {
    DVector::from_vec(vec![x, y])
}

#[test_log::test]
fn test_half_plane_has_constant_negative_curvature() {
    let m = half_plane(GeodesicSolver::default());
    for p in [v2(0.0, 1.0), v2(-2.0, 0.3), v2(5.0, 4.0)] {
        assert_relative_eq!(m.gaussian_curvature(&p).unwrap(), -1.0, epsilon = 1e-5);
        let g = m.local_metric(&p).unwrap();
        assert_relative_eq!(m.ricci_tensor(&p).unwrap(), -&g, epsilon = 1e-4, max_relative = 1e-5);
        assert_relative_eq!(m.einstein_tensor(&p).unwrap(), DMatrix::zeros(2, 2), epsilon = 1e-4);
    }
}

#[test]
fn test_spherical_coordinates_have_unit_curvature() {
    let m = spherical(GeodesicSolver::default());
    for p in [v2(0.4, 0.0), v2(1.2, 2.0), v2(2.7, -1.0)] {
        assert_relative_eq!(m.gaussian_curvature(&p).unwrap(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(m.scalar_curvature(&p).unwrap(), 2.0, epsilon = 1e-5);
    }
}

#[test]
fn test_forward_differences_are_less_accurate_but_consistent() {
    let m = MetricManifold::new(chart(), SphericalCoordinatesMetric)
        .with_finite_difference(FiniteDifference::forward().with_relative_step(1e-5));
    let k = m.gaussian_curvature(&v2(1.0, 0.5)).unwrap();
    assert_relative_eq!(k, 1.0, epsilon = 1e-2);
}

#[test]
fn test_riemann_tensor_symmetries_on_the_half_plane() {
    let m = half_plane(GeodesicSolver::default());
    let p = v2(0.2, 0.9);
    let riemann = m.riemann_tensor(&p).unwrap();
    let g = m.local_metric(&p).unwrap();
    // Lowered tensor R_lijk = g_lm Rᵐ_ijk is antisymmetric in (l, i).
    let lowered = |l: usize, i: usize, j: usize, k: usize| {
        (0..2).map(|s| g[(l, s)] * riemann[(s, i, j, k)]).sum::<f64>()
    };
    for l in 0..2 {
        for i in 0..2 {
            assert_relative_eq!(lowered(l, i, 0, 1), -lowered(i, l, 0, 1), epsilon = 1e-5);
            assert_relative_eq!(riemann[(l, i, 0, 1)], -riemann[(l, i, 1, 0)], epsilon = 1e-6);
        }
    }
}

#[test]
fn test_euclidean_metric_is_flat() {
    let m = MetricManifold::new(chart(), EuclideanMetric);
    let p = v2(3.0, -7.0);
    assert_eq!(m.christoffel_symbols_second(&p).unwrap().max_abs(), 0.0);
    assert_eq!(m.gaussian_curvature(&p).unwrap(), 0.0);
}

#[test_log::test]
fn test_half_plane_geodesics_match_closed_forms() {
    for solver in [GeodesicSolver::dormand_prince(), GeodesicSolver::RungeKutta4 { steps: 400 }] {
        let m = half_plane(solver);

        // Vertical geodesic: y(t) = exp(t).
        let q = m.exp(&v2(0.0, 1.0), &v2(0.0, 1.0)).unwrap();
        assert_relative_eq!(q, v2(0.0, 1.0f64.exp()), epsilon = 1e-6);

        // Unit-speed half-circle about the origin: (tanh t, sech t).
        let q = m.exp(&v2(0.0, 1.0), &v2(1.0, 0.0)).unwrap();
        assert_relative_eq!(q, v2(1.0f64.tanh(), 1.0 / 1.0f64.cosh()), epsilon = 1e-6);
    }
}

#[test]
fn test_spherical_geodesics_match_great_circles() {
    let m = spherical(GeodesicSolver::default());

    // Along the equator and along a meridian.
    let q = m.exp(&v2(std::f64::consts::FRAC_PI_2, 0.2), &v2(0.0, 1.0)).unwrap();
    assert_relative_eq!(q, v2(std::f64::consts::FRAC_PI_2, 1.2), epsilon = 1e-6);
    let q = m.exp(&v2(1.0, 0.3), &v2(0.5, 0.0)).unwrap();
    assert_relative_eq!(q, v2(1.5, 0.3), epsilon = 1e-6);

    // A generic direction, compared with the embedded sphere's exponential.
    let p = v2(1.0, 0.4);
    let v = v2(0.3, 0.5);
    let (theta, phi) = (p[0], p[1]);
    let d_theta = DVector::from_vec(vec![theta.cos() * phi.cos(), theta.cos() * phi.sin(), -theta.sin()]);
    let d_phi = DVector::from_vec(vec![-theta.sin() * phi.sin(), theta.sin() * phi.cos(), 0.0]);
    let embedded_velocity = d_theta * v[0] + d_phi * v[1];

    let sphere = Sphere::new(3).unwrap();
    let x = SphericalCoordinatesMetric.embed(&p).unwrap();
    let expected = sphere.exp(&x, &embedded_velocity).unwrap();
    let got = SphericalCoordinatesMetric.embed(&m.exp(&p, &v).unwrap()).unwrap();
    assert_relative_eq!(got, expected, epsilon = 1e-6);
}

#[test]
fn test_geodesics_preserve_speed() {
    let m = half_plane(GeodesicSolver::default());
    let p = v2(0.3, 1.5);
    let v = v2(0.4, -0.2);
    let speed = m.norm(&p, &v).unwrap();
    let q = m.exp(&p, &v).unwrap();
    // Along a geodesic the distance travelled equals the initial speed; the
    // half-plane distance has the closed form arccosh(1 + |p − q|² / (2 y_p y_q)).
    let d = (1.0 + (&p - &q).norm_squared() / (2.0 * p[1] * q[1])).acosh();
    assert_relative_eq!(d, speed, epsilon = 1e-6);
}

#[test]
fn test_generic_operations_report_missing_capabilities() {
    let no_solver = MetricManifold::new(chart(), PoincareHalfPlaneMetric);
    let p = v2(0.0, 1.0);
    let q = v2(1.0, 1.0);
    assert!(matches!(no_solver.exp(&p, &q), Err(ManifoldError::NotImplemented { .. })));
    assert!(matches!(no_solver.log(&p, &q), Err(ManifoldError::NotImplemented { .. })));
    assert!(matches!(no_solver.distance(&p, &q), Err(ManifoldError::NotImplemented { .. })));

    // The embedded sphere has no global chart.
    let embedded = MetricManifold::new(Sphere::new(3).unwrap(), EuclideanMetric)
        .with_geodesic_solver(GeodesicSolver::default());
    let x = DVector::from_vec(vec![1.0, 0.0, 0.0]);
    let v = DVector::from_vec(vec![0.0, 0.1, 0.0]);
    assert!(matches!(embedded.exp(&x, &v), Err(ManifoldError::NotImplemented { .. })));
}

#[test]
fn test_metric_errors_propagate_through_curvature() {
    let m = half_plane(GeodesicSolver::default());
    assert!(matches!(
        m.gaussian_curvature(&v2(0.0, -1.0)),
        Err(ManifoldError::DomainError { .. })
    ));
    let s = spherical(GeodesicSolver::default());
    assert!(matches!(
        s.christoffel_symbols_second(&v2(0.0, 0.0)),
        Err(ManifoldError::DomainError { .. })
    ));
}
