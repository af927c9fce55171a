//! Riemannian metrics attached to a base manifold.
//!
//! A [`MetricManifold`] pairs a base manifold with a [`Metric`]. When the
//! metric is flagged as the base manifold's default, every operation delegates
//! to the base manifold's own (closed-form) implementation. Otherwise the
//! operations are driven by the metric tensor `g_p` in local coordinates:
//!
//! - `inner(p, X, Y) = Xᵀ g_p Y`
//! - `flat(p, X) = g_p X`, `sharp(p, ξ) = g_p⁻¹ ξ`
//! - `exp(p, X)` integrates the geodesic equation (see [`GeodesicSolver`])
//!
//! The generic exponential map requires points to be chart coordinates, i.e.
//! the base manifold must be covered by a single global chart
//! (`representation_size == dimension`). Embedded representations are
//! rejected with `NotImplemented`.

use crate::{
    error::{ManifoldError, Result},
    geometry::{differentiation::FiniteDifference, geodesic::GeodesicSolver},
    manifold::Manifold,
    types::{DMatrix, DVector, Scalar},
};
use nalgebra::Dyn;
use rand::RngCore;
use std::fmt::Debug;

/// A Riemannian metric on a base manifold `M`.
///
/// `local_metric` is the seam generic algorithms rely on; metrics that do not
/// provide it make every metric-tensor-driven operation fail with
/// `NotImplemented`.
pub trait Metric<T: Scalar, M>: Debug + Send + Sync {
    /// Returns a human-readable name for the metric.
    fn name(&self) -> &str;

    /// The metric tensor `g_ij` at `point` in local coordinates.
    fn local_metric(&self, _manifold: &M, _point: &DVector<T>) -> Result<DMatrix<T>> {
        Err(ManifoldError::not_implemented(format!(
            "local_metric for {}",
            self.name()
        )))
    }
}

/// Marker for the metric a base manifold implements natively.
///
/// Only such a metric can be attached with
/// [`MetricManifold::with_default_metric`].
pub trait DefaultMetric<M> {}

/// A base manifold equipped with a metric.
#[derive(Debug, Clone)]
pub struct MetricManifold<M, G> {
    manifold: M,
    metric: G,
    default_metric: bool,
    differentiation: FiniteDifference,
    geodesic_solver: Option<GeodesicSolver>,
}

impl<M, G> MetricManifold<M, G> {
    /// Attaches a non-default metric.
    ///
    /// Operations are computed from the metric tensor. No geodesic solver is
    /// configured, so `exp` reports `NotImplemented` until
    /// [`with_geodesic_solver`](Self::with_geodesic_solver) is called.
    pub fn new(manifold: M, metric: G) -> Self {
        Self {
            manifold,
            metric,
            default_metric: false,
            differentiation: FiniteDifference::default(),
            geodesic_solver: None,
        }
    }

    /// Attaches the base manifold's default metric; all operations delegate
    /// to the base manifold.
    pub fn with_default_metric(manifold: M, metric: G) -> Self
    where
        G: DefaultMetric<M>,
    {
        Self {
            default_metric: true,
            ..Self::new(manifold, metric)
        }
    }

    /// Sets the numerical differentiation scheme for metric derivatives.
    pub fn with_finite_difference(mut self, differentiation: FiniteDifference) -> Self {
        self.differentiation = differentiation;
        self
    }

    /// Sets the ODE backend used by the generic exponential map.
    pub fn with_geodesic_solver(mut self, solver: GeodesicSolver) -> Self {
        self.geodesic_solver = Some(solver);
        self
    }

    /// The base manifold.
    pub fn base(&self) -> &M {
        &self.manifold
    }

    /// The attached metric.
    pub fn metric(&self) -> &G {
        &self.metric
    }

    /// Whether the attached metric is the base manifold's default.
    pub fn is_default_metric(&self) -> bool {
        self.default_metric
    }

    /// The numerical differentiation scheme.
    pub fn finite_difference(&self) -> FiniteDifference {
        self.differentiation
    }

    /// The configured geodesic solver, if any.
    pub fn geodesic_solver(&self) -> Option<GeodesicSolver> {
        self.geodesic_solver
    }
}

impl<M, G> MetricManifold<M, G> {
    /// The metric tensor at `point`.
    ///
    /// # Errors
    ///
    /// `NotImplemented` if the metric does not provide `local_metric`;
    /// `DimensionMismatch` if the returned tensor is not `n×n` for a point of
    /// length `n`.
    pub fn local_metric<T>(&self, point: &DVector<T>) -> Result<DMatrix<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        let g = self.metric.local_metric(&self.manifold, point)?;
        let n = point.len();
        if g.shape() != (n, n) {
            return Err(ManifoldError::dimension_mismatch(
                format!("{n}x{n} metric tensor"),
                format!("{}x{}", g.nrows(), g.ncols()),
            ));
        }
        Ok(g)
    }

    /// The inverse metric tensor `g^{ij}` at `point`.
    pub fn inverse_local_metric<T>(&self, point: &DVector<T>) -> Result<DMatrix<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        self.local_metric(point)?.try_inverse().ok_or_else(|| {
            ManifoldError::numerical_error("local metric is not invertible")
        })
    }

    /// Determinant of the metric tensor at `point`.
    pub fn det_local_metric<T>(&self, point: &DVector<T>) -> Result<T>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        Ok(self.local_metric(point)?.determinant())
    }

    fn coordinate_inner<T>(&self, point: &DVector<T>, u: &DVector<T>, v: &DVector<T>) -> Result<T>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        check_lengths(point, u)?;
        check_lengths(point, v)?;
        let g = self.local_metric(point)?;
        Ok(u.dot(&(&g * v)))
    }

    fn require_chart<T>(&self, operation: &str) -> Result<()>
    where
        T: Scalar,
        M: Manifold<T, Dyn>,
    {
        if self.manifold.representation_size() != self.manifold.dimension() {
            return Err(ManifoldError::not_implemented(format!(
                "{operation} on {} requires a single global chart (representation size {} != dimension {})",
                self.manifold.name(),
                self.manifold.representation_size(),
                self.manifold.dimension()
            )));
        }
        Ok(())
    }

    /// Integrates the geodesic from `point` with initial velocity `tangent`
    /// over `[0, 1]`.
    fn exp_by_ode<T>(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>>
    where
        T: Scalar,
        M: Manifold<T, Dyn>,
        G: Metric<T, M>,
    {
        self.require_chart::<T>("exp")?;
        let solver = self.geodesic_solver.ok_or_else(|| {
            ManifoldError::not_implemented("exp for a non-default metric without a geodesic solver")
        })?;
        check_lengths(point, tangent)?;
        solver.integrate(point, tangent, T::one(), |x, v| {
            let gamma = self.christoffel_symbols_second(x)?;
            let n = x.len();
            Ok(DVector::from_fn(n, |k, _| {
                let mut acc = T::zero();
                for j in 0..n {
                    for i in 0..n {
                        acc = acc + gamma[(k, i, j)] * v[i] * v[j];
                    }
                }
                -acc
            }))
        })
    }
}

fn check_lengths<T: Scalar>(point: &DVector<T>, vector: &DVector<T>) -> Result<()> {
    if point.len() != vector.len() {
        return Err(ManifoldError::dimension_mismatch(point.len(), vector.len()));
    }
    Ok(())
}

impl<T, M, G> Manifold<T, Dyn> for MetricManifold<M, G>
where
    T: Scalar,
    M: Manifold<T, Dyn>,
    G: Metric<T, M>,
{
    fn name(&self) -> &str {
        self.manifold.name()
    }

    fn dimension(&self) -> usize {
        self.manifold.dimension()
    }

    fn representation_size(&self) -> usize {
        self.manifold.representation_size()
    }

    fn is_point_on_manifold(&self, point: &DVector<T>, tol: T) -> bool {
        self.manifold.is_point_on_manifold(point, tol)
    }

    fn is_vector_in_tangent_space(&self, point: &DVector<T>, vector: &DVector<T>, tol: T) -> bool {
        self.manifold.is_vector_in_tangent_space(point, vector, tol)
    }

    fn project_tangent(&self, point: &DVector<T>, vector: &DVector<T>) -> Result<DVector<T>> {
        self.manifold.project_tangent(point, vector)
    }

    fn inner_product(&self, point: &DVector<T>, u: &DVector<T>, v: &DVector<T>) -> Result<T> {
        if self.default_metric {
            self.manifold.inner_product(point, u, v)
        } else {
            self.coordinate_inner(point, u, v)
        }
    }

    fn exp(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>> {
        if self.default_metric {
            self.manifold.exp(point, tangent)
        } else {
            self.exp_by_ode(point, tangent)
        }
    }

    fn log(&self, point: &DVector<T>, other: &DVector<T>) -> Result<DVector<T>> {
        if self.default_metric {
            self.manifold.log(point, other)
        } else {
            Err(ManifoldError::not_implemented(format!(
                "log for metric {} on {}",
                self.metric.name(),
                self.manifold.name()
            )))
        }
    }

    fn distance(&self, x: &DVector<T>, y: &DVector<T>) -> Result<T> {
        if self.default_metric {
            self.manifold.distance(x, y)
        } else {
            Err(ManifoldError::not_implemented(format!(
                "distance for metric {} on {}",
                self.metric.name(),
                self.manifold.name()
            )))
        }
    }

    fn retract(&self, point: &DVector<T>, tangent: &DVector<T>) -> Result<DVector<T>> {
        self.manifold.retract(point, tangent)
    }

    fn inverse_retract(&self, point: &DVector<T>, other: &DVector<T>) -> Result<DVector<T>> {
        self.manifold.inverse_retract(point, other)
    }

    fn parallel_transport(
        &self,
        from: &DVector<T>,
        to: &DVector<T>,
        vector: &DVector<T>,
    ) -> Result<DVector<T>> {
        if self.default_metric {
            self.manifold.parallel_transport(from, to, vector)
        } else {
            Err(ManifoldError::not_implemented(format!(
                "parallel_transport for metric {}",
                self.metric.name()
            )))
        }
    }

    /// For a non-default metric the coordinate basis is orthonormalised with
    /// respect to `g_p`: the columns of `L⁻ᵀ` for `g_p = L Lᵀ`.
    fn orthonormal_basis(&self, point: &DVector<T>) -> Result<Vec<DVector<T>>> {
        if self.default_metric {
            return self.manifold.orthonormal_basis(point);
        }
        let g = self.local_metric(point)?;
        let cholesky = g.cholesky().ok_or_else(|| {
            ManifoldError::numerical_error("local metric is not positive definite")
        })?;
        let inverse_transpose = cholesky
            .l()
            .transpose()
            .try_inverse()
            .ok_or_else(|| ManifoldError::numerical_error("singular Cholesky factor"))?;
        Ok(inverse_transpose
            .column_iter()
            .map(|column| column.into_owned())
            .collect())
    }

    fn flat(&self, point: &DVector<T>, vector: &DVector<T>) -> Result<DVector<T>> {
        if self.default_metric {
            return self.manifold.flat(point, vector);
        }
        check_lengths(point, vector)?;
        Ok(self.local_metric(point)? * vector)
    }

    fn sharp(&self, point: &DVector<T>, covector: &DVector<T>) -> Result<DVector<T>> {
        if self.default_metric {
            return self.manifold.sharp(point, covector);
        }
        check_lengths(point, covector)?;
        self.local_metric(point)?
            .lu()
            .solve(covector)
            .ok_or_else(|| ManifoldError::numerical_error("local metric is not invertible"))
    }

    fn random_point(&self, rng: &mut dyn RngCore) -> DVector<T> {
        self.manifold.random_point(rng)
    }

    fn random_tangent(&self, point: &DVector<T>, rng: &mut dyn RngCore) -> Result<DVector<T>> {
        self.manifold.random_tangent(point, rng)
    }

    fn is_flat(&self) -> bool {
        self.default_metric && self.manifold.is_flat()
    }
}
