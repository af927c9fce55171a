//! Fréchet statistics on manifolds.
//!
//! Weighted means (minimizers of `Σ wᵢ d(y, xᵢ)²`), medians (minimizers of
//! `Σ wᵢ d(y, xᵢ)`) and variances of a sample of manifold points. Estimators
//! are plain configuration values implementing [`MeanEstimator`] or
//! [`MedianEstimator`]; the free functions below pick uniform weights when
//! none are given.
//!
//! # Example
//!
//! ```rust,ignore
//! use riemannkit_core::statistics::{mean_and_var, GeodesicInterpolation};
//! use riemannkit_core::test_manifolds::TestEuclideanManifold;
//! use nalgebra::DVector;
//!
//! let m = TestEuclideanManifold::new(3);
//! let points = vec![
//!     DVector::from_vec(vec![0.0, 0.0, 0.0]),
//!     DVector::from_vec(vec![2.0, 0.0, 0.0]),
//!     DVector::from_vec(vec![0.0, 2.0, 0.0]),
//! ];
//! let (y, v) = mean_and_var(&m, &points, None, &GeodesicInterpolation::new(), false).unwrap();
//! assert!((y[0] - 2.0 / 3.0).abs() < 1e-12);
//! assert!((v - 16.0 / 9.0).abs() < 1e-12);
//! ```

pub mod mean;
pub mod median;
pub mod variance;
pub mod weights;

pub use mean::{GeodesicInterpolation, GeodesicInterpolationWithinRadius, GradientDescentEstimation};
pub use median::{CyclicProximalPointEstimation, WeiszfeldEstimation};
pub use variance::{std, std_about, var, var_about};
pub use weights::{WeightKind, Weights};

use crate::{
    error::{ManifoldError, Result},
    manifold::{Manifold, Point},
    types::Scalar,
};
use ::std::borrow::Cow;
use ::std::fmt::Debug;
use nalgebra::{allocator::Allocator, DefaultAllocator, Dim};
use num_traits::Float;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Stopping rule shared by the iterative estimators.
///
/// Two successive iterates `y`, `y_old` are considered equal when
/// `‖y − y_old‖ ≤ max(atol, rtol·max(‖y‖, ‖y_old‖))`, as decided by
/// [`Manifold::is_approx_point`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceTolerance<T> {
    /// Absolute tolerance.
    pub atol: T,
    /// Relative tolerance.
    pub rtol: T,
}

impl<T: Scalar> Default for ConvergenceTolerance<T> {
    fn default() -> Self {
        Self {
            atol: T::zero(),
            rtol: T::sqrt_epsilon(),
        }
    }
}

impl<T: Scalar> ConvergenceTolerance<T> {
    /// Creates the default tolerance (`atol = 0`, `rtol = √ε`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absolute tolerance.
    pub fn with_atol(mut self, atol: T) -> Self {
        self.atol = atol;
        self
    }

    /// Sets the relative tolerance.
    pub fn with_rtol(mut self, rtol: T) -> Self {
        self.rtol = rtol;
        self
    }

    /// Whether `y` and `y_old` are indistinguishable on `manifold`.
    pub fn is_converged<D, M>(&self, manifold: &M, y: &Point<T, D>, y_old: &Point<T, D>) -> bool
    where
        D: Dim,
        M: Manifold<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
    {
        manifold.is_approx_point(y, y_old, self.atol, self.rtol)
    }
}

/// An algorithm computing a weighted Fréchet mean.
pub trait MeanEstimator<T: Scalar>: Debug + Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Estimates the mean of `points` under `weights`, starting from
    /// `initial` (the first sample when `None`) where the method iterates.
    ///
    /// Single-pass methods ([`GeodesicInterpolation`] and
    /// [`GeodesicInterpolationWithinRadius`]) ignore `initial`; they always
    /// start at the first positively weighted sample.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `weights` and `points` differ in length,
    /// `DomainError` for an empty sample, and any error raised by the
    /// manifold operations.
    fn estimate_mean<D, M>(
        &self,
        manifold: &M,
        points: &[Point<T, D>],
        weights: &Weights<T>,
        initial: Option<&Point<T, D>>,
    ) -> Result<Point<T, D>>
    where
        D: Dim,
        M: Manifold<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>;

    /// Estimates the mean and the variance about it.
    fn estimate_mean_and_var<D, M>(
        &self,
        manifold: &M,
        points: &[Point<T, D>],
        weights: &Weights<T>,
        corrected: bool,
    ) -> Result<(Point<T, D>, T)>
    where
        D: Dim,
        M: Manifold<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
    {
        let y = self.estimate_mean(manifold, points, weights, None)?;
        let v = var_about(manifold, points, Some(weights), &y, corrected)?;
        Ok((y, v))
    }
}

/// An algorithm computing a weighted Fréchet median.
pub trait MedianEstimator<T: Scalar>: Debug + Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Estimates the median of `points` under `weights`, starting from
    /// `initial` (the first sample when `None`).
    ///
    /// # Errors
    ///
    /// Same as [`MeanEstimator::estimate_mean`].
    fn estimate_median<D, M>(
        &self,
        manifold: &M,
        points: &[Point<T, D>],
        weights: &Weights<T>,
        initial: Option<&Point<T, D>>,
    ) -> Result<Point<T, D>>
    where
        D: Dim,
        M: Manifold<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>;
}

/// Rejects empty samples and weight vectors of the wrong length.
pub(crate) fn check_sample<T, P>(points: &[P], weights: &Weights<T>) -> Result<()>
where
    T: Scalar,
{
    if weights.len() != points.len() {
        return Err(ManifoldError::dimension_mismatch(
            format!("{} weights", points.len()),
            format!("{} weights", weights.len()),
        ));
    }
    if points.is_empty() {
        return Err(ManifoldError::domain_error(
            "cannot estimate a statistic of an empty sample",
        ));
    }
    Ok(())
}

/// Uses `weights` when given, uniform weights over `n` points otherwise.
pub(crate) fn resolve_weights<T: Scalar>(
    weights: Option<&Weights<T>>,
    n: usize,
) -> Result<Cow<'_, Weights<T>>> {
    match weights {
        Some(w) => Ok(Cow::Borrowed(w)),
        None if n == 0 => Err(ManifoldError::domain_error(
            "cannot estimate a statistic of an empty sample",
        )),
        None => Weights::uniform(n).map(Cow::Owned),
    }
}

/// Visiting order of `n` samples, shuffled when a seed is configured.
pub(crate) fn visit_order(n: usize, rng: Option<&mut StdRng>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    if let Some(rng) = rng {
        order.shuffle(rng);
    }
    order
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> Option<StdRng> {
    seed.map(StdRng::seed_from_u64)
}

/// Starting point of an iterative estimator.
pub(crate) fn starting_point<T, D>(points: &[Point<T, D>], initial: Option<&Point<T, D>>) -> Point<T, D>
where
    T: Scalar,
    D: Dim,
    DefaultAllocator: Allocator<D>,
{
    initial.unwrap_or(&points[0]).clone()
}

/// Weighted Fréchet mean of `points`; uniform weights when `weights` is `None`.
pub fn mean<T, D, M, E>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    estimator: &E,
) -> Result<Point<T, D>>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    E: MeanEstimator<T>,
    DefaultAllocator: Allocator<D>,
{
    let weights = resolve_weights(weights, points.len())?;
    estimator.estimate_mean(manifold, points, &weights, None)
}

/// Like [`mean`], iterating from `initial`.
///
/// `initial` only affects iterative estimators. [`GeodesicInterpolation`]
/// ignores it, and so does [`GeodesicInterpolationWithinRadius`] unless
/// its gradient-descent fallback runs, in which case the fallback starts at
/// the interpolated estimate.
pub fn mean_from<T, D, M, E>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    initial: &Point<T, D>,
    estimator: &E,
) -> Result<Point<T, D>>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    E: MeanEstimator<T>,
    DefaultAllocator: Allocator<D>,
{
    let weights = resolve_weights(weights, points.len())?;
    estimator.estimate_mean(manifold, points, &weights, Some(initial))
}

/// Weighted Fréchet median of `points`; uniform weights when `weights` is `None`.
pub fn median<T, D, M, E>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    estimator: &E,
) -> Result<Point<T, D>>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    E: MedianEstimator<T>,
    DefaultAllocator: Allocator<D>,
{
    let weights = resolve_weights(weights, points.len())?;
    estimator.estimate_median(manifold, points, &weights, None)
}

/// Like [`median`], iterating from `initial`.
pub fn median_from<T, D, M, E>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    initial: &Point<T, D>,
    estimator: &E,
) -> Result<Point<T, D>>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    E: MedianEstimator<T>,
    DefaultAllocator: Allocator<D>,
{
    let weights = resolve_weights(weights, points.len())?;
    estimator.estimate_median(manifold, points, &weights, Some(initial))
}

/// Mean and variance about it, in one call.
///
/// [`GeodesicInterpolation`] accumulates the second moment while it
/// interpolates; the result is exact in flat spaces and approximate elsewhere.
pub fn mean_and_var<T, D, M, E>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    estimator: &E,
    corrected: bool,
) -> Result<(Point<T, D>, T)>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    E: MeanEstimator<T>,
    DefaultAllocator: Allocator<D>,
{
    let weights = resolve_weights(weights, points.len())?;
    estimator.estimate_mean_and_var(manifold, points, &weights, corrected)
}

/// Mean and standard deviation about it.
pub fn mean_and_std<T, D, M, E>(
    manifold: &M,
    points: &[Point<T, D>],
    weights: Option<&Weights<T>>,
    estimator: &E,
    corrected: bool,
) -> Result<(Point<T, D>, T)>
where
    T: Scalar,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    E: MeanEstimator<T>,
    DefaultAllocator: Allocator<D>,
{
    let (y, v) = mean_and_var(manifold, points, weights, estimator, corrected)?;
    Ok((y, <T as Float>::sqrt(v)))
}
