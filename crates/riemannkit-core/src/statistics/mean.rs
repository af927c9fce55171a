//! Fréchet mean estimators.

use super::{
    check_sample, seeded_rng, starting_point, visit_order, ConvergenceTolerance, MeanEstimator,
    Weights,
};
use crate::{
    error::{ManifoldError, Result},
    manifold::{Manifold, Point},
    types::Scalar,
};
use log::{debug, trace, warn};
use nalgebra::{allocator::Allocator, DefaultAllocator, Dim};
use num_traits::Float;

/// Riemannian gradient descent on `Σ wᵢ d(y, xᵢ)²`.
///
/// Each iteration averages the logarithms `log_y(xᵢ)` online with the
/// normalized weights and moves half-way along the result. The fixed step is
/// the Riemannian analogue of the optimal Euclidean step; no line search is
/// performed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradientDescentEstimation<T> {
    /// Maximum number of iterations.
    pub stop_iter: usize,
    /// Stopping rule on successive iterates.
    pub tolerance: ConvergenceTolerance<T>,
}

impl<T: Scalar> Default for GradientDescentEstimation<T> {
    fn default() -> Self {
        Self {
            stop_iter: 100,
            tolerance: ConvergenceTolerance::default(),
        }
    }
}

impl<T: Scalar> GradientDescentEstimation<T> {
    /// Creates the estimator with `stop_iter = 100`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration cap.
    pub fn with_stop_iter(mut self, stop_iter: usize) -> Self {
        self.stop_iter = stop_iter;
        self
    }

    /// Sets the stopping rule.
    pub fn with_tolerance(mut self, tolerance: ConvergenceTolerance<T>) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl<T: Scalar> MeanEstimator<T> for GradientDescentEstimation<T> {
    fn name(&self) -> &str {
        "GradientDescent"
    }

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
        DefaultAllocator: Allocator<D>,
    {
        check_sample(points, weights)?;
        let half = <T as Scalar>::from_f64(0.5);
        let mut y = starting_point(points, initial);

        for iteration in 0..self.stop_iter {
            let mut v = manifold.zero_tangent_vector(&y);
            let mut cumulative = T::zero();
            for (x, &w) in points.iter().zip(weights.values()) {
                if w == T::zero() {
                    continue;
                }
                cumulative += w;
                let log = manifold.log(&y, x)?;
                v += (log - &v) * (w / cumulative);
            }
            let y_new = manifold.exp_scaled(&y, &v, half)?;
            let converged = self.tolerance.is_converged(manifold, &y_new, &y);
            y = y_new;
            trace!("{}: iteration {iteration}, step norm {}", self.name(), v.norm());
            if converged {
                debug!("{}: converged after {} iterations", self.name(), iteration + 1);
                return Ok(y);
            }
        }
        warn!(
            "{}: stop_iter = {} reached without convergence, returning the last iterate",
            self.name(),
            self.stop_iter
        );
        Ok(y)
    }
}

/// Single-pass geodesic interpolation.
///
/// The running estimate moves from its position towards each new sample by
/// the fraction `wⱼ / Σ_{i≤j} wᵢ` of the connecting geodesic. The result is
/// exact in flat spaces and only approximates the mean otherwise; it is
/// reliable when all points lie in a geodesic ball small enough for the
/// mean to be unique.
///
/// The walk always starts at the first positively weighted sample, so the
/// `initial` point passed to [`mean_from`](super::mean_from) has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeodesicInterpolation {
    /// Seed for shuffling the visiting order; points are visited in order
    /// when `None`.
    pub shuffle_seed: Option<u64>,
}

impl GeodesicInterpolation {
    /// Visits the points in their given order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visits the points in an order shuffled by a generator seeded with `seed`.
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Runs the interpolation, returning the estimate and the accumulated
    /// weighted second moment `Σ wᵢ d(y, xᵢ)²`.
    fn interpolate<T, D, M>(
        &self,
        manifold: &M,
        points: &[Point<T, D>],
        weights: &Weights<T>,
    ) -> Result<(Point<T, D>, T)>
    where
        T: Scalar,
        D: Dim,
        M: Manifold<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
    {
        check_sample(points, weights)?;
        let values = weights.values();
        let mut rng = seeded_rng(self.shuffle_seed);
        let order = visit_order(points.len(), rng.as_mut());
        let mut positive = order.into_iter().filter(|&j| values[j] > T::zero());

        let first = positive
            .next()
            .ok_or_else(|| ManifoldError::domain_error("no sample has a positive weight"))?;
        let mut y = points[first].clone();
        let mut s = values[first];
        let mut second_moment = T::zero();

        for j in positive {
            let s_new = s + values[j];
            let t = values[j] / s_new;
            let x = manifold.log(&y, &points[j])?;
            let d2 = manifold.inner_product(&y, &x, &x)?;
            y = manifold.exp_scaled(&y, &x, t)?;
            second_moment += s * t * d2;
            s = s_new;
        }
        Ok((y, second_moment))
    }
}

impl<T: Scalar> MeanEstimator<T> for GeodesicInterpolation {
    fn name(&self) -> &str {
        "GeodesicInterpolation"
    }

    fn estimate_mean<D, M>(
        &self,
        manifold: &M,
        points: &[Point<T, D>],
        weights: &Weights<T>,
        _initial: Option<&Point<T, D>>,
    ) -> Result<Point<T, D>>
    where
        D: Dim,
        M: Manifold<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
    {
        self.interpolate(manifold, points, weights).map(|(y, _)| y)
    }

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
        let (y, second_moment) = self.interpolate(manifold, points, weights)?;
        let c = weights.correction_factor(corrected)?;
        Ok((y, second_moment * c))
    }
}

/// Geodesic interpolation with a fallback to gradient descent.
///
/// The interpolated estimate is accepted when every positively weighted
/// point lies within `radius` of it. Otherwise it seeds the fallback
/// estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeodesicInterpolationWithinRadius<T> {
    radius: T,
    /// Seed for shuffling the interpolation order.
    pub shuffle_seed: Option<u64>,
    /// Estimator used when the radius check fails.
    pub fallback: GradientDescentEstimation<T>,
}

impl<T: Scalar> GeodesicInterpolationWithinRadius<T> {
    /// Creates the estimator.
    ///
    /// # Errors
    ///
    /// `DomainError` unless `radius` is finite and positive.
    pub fn new(radius: T) -> Result<Self> {
        if !<T as Float>::is_finite(radius) || radius <= T::zero() {
            return Err(ManifoldError::domain_error(format!(
                "radius must be finite and positive, got {radius}"
            )));
        }
        Ok(Self {
            radius,
            shuffle_seed: None,
            fallback: GradientDescentEstimation::default(),
        })
    }

    /// The acceptance radius.
    pub fn radius(&self) -> T {
        self.radius
    }

    /// Shuffles the interpolation order with a generator seeded with `seed`.
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Replaces the fallback estimator.
    pub fn with_fallback(mut self, fallback: GradientDescentEstimation<T>) -> Self {
        self.fallback = fallback;
        self
    }

    fn interpolation(&self) -> GeodesicInterpolation {
        GeodesicInterpolation {
            shuffle_seed: self.shuffle_seed,
        }
    }

    fn within_radius<D, M>(&self, manifold: &M, points: &[Point<T, D>], weights: &Weights<T>, y: &Point<T, D>) -> Result<bool>
    where
        D: Dim,
        M: Manifold<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
    {
        for (x, &w) in points.iter().zip(weights.values()) {
            if w > T::zero() && manifold.distance(y, x)? > self.radius {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<T: Scalar> MeanEstimator<T> for GeodesicInterpolationWithinRadius<T> {
    fn name(&self) -> &str {
        "GeodesicInterpolationWithinRadius"
    }

    fn estimate_mean<D, M>(
        &self,
        manifold: &M,
        points: &[Point<T, D>],
        weights: &Weights<T>,
        _initial: Option<&Point<T, D>>,
    ) -> Result<Point<T, D>>
    where
        D: Dim,
        M: Manifold<T, D> + ?Sized,
        DefaultAllocator: Allocator<D>,
    {
        let y = self.interpolation().estimate_mean(manifold, points, weights, None)?;
        if self.within_radius(manifold, points, weights, &y)? {
            return Ok(y);
        }
        debug!(
            "{}: sample exceeds radius {}, refining with {}",
            MeanEstimator::<T>::name(self),
            self.radius,
            self.fallback.name()
        );
        self.fallback.estimate_mean(manifold, points, weights, Some(&y))
    }

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
        let (y, v) = self
            .interpolation()
            .estimate_mean_and_var(manifold, points, weights, corrected)?;
        if self.within_radius(manifold, points, weights, &y)? {
            return Ok((y, v));
        }
        let y = self.fallback.estimate_mean(manifold, points, weights, Some(&y))?;
        let v = super::var_about(manifold, points, Some(weights), &y, corrected)?;
        Ok((y, v))
    }
}
