//! Fréchet median estimators.

use super::{
    check_sample, seeded_rng, starting_point, visit_order, ConvergenceTolerance, MedianEstimator,
    Weights,
};
use crate::{
    error::Result,
    manifold::{Manifold, Point},
    types::Scalar,
};
use log::{debug, trace, warn};
use nalgebra::{allocator::Allocator, DefaultAllocator, Dim};
use num_traits::Float;

/// Cyclic proximal point algorithm.
///
/// Sweep `i` visits every sample and moves the estimate towards it along the
/// connecting geodesic by the proximal step `min(λᵢ wⱼ / d, 1)` with
/// `λᵢ = 0.5 / i` and normalized weights. Converges slowly but robustly.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CyclicProximalPointEstimation<T> {
    /// Maximum number of sweeps.
    pub stop_iter: usize,
    /// Seed for reshuffling the visiting order every sweep.
    pub shuffle_seed: Option<u64>,
    /// Stopping rule on the estimates of successive sweeps.
    pub tolerance: ConvergenceTolerance<T>,
}

impl<T: Scalar> Default for CyclicProximalPointEstimation<T> {
    fn default() -> Self {
        Self {
            stop_iter: 1_000_000,
            shuffle_seed: None,
            tolerance: ConvergenceTolerance::default(),
        }
    }
}

impl<T: Scalar> CyclicProximalPointEstimation<T> {
    /// Creates the estimator with `stop_iter = 1_000_000`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sweep cap.
    pub fn with_stop_iter(mut self, stop_iter: usize) -> Self {
        self.stop_iter = stop_iter;
        self
    }

    /// Shuffles the visiting order with a generator seeded with `seed`.
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Sets the stopping rule.
    pub fn with_tolerance(mut self, tolerance: ConvergenceTolerance<T>) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl<T: Scalar> MedianEstimator<T> for CyclicProximalPointEstimation<T> {
    fn name(&self) -> &str {
        "CyclicProximalPoint"
    }

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
        DefaultAllocator: Allocator<D>,
    {
        check_sample(points, weights)?;
        let w = weights.normalized();
        let half = <T as Scalar>::from_f64(0.5);
        let mut rng = seeded_rng(self.shuffle_seed);
        let mut y = starting_point(points, initial);

        for sweep in 1..=self.stop_iter {
            let lambda = half / <T as Scalar>::from_usize(sweep);
            let y_old = y.clone();
            for j in visit_order(points.len(), rng.as_mut()) {
                if w[j] == T::zero() {
                    continue;
                }
                let d = manifold.distance(&y, &points[j])?;
                if d > T::zero() {
                    let t = <T as Float>::min(lambda * w[j] / d, T::one());
                    let x = manifold.log(&y, &points[j])?;
                    y = manifold.exp_scaled(&y, &x, t)?;
                }
            }
            trace!("{}: sweep {sweep}", self.name());
            if self.tolerance.is_converged(manifold, &y, &y_old) {
                debug!("{}: converged after {sweep} sweeps", self.name());
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

/// Riemannian Weiszfeld iteration.
///
/// Moves the estimate along `Σ (wⱼ/dⱼ) log_y(xⱼ) / Σ (wⱼ/dⱼ)` scaled by
/// `step`, ignoring samples that coincide with the estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeiszfeldEstimation<T> {
    /// Maximum number of iterations.
    pub stop_iter: usize,
    /// Step length `α` along the weighted direction.
    pub step: T,
    /// Stopping rule on successive iterates.
    pub tolerance: ConvergenceTolerance<T>,
}

impl<T: Scalar> Default for WeiszfeldEstimation<T> {
    fn default() -> Self {
        Self {
            stop_iter: 2000,
            step: T::one(),
            tolerance: ConvergenceTolerance::default(),
        }
    }
}

impl<T: Scalar> WeiszfeldEstimation<T> {
    /// Creates the estimator with `stop_iter = 2000` and unit step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration cap.
    pub fn with_stop_iter(mut self, stop_iter: usize) -> Self {
        self.stop_iter = stop_iter;
        self
    }

    /// Sets the step length.
    pub fn with_step(mut self, step: T) -> Self {
        self.step = step;
        self
    }

    /// Sets the stopping rule.
    pub fn with_tolerance(mut self, tolerance: ConvergenceTolerance<T>) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl<T: Scalar> MedianEstimator<T> for WeiszfeldEstimation<T> {
    fn name(&self) -> &str {
        "Weiszfeld"
    }

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
        DefaultAllocator: Allocator<D>,
    {
        check_sample(points, weights)?;
        let mut y = starting_point(points, initial);

        for iteration in 0..self.stop_iter {
            let mut direction = manifold.zero_tangent_vector(&y);
            let mut total = T::zero();
            for (x, &w) in points.iter().zip(weights.values()) {
                if w == T::zero() {
                    continue;
                }
                let d = manifold.distance(&y, x)?;
                if d > T::zero() {
                    let a = w / d;
                    direction += manifold.log(&y, x)? * a;
                    total += a;
                }
            }
            if total == T::zero() {
                debug!("{}: estimate coincides with every sample", self.name());
                return Ok(y);
            }
            let y_new = manifold.exp_scaled(&y, &(direction / total), self.step)?;
            let converged = self.tolerance.is_converged(manifold, &y_new, &y);
            y = y_new;
            trace!("{}: iteration {iteration}", self.name());
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
