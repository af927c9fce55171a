//! Sample weights for the statistical estimators.
//!
//! The kind of a weight vector only matters for the bias correction applied
//! by the variance estimators; means and medians use the values alone.

use crate::{
    error::{ManifoldError, Result},
    types::Scalar,
};
use num_traits::Float;

/// Interpretation of a weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightKind {
    /// Unspecified weights; no bias correction is defined.
    Plain,
    /// Each weight counts repeated observations.
    Frequency,
    /// Weights are sampling probabilities (inverse inclusion rates).
    Probability,
    /// Weights describe the relative importance (reliability) of samples.
    Analytic,
}

/// Non-negative weights, one per sample point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weights<T> {
    values: Vec<T>,
    kind: WeightKind,
    sum: T,
}

impl<T: Scalar> Weights<T> {
    /// Validates and wraps a weight vector.
    ///
    /// # Errors
    ///
    /// `DomainError` if a weight is negative or non-finite, or if the weights
    /// do not have a positive sum.
    pub fn new(values: Vec<T>, kind: WeightKind) -> Result<Self> {
        if let Some((index, bad)) = values
            .iter()
            .enumerate()
            .find(|(_, &w)| !<T as Float>::is_finite(w) || w < T::zero())
        {
            return Err(ManifoldError::domain_error(format!(
                "weight {index} is {bad}, weights must be finite and non-negative"
            )));
        }
        let sum = values.iter().fold(T::zero(), |acc, &w| acc + w);
        if sum <= T::zero() {
            return Err(ManifoldError::domain_error(
                "weights must have a positive sum",
            ));
        }
        Ok(Self { values, kind, sum })
    }

    /// Plain weights.
    pub fn plain(values: Vec<T>) -> Result<Self> {
        Self::new(values, WeightKind::Plain)
    }

    /// Frequency weights.
    pub fn frequency(values: Vec<T>) -> Result<Self> {
        Self::new(values, WeightKind::Frequency)
    }

    /// Probability weights.
    pub fn probability(values: Vec<T>) -> Result<Self> {
        Self::new(values, WeightKind::Probability)
    }

    /// Analytic weights.
    pub fn analytic(values: Vec<T>) -> Result<Self> {
        Self::new(values, WeightKind::Analytic)
    }

    /// `n` probability weights of one.
    ///
    /// # Errors
    ///
    /// `DomainError` if `n == 0`.
    pub fn uniform(n: usize) -> Result<Self> {
        Self::probability(vec![T::one(); n])
    }

    /// Number of weights.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no weights. Never true for a validated vector.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The weight values.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// The weight kind.
    pub fn kind(&self) -> WeightKind {
        self.kind
    }

    /// Sum of the weights.
    pub fn sum(&self) -> T {
        self.sum
    }

    /// Weights divided by their sum.
    pub fn normalized(&self) -> Vec<T> {
        self.values.iter().map(|&w| w / self.sum).collect()
    }

    /// The factor `c` in `var = c · Σ wᵢ d(m, xᵢ)²`.
    ///
    /// | `corrected` | kind | `c` |
    /// |---|---|---|
    /// | `false` | any | `1 / Σw` |
    /// | `true` | `Frequency` | `1 / (Σw − 1)` |
    /// | `true` | `Probability` | `n' / ((n' − 1) Σw)`, `n'` = non-zero weights |
    /// | `true` | `Analytic` | `1 / (Σw − Σw² / Σw)` |
    ///
    /// # Errors
    ///
    /// `DomainError` for corrected `Plain` weights, or when the corrected
    /// denominator is not positive.
    pub fn correction_factor(&self, corrected: bool) -> Result<T> {
        if !corrected {
            return Ok(T::one() / self.sum);
        }
        let denominator = match self.kind {
            WeightKind::Plain => {
                return Err(ManifoldError::domain_error(
                    "bias correction is not defined for plain weights; use frequency, probability or analytic weights",
                ))
            }
            WeightKind::Frequency => self.sum - T::one(),
            WeightKind::Probability => {
                let nonzero = self.values.iter().filter(|&&w| w > T::zero()).count();
                let n = <T as Scalar>::from_usize(nonzero);
                (n - T::one()) * self.sum / n
            }
            WeightKind::Analytic => {
                let squares = self.values.iter().fold(T::zero(), |acc, &w| acc + w * w);
                self.sum - squares / self.sum
            }
        };
        if denominator <= T::zero() {
            return Err(ManifoldError::domain_error(format!(
                "bias-corrected variance is undefined for these {:?} weights",
                self.kind
            )));
        }
        Ok(T::one() / denominator)
    }
}
