//! Numerical differentiation of matrix- and tensor-valued functions of a
//! coordinate vector.
//!
//! The metric-manifold machinery differentiates the local metric (and the
//! Christoffel symbols built from it) with respect to chart coordinates. The
//! step for coordinate `k` is `relative_step · max(1, |p_k|)`.
//!
//! Only finite differences are available. [`FiniteDifference`] is
//! `#[non_exhaustive]` so that an automatic-differentiation backend can be
//! added as another variant without breaking callers.

use crate::{
    error::{ManifoldError, Result},
    numerical::tensor::{Tensor3, Tensor4},
    types::{DMatrix, DVector, Scalar},
};
use num_traits::Float;

/// Finite-difference scheme used to differentiate local quantities.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum FiniteDifference {
    /// One-sided differences, `(f(p + h·e_k) − f(p)) / h`.
    Forward {
        /// Step relative to the coordinate magnitude
        relative_step: f64,
    },
    /// Symmetric differences, `(f(p + h·e_k) − f(p − h·e_k)) / 2h`.
    Central {
        /// Step relative to the coordinate magnitude
        relative_step: f64,
    },
}

impl Default for FiniteDifference {
    fn default() -> Self {
        Self::central()
    }
}

impl FiniteDifference {
    /// Forward differences with the default step `1e-7`.
    pub fn forward() -> Self {
        Self::Forward {
            relative_step: 1e-7,
        }
    }

    /// Central differences with the default step `1e-4`.
    pub fn central() -> Self {
        Self::Central {
            relative_step: 1e-4,
        }
    }

    /// Replaces the relative step.
    pub fn with_relative_step(self, step: f64) -> Self {
        match self {
            Self::Forward { .. } => Self::Forward {
                relative_step: step,
            },
            Self::Central { .. } => Self::Central {
                relative_step: step,
            },
        }
    }

    /// The configured relative step.
    pub fn relative_step(&self) -> f64 {
        match *self {
            Self::Forward { relative_step } | Self::Central { relative_step } => relative_step,
        }
    }

    fn validate(&self) -> Result<()> {
        let step = self.relative_step();
        if !(step.is_finite() && step > 0.0) {
            return Err(ManifoldError::invalid_parameter(format!(
                "finite-difference step must be positive and finite, got {step}"
            )));
        }
        Ok(())
    }

    fn step_at<T: Scalar>(&self, coordinate: T) -> T {
        <T as Scalar>::from_f64(self.relative_step())
            * <T as Float>::max(T::one(), <T as Float>::abs(coordinate))
    }

    /// Derivative of `f` along coordinate `k` at `p`, given `base = f(p)`.
    fn partial<T, V, F>(&self, p: &DVector<T>, base: &V, k: usize, f: &mut F) -> Result<Vec<T>>
    where
        T: Scalar,
        F: FnMut(&DVector<T>) -> Result<V>,
        V: AsFlat<T>,
    {
        let h = self.step_at(p[k]);
        let mut shifted = p.clone();
        shifted[k] = p[k] + h;
        let plus = f(&shifted)?;
        match self {
            Self::Forward { .. } => Ok(difference(plus.flat(), base.flat(), h)),
            Self::Central { .. } => {
                shifted[k] = p[k] - h;
                let minus = f(&shifted)?;
                Ok(difference(plus.flat(), minus.flat(), h + h))
            }
        }
    }

    /// Jacobian of a matrix-valued function: `J[i, j, k] = ∂_k f(p)[i, j]`.
    ///
    /// # Errors
    ///
    /// Propagates failures of `f`; returns `DimensionMismatch` if `f` changes
    /// shape between evaluations.
    pub fn matrix_jacobian<T, F>(&self, p: &DVector<T>, mut f: F) -> Result<Tensor3<T>>
    where
        T: Scalar,
        F: FnMut(&DVector<T>) -> Result<DMatrix<T>>,
    {
        self.validate()?;
        let reference = f(p)?;
        let (rows, cols) = reference.shape();
        let mut checked = |x: &DVector<T>| -> Result<DMatrix<T>> {
            let value = f(x)?;
            if value.shape() != (rows, cols) {
                return Err(ManifoldError::dimension_mismatch(
                    format!("{rows}x{cols}"),
                    format!("{}x{}", value.nrows(), value.ncols()),
                ));
            }
            Ok(value)
        };
        let n = p.len();
        let mut jacobian = Tensor3::zeros(rows, cols, n);
        for k in 0..n {
            let column = self.partial(p, &reference, k, &mut checked)?;
            for j in 0..cols {
                for i in 0..rows {
                    jacobian[(i, j, k)] = column[i + rows * j];
                }
            }
        }
        Ok(jacobian)
    }

    /// Jacobian of a 3-tensor-valued function: `J[i, j, k, l] = ∂_l f(p)[i, j, k]`.
    ///
    /// # Errors
    ///
    /// Propagates failures of `f`; returns `DimensionMismatch` if `f` changes
    /// shape between evaluations.
    pub fn tensor_jacobian<T, F>(&self, p: &DVector<T>, mut f: F) -> Result<Tensor4<T>>
    where
        T: Scalar,
        F: FnMut(&DVector<T>) -> Result<Tensor3<T>>,
    {
        self.validate()?;
        let reference = f(p)?;
        let dims = reference.dims();
        let mut checked = |x: &DVector<T>| -> Result<Tensor3<T>> {
            let value = f(x)?;
            if value.dims() != dims {
                return Err(ManifoldError::dimension_mismatch(
                    format!("{dims:?}"),
                    format!("{:?}", value.dims()),
                ));
            }
            Ok(value)
        };
        let n = p.len();
        let [d0, d1, d2] = dims;
        let mut jacobian = Tensor4::zeros(d0, d1, d2, n);
        for l in 0..n {
            let column = self.partial(p, &reference, l, &mut checked)?;
            for k in 0..d2 {
                for j in 0..d1 {
                    for i in 0..d0 {
                        jacobian[(i, j, k, l)] = column[i + d0 * (j + d1 * k)];
                    }
                }
            }
        }
        Ok(jacobian)
    }
}

/// Values whose entries can be read in storage order.
trait AsFlat<T> {
    fn flat(&self) -> &[T];
}

impl<T: Scalar> AsFlat<T> for DMatrix<T> {
    fn flat(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Scalar> AsFlat<T> for Tensor3<T> {
    fn flat(&self) -> &[T] {
        self.as_slice()
    }
}

fn difference<T: Scalar>(upper: &[T], lower: &[T], width: T) -> Vec<T> {
    upper
        .iter()
        .zip(lower)
        .map(|(&a, &b)| (a - b) / width)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadratic(p: &DVector<f64>) -> Result<DMatrix<f64>> {
        Ok(DMatrix::from_row_slice(
            2,
            2,
            &[p[0] * p[0], p[0] * p[1], p[1], 3.0],
        ))
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            FiniteDifference::default(),
            FiniteDifference::Central {
                relative_step: 1e-4
            }
        );
        assert_eq!(FiniteDifference::forward().relative_step(), 1e-7);
        assert_eq!(
            FiniteDifference::forward().with_relative_step(1e-6),
            FiniteDifference::Forward {
                relative_step: 1e-6
            }
        );
    }

    #[test]
    fn test_matrix_jacobian_central() {
        let p = DVector::from_vec(vec![1.5, -2.0]);
        let j = FiniteDifference::central()
            .matrix_jacobian(&p, quadratic)
            .unwrap();
        assert_eq!(j.dims(), [2, 2, 2]);
        assert_relative_eq!(j[(0, 0, 0)], 3.0, epsilon = 1e-8);
        assert_relative_eq!(j[(0, 0, 1)], 0.0, epsilon = 1e-8);
        assert_relative_eq!(j[(0, 1, 0)], -2.0, epsilon = 1e-8);
        assert_relative_eq!(j[(0, 1, 1)], 1.5, epsilon = 1e-8);
        assert_relative_eq!(j[(1, 0, 1)], 1.0, epsilon = 1e-8);
        assert_relative_eq!(j[(1, 1, 0)], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_jacobian_forward() {
        let p = DVector::from_vec(vec![1.5, -2.0]);
        let j = FiniteDifference::forward()
            .matrix_jacobian(&p, quadratic)
            .unwrap();
        assert_relative_eq!(j[(0, 0, 0)], 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_evaluation_counts() {
        let p = DVector::from_vec(vec![0.3, -1.0, 2.0]);
        let mut calls = 0;
        FiniteDifference::forward()
            .matrix_jacobian(&p, |x: &DVector<f64>| {
                calls += 1;
                Ok(DMatrix::from_element(1, 1, x.sum()))
            })
            .unwrap();
        // f(p) once, then one shifted evaluation per coordinate.
        assert_eq!(calls, 4);

        let mut calls = 0;
        FiniteDifference::central()
            .tensor_jacobian(&p, |x: &DVector<f64>| {
                calls += 1;
                Ok(Tensor3::from_fn([1, 1, 1], |_, _, _| x.sum()))
            })
            .unwrap();
        assert_eq!(calls, 7);
    }

    #[test]
    fn test_tensor_jacobian() {
        let p = DVector::from_vec(vec![0.5, 2.0]);
        let j = FiniteDifference::central()
            .tensor_jacobian(&p, |x: &DVector<f64>| {
                Ok(Tensor3::from_fn([1, 1, 2], |_, _, k| x[k] * x[0]))
            })
            .unwrap();
        assert_eq!(j.dims(), [1, 1, 2, 2]);
        assert_relative_eq!(j[(0, 0, 0, 0)], 1.0, epsilon = 1e-8);
        assert_relative_eq!(j[(0, 0, 1, 0)], 2.0, epsilon = 1e-8);
        assert_relative_eq!(j[(0, 0, 1, 1)], 0.5, epsilon = 1e-8);
    }

    #[test]
    fn test_shape_change_is_reported() {
        let p = DVector::from_vec(vec![0.0]);
        let result = FiniteDifference::central().matrix_jacobian(&p, |x: &DVector<f64>| {
            let n = if x[0] == 0.0 { 1 } else { 2 };
            Ok(DMatrix::zeros(n, n))
        });
        assert!(matches!(result, Err(ManifoldError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_invalid_step() {
        let p = DVector::from_vec(vec![0.0]);
        let result = FiniteDifference::central()
            .with_relative_step(0.0)
            .matrix_jacobian(&p, quadratic_1d);
        assert!(matches!(result, Err(ManifoldError::DomainError { .. })));
    }

    fn quadratic_1d(p: &DVector<f64>) -> Result<DMatrix<f64>> {
        Ok(DMatrix::from_element(1, 1, p[0] * p[0]))
    }
}
