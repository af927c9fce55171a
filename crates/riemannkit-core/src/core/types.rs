//! The scalar trait and the nalgebra aliases used across the crate.
//!
//! The algorithms are generic over `f32` and `f64`. Besides the arithmetic
//! of [`RealField`] and [`Float`], they need exact conversions for literal
//! coefficients (Padé tables, step fractions, sample counts) and a lossless
//! route to `f64` for tolerance bookkeeping and log messages.

use nalgebra::{Const, Dyn, OMatrix, OVector, RealField};
use num_traits::Float;
use std::fmt::{Debug, Display};

/// Real floating-point element type of points, vectors and matrices.
pub trait Scalar: RealField + Float + Copy + Display + Debug + Send + Sync + 'static {
    /// Machine epsilon.
    const EPSILON: Self;

    /// Tolerance used by `check_point` for the manifold constraint.
    const MANIFOLD_TOLERANCE: Self;

    /// Tolerance used by `check_vector` for the tangency constraint.
    const ORTHOGONALITY_TOLERANCE: Self;

    /// Rounds an `f64` literal to this precision.
    fn from_f64(v: f64) -> Self;

    /// Widens to `f64`.
    fn to_f64(self) -> f64;

    /// Converts a count (iterations, sample sizes, step numbers).
    fn from_usize(v: usize) -> Self;

    /// `sqrt(ε)`, the default relative tolerance for iterates and the
    /// accuracy floor of quantities obtained through a square root.
    fn sqrt_epsilon() -> Self {
        <Self as Float>::sqrt(Self::EPSILON)
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const MANIFOLD_TOLERANCE: Self = 1e-5;
    const ORTHOGONALITY_TOLERANCE: Self = 1e-5;

    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_usize(v: usize) -> Self {
        v as f32
    }
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const MANIFOLD_TOLERANCE: Self = 1e-10;
    const ORTHOGONALITY_TOLERANCE: Self = 1e-10;

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn from_usize(v: usize) -> Self {
        v as f64
    }
}

/// Dynamically sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Dynamically sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Statically sized matrix.
pub type SMatrix<T, const R: usize, const C: usize> = OMatrix<T, Const<R>, Const<C>>;

/// Statically sized vector.
pub type SVector<T, const N: usize> = OVector<T, Const<N>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_round_to_precision() {
        assert_eq!(<f32 as Scalar>::from_f64(0.1), 0.1f32);
        assert_eq!(<f64 as Scalar>::from_f64(0.1), 0.1);
        assert_eq!(Scalar::to_f64(0.1f32), f64::from(0.1f32));
        assert_eq!(<f32 as Scalar>::from_usize(1 << 20), 1_048_576.0);
    }

    #[test]
    fn test_sqrt_epsilon() {
        assert_eq!(<f64 as Scalar>::sqrt_epsilon(), 2f64.powi(-26));
        assert_eq!(<f32 as Scalar>::sqrt_epsilon(), f32::EPSILON.sqrt());
    }

    #[test]
    fn test_tolerances_sit_above_rounding() {
        assert!(f32::EPSILON < <f32 as Scalar>::MANIFOLD_TOLERANCE);
        assert!(f64::EPSILON < <f64 as Scalar>::MANIFOLD_TOLERANCE);
        assert!(<f64 as Scalar>::ORTHOGONALITY_TOLERANCE < f64::from(<f32 as Scalar>::ORTHOGONALITY_TOLERANCE));
    }
}
