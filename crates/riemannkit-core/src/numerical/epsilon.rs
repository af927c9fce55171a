//! Machine epsilon of the real number type underlying a value.
//!
//! Tolerances in the estimators and the conformance harness are expressed as
//! multiples of the largest epsilon among the values involved, so mixing an
//! `f32` point with an `f64` tangent vector tolerates `f32` rounding.

use nalgebra::{Complex, Dim, Matrix, Scalar as NalgebraScalar};

/// Types with an underlying real number type.
pub trait RealEpsilon {
    /// Machine epsilon of the underlying real type, widened to `f64`.
    const REAL_EPSILON: f64;
}

impl RealEpsilon for f32 {
    const REAL_EPSILON: f64 = f32::EPSILON as f64;
}

impl RealEpsilon for f64 {
    const REAL_EPSILON: f64 = f64::EPSILON;
}

impl<T: RealEpsilon> RealEpsilon for Complex<T> {
    const REAL_EPSILON: f64 = T::REAL_EPSILON;
}

impl<T, R, C, S> RealEpsilon for Matrix<T, R, C, S>
where
    T: RealEpsilon + NalgebraScalar,
    R: Dim,
    C: Dim,
{
    const REAL_EPSILON: f64 = T::REAL_EPSILON;
}

impl<T: RealEpsilon> RealEpsilon for [T] {
    const REAL_EPSILON: f64 = T::REAL_EPSILON;
}

impl<T: RealEpsilon> RealEpsilon for Vec<T> {
    const REAL_EPSILON: f64 = T::REAL_EPSILON;
}

impl<T: RealEpsilon + ?Sized> RealEpsilon for &T {
    const REAL_EPSILON: f64 = T::REAL_EPSILON;
}

/// Epsilon of the real type underlying `value`.
pub fn real_epsilon_of<V: RealEpsilon + ?Sized>(_value: &V) -> f64 {
    V::REAL_EPSILON
}

/// Largest machine epsilon among the real types underlying the arguments.
///
/// ```
/// use riemannkit_core::max_eps;
/// use nalgebra::DVector;
///
/// let p = DVector::<f32>::zeros(3);
/// let v = DVector::<f64>::zeros(3);
/// assert_eq!(max_eps!(p, v), f32::EPSILON as f64);
/// assert_eq!(max_eps!(1.0_f64), f64::EPSILON);
/// ```
#[macro_export]
macro_rules! max_eps {
    ($($value:expr),+ $(,)?) => {
        [$($crate::numerical::real_epsilon_of(&$value)),+]
            .into_iter()
            .fold(0.0_f64, f64::max)
    };
}
