//! Numerical integration of the geodesic equation.
//!
//! In a chart the geodesic with initial point `p` and velocity `v` solves
//!
//! ```text
//! d²xᵏ/dt² = −Γᵏ_ij(x) ẋⁱ ẋʲ,    x(0) = p,  ẋ(0) = v
//! ```
//!
//! The solvers here integrate the first-order system in `(x, ẋ)` over
//! `[0, t_end]`; the acceleration is supplied by the caller.

use crate::{
    error::{ManifoldError, Result},
    types::{DVector, Scalar},
};
use num_traits::Float;

/// ODE backend for the generic exponential map.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeodesicSolver {
    /// Classical fourth-order Runge–Kutta with a fixed number of steps.
    RungeKutta4 {
        /// Number of equal steps on `[0, t_end]`
        steps: usize,
    },
    /// Adaptive Dormand–Prince 5(4) with embedded error control.
    DormandPrince {
        /// Absolute error tolerance per component
        abs_tol: f64,
        /// Relative error tolerance per component
        rel_tol: f64,
        /// Maximum number of attempted steps
        max_steps: usize,
    },
}

impl Default for GeodesicSolver {
    fn default() -> Self {
        Self::dormand_prince()
    }
}

impl GeodesicSolver {
    /// Fixed-step RK4 with 100 steps.
    pub fn runge_kutta4() -> Self {
        Self::RungeKutta4 { steps: 100 }
    }

    /// Dormand–Prince with tolerances `1e-10` and at most 10 000 steps.
    pub fn dormand_prince() -> Self {
        Self::DormandPrince {
            abs_tol: 1e-10,
            rel_tol: 1e-10,
            max_steps: 10_000,
        }
    }

    /// Integrates `ẍ = acceleration(x, ẋ)` from `(point, velocity)` over
    /// `[0, t_end]` and returns `x(t_end)`.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if `point` and `velocity` differ in length.
    /// - `DomainError` for invalid solver parameters.
    /// - `NumericalError` if the adaptive solver exhausts its step limit or
    ///   the state becomes non-finite.
    /// - Any error returned by `acceleration`.
    pub fn integrate<T, F>(
        &self,
        point: &DVector<T>,
        velocity: &DVector<T>,
        t_end: T,
        mut acceleration: F,
    ) -> Result<DVector<T>>
    where
        T: Scalar,
        F: FnMut(&DVector<T>, &DVector<T>) -> Result<DVector<T>>,
    {
        let n = point.len();
        if velocity.len() != n {
            return Err(ManifoldError::dimension_mismatch(n, velocity.len()));
        }
        let mut rhs = |state: &DVector<T>| -> Result<DVector<T>> {
            let x = state.rows(0, n).into_owned();
            let v = state.rows(n, n).into_owned();
            let a = acceleration(&x, &v)?;
            if a.len() != n {
                return Err(ManifoldError::dimension_mismatch(n, a.len()));
            }
            let mut derivative = DVector::zeros(2 * n);
            derivative.rows_mut(0, n).copy_from(&v);
            derivative.rows_mut(n, n).copy_from(&a);
            Ok(derivative)
        };

        let mut state = DVector::zeros(2 * n);
        state.rows_mut(0, n).copy_from(point);
        state.rows_mut(n, n).copy_from(velocity);

        let final_state = match *self {
            Self::RungeKutta4 { steps } => runge_kutta4(state, t_end, steps, &mut rhs)?,
            Self::DormandPrince {
                abs_tol,
                rel_tol,
                max_steps,
            } => dormand_prince(state, t_end, abs_tol, rel_tol, max_steps, &mut rhs)?,
        };
        if final_state.iter().any(|x| !<T as Float>::is_finite(*x)) {
            return Err(ManifoldError::numerical_error(
                "geodesic integration produced non-finite values",
            ));
        }
        Ok(final_state.rows(0, n).into_owned())
    }
}

fn runge_kutta4<T, F>(mut y: DVector<T>, t_end: T, steps: usize, f: &mut F) -> Result<DVector<T>>
where
    T: Scalar,
    F: FnMut(&DVector<T>) -> Result<DVector<T>>,
{
    if steps == 0 {
        return Err(ManifoldError::invalid_parameter(
            "Runge-Kutta step count must be positive",
        ));
    }
    let h = t_end / <T as Scalar>::from_usize(steps);
    let half = <T as Scalar>::from_f64(0.5);
    let sixth = <T as Scalar>::from_f64(1.0 / 6.0);
    let two = <T as Scalar>::from_f64(2.0);
    for _ in 0..steps {
        let k1 = f(&y)?;
        let k2 = f(&(&y + &k1 * (h * half)))?;
        let k3 = f(&(&y + &k2 * (h * half)))?;
        let k4 = f(&(&y + &k3 * h))?;
        y += (k1 + k2 * two + k3 * two + k4) * (h * sixth);
    }
    log::debug!("geodesic: {steps} fixed Runge-Kutta steps");
    Ok(y)
}

/// Dormand–Prince tableau; the system is autonomous so the nodes are not needed.
const DP_A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];
/// Fifth-order weights (first-same-as-last with the seventh stage).
const DP_B: [f64; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];
/// Embedded fourth-order weights.
const DP_B_STAR: [f64; 7] = [
    5179.0 / 57600.0,
    0.0,
    7571.0 / 16695.0,
    393.0 / 640.0,
    -92097.0 / 339200.0,
    187.0 / 2100.0,
    1.0 / 40.0,
];

fn dormand_prince<T, F>(
    mut y: DVector<T>,
    t_end: T,
    abs_tol: f64,
    rel_tol: f64,
    max_steps: usize,
    f: &mut F,
) -> Result<DVector<T>>
where
    T: Scalar,
    F: FnMut(&DVector<T>) -> Result<DVector<T>>,
{
    if !(abs_tol > 0.0 && rel_tol >= 0.0 && max_steps > 0) {
        return Err(ManifoldError::invalid_parameter(format!(
            "invalid Dormand-Prince parameters (abs_tol {abs_tol}, rel_tol {rel_tol}, max_steps {max_steps})"
        )));
    }
    let span = <T as Float>::abs(t_end);
    if span == T::zero() {
        return Ok(y);
    }
    let direction = <T as Float>::signum(t_end);
    let atol = <T as Scalar>::from_f64(abs_tol);
    let rtol = <T as Scalar>::from_f64(rel_tol);
    let min_step = span * T::EPSILON * <T as Scalar>::from_f64(16.0);

    let mut t = T::zero();
    let mut h = span * <T as Scalar>::from_f64(0.1);
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut stages: Vec<DVector<T>> = Vec::with_capacity(7);

    for _ in 0..max_steps {
        if t >= span {
            log::debug!("geodesic: Dormand-Prince finished in {accepted} steps ({rejected} rejected)");
            return Ok(y);
        }
        let last = h >= span - t;
        if last {
            h = span - t;
        }
        let signed_h = h * direction;

        stages.clear();
        stages.push(f(&y)?);
        for s in 1..7 {
            let mut stage_point = y.clone();
            for (r, k) in stages.iter().enumerate() {
                let a = DP_A[s][r];
                if a != 0.0 {
                    stage_point += k * (signed_h * <T as Scalar>::from_f64(a));
                }
            }
            stages.push(f(&stage_point)?);
        }

        let mut y_next = y.clone();
        let mut error = DVector::<T>::zeros(y.len());
        for (s, k) in stages.iter().enumerate() {
            if DP_B[s] != 0.0 {
                y_next += k * (signed_h * <T as Scalar>::from_f64(DP_B[s]));
            }
            let e = DP_B[s] - DP_B_STAR[s];
            if e != 0.0 {
                error += k * (signed_h * <T as Scalar>::from_f64(e));
            }
        }

        let mut sum = T::zero();
        for i in 0..y.len() {
            let scale = atol
                + rtol * <T as Float>::max(<T as Float>::abs(y[i]), <T as Float>::abs(y_next[i]));
            let ratio = error[i] / scale;
            sum = sum + ratio * ratio;
        }
        let error_norm = if y.is_empty() {
            T::zero()
        } else {
            <T as Float>::sqrt(sum / <T as Scalar>::from_usize(y.len()))
        };
        if !<T as Float>::is_finite(error_norm) {
            return Err(ManifoldError::numerical_error(
                "geodesic integration produced non-finite values",
            ));
        }

        let factor = if error_norm == T::zero() {
            <T as Scalar>::from_f64(5.0)
        } else {
            <T as Float>::min(
                <T as Scalar>::from_f64(5.0),
                <T as Float>::max(
                    <T as Scalar>::from_f64(0.2),
                    <T as Scalar>::from_f64(0.9)
                        * <T as Float>::powf(error_norm, <T as Scalar>::from_f64(-0.2)),
                ),
            )
        };

        if error_norm <= T::one() {
            t = if last { span } else { t + h };
            y = y_next;
            accepted += 1;
            log::trace!("geodesic: accepted step {accepted}, t = {t}, h = {h}");
        } else {
            rejected += 1;
        }
        h = h * factor;
        if h < min_step && t < span {
            return Err(ManifoldError::numerical_error(
                "geodesic integration step size underflow",
            ));
        }
    }

    if t >= span {
        return Ok(y);
    }
    log::warn!("geodesic: Dormand-Prince exhausted {max_steps} steps at t = {t}");
    Err(ManifoldError::numerical_error(format!(
        "geodesic integration did not reach t = {t_end} within {max_steps} steps"
    )))
}
