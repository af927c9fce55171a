//! Numerically safe matrix functions.
//!
//! The routines here fail fast: a matrix that has no real logarithm, or a
//! "symmetric" matrix that is not symmetric, is reported as a domain error
//! instead of being silently corrected. Structured inputs (diagonal,
//! symmetric, triangular) are detected exactly and take cheaper paths, and
//! every routine returns the same matrix type it was given, so fixed-size
//! inputs stay fixed-size.

use crate::{
    error::{ManifoldError, Result},
    types::Scalar,
};
use approx::AbsDiffEq;
use nalgebra::{
    allocator::Allocator, ComplexField, DefaultAllocator, Dim, DimDiff, DimSub, Matrix, OMatrix,
    RawStorage, SymmetricEigen, U1,
};
use num_traits::{Float, Zero};

/// Maximum number of square roots taken by the inverse scaling-and-squaring
/// logarithm before giving up.
const MAX_SQUARE_ROOTS: u32 = 64;

/// Maximum number of Denman–Beavers iterations for one square root.
const MAX_SQRT_ITERATIONS: usize = 100;

/// Maximum number of terms of the log(I + Z) series.
const MAX_SERIES_TERMS: usize = 200;

/// ‖Y − I‖₁ threshold below which the series for log(Y) is evaluated.
const SERIES_RADIUS: f64 = 0.25;

/// Exact structural classification of a square matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixStructure {
    /// All off-diagonal entries are exactly zero.
    Diagonal,
    /// `X == Xᴴ` entrywise.
    Hermitian,
    /// `X == −Xᴴ` entrywise.
    SkewHermitian,
    /// All entries below the diagonal are exactly zero.
    UpperTriangular,
    /// All entries above the diagonal are exactly zero.
    LowerTriangular,
    /// None of the above.
    General,
}

impl MatrixStructure {
    /// Classifies a square matrix. No tolerance is applied.
    pub fn detect<T, R, C, S>(x: &Matrix<T, R, C, S>) -> Self
    where
        T: ComplexField,
        R: Dim,
        C: Dim,
        S: RawStorage<T, R, C>,
    {
        let n = x.nrows();
        let mut lower_zero = true;
        let mut upper_zero = true;
        let mut hermitian = true;
        let mut skew = true;
        for j in 0..n {
            for i in 0..n {
                let xij = x[(i, j)].clone();
                if i > j && !xij.is_zero() {
                    lower_zero = false;
                }
                if i < j && !xij.is_zero() {
                    upper_zero = false;
                }
                let xji_conj = x[(j, i)].clone().conjugate();
                if xij != xji_conj {
                    hermitian = false;
                }
                if xij != -xji_conj {
                    skew = false;
                }
            }
        }
        match (lower_zero, upper_zero) {
            (true, true) => Self::Diagonal,
            _ if hermitian => Self::Hermitian,
            _ if skew => Self::SkewHermitian,
            (true, false) => Self::UpperTriangular,
            (false, true) => Self::LowerTriangular,
            (false, false) => Self::General,
        }
    }
}

/// The 1-norm (maximum absolute column sum) of a matrix.
pub fn norm_1<T, R, C, S>(x: &Matrix<T, R, C, S>) -> T::RealField
where
    T: ComplexField,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    let mut best = T::RealField::zero();
    for j in 0..x.ncols() {
        let mut column = T::RealField::zero();
        for i in 0..x.nrows() {
            column += x[(i, j)].clone().abs();
        }
        if column > best {
            best = column;
        }
    }
    best
}

pub(crate) fn ensure_square<T, R, C, S>(x: &Matrix<T, R, C, S>, what: &str) -> Result<()>
where
    T: ComplexField,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    if x.nrows() != x.ncols() {
        return Err(ManifoldError::dimension_mismatch(
            format!("square matrix for {what}"),
            format!("{}x{} matrix", x.nrows(), x.ncols()),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_finite<T, R, C, S>(x: &Matrix<T, R, C, S>, what: &str) -> Result<()>
where
    T: ComplexField,
    R: Dim,
    C: Dim,
    S: RawStorage<T, R, C>,
{
    if x.iter().all(|v| v.clone().is_finite()) {
        Ok(())
    } else {
        Err(ManifoldError::numerical_error(format!(
            "{what} received non-finite entries"
        )))
    }
}

/// Checks whether `X Xᴴ ≈ Xᴴ X`.
///
/// Diagonal, Hermitian and skew-Hermitian matrices are normal by structure and
/// return `true` without any arithmetic. Otherwise the commutator is formed
/// and compared in Frobenius norm against `atol`, or, when `atol` is `None`,
/// against `sqrt(ε)·max(‖X Xᴴ‖, ‖Xᴴ X‖)`.
pub fn is_normal<T, D>(x: &OMatrix<T, D, D>, atol: Option<T::RealField>) -> bool
where
    T: ComplexField,
    D: Dim,
    DefaultAllocator: Allocator<D, D>,
{
    if x.nrows() != x.ncols() {
        return false;
    }
    match MatrixStructure::detect(x) {
        MatrixStructure::Diagonal
        | MatrixStructure::Hermitian
        | MatrixStructure::SkewHermitian => true,
        _ => {
            let xh = x.adjoint();
            let lhs = x * &xh;
            let rhs = &xh * x;
            let tol = atol.unwrap_or_else(|| {
                let scale = lhs.norm();
                let other = rhs.norm();
                let scale = if other > scale { other } else { scale };
                T::RealField::default_epsilon().sqrt() * scale
            });
            (lhs - rhs).norm() <= tol
        }
    }
}

/// Symmetric eigendecomposition that keeps the input's dimension type.
///
/// The input must be symmetric up to `sqrt(ε)·max(1, ‖X‖₁)`; it is
/// symmetrized before decomposition so that rounding-level asymmetry does not
/// leak into the eigenvectors. Fixed-size inputs produce fixed-size
/// eigenvectors and eigenvalues.
///
/// # Errors
///
/// - `DimensionMismatch` if the matrix is not square.
/// - `NumericalError` on non-finite entries.
/// - `DomainError` if the matrix is not symmetric.
pub fn eigen_safe<T, D>(x: &OMatrix<T, D, D>) -> Result<SymmetricEigen<T, D>>
where
    T: Scalar,
    D: DimSub<U1>,
    DefaultAllocator: Allocator<D, D> + Allocator<D> + Allocator<DimDiff<D, U1>>,
{
    ensure_square(x, "eigen_safe")?;
    ensure_finite(x, "eigen_safe")?;
    let tol = T::sqrt_epsilon() * <T as Float>::max(T::one(), norm_1(x));
    let asymmetry = (x - x.transpose())
        .iter()
        .fold(T::zero(), |acc, &v| <T as Float>::max(acc, <T as Float>::abs(v)));
    if asymmetry > tol {
        return Err(ManifoldError::domain_error(format!(
            "eigen_safe requires a symmetric matrix (asymmetry {:e})",
            <T as Scalar>::to_f64(asymmetry)
        )));
    }
    let symmetric = (x + x.transpose()) * <T as Scalar>::from_f64(0.5);
    Ok(symmetric.symmetric_eigen())
}

/// Real matrix logarithm with explicit domain checking.
///
/// Returns the principal logarithm of `x`. The routine refuses inputs for
/// which no real principal logarithm exists instead of returning an inexact
/// or complex-projected result:
///
/// - diagonal input: every diagonal entry must be positive;
/// - symmetric input: every eigenvalue must be positive, the logarithm is
///   taken on the spectrum;
/// - triangular input: every diagonal entry (eigenvalue) must be positive;
/// - general input: no eigenvalue may lie on the closed negative real axis.
///
/// Non-symmetric inputs use inverse scaling and squaring: repeated
/// Denman–Beavers square roots until ‖Y − I‖₁ ≤ 1/4, then the series of
/// log(I + Z), scaled back by 2^k.
///
/// # Errors
///
/// - `DimensionMismatch` if the matrix is not square.
/// - `NumericalError` on non-finite entries or a breakdown of the square-root
///   iteration.
/// - `DomainError` if no real logarithm exists.
pub fn log_safe<T, D>(x: &OMatrix<T, D, D>) -> Result<OMatrix<T, D, D>>
where
    T: Scalar,
    D: DimSub<U1>,
    DefaultAllocator: Allocator<D, D>
        + Allocator<D>
        + Allocator<DimDiff<D, U1>>
        + Allocator<D, DimDiff<D, U1>>,
{
    ensure_square(x, "log_safe")?;
    ensure_finite(x, "log_safe")?;

    match MatrixStructure::detect(x) {
        MatrixStructure::Diagonal => {
            let diagonal = x.diagonal();
            check_positive_diagonal(diagonal.iter().copied())?;
            Ok(OMatrix::from_diagonal(&diagonal.map(|d| <T as Float>::ln(d))))
        }
        MatrixStructure::Hermitian => {
            let mut eigen = x.clone().symmetric_eigen();
            if let Some(&bad) = eigen.eigenvalues.iter().find(|&&lambda| lambda <= T::zero()) {
                return Err(ManifoldError::domain_error(format!(
                    "symmetric matrix has non-positive eigenvalue {bad}, no real logarithm"
                )));
            }
            eigen.eigenvalues = eigen.eigenvalues.map(|lambda| <T as Float>::ln(lambda));
            Ok(eigen.recompose())
        }
        MatrixStructure::UpperTriangular | MatrixStructure::LowerTriangular => {
            check_positive_diagonal(x.diagonal().iter().copied())?;
            log_inverse_scaling_squaring(x)
        }
        MatrixStructure::SkewHermitian | MatrixStructure::General => {
            let scale = <T as Float>::max(norm_1(x), T::one());
            let tol = <T as Scalar>::from_f64(100.0) * T::EPSILON * scale;
            for lambda in x.complex_eigenvalues().iter() {
                if <T as Float>::abs(lambda.im) <= tol && lambda.re <= T::zero() {
                    return Err(ManifoldError::domain_error(format!(
                        "matrix has eigenvalue {} on the closed negative real axis, no real logarithm",
                        lambda.re
                    )));
                }
            }
            log_inverse_scaling_squaring(x)
        }
    }
}

fn check_positive_diagonal<T: Scalar>(mut diagonal: impl Iterator<Item = T>) -> Result<()> {
    match diagonal.find(|&d| d <= T::zero()) {
        Some(bad) => Err(ManifoldError::domain_error(format!(
            "triangular matrix has non-positive diagonal entry {bad}, no real logarithm"
        ))),
        None => Ok(()),
    }
}

fn log_inverse_scaling_squaring<T, D>(x: &OMatrix<T, D, D>) -> Result<OMatrix<T, D, D>>
where
    T: Scalar,
    D: Dim,
    DefaultAllocator: Allocator<D, D>,
{
    let (d, _) = x.shape_generic();
    let identity = OMatrix::<T, D, D>::identity_generic(d, d);
    let radius = <T as Scalar>::from_f64(SERIES_RADIUS);

    let mut y = x.clone();
    let mut roots = 0u32;
    while norm_1(&(&y - &identity)) > radius {
        if roots >= MAX_SQUARE_ROOTS {
            return Err(ManifoldError::numerical_error(
                "log_safe: square roots did not approach the identity",
            ));
        }
        y = sqrt_denman_beavers(&y)?;
        roots += 1;
    }
    log::debug!("log_safe: {roots} square roots before series evaluation");

    let z = &y - &identity;
    let mut power = z.clone();
    let mut series = z.clone();
    for j in 2..=MAX_SERIES_TERMS {
        power = &power * &z;
        let jj = <T as Scalar>::from_usize(j);
        let coefficient = if j % 2 == 0 { -T::one() / jj } else { T::one() / jj };
        series += &power * coefficient;
        if norm_1(&power) / jj <= T::EPSILON * norm_1(&series) {
            break;
        }
    }

    let factor = <T as Float>::powi(<T as Scalar>::from_f64(2.0), roots as i32);
    Ok(series * factor)
}

/// Principal square root by the Denman–Beavers iteration.
fn sqrt_denman_beavers<T, D>(a: &OMatrix<T, D, D>) -> Result<OMatrix<T, D, D>>
where
    T: Scalar,
    D: Dim,
    DefaultAllocator: Allocator<D, D>,
{
    let (d, _) = a.shape_generic();
    let half = <T as Scalar>::from_f64(0.5);
    let sqrt_eps = T::sqrt_epsilon();

    let mut y = a.clone();
    let mut z = OMatrix::<T, D, D>::identity_generic(d, d);
    let mut polishing = false;
    for _ in 0..MAX_SQRT_ITERATIONS {
        let y_inv = y
            .clone()
            .try_inverse()
            .ok_or_else(|| ManifoldError::numerical_error("log_safe: singular square-root iterate"))?;
        let z_inv = z
            .clone()
            .try_inverse()
            .ok_or_else(|| ManifoldError::numerical_error("log_safe: singular square-root iterate"))?;
        let y_next = (&y + z_inv) * half;
        let z_next = (&z + y_inv) * half;
        let delta = norm_1(&(&y_next - &y));
        y = y_next;
        z = z_next;
        if polishing {
            return Ok(y);
        }
        // Quadratic convergence: one more step after reaching sqrt(eps) lands at eps.
        if delta <= sqrt_eps * norm_1(&y) {
            polishing = true;
        }
    }
    Err(ManifoldError::numerical_error(
        "log_safe: Denman–Beavers iteration did not converge",
    ))
}
