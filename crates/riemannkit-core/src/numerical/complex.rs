//! Real block embedding of complex matrices.
//!
//! A complex matrix `A + iB` acts on `Cⁿ ≅ R²ⁿ` as the real block matrix
//! `[[A, −B], [B, A]]`. The embedding is an algebra homomorphism, so products
//! and inverses can be computed on the real side and mapped back.

use crate::error::{ManifoldError, Result};
use crate::types::DMatrix;
use nalgebra::{Complex, RealField};

/// Embeds an `n×n` complex matrix as the `2n×2n` real matrix `[[A, −B], [B, A]]`.
///
/// # Errors
///
/// Returns `DimensionMismatch` if the input is not square.
pub fn realify<T>(x: &DMatrix<Complex<T>>) -> Result<DMatrix<T>>
where
    T: RealField + Copy,
{
    let n = x.nrows();
    if x.ncols() != n {
        return Err(ManifoldError::dimension_mismatch(
            "square complex matrix",
            format!("{}x{}", x.nrows(), x.ncols()),
        ));
    }
    let mut out = DMatrix::zeros(2 * n, 2 * n);
    for j in 0..n {
        for i in 0..n {
            let z = x[(i, j)];
            out[(i, j)] = z.re;
            out[(i + n, j + n)] = z.re;
            out[(i, j + n)] = -z.im;
            out[(i + n, j)] = z.im;
        }
    }
    Ok(out)
}

/// Inverse of [`realify`]: reads `A` from the top-left block and `B` from the
/// bottom-left block of a `2n×2n` real matrix.
///
/// The other two blocks are not inspected; for matrices in the image of
/// `realify` they are determined by the first column of blocks.
///
/// # Errors
///
/// Returns `DimensionMismatch` if the input is not square with even size.
pub fn complexify<T>(x: &DMatrix<T>) -> Result<DMatrix<Complex<T>>>
where
    T: RealField + Copy,
{
    let size = x.nrows();
    if x.ncols() != size || size % 2 != 0 {
        return Err(ManifoldError::dimension_mismatch(
            "square real matrix of even size",
            format!("{}x{}", x.nrows(), x.ncols()),
        ));
    }
    let n = size / 2;
    Ok(DMatrix::from_fn(n, n, |i, j| {
        Complex::new(x[(i, j)], x[(i + n, j)])
    }))
}
