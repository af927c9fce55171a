//! Matrix exponential together with its Fréchet derivative.
//!
//! For square `A` and direction `E` this computes `exp(A)` and
//! `L(A, E) = d/dt exp(A + tE)|_{t=0}` with the scaling-and-squaring Padé
//! method of Al-Mohy and Higham (2009). The approximation order is chosen from
//! `‖A‖₁` against [`ELL_TABLE_61`]; above the order-9 threshold the matrices
//! are scaled by `2^-s`, the order-13 approximant is evaluated, and the pair is
//! squared back `s` times with
//! `L ← R·L + L·R`, `R ← R·R`.
//!
//! All intermediate `k×k` blocks live in a single [`PadeBuffer`] so that
//! repeated calls on equally sized inputs do not allocate scratch space; the
//! only per-call allocation is the LU factorisation of `V − U`.

use crate::error::{ManifoldError, Result};
use crate::numerical::stability::{ensure_finite, ensure_square, norm_1};
use crate::types::DMatrix;
use nalgebra::{ComplexField, DMatrixView, DMatrixViewMut};

/// Bounds on `‖A‖₁` below which the Padé approximant of order `m` (the array
/// index) is accurate to unit roundoff. Index 0 is unused.
pub const ELL_TABLE_61: [f64; 21] = [
    0.0, 2.11e-8, 3.56e-4, 1.08e-2, 6.49e-2, 2.00e-1, 4.37e-1, 7.83e-1, 1.23e0, 1.78e0, 2.42e0,
    3.13e0, 3.90e0, 4.74e0, 5.63e0, 6.56e0, 7.52e0, 8.53e0, 9.56e0, 1.06e1, 1.17e1,
];

const PADE_3: [f64; 4] = [120.0, 60.0, 12.0, 1.0];
const PADE_5: [f64; 6] = [30240.0, 15120.0, 3360.0, 420.0, 30.0, 1.0];
const PADE_7: [f64; 8] = [
    17297280.0, 8648640.0, 1995840.0, 277200.0, 25200.0, 1512.0, 56.0, 1.0,
];
const PADE_9: [f64; 10] = [
    17643225600.0,
    8821612800.0,
    2075673600.0,
    302702400.0,
    30270240.0,
    2162160.0,
    110880.0,
    3960.0,
    90.0,
    1.0,
];
const PADE_13: [f64; 14] = [
    64764752532480000.0,
    32382376266240000.0,
    7771770303897600.0,
    1187353796428800.0,
    129060195264000.0,
    10559470521600.0,
    670442572800.0,
    33522128640.0,
    1323241920.0,
    40840800.0,
    960960.0,
    16380.0,
    182.0,
    1.0,
];

/// Named `k×k` sub-blocks of a [`PadeBuffer`].
///
/// Slots are laid out so that every block is computed only from blocks in
/// lower slots. `A8`/`M8` are only used up to order 9 and `W1`/`Z1` only at
/// order 13, so they share slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    A2,
    M2,
    A4,
    M4,
    A6,
    M6,
    A8,
    M8,
    W1,
    Z1,
    W,
    U,
    V,
    Lw1,
    Lz1,
    Lw,
    Lu,
    Lv,
}

impl Block {
    const COUNT: usize = 16;

    const POWERS: [(Block, Block); 4] = [
        (Block::A2, Block::M2),
        (Block::A4, Block::M4),
        (Block::A6, Block::M6),
        (Block::A8, Block::M8),
    ];

    fn slot(self) -> usize {
        match self {
            Block::A2 => 0,
            Block::M2 => 1,
            Block::A4 => 2,
            Block::M4 => 3,
            Block::A6 => 4,
            Block::M6 => 5,
            Block::A8 | Block::W1 => 6,
            Block::M8 | Block::Z1 => 7,
            Block::W => 8,
            Block::U => 9,
            Block::V => 10,
            Block::Lw1 => 11,
            Block::Lz1 => 12,
            Block::Lw => 13,
            Block::Lu => 14,
            Block::Lv => 15,
        }
    }
}

/// Read access to the blocks below a given slot.
struct Blocks<'a, T> {
    head: &'a [T],
    n: usize,
    limit: usize,
}

impl<'a, T: ComplexField> Blocks<'a, T> {
    fn get(&self, block: Block) -> DMatrixView<'a, T> {
        let slot = block.slot();
        debug_assert!(slot < self.limit, "{block:?} read before it was written");
        let len = self.n * self.n;
        let head: &'a [T] = self.head;
        DMatrixView::from_slice(&head[slot * len..(slot + 1) * len], self.n, self.n)
    }
}

/// Reusable scratch space for [`expm_frechet_with_buffer`].
///
/// Holds a single `k×16k` matrix whose consecutive `k×k` column blocks are the
/// Padé intermediates (powers of `A`, their directional derivatives, `U`, `V`,
/// `Lu`, `Lv`). Column-major storage makes every block a contiguous slice.
#[derive(Debug, Clone)]
pub struct PadeBuffer<T: ComplexField> {
    n: usize,
    data: DMatrix<T>,
}

impl<T: ComplexField + Copy> PadeBuffer<T> {
    /// Allocates a buffer for `n×n` inputs.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            data: DMatrix::zeros(n, Block::COUNT * n),
        }
    }

    /// Wraps an existing `k×16k` matrix as a buffer.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the matrix is not `k×16k`.
    pub fn from_matrix(data: DMatrix<T>) -> Result<Self> {
        let n = data.nrows();
        if data.ncols() != Block::COUNT * n {
            return Err(ManifoldError::dimension_mismatch(
                format!("{n}x{} buffer", Block::COUNT * n),
                format!("{}x{}", data.nrows(), data.ncols()),
            ));
        }
        Ok(Self { n, data })
    }

    /// Side length of the matrices this buffer serves.
    pub fn matrix_size(&self) -> usize {
        self.n
    }

    /// The underlying `k×16k` matrix.
    pub fn as_matrix(&self) -> &DMatrix<T> {
        &self.data
    }

    fn read_all(&self) -> Blocks<'_, T> {
        Blocks {
            head: self.data.as_slice(),
            n: self.n,
            limit: Block::COUNT,
        }
    }

    /// Blocks below `target` for reading, and `target` itself for writing.
    fn split(&mut self, target: Block) -> (Blocks<'_, T>, DMatrixViewMut<'_, T>) {
        let n = self.n;
        let len = n * n;
        let slot = target.slot();
        let (head, tail) = self.data.as_mut_slice().split_at_mut(slot * len);
        (
            Blocks {
                head,
                n,
                limit: slot,
            },
            DMatrixViewMut::from_slice(&mut tail[..len], n, n),
        )
    }

    /// Even powers `A^{2j}` and their derivatives `M_{2j}` for `j = 1..=count`.
    fn fill_powers(&mut self, a: &DMatrix<T>, e: &DMatrix<T>, count: usize) {
        let one = T::one();
        let zero = T::zero();
        {
            let (_, mut dst) = self.split(Block::A2);
            dst.gemm(one, a, a, zero);
        }
        {
            let (_, mut dst) = self.split(Block::M2);
            dst.gemm(one, a, e, zero);
            dst.gemm(one, e, a, one);
        }
        for j in 1..count {
            let (prev_a, prev_m) = Block::POWERS[j - 1];
            let (cur_a, cur_m) = Block::POWERS[j];
            {
                let (blocks, mut dst) = self.split(cur_a);
                dst.gemm(one, &blocks.get(prev_a), &blocks.get(Block::A2), zero);
            }
            {
                let (blocks, mut dst) = self.split(cur_m);
                dst.gemm(one, &blocks.get(prev_a), &blocks.get(Block::M2), zero);
                dst.gemm(one, &blocks.get(prev_m), &blocks.get(Block::A2), one);
            }
        }
    }

    /// `dst = identity·I + Σ cᵢ·blockᵢ`.
    fn combine(&mut self, target: Block, identity: f64, terms: &[(f64, Block)]) {
        let (blocks, mut dst) = self.split(target);
        dst.fill(T::zero());
        for &(coefficient, block) in terms {
            let c: T = nalgebra::convert(coefficient);
            dst.zip_apply(&blocks.get(block), |d, x| *d = *d + c * x);
        }
        if identity != 0.0 {
            let c: T = nalgebra::convert(identity);
            for i in 0..dst.nrows() {
                dst[(i, i)] = dst[(i, i)] + c;
            }
        }
    }

    /// Padé orders 3, 5, 7 and 9.
    fn fill_low_order(&mut self, b: &[f64], a: &DMatrix<T>, e: &DMatrix<T>) {
        let one = T::one();
        let zero = T::zero();
        let count = (b.len() - 1) / 2;
        self.fill_powers(a, e, count);

        let odd: Vec<(f64, Block)> = (1..=count)
            .map(|j| (b[2 * j + 1], Block::POWERS[j - 1].0))
            .collect();
        let even: Vec<(f64, Block)> = (1..=count)
            .map(|j| (b[2 * j], Block::POWERS[j - 1].0))
            .collect();
        let odd_deriv: Vec<(f64, Block)> = (1..=count)
            .map(|j| (b[2 * j + 1], Block::POWERS[j - 1].1))
            .collect();
        let even_deriv: Vec<(f64, Block)> = (1..=count)
            .map(|j| (b[2 * j], Block::POWERS[j - 1].1))
            .collect();

        self.combine(Block::W, b[1], &odd);
        {
            let (blocks, mut dst) = self.split(Block::U);
            dst.gemm(one, a, &blocks.get(Block::W), zero);
        }
        self.combine(Block::V, b[0], &even);
        self.combine(Block::Lw, 0.0, &odd_deriv);
        {
            let (blocks, mut dst) = self.split(Block::Lu);
            dst.gemm(one, a, &blocks.get(Block::Lw), zero);
            dst.gemm(one, e, &blocks.get(Block::W), one);
        }
        self.combine(Block::Lv, 0.0, &even_deriv);
    }

    /// Padé order 13, evaluated with the A6-factored scheme.
    fn fill_order_13(&mut self, a: &DMatrix<T>, e: &DMatrix<T>) {
        use Block::*;
        let one = T::one();
        let zero = T::zero();
        let b = &PADE_13;
        self.fill_powers(a, e, 3);

        self.combine(W1, 0.0, &[(b[13], A6), (b[11], A4), (b[9], A2)]);
        self.combine(Z1, 0.0, &[(b[12], A6), (b[10], A4), (b[8], A2)]);

        self.combine(W, b[1], &[(b[7], A6), (b[5], A4), (b[3], A2)]);
        {
            let (blocks, mut dst) = self.split(W);
            dst.gemm(one, &blocks.get(A6), &blocks.get(W1), one);
        }
        {
            let (blocks, mut dst) = self.split(U);
            dst.gemm(one, a, &blocks.get(W), zero);
        }
        self.combine(V, b[0], &[(b[6], A6), (b[4], A4), (b[2], A2)]);
        {
            let (blocks, mut dst) = self.split(V);
            dst.gemm(one, &blocks.get(A6), &blocks.get(Z1), one);
        }

        self.combine(Lw1, 0.0, &[(b[13], M6), (b[11], M4), (b[9], M2)]);
        self.combine(Lz1, 0.0, &[(b[12], M6), (b[10], M4), (b[8], M2)]);

        self.combine(Lw, 0.0, &[(b[7], M6), (b[5], M4), (b[3], M2)]);
        {
            let (blocks, mut dst) = self.split(Lw);
            dst.gemm(one, &blocks.get(A6), &blocks.get(Lw1), one);
            dst.gemm(one, &blocks.get(M6), &blocks.get(W1), one);
        }
        {
            let (blocks, mut dst) = self.split(Lu);
            dst.gemm(one, a, &blocks.get(Lw), zero);
            dst.gemm(one, e, &blocks.get(W), one);
        }
        self.combine(Lv, 0.0, &[(b[6], M6), (b[4], M4), (b[2], M2)]);
        {
            let (blocks, mut dst) = self.split(Lv);
            dst.gemm(one, &blocks.get(A6), &blocks.get(Lz1), one);
            dst.gemm(one, &blocks.get(M6), &blocks.get(Z1), one);
        }
    }

    /// `R = (V − U)⁻¹(U + V)` and `L = (V − U)⁻¹(Lu + Lv + (Lu − Lv)·R)`.
    fn solve(&self, exp_a: &mut DMatrix<T>, frechet: &mut DMatrix<T>) -> Result<()> {
        let one = T::one();
        let blocks = self.read_all();
        let u = blocks.get(Block::U);
        let v = blocks.get(Block::V);
        let lu_block = blocks.get(Block::Lu);
        let lv_block = blocks.get(Block::Lv);

        let factorization = (&v - &u).lu();

        exp_a.copy_from(&u);
        exp_a.zip_apply(&v, |r, x| *r = *r + x);
        if !factorization.solve_mut(exp_a) {
            return Err(ManifoldError::numerical_error(
                "expm_frechet: V - U is singular",
            ));
        }

        frechet.copy_from(&lu_block);
        frechet.zip_apply(&lv_block, |l, x| *l = *l + x);
        frechet.gemm(one, &lu_block, &*exp_a, one);
        frechet.gemm(-one, &lv_block, &*exp_a, one);
        if !factorization.solve_mut(frechet) {
            return Err(ManifoldError::numerical_error(
                "expm_frechet: V - U is singular",
            ));
        }
        Ok(())
    }

    /// Undoes the scaling: `L ← R·L + L·R`, `R ← R·R`, `times` times.
    fn square(&mut self, exp_a: &mut DMatrix<T>, frechet: &mut DMatrix<T>, times: u32) {
        if times == 0 {
            return;
        }
        let one = T::one();
        let zero = T::zero();
        let n = self.n;
        let len = n * n;
        let (first, rest) = self.data.as_mut_slice().split_at_mut(len);
        let mut next_frechet = DMatrixViewMut::from_slice(first, n, n);
        let mut next_exp = DMatrixViewMut::from_slice(&mut rest[..len], n, n);
        for _ in 0..times {
            next_frechet.gemm(one, &*exp_a, &*frechet, zero);
            next_frechet.gemm(one, &*frechet, &*exp_a, one);
            next_exp.gemm(one, &*exp_a, &*exp_a, zero);
            frechet.copy_from(&next_frechet);
            exp_a.copy_from(&next_exp);
        }
    }
}

/// Picks the Padé order and number of squarings for a given `‖A‖₁`.
fn select_order(norm: f64) -> (usize, u32) {
    for m in [3, 5, 7, 9] {
        if norm <= ELL_TABLE_61[m] {
            return (m, 0);
        }
    }
    let s = (norm / ELL_TABLE_61[13]).log2().ceil().max(0.0);
    (13, s as u32)
}

fn check_shape<T: ComplexField>(m: &DMatrix<T>, n: usize, what: &str) -> Result<()> {
    if m.shape() != (n, n) {
        return Err(ManifoldError::dimension_mismatch(
            format!("{n}x{n} {what}"),
            format!("{}x{}", m.nrows(), m.ncols()),
        ));
    }
    Ok(())
}

/// Computes `exp(A)` and the Fréchet derivative `L(A, E)` into caller-provided
/// storage.
///
/// `exp_a` and `frechet` must be `n×n` for `n×n` inputs and `buffer` must have
/// been created for size `n`. Calling this repeatedly with the same buffer
/// performs no scratch allocations.
///
/// # Errors
///
/// - `DimensionMismatch` if `A` is not square, `E` differs in shape from `A`,
///   or the outputs or buffer are sized for a different `n`.
/// - `NumericalError` on non-finite input or a singular Padé denominator.
pub fn expm_frechet_with_buffer<T>(
    buffer: &mut PadeBuffer<T>,
    exp_a: &mut DMatrix<T>,
    frechet: &mut DMatrix<T>,
    a: &DMatrix<T>,
    e: &DMatrix<T>,
) -> Result<()>
where
    T: ComplexField + Copy,
{
    ensure_square(a, "expm_frechet")?;
    let n = a.nrows();
    check_shape(e, n, "direction")?;
    check_shape(exp_a, n, "exponential output")?;
    check_shape(frechet, n, "derivative output")?;
    if buffer.matrix_size() != n {
        return Err(ManifoldError::dimension_mismatch(
            format!("{n}x{} buffer", Block::COUNT * n),
            format!(
                "{}x{}",
                buffer.data.nrows(),
                buffer.data.ncols()
            ),
        ));
    }
    ensure_finite(a, "expm_frechet")?;
    ensure_finite(e, "expm_frechet")?;
    if n == 0 {
        return Ok(());
    }

    let norm: f64 = nalgebra::try_convert(norm_1(a))
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ManifoldError::numerical_error("expm_frechet: norm of A is not finite"))?;
    let (order, squarings) = select_order(norm);
    log::debug!("expm_frechet: n = {n}, |A|_1 = {norm:e}, order {order}, {squarings} squarings");

    exp_a.copy_from(a);
    frechet.copy_from(e);
    if squarings > 0 {
        let scale: T = nalgebra::convert(2f64.powi(-(squarings as i32)));
        *exp_a *= scale;
        *frechet *= scale;
    }

    match order {
        3 => buffer.fill_low_order(&PADE_3, exp_a, frechet),
        5 => buffer.fill_low_order(&PADE_5, exp_a, frechet),
        7 => buffer.fill_low_order(&PADE_7, exp_a, frechet),
        9 => buffer.fill_low_order(&PADE_9, exp_a, frechet),
        _ => buffer.fill_order_13(exp_a, frechet),
    }
    buffer.solve(exp_a, frechet)?;
    buffer.square(exp_a, frechet, squarings);

    if exp_a.iter().chain(frechet.iter()).any(|x| !x.is_finite()) {
        return Err(ManifoldError::numerical_error(
            "expm_frechet: result overflowed",
        ));
    }
    Ok(())
}

/// Computes `(exp(A), L(A, E))`.
///
/// Allocating wrapper around [`expm_frechet_with_buffer`]; both produce
/// identical results.
pub fn expm_frechet<T>(a: &DMatrix<T>, e: &DMatrix<T>) -> Result<(DMatrix<T>, DMatrix<T>)>
where
    T: ComplexField + Copy,
{
    ensure_square(a, "expm_frechet")?;
    let n = a.nrows();
    let mut buffer = PadeBuffer::new(n);
    let mut exp_a = DMatrix::zeros(n, n);
    let mut frechet = DMatrix::zeros(n, n);
    expm_frechet_with_buffer(&mut buffer, &mut exp_a, &mut frechet, a, e)?;
    Ok((exp_a, frechet))
}

/// Matrix exponential, computed by [`expm_frechet`] with a zero direction.
pub fn expm<T>(a: &DMatrix<T>) -> Result<DMatrix<T>>
where
    T: ComplexField + Copy,
{
    let zero = DMatrix::zeros(a.nrows(), a.ncols());
    expm_frechet(a, &zero).map(|(exp_a, _)| exp_a)
}
