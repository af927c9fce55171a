//! Dense 3- and 4-index arrays for differential-geometric quantities.
//!
//! Christoffel symbols and metric derivatives are 3-index arrays, the Riemann
//! tensor and second derivatives of Christoffel symbols are 4-index arrays.
//! Storage is a flat `Vec` with the first index varying fastest, matching the
//! column-major layout of nalgebra matrices.

use crate::types::{DMatrix, Scalar};
use approx::AbsDiffEq;
use num_traits::Float;
use std::ops::{Index, IndexMut};

/// A dense 3-index array `T[i, j, k]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tensor3<T> {
    dims: [usize; 3],
    data: Vec<T>,
}

/// A dense 4-index array `T[i, j, k, l]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tensor4<T> {
    dims: [usize; 4],
    data: Vec<T>,
}

impl<T: Scalar> Tensor3<T> {
    /// A zero tensor of the given shape.
    pub fn zeros(d0: usize, d1: usize, d2: usize) -> Self {
        Self {
            dims: [d0, d1, d2],
            data: vec![T::zero(); d0 * d1 * d2],
        }
    }

    /// Builds a tensor from a function of its indices.
    pub fn from_fn(dims: [usize; 3], mut f: impl FnMut(usize, usize, usize) -> T) -> Self {
        let mut out = Self::zeros(dims[0], dims[1], dims[2]);
        for k in 0..dims[2] {
            for j in 0..dims[1] {
                for i in 0..dims[0] {
                    out[(i, j, k)] = f(i, j, k);
                }
            }
        }
        out
    }

    /// Shape of the tensor.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Flat view of the entries, first index fastest.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The matrix `(i, j) ↦ T[i, j, k]` for fixed `k`.
    pub fn slice_last(&self, k: usize) -> DMatrix<T> {
        DMatrix::from_fn(self.dims[0], self.dims[1], |i, j| self[(i, j, k)])
    }

    /// Writes the matrix `m` into the slice `T[:, :, k]`.
    pub fn set_slice_last(&mut self, k: usize, m: &DMatrix<T>) {
        for j in 0..self.dims[1] {
            for i in 0..self.dims[0] {
                self[(i, j, k)] = m[(i, j)];
            }
        }
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &v| <T as Float>::max(acc, <T as Float>::abs(v)))
    }

    fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.dims[0] && j < self.dims[1] && k < self.dims[2]);
        i + self.dims[0] * (j + self.dims[1] * k)
    }
}

impl<T: Scalar> Index<(usize, usize, usize)> for Tensor3<T> {
    type Output = T;

    fn index(&self, (i, j, k): (usize, usize, usize)) -> &T {
        &self.data[self.offset(i, j, k)]
    }
}

impl<T: Scalar> IndexMut<(usize, usize, usize)> for Tensor3<T> {
    fn index_mut(&mut self, (i, j, k): (usize, usize, usize)) -> &mut T {
        let offset = self.offset(i, j, k);
        &mut self.data[offset]
    }
}

impl<T: Scalar> Tensor4<T> {
    /// A zero tensor of the given shape.
    pub fn zeros(d0: usize, d1: usize, d2: usize, d3: usize) -> Self {
        Self {
            dims: [d0, d1, d2, d3],
            data: vec![T::zero(); d0 * d1 * d2 * d3],
        }
    }

    /// Builds a tensor from a function of its indices.
    pub fn from_fn(dims: [usize; 4], mut f: impl FnMut(usize, usize, usize, usize) -> T) -> Self {
        let mut out = Self::zeros(dims[0], dims[1], dims[2], dims[3]);
        for l in 0..dims[3] {
            for k in 0..dims[2] {
                for j in 0..dims[1] {
                    for i in 0..dims[0] {
                        out[(i, j, k, l)] = f(i, j, k, l);
                    }
                }
            }
        }
        out
    }

    /// Shape of the tensor.
    pub fn dims(&self) -> [usize; 4] {
        self.dims
    }

    /// Flat view of the entries, first index fastest.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Contracts the first index with the third: `C[j, l] = Σ_i T[i, j, i, l]`.
    ///
    /// For the Riemann tensor `R[l, i, j, k]` this is the Ricci tensor.
    pub fn contract_first_third(&self) -> DMatrix<T> {
        let [d0, d1, d2, d3] = self.dims;
        debug_assert_eq!(d0, d2);
        DMatrix::from_fn(d1, d3, |j, l| {
            (0..d0.min(d2)).fold(T::zero(), |acc, i| acc + self[(i, j, i, l)])
        })
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &v| <T as Float>::max(acc, <T as Float>::abs(v)))
    }

    fn offset(&self, i: usize, j: usize, k: usize, l: usize) -> usize {
        debug_assert!(
            i < self.dims[0] && j < self.dims[1] && k < self.dims[2] && l < self.dims[3]
        );
        i + self.dims[0] * (j + self.dims[1] * (k + self.dims[2] * l))
    }
}

impl<T: Scalar> Index<(usize, usize, usize, usize)> for Tensor4<T> {
    type Output = T;

    fn index(&self, (i, j, k, l): (usize, usize, usize, usize)) -> &T {
        &self.data[self.offset(i, j, k, l)]
    }
}

impl<T: Scalar> IndexMut<(usize, usize, usize, usize)> for Tensor4<T> {
    fn index_mut(&mut self, (i, j, k, l): (usize, usize, usize, usize)) -> &mut T {
        let offset = self.offset(i, j, k, l);
        &mut self.data[offset]
    }
}

macro_rules! impl_abs_diff_eq {
    ($tensor:ident) => {
        impl<T: Scalar> AbsDiffEq for $tensor<T> {
            type Epsilon = T;

            fn default_epsilon() -> T {
                T::EPSILON
            }

            fn abs_diff_eq(&self, other: &Self, epsilon: T) -> bool {
                self.dims == other.dims
                    && self
                        .data
                        .iter()
                        .zip(&other.data)
                        .all(|(&a, &b)| <T as Float>::abs(a - b) <= epsilon)
            }
        }
    };
}

impl_abs_diff_eq!(Tensor3);
impl_abs_diff_eq!(Tensor4);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tensor3_layout() {
        let t = Tensor3::<f64>::from_fn([2, 3, 4], |i, j, k| (100 * i + 10 * j + k) as f64);
        assert_eq!(t.dims(), [2, 3, 4]);
        assert_eq!(t[(1, 2, 3)], 123.0);
        assert_eq!(t.as_slice()[1], 100.0);
        let slice = t.slice_last(2);
        assert_eq!(slice[(1, 1)], 112.0);
    }

    #[test]
    fn test_tensor3_set_slice() {
        let mut t = Tensor3::<f64>::zeros(2, 2, 2);
        t.set_slice_last(1, &DMatrix::from_element(2, 2, 3.0));
        assert_eq!(t[(0, 1, 1)], 3.0);
        assert_eq!(t[(0, 1, 0)], 0.0);
        assert_eq!(t.max_abs(), 3.0);
    }

    #[test]
    fn test_tensor4_contraction() {
        let t = Tensor4::<f64>::from_fn([2, 2, 2, 2], |i, j, k, l| {
            if i == k { (1 + j + 2 * l) as f64 } else { 5.0 }
        });
        let c = t.contract_first_third();
        assert_eq!(c[(0, 0)], 2.0);
        assert_eq!(c[(1, 1)], 8.0);
    }

    #[test]
    fn test_abs_diff_eq() {
        let a = Tensor3::<f64>::zeros(2, 2, 2);
        let mut b = a.clone();
        b[(1, 1, 1)] = 1e-12;
        assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        assert!(!a.abs_diff_eq(&Tensor3::zeros(2, 2, 3), 1.0));
    }
}
