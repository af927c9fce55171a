//! Christoffel symbols and curvature tensors of a metric manifold.
//!
//! All quantities are computed in the chart of the point representation from
//! the local metric `g_ij` and its numerical derivatives. Index conventions:
//!
//! | quantity | array index | meaning |
//! |----------|-------------|---------|
//! | metric Jacobian | `[i, j, k]` | `∂_k g_ij` |
//! | Christoffel, first kind | `[i, j, k]` | `Γ_ijk = ½(∂_i g_kj + ∂_j g_ik − ∂_k g_ij)` |
//! | Christoffel, second kind | `[l, i, j]` | `Γˡ_ij = g^{kl} Γ_ijk` |
//! | its Jacobian | `[l, i, j, k]` | `∂_k Γˡ_ij` |
//! | Riemann | `[l, i, j, k]` | `Rˡ_ijk = ∂_j Γˡ_ik − ∂_k Γˡ_ij + Γˢ_ik Γˡ_sj − Γˢ_ij Γˡ_sk` |
//! | Ricci | `[i, j]` | `Ric_ij = Rˡ_ilj` |
//!
//! With this convention the hyperbolic plane has Gaussian curvature −1 and
//! the round sphere +1.

use crate::{
    error::{ManifoldError, Result},
    geometry::metric::{Metric, MetricManifold},
    numerical::tensor::{Tensor3, Tensor4},
    types::{DMatrix, DVector, Scalar},
};

impl<M, G> MetricManifold<M, G> {
    /// Numerical Jacobian of the local metric, `[i, j, k] = ∂_k g_ij`.
    pub fn local_metric_jacobian<T>(&self, point: &DVector<T>) -> Result<Tensor3<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        self.finite_difference()
            .matrix_jacobian(point, |x| self.local_metric(x))
    }

    /// Christoffel symbols of the first kind, `[i, j, k] = Γ_ijk`.
    pub fn christoffel_symbols_first<T>(&self, point: &DVector<T>) -> Result<Tensor3<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        let dg = self.local_metric_jacobian(point)?;
        let n = point.len();
        let half = <T as Scalar>::from_f64(0.5);
        Ok(Tensor3::from_fn([n, n, n], |i, j, k| {
            half * (dg[(k, j, i)] + dg[(i, k, j)] - dg[(i, j, k)])
        }))
    }

    /// Christoffel symbols of the second kind, `[l, i, j] = Γˡ_ij`.
    pub fn christoffel_symbols_second<T>(&self, point: &DVector<T>) -> Result<Tensor3<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        let g_inv = self.inverse_local_metric(point)?;
        let first = self.christoffel_symbols_first(point)?;
        let n = point.len();
        Ok(Tensor3::from_fn([n, n, n], |l, i, j| {
            (0..n).fold(T::zero(), |acc, k| acc + g_inv[(k, l)] * first[(i, j, k)])
        }))
    }

    /// Numerical Jacobian of the second-kind symbols, `[l, i, j, k] = ∂_k Γˡ_ij`.
    pub fn christoffel_symbols_second_jacobian<T>(&self, point: &DVector<T>) -> Result<Tensor4<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        self.finite_difference()
            .tensor_jacobian(point, |x| self.christoffel_symbols_second(x))
    }

    /// Riemann curvature tensor, `[l, i, j, k] = Rˡ_ijk`.
    pub fn riemann_tensor<T>(&self, point: &DVector<T>) -> Result<Tensor4<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        let gamma = self.christoffel_symbols_second(point)?;
        let d_gamma = self.christoffel_symbols_second_jacobian(point)?;
        let n = point.len();
        Ok(Tensor4::from_fn([n, n, n, n], |l, i, j, k| {
            let quadratic = (0..n).fold(T::zero(), |acc, s| {
                acc + gamma[(s, i, k)] * gamma[(l, s, j)] - gamma[(s, i, j)] * gamma[(l, s, k)]
            });
            d_gamma[(l, i, k, j)] - d_gamma[(l, i, j, k)] + quadratic
        }))
    }

    /// Ricci tensor, `Ric_ij = Rˡ_ilj`.
    pub fn ricci_tensor<T>(&self, point: &DVector<T>) -> Result<DMatrix<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        Ok(self.riemann_tensor(point)?.contract_first_third())
    }

    /// Ricci (scalar) curvature, `g^{ij} Ric_ij`.
    pub fn ricci_curvature<T>(&self, point: &DVector<T>) -> Result<T>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        let g_inv = self.inverse_local_metric(point)?;
        let ricci = self.ricci_tensor(point)?;
        Ok(g_inv.component_mul(&ricci).sum())
    }

    /// Alias of [`ricci_curvature`](Self::ricci_curvature).
    pub fn scalar_curvature<T>(&self, point: &DVector<T>) -> Result<T>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        self.ricci_curvature(point)
    }

    /// Gaussian curvature, half the scalar curvature. Meaningful on surfaces.
    pub fn gaussian_curvature<T>(&self, point: &DVector<T>) -> Result<T>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        Ok(self.ricci_curvature(point)? * <T as Scalar>::from_f64(0.5))
    }

    /// Einstein tensor, `Ric − ½ g S` with `S` the scalar curvature.
    pub fn einstein_tensor<T>(&self, point: &DVector<T>) -> Result<DMatrix<T>>
    where
        T: Scalar,
        G: Metric<T, M>,
    {
        let g = self.local_metric(point)?;
        let g_inv = g
            .clone()
            .try_inverse()
            .ok_or_else(|| ManifoldError::numerical_error("local metric is not invertible"))?;
        let ricci = self.ricci_tensor(point)?;
        let scalar = g_inv.component_mul(&ricci).sum();
        Ok(ricci - g * (scalar * <T as Scalar>::from_f64(0.5)))
    }
}
