//! Numerical utilities: safe matrix functions, the matrix exponential with
//! its Fréchet derivative, complex embeddings and dense tensors.

pub mod complex;
pub mod epsilon;
pub mod expm_frechet;
pub mod stability;
pub mod tensor;

pub use complex::{complexify, realify};
pub use epsilon::{real_epsilon_of, RealEpsilon};
pub use expm_frechet::{expm, expm_frechet, expm_frechet_with_buffer, PadeBuffer, ELL_TABLE_61};
pub use stability::{eigen_safe, is_normal, log_safe, norm_1, MatrixStructure};
pub use tensor::{Tensor3, Tensor4};
