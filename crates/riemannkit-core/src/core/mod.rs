//! Core traits and types: errors, scalars and the manifold interface.

pub mod error;
pub mod manifold;
pub mod types;

pub use error::*;
pub use manifold::*;
pub use types::*;
