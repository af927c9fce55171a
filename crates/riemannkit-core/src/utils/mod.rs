//! Test support shared with downstream crates through the `test-utils` feature.

#[cfg(any(test, feature = "test-utils"))]
pub mod conformance;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_manifolds;
