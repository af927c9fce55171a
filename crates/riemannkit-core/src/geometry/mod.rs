//! Differential geometry of manifolds carrying an explicit metric tensor.

pub mod curvature;
pub mod differentiation;
pub mod geodesic;
pub mod metric;

pub use differentiation::FiniteDifference;
pub use geodesic::GeodesicSolver;
pub use metric::{DefaultMetric, Metric, MetricManifold};
