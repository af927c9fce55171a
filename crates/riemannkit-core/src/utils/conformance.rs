//! Conformance harness for [`Manifold`] implementations.
//!
//! Given a manifold, sample points and tangent vectors, the harness
//! exercises every capability of the trait and compares the results against
//! the contracts they must satisfy. Each [`Check`] can be switched off, given
//! its own [`Tolerance`], or allowed to fail with specific [`ErrorKind`]s
//! (e.g. `NotImplemented` for a manifold without `log`).
//!
//! Tolerances scale with the machine epsilon of the compared values, so one
//! configuration serves `f32` and `f64` manifolds alike.
//!
//! ```rust,ignore
//! let m = Sphere::new(3);
//! let points = vec![p, q, r];
//! let vectors = vec![v];
//! let report = run_conformance(&m, &points, &vectors, &ConformanceConfig::new()).unwrap();
//! report.assert_passed();
//! ```

#![cfg(any(test, feature = "test-utils"))]

use crate::{
    error::{ErrorKind, ManifoldError, Result},
    manifold::{Manifold, Point, TangentVector},
    max_eps,
    numerical::RealEpsilon,
    types::Scalar,
};
use log::debug;
use nalgebra::{allocator::Allocator, DefaultAllocator, Dim};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A manifold contract verified by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Check {
    /// Sample points pass `check_point`.
    PointValidity,
    /// Sample vectors pass `check_vector` at their points.
    VectorValidity,
    /// The zero vector is tangent, has zero norm and `exp(p, 0) = p`.
    ZeroVector,
    /// `exp(p, log(p, q)) = q`, `log(p, p) = 0`, and `exp` yields points.
    ExpLog,
    /// `retract(p, inverse_retract(p, q)) = q`.
    RetractionInverse,
    /// Symmetry and non-negativity of `distance`, agreement with `‖log‖`.
    Distance,
    /// Parallel transport is an isometry and its reverse undoes it.
    ParallelTransport,
    /// `orthonormal_basis` has `dimension` orthonormal tangent vectors.
    Basis,
    /// Linearity of the inner product, norm homogeneity, projection
    /// idempotence on tangent vectors.
    VectorSpace,
    /// `sharp(flat(v)) = v` and `⟨v, w⟩ = flat(v) · w`.
    Musical,
    /// Seeded random generation is reproducible and yields valid samples.
    RandomReproducibility,
}

impl Check {
    /// Every check, in execution order.
    pub const ALL: [Check; 11] = [
        Check::PointValidity,
        Check::VectorValidity,
        Check::ZeroVector,
        Check::ExpLog,
        Check::RetractionInverse,
        Check::Distance,
        Check::ParallelTransport,
        Check::Basis,
        Check::VectorSpace,
        Check::Musical,
        Check::RandomReproducibility,
    ];
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Comparison tolerance in units of machine epsilon.
///
/// Two values `a`, `b` of magnitude `scale = max(‖a‖, ‖b‖)` compared at
/// epsilon `ε` agree when `‖a − b‖ ≤ ε·(atol_multiplier + rtol_multiplier·scale)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance {
    /// Absolute part, in multiples of epsilon.
    pub atol_multiplier: f64,
    /// Relative part, in multiples of epsilon.
    pub rtol_multiplier: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            atol_multiplier: 1e3,
            rtol_multiplier: 1e3,
        }
    }
}

impl Tolerance {
    /// Creates a tolerance from its two multipliers.
    pub fn new(atol_multiplier: f64, rtol_multiplier: f64) -> Self {
        Self {
            atol_multiplier,
            rtol_multiplier,
        }
    }

    /// Largest admissible error at epsilon `eps` for values of size `scale`.
    pub fn bound(&self, eps: f64, scale: f64) -> f64 {
        eps * (self.atol_multiplier + self.rtol_multiplier * scale)
    }
}

/// What the harness runs and how strictly it compares.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConformanceConfig {
    /// Checks to run.
    pub checks: BTreeSet<Check>,
    /// Tolerance for checks without an override.
    pub tolerance: Tolerance,
    /// Per-check tolerances.
    pub overrides: BTreeMap<Check, Tolerance>,
    /// Error kinds that count as a skipped rather than failed comparison.
    pub accepted_errors: BTreeMap<Check, BTreeSet<ErrorKind>>,
    /// Seed of the generators used by the harness.
    pub seed: u64,
}

impl Default for ConformanceConfig {
    fn default() -> Self {
        Self {
            checks: Check::ALL.into_iter().collect(),
            tolerance: Tolerance::default(),
            overrides: BTreeMap::new(),
            accepted_errors: BTreeMap::new(),
            seed: 42,
        }
    }
}

impl ConformanceConfig {
    /// Enables every check with the default tolerance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs only the given checks.
    pub fn with_only<I: IntoIterator<Item = Check>>(mut self, checks: I) -> Self {
        self.checks = checks.into_iter().collect();
        self
    }

    /// Disables a check.
    pub fn without(mut self, check: Check) -> Self {
        self.checks.remove(&check);
        self
    }

    /// Sets the default tolerance.
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Overrides the tolerance of one check.
    pub fn with_check_tolerance(mut self, check: Check, tolerance: Tolerance) -> Self {
        self.overrides.insert(check, tolerance);
        self
    }

    /// Lets `check` skip samples on which an operation fails with `kind`.
    pub fn accepting(mut self, check: Check, kind: ErrorKind) -> Self {
        self.accepted_errors.entry(check).or_default().insert(kind);
        self
    }

    /// Sets the generator seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Effective tolerance of `check`.
    pub fn tolerance_for(&self, check: Check) -> Tolerance {
        self.overrides.get(&check).copied().unwrap_or(self.tolerance)
    }

    fn accepts(&self, check: Check, kind: ErrorKind) -> bool {
        self.accepted_errors
            .get(&check)
            .is_some_and(|kinds| kinds.contains(&kind))
    }
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// The check.
    pub check: Check,
    /// Number of comparisons performed.
    pub comparisons: usize,
    /// Largest error observed, in the units of the compared values.
    pub max_error: f64,
    /// Samples skipped because of an accepted error.
    pub skipped: usize,
    /// Descriptions of the failed comparisons.
    pub failures: Vec<String>,
}

impl CheckOutcome {
    fn new(check: Check) -> Self {
        Self {
            check,
            comparisons: 0,
            max_error: 0.0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every comparison succeeded.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcomes of all enabled checks on one manifold.
#[derive(Debug, Clone, PartialEq)]
pub struct ConformanceReport {
    /// Name of the manifold under test.
    pub manifold: String,
    /// One outcome per enabled check.
    pub outcomes: Vec<CheckOutcome>,
}

impl ConformanceReport {
    /// Whether every check passed.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(CheckOutcome::passed)
    }

    /// Outcome of `check`, if it ran.
    pub fn outcome(&self, check: Check) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.check == check)
    }

    /// Panics with every failure message unless all checks passed.
    pub fn assert_passed(&self) {
        if self.passed() {
            return;
        }
        let mut message = format!("{} failed conformance:", self.manifold);
        for outcome in self.outcomes.iter().filter(|o| !o.passed()) {
            for failure in &outcome.failures {
                message.push_str(&format!("\n  [{}] {}", outcome.check, failure));
            }
        }
        panic!("{message}");
    }
}

/// Accumulates the comparisons of one check.
struct Recorder<'a> {
    config: &'a ConformanceConfig,
    tolerance: Tolerance,
    outcome: CheckOutcome,
}

impl<'a> Recorder<'a> {
    fn new(config: &'a ConformanceConfig, check: Check) -> Self {
        Self {
            config,
            tolerance: config.tolerance_for(check),
            outcome: CheckOutcome::new(check),
        }
    }

    /// Unwraps `result`, recording a skip or a failure on error.
    fn attempt<R>(&mut self, what: &str, result: Result<R>) -> Option<R> {
        match result {
            Ok(value) => Some(value),
            Err(e) if self.config.accepts(self.outcome.check, e.kind()) => {
                self.outcome.skipped += 1;
                None
            }
            Err(e) => {
                self.outcome.failures.push(format!("{what} failed: {e}"));
                None
            }
        }
    }

    fn require(&mut self, what: &str, condition: bool) {
        self.outcome.comparisons += 1;
        if !condition {
            self.outcome.failures.push(format!("{what} does not hold"));
        }
    }

    fn compare(&mut self, what: &str, error: f64, eps: f64, scale: f64) {
        self.outcome.comparisons += 1;
        self.outcome.max_error = self.outcome.max_error.max(error);
        let bound = self.tolerance.bound(eps, scale);
        // NaN errors fail.
        if !(error <= bound) {
            self.outcome
                .failures
                .push(format!("{what}: error {error:e} exceeds {bound:e}"));
        }
    }

    fn compare_vectors<T, D>(&mut self, what: &str, a: &Point<T, D>, b: &Point<T, D>, eps: f64)
    where
        T: Scalar,
        D: Dim,
        DefaultAllocator: Allocator<D>,
    {
        let error = (a - b).norm().to_f64();
        let scale = a.norm().to_f64().max(b.norm().to_f64());
        self.compare(what, error, eps, scale);
    }

    fn compare_scalars<T: Scalar>(&mut self, what: &str, a: T, b: T, eps: f64) {
        let (a, b) = (a.to_f64(), b.to_f64());
        self.compare(what, (a - b).abs(), eps, a.abs().max(b.abs()));
    }

    fn finish(self) -> CheckOutcome {
        debug!(
            "conformance {}: {} comparisons, {} skipped, max error {:e}, {}",
            self.outcome.check,
            self.outcome.comparisons,
            self.outcome.skipped,
            self.outcome.max_error,
            if self.outcome.passed() { "passed" } else { "FAILED" }
        );
        self.outcome
    }
}

/// Runs the enabled checks of `config` against `manifold`.
///
/// `vectors[i]` must be tangent at `points[i]`. Pairwise checks use
/// consecutive points (cyclically) and are vacuous for a single point.
///
/// # Errors
///
/// `DomainError` if `points` is empty, `DimensionMismatch` if there are more
/// vectors than points. Failures of the manifold itself are reported in the
/// returned [`ConformanceReport`], not as errors.
pub fn run_conformance<T, D, M>(
    manifold: &M,
    points: &[Point<T, D>],
    vectors: &[TangentVector<T, D>],
    config: &ConformanceConfig,
) -> Result<ConformanceReport>
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    if points.is_empty() {
        return Err(ManifoldError::domain_error("conformance needs at least one point"));
    }
    if vectors.len() > points.len() {
        return Err(ManifoldError::dimension_mismatch(
            format!("at most {} tangent vectors", points.len()),
            vectors.len(),
        ));
    }

    let samples = Samples { points, vectors };
    let mut outcomes = Vec::new();
    for check in Check::ALL.into_iter().filter(|c| config.checks.contains(c)) {
        let mut recorder = Recorder::new(config, check);
        match check {
            Check::PointValidity => point_validity(manifold, &samples, &mut recorder),
            Check::VectorValidity => vector_validity(manifold, &samples, &mut recorder),
            Check::ZeroVector => zero_vector(manifold, &samples, &mut recorder),
            Check::ExpLog => exp_log(manifold, &samples, &mut recorder),
            Check::RetractionInverse => retraction_inverse(manifold, &samples, &mut recorder),
            Check::Distance => distance(manifold, &samples, &mut recorder),
            Check::ParallelTransport => parallel_transport(manifold, &samples, &mut recorder),
            Check::Basis => basis(manifold, &samples, &mut recorder),
            Check::VectorSpace => vector_space(manifold, &samples, &mut recorder),
            Check::Musical => musical(manifold, &samples, &mut recorder),
            Check::RandomReproducibility => random_reproducibility(manifold, &mut recorder),
        }
        outcomes.push(recorder.finish());
    }
    Ok(ConformanceReport {
        manifold: manifold.name().to_string(),
        outcomes,
    })
}

struct Samples<'s, T, D>
where
    T: Scalar,
    D: Dim,
    DefaultAllocator: Allocator<D>,
{
    points: &'s [Point<T, D>],
    vectors: &'s [TangentVector<T, D>],
}

impl<'s, T, D> Samples<'s, T, D>
where
    T: Scalar,
    D: Dim,
    DefaultAllocator: Allocator<D>,
{
    /// Consecutive point pairs, wrapping around; empty for one point.
    fn pairs(&self) -> impl Iterator<Item = (&'s Point<T, D>, &'s Point<T, D>)> {
        let points = self.points;
        let n = points.len();
        let count = if n > 1 { n } else { 0 };
        (0..count).map(move |i| (&points[i], &points[(i + 1) % n]))
    }

    /// Points carrying a sample vector.
    fn with_vectors(&self) -> impl Iterator<Item = (&'s Point<T, D>, &'s TangentVector<T, D>)> {
        let (points, vectors) = (self.points, self.vectors);
        points.iter().zip(vectors.iter())
    }
}

fn point_validity<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    for (i, p) in samples.points.iter().enumerate() {
        let valid = manifold.check_point(p);
        r.require(&format!("check_point on point {i} ({valid:?})"), valid.is_ok());
    }
}

fn vector_validity<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    for (i, (p, v)) in samples.with_vectors().enumerate() {
        let valid = manifold.check_vector(p, v);
        r.require(&format!("check_vector on vector {i} ({valid:?})"), valid.is_ok());
    }
}

fn zero_vector<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    for p in samples.points {
        let eps = max_eps!(p);
        let zero = manifold.zero_tangent_vector(p);
        r.require(
            "zero vector is tangent",
            manifold.is_vector_in_tangent_space(p, &zero, T::MANIFOLD_TOLERANCE),
        );
        if let Some(n) = r.attempt("norm(p, 0)", manifold.norm(p, &zero)) {
            r.compare_scalars("norm(p, 0) = 0", n, T::zero(), eps);
        }
        if let Some(q) = r.attempt("exp(p, 0)", manifold.exp(p, &zero)) {
            r.compare_vectors("exp(p, 0) = p", &q, p, eps);
        }
    }
}

fn exp_log<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    for (p, q) in samples.pairs() {
        let eps = max_eps!(p, q);
        let Some(x) = r.attempt("log(p, q)", manifold.log(p, q)) else {
            continue;
        };
        r.require(
            "log(p, q) is tangent at p",
            manifold.is_vector_in_tangent_space(p, &x, T::MANIFOLD_TOLERANCE),
        );
        if let Some(back) = r.attempt("exp(p, log(p, q))", manifold.exp(p, &x)) {
            r.compare_vectors("exp(p, log(p, q)) = q", &back, q, eps);
        }
    }
    for p in samples.points {
        if let Some(x) = r.attempt("log(p, p)", manifold.log(p, p)) {
            let zero = manifold.zero_tangent_vector(p);
            r.compare_vectors("log(p, p) = 0", &x, &zero, max_eps!(p));
        }
    }
    for (p, v) in samples.with_vectors() {
        if let Some(q) = r.attempt("exp(p, v)", manifold.exp(p, v)) {
            r.require(
                "exp(p, v) is on the manifold",
                manifold.is_point_on_manifold(&q, T::MANIFOLD_TOLERANCE),
            );
        }
    }
}

fn retraction_inverse<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    for (p, q) in samples.pairs() {
        let Some(x) = r.attempt("inverse_retract(p, q)", manifold.inverse_retract(p, q)) else {
            continue;
        };
        if let Some(back) = r.attempt("retract(p, inverse_retract(p, q))", manifold.retract(p, &x)) {
            r.compare_vectors("retract(p, inverse_retract(p, q)) = q", &back, q, max_eps!(p, q));
        }
    }
}

fn distance<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    for p in samples.points {
        if let Some(d) = r.attempt("distance(p, p)", manifold.distance(p, p)) {
            // Square roots of rounding noise dominate d(p, p).
            r.compare_scalars("distance(p, p) = 0", d, T::zero(), max_eps!(p).sqrt());
        }
    }
    for (p, q) in samples.pairs() {
        let eps = max_eps!(p, q);
        let Some(d) = r.attempt("distance(p, q)", manifold.distance(p, q)) else {
            continue;
        };
        r.require("distance(p, q) >= 0", d >= T::zero());
        if let Some(d_rev) = r.attempt("distance(q, p)", manifold.distance(q, p)) {
            r.compare_scalars("distance(p, q) = distance(q, p)", d, d_rev, eps);
        }
        let norm_of_log = manifold.log(p, q).and_then(|x| manifold.norm(p, &x));
        if let Some(n) = r.attempt("norm(p, log(p, q))", norm_of_log) {
            r.compare_scalars("distance(p, q) = norm(p, log(p, q))", d, n, eps);
        }
    }
}

fn parallel_transport<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    let n = samples.points.len();
    if n < 2 {
        return;
    }
    for (i, (p, v)) in samples.with_vectors().enumerate() {
        let q = &samples.points[(i + 1) % n];
        let eps = max_eps!(p, q, v);
        let Some(w) = r.attempt("parallel_transport(p, q, v)", manifold.parallel_transport(p, q, v)) else {
            continue;
        };
        r.require(
            "transported vector is tangent at q",
            manifold.is_vector_in_tangent_space(q, &w, T::MANIFOLD_TOLERANCE),
        );
        let norms = manifold
            .norm(p, v)
            .and_then(|nv| manifold.norm(q, &w).map(|nw| (nv, nw)));
        if let Some((nv, nw)) = r.attempt("norms of v and its transport", norms) {
            r.compare_scalars("parallel transport preserves the norm", nw, nv, eps);
        }
        if let Some(back) = r.attempt("parallel_transport(q, p, w)", manifold.parallel_transport(q, p, &w)) {
            r.compare_vectors("transport there and back is the identity", &back, v, eps);
        }
    }
}

fn basis<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    for p in samples.points {
        let eps = max_eps!(p);
        let Some(basis) = r.attempt("orthonormal_basis(p)", manifold.orthonormal_basis(p)) else {
            continue;
        };
        r.require(
            &format!("basis has {} = dimension vectors (got {})", manifold.dimension(), basis.len()),
            basis.len() == manifold.dimension(),
        );
        for (i, bi) in basis.iter().enumerate() {
            r.require(
                &format!("basis vector {i} is tangent"),
                manifold.is_vector_in_tangent_space(p, bi, T::MANIFOLD_TOLERANCE),
            );
            for (j, bj) in basis.iter().enumerate().skip(i) {
                if let Some(ip) = r.attempt("inner product of basis vectors", manifold.inner_product(p, bi, bj)) {
                    let expected = if i == j { T::one() } else { T::zero() };
                    r.compare_scalars(&format!("<b{i}, b{j}> = δ"), ip, expected, eps);
                }
            }
        }
    }
}

fn vector_space<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    let mut rng = StdRng::seed_from_u64(r.config.seed);
    let a = <T as Scalar>::from_f64(2.5);
    let b = <T as Scalar>::from_f64(-0.75);
    for (p, v) in samples.with_vectors() {
        let eps = max_eps!(p, v);
        let Some(w) = r.attempt("random_tangent(p)", manifold.random_tangent(p, &mut rng)) else {
            continue;
        };
        let combination = v * a + &w * b;
        r.require(
            "linear combination is tangent",
            manifold.is_vector_in_tangent_space(p, &combination, T::MANIFOLD_TOLERANCE),
        );

        let inner = |x: &TangentVector<T, D>, y: &TangentVector<T, D>| manifold.inner_product(p, x, y);
        let linear = inner(&combination, v)
            .and_then(|lhs| Ok((lhs, a * inner(v, v)? + b * inner(&w, v)?)));
        if let Some((lhs, rhs)) = r.attempt("inner products", linear) {
            r.compare_scalars("inner product is linear", lhs, rhs, eps);
        }
        let symmetric = inner(v, &w).and_then(|vw| inner(&w, v).map(|wv| (vw, wv)));
        if let Some((vw, wv)) = r.attempt("inner products", symmetric) {
            r.compare_scalars("inner product is symmetric", vw, wv, eps);
        }

        let norms = manifold
            .norm(p, &(v * a))
            .and_then(|scaled| manifold.norm(p, v).map(|nv| (scaled, nv * <T as num_traits::Float>::abs(a))));
        if let Some((lhs, rhs)) = r.attempt("norms", norms) {
            r.compare_scalars("norm is absolutely homogeneous", lhs, rhs, eps);
        }

        if let Some(projected) = r.attempt("project_tangent(p, v)", manifold.project_tangent(p, v)) {
            r.compare_vectors("projection fixes tangent vectors", &projected, v, eps);
        }
    }
}

fn musical<T, D, M>(manifold: &M, samples: &Samples<'_, T, D>, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    let mut rng = StdRng::seed_from_u64(r.config.seed);
    for (p, v) in samples.with_vectors() {
        let eps = max_eps!(p, v);
        let Some(covector) = r.attempt("flat(p, v)", manifold.flat(p, v)) else {
            continue;
        };
        if let Some(back) = r.attempt("sharp(p, flat(p, v))", manifold.sharp(p, &covector)) {
            r.compare_vectors("sharp(flat(v)) = v", &back, v, eps);
        }
        let Some(w) = r.attempt("random_tangent(p)", manifold.random_tangent(p, &mut rng)) else {
            continue;
        };
        if let Some(ip) = r.attempt("inner_product(p, v, w)", manifold.inner_product(p, v, &w)) {
            r.compare_scalars("<v, w> = flat(v) · w", ip, covector.dot(&w), eps);
        }
    }
}

fn random_reproducibility<T, D, M>(manifold: &M, r: &mut Recorder<'_>)
where
    T: Scalar + RealEpsilon,
    D: Dim,
    M: Manifold<T, D> + ?Sized,
    DefaultAllocator: Allocator<D>,
{
    let mut first = StdRng::seed_from_u64(r.config.seed);
    let mut second = StdRng::seed_from_u64(r.config.seed);
    let p = manifold.random_point(&mut first);
    let q = manifold.random_point(&mut second);
    r.require("seeded random_point is reproducible", p == q);
    r.require(
        "random_point is on the manifold",
        manifold.is_point_on_manifold(&p, T::MANIFOLD_TOLERANCE),
    );

    let v = manifold.random_tangent(&p, &mut first);
    let w = manifold.random_tangent(&p, &mut second);
    let pair = v.and_then(|v| w.map(|w| (v, w)));
    if let Some((v, w)) = r.attempt("random_tangent(p)", pair) {
        r.require("seeded random_tangent is reproducible", v == w);
        r.require(
            "random_tangent is tangent",
            manifold.is_vector_in_tangent_space(&p, &v, T::MANIFOLD_TOLERANCE),
        );
    }
}
