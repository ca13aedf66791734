//! The detector battery.
//!
//! Every detector looks at the same three terms and either returns a
//! [`Prediction`] or a [`Rejection`] saying why its pattern does not apply.
//! Detectors are stateless; dispatch is a plain `match` over [`DetectorKind`].

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::poly::{common_step, differences, eval_polynomial, fit_quadratic, nearest_integer};
use super::{Pattern, Prediction, Sequence};

/// Absolute tolerance for every exact-match comparison.
pub const EPSILON: f64 = 1e-10;

/// Relative deviation accepted by the approximate arithmetic/geometric branches.
const APPROX_TOLERANCE: f64 = 0.1;

const FIB_WEIGHT_WINDOW: RangeInclusive<f64> = 0.8..=1.2;

const FACTORIALS: [f64; 8] = [1.0, 1.0, 2.0, 6.0, 24.0, 120.0, 720.0, 5040.0];

const POWER_BASES: [u32; 5] = [2, 3, 4, 5, 10];

/// Why a detector declined a sequence.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("a zero term leaves the ratio undefined")]
    ZeroTerm,
    #[error("a non-positive term has no logarithm")]
    NonPositiveTerm,
    #[error("a negative term has no real root")]
    NegativeTerm,
    #[error("terms do not fit the pattern")]
    NoFit,
    #[error("the extrapolated value is undefined")]
    Undefined,
}

pub type Detection = Result<Prediction, Rejection>;

/// Name of a single pattern detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    Arithmetic,
    Geometric,
    Polynomial,
    Fibonacci,
    Quadratic,
    Exponential,
    Factorial,
    Power,
    Harmonic,
    Custom,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 10] = [
        DetectorKind::Arithmetic,
        DetectorKind::Geometric,
        DetectorKind::Polynomial,
        DetectorKind::Fibonacci,
        DetectorKind::Quadratic,
        DetectorKind::Exponential,
        DetectorKind::Factorial,
        DetectorKind::Power,
        DetectorKind::Harmonic,
        DetectorKind::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DetectorKind::Arithmetic => "arithmetic",
            DetectorKind::Geometric => "geometric",
            DetectorKind::Polynomial => "polynomial",
            DetectorKind::Fibonacci => "fibonacci",
            DetectorKind::Quadratic => "quadratic",
            DetectorKind::Exponential => "exponential",
            DetectorKind::Factorial => "factorial",
            DetectorKind::Power => "power",
            DetectorKind::Harmonic => "harmonic",
            DetectorKind::Custom => "custom",
        }
    }

    /// Run this detector against `seq`.
    ///
    /// A NaN extrapolation (overflowing terms) is reported as
    /// [`Rejection::Undefined`] rather than as a match.
    pub fn detect(self, seq: Sequence) -> Detection {
        let detection = match self {
            DetectorKind::Arithmetic => arithmetic(seq),
            DetectorKind::Geometric => geometric(seq),
            DetectorKind::Polynomial => polynomial(seq),
            DetectorKind::Fibonacci => fibonacci(seq),
            DetectorKind::Quadratic => perfect_squares(seq).or_else(|_| triangular(seq)),
            DetectorKind::Exponential => exponential(seq),
            DetectorKind::Factorial => factorial(seq),
            DetectorKind::Power => power(seq),
            DetectorKind::Harmonic => harmonic(seq),
            DetectorKind::Custom => alternating(seq).or_else(|_| higher_order(seq)),
        };
        detection.and_then(|p| if p.value.is_nan() { Err(Rejection::Undefined) } else { Ok(p) })
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown detector '{0}' (expected one of: arithmetic, geometric, polynomial, fibonacci, quadratic, exponential, factorial, power, harmonic, custom)")]
pub struct UnknownDetector(pub String);

impl FromStr for DetectorKind {
    type Err = UnknownDetector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DetectorKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownDetector(s.to_string()))
    }
}

fn arithmetic(seq: Sequence) -> Detection {
    let [d1, d2] = differences(seq);
    if (d1 - d2).abs() < EPSILON {
        return Ok(Prediction::new(seq[2] + d1, Pattern::Arithmetic, 0.95));
    }
    let avg = (d1 + d2) / 2.0;
    if (d1 - d2).abs() / avg.abs().max(1.0) < APPROX_TOLERANCE {
        return Ok(Prediction::new(seq[2] + avg, Pattern::ApproximateArithmetic, 0.7));
    }
    Err(Rejection::NoFit)
}

fn geometric(seq: Sequence) -> Detection {
    let [a, b, c] = seq;
    if a == 0.0 || b == 0.0 {
        return Err(Rejection::ZeroTerm);
    }
    let (r1, r2) = (b / a, c / b);
    if (r1 - r2).abs() < EPSILON {
        return Ok(Prediction::new(c * r1, Pattern::Geometric, 0.95));
    }
    let avg = (r1 + r2) / 2.0;
    if (r1 - r2).abs() / avg.abs() < APPROX_TOLERANCE {
        return Ok(Prediction::new(c * avg, Pattern::ApproximateGeometric, 0.7));
    }
    Err(Rejection::NoFit)
}

fn polynomial(seq: Sequence) -> Detection {
    let [d1, d2] = differences(seq);
    let dd = d2 - d1;
    if dd.abs() < EPSILON {
        Ok(Prediction::new(seq[2] + d2, Pattern::LinearPolynomial, 0.9))
    } else {
        Ok(Prediction::new(seq[2] + d2 + dd, Pattern::QuadraticPolynomial, 0.8))
    }
}

fn fibonacci(seq: Sequence) -> Detection {
    let [a, b, c] = seq;
    if (c - (a + b)).abs() < EPSILON {
        return Ok(Prediction::new(b + c, Pattern::Fibonacci, 0.9));
    }
    if a != 0.0 && a + b != 0.0 {
        let weight = c / (a + b);
        if FIB_WEIGHT_WINDOW.contains(&weight) {
            return Ok(Prediction::new(weight * (b + c), Pattern::WeightedFibonacci, 0.6));
        }
    }
    Err(Rejection::NoFit)
}

fn integral_terms(values: [f64; 3]) -> Option<[f64; 3]> {
    let mut ints = [0.0; 3];
    for (slot, &v) in ints.iter_mut().zip(values.iter()) {
        *slot = nearest_integer(v, EPSILON)?;
    }
    Some(ints)
}

fn perfect_squares(seq: Sequence) -> Detection {
    if seq.iter().any(|&x| x < 0.0) {
        return Err(Rejection::NegativeTerm);
    }
    let roots = integral_terms(seq.map(f64::sqrt)).ok_or(Rejection::NoFit)?;
    let step = common_step(roots).ok_or(Rejection::NoFit)?;
    let next = roots[2] + step;
    Ok(Prediction::new(next * next, Pattern::PerfectSquares, 0.85))
}

/// Real `n` with `n(n+1)/2 = x`; non-positive terms down to -1/8 map to 0.
fn triangular_index(x: f64) -> Result<f64, Rejection> {
    if x > 0.0 {
        Ok(((1.0 + 8.0 * x).sqrt() - 1.0) / 2.0)
    } else if 1.0 + 8.0 * x >= 0.0 {
        Ok(0.0)
    } else {
        Err(Rejection::NegativeTerm)
    }
}

fn triangular(seq: Sequence) -> Detection {
    let mut indices = [0.0; 3];
    for (slot, &x) in indices.iter_mut().zip(seq.iter()) {
        *slot = triangular_index(x)?;
    }
    let ns = integral_terms(indices).ok_or(Rejection::NoFit)?;
    let step = common_step(ns).ok_or(Rejection::NoFit)?;
    let next = ns[2] + step;
    Ok(Prediction::new(next * (next + 1.0) / 2.0, Pattern::Triangular, 0.85))
}

fn exponential(seq: Sequence) -> Detection {
    if seq.iter().any(|&x| x <= 0.0) {
        return Err(Rejection::NonPositiveTerm);
    }
    let logs = seq.map(f64::ln);
    let [d1, d2] = differences(logs);
    if (d1 - d2).abs() < EPSILON {
        return Ok(Prediction::new((logs[2] + d1).exp(), Pattern::Exponential, 0.8));
    }
    Err(Rejection::NoFit)
}

fn factorial(seq: Sequence) -> Detection {
    FACTORIALS
        .windows(4)
        .find(|w| w.iter().zip(seq.iter()).all(|(f, x)| (x - f).abs() < EPSILON))
        .map(|w| Prediction::new(w[3], Pattern::Factorial, 0.9))
        .ok_or(Rejection::NoFit)
}

fn power(seq: Sequence) -> Detection {
    if seq.iter().any(|&x| x <= 0.0) {
        return Err(Rejection::NonPositiveTerm);
    }
    for base in POWER_BASES {
        let ln_base = f64::from(base).ln();
        let Some(powers) = integral_terms(seq.map(|x| x.ln() / ln_base)) else {
            continue;
        };
        if common_step(powers) == Some(1.0) {
            // |powers| stays near 1100 for finite terms
            let next = f64::from(base).powi(powers[2] as i32 + 1);
            return Ok(Prediction::new(next, Pattern::Powers { base }, 0.85));
        }
    }
    Err(Rejection::NoFit)
}

fn harmonic(seq: Sequence) -> Detection {
    if seq.iter().any(|&x| x == 0.0) {
        return Err(Rejection::ZeroTerm);
    }
    let reciprocals = seq.map(f64::recip);
    let [d1, d2] = differences(reciprocals);
    if (d1 - d2).abs() < EPSILON {
        let next_reciprocal = reciprocals[2] + d1;
        let next = if next_reciprocal == 0.0 { f64::INFINITY } else { next_reciprocal.recip() };
        return Ok(Prediction::new(next, Pattern::Harmonic, 0.8));
    }
    Err(Rejection::NoFit)
}

fn alternating(seq: Sequence) -> Detection {
    let signs = seq.map(|x| if x >= 0.0 { 1.0 } else { -1.0 });
    if signs.iter().all(|&s| s == signs[0]) {
        return Err(Rejection::NoFit);
    }
    // Mixed signs are exactly two distinct values, so the next term flips.
    let inner = arithmetic(seq.map(f64::abs))?;
    Ok(Prediction::new(
        -signs[2] * inner.value,
        Pattern::Alternating(Box::new(inner.pattern)),
        inner.confidence * 0.8,
    ))
}

fn higher_order(seq: Sequence) -> Detection {
    let coeffs = fit_quadratic(seq);
    Ok(Prediction::new(eval_polynomial(&coeffs, 3.0), Pattern::HigherOrderPolynomial, 0.6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::E;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn arithmetic_exact_and_approximate() {
        let p = DetectorKind::Arithmetic.detect([1.0, 3.0, 5.0]).unwrap();
        assert_eq!(p.value, 7.0);
        assert_eq!(p.pattern, Pattern::Arithmetic);
        assert_eq!(p.confidence, 0.95);

        let p = DetectorKind::Arithmetic.detect([1.0, 2.0, 3.05]).unwrap();
        assert_close(p.value, 4.075);
        assert_eq!(p.pattern, Pattern::ApproximateArithmetic);
        assert_eq!(p.confidence, 0.7);

        assert_eq!(DetectorKind::Arithmetic.detect([1.0, 2.0, 4.0]), Err(Rejection::NoFit));
    }

    #[test]
    fn geometric_rejects_zero_terms() {
        assert_eq!(DetectorKind::Geometric.detect([0.0, 1.0, 2.0]), Err(Rejection::ZeroTerm));
        assert_eq!(DetectorKind::Geometric.detect([1.0, 0.0, 0.0]), Err(Rejection::ZeroTerm));
        // c == 0 is allowed: r2 is just zero
        assert_eq!(DetectorKind::Geometric.detect([1.0, 2.0, 0.0]), Err(Rejection::NoFit));
    }

    #[test]
    fn geometric_exact_and_approximate() {
        let p = DetectorKind::Geometric.detect([2.0, 6.0, 18.0]).unwrap();
        assert_eq!(p.value, 54.0);
        assert_eq!(p.pattern, Pattern::Geometric);

        let p = DetectorKind::Geometric.detect([1.0, 2.0, 4.2]).unwrap();
        assert_close(p.value, 4.2 * 2.05);
        assert_eq!(p.pattern, Pattern::ApproximateGeometric);
        assert_eq!(p.confidence, 0.7);
    }

    #[test]
    fn polynomial_always_matches() {
        let p = DetectorKind::Polynomial.detect([2.0, 4.0, 6.0]).unwrap();
        assert_eq!((p.value, p.pattern, p.confidence), (8.0, Pattern::LinearPolynomial, 0.9));

        let p = DetectorKind::Polynomial.detect([1.0, 4.0, 9.0]).unwrap();
        assert_eq!((p.value, p.pattern, p.confidence), (16.0, Pattern::QuadraticPolynomial, 0.8));

        let p = DetectorKind::Polynomial.detect([3.0, 17.0, 4.0]).unwrap();
        assert_eq!(p.value, -36.0);
    }

    #[test]
    fn fibonacci_exact_and_weighted() {
        let p = DetectorKind::Fibonacci.detect([2.0, 3.0, 5.0]).unwrap();
        assert_eq!((p.value, p.pattern, p.confidence), (8.0, Pattern::Fibonacci, 0.9));

        let p = DetectorKind::Fibonacci.detect([1.0, 2.0, 3.2]).unwrap();
        assert_close(p.value, 3.2 / 3.0 * 5.2);
        assert_eq!(p.pattern, Pattern::WeightedFibonacci);
        assert_eq!(p.confidence, 0.6);

        // weighted branch needs a != 0 and a + b != 0
        assert_eq!(DetectorKind::Fibonacci.detect([0.0, 2.0, 2.1]), Err(Rejection::NoFit));
        assert_eq!(DetectorKind::Fibonacci.detect([1.0, -1.0, 5.0]), Err(Rejection::NoFit));
        assert_eq!(DetectorKind::Fibonacci.detect([1.0, 2.0, 9.0]), Err(Rejection::NoFit));
    }

    #[test]
    fn quadratic_shapes() {
        let p = DetectorKind::Quadratic.detect([1.0, 4.0, 9.0]).unwrap();
        assert_eq!((p.value, p.pattern, p.confidence), (16.0, Pattern::PerfectSquares, 0.85));

        let p = DetectorKind::Quadratic.detect([1.0, 3.0, 6.0]).unwrap();
        assert_eq!((p.value, p.pattern, p.confidence), (10.0, Pattern::Triangular, 0.85));

        // squares with a step of two roots
        let p = DetectorKind::Quadratic.detect([1.0, 9.0, 25.0]).unwrap();
        assert_eq!(p.value, 49.0);

        assert!(DetectorKind::Quadratic.detect([-1.0, 0.0, 1.0]).is_err());
        assert_eq!(DetectorKind::Quadratic.detect([2.0, 5.0, 7.0]), Err(Rejection::NoFit));
    }

    #[test]
    fn quadratic_handles_roots_past_i64() {
        // roots 1e20, 2e20, 3e20
        let p = DetectorKind::Quadratic.detect([1e40, 4e40, 9e40]).unwrap();
        assert_eq!(p.pattern, Pattern::PerfectSquares);
        assert!((p.value / 1.6e41 - 1.0).abs() < 1e-12, "got {}", p.value);

        // roots 1, 2^62, 1e20 do not progress evenly
        assert_eq!(DetectorKind::Quadratic.detect([1.0, 2f64.powi(124), 1e40]), Err(Rejection::NoFit));
    }

    #[test]
    fn triangular_index_domain() {
        assert_eq!(triangular_index(10.0), Ok(4.0));
        assert_eq!(triangular_index(0.0), Ok(0.0));
        assert_eq!(triangular_index(-0.125), Ok(0.0));
        assert_eq!(triangular_index(-1.0), Err(Rejection::NegativeTerm));
    }

    #[test]
    fn exponential_needs_positive_terms() {
        let p = DetectorKind::Exponential.detect([1.0, E, E * E]).unwrap();
        assert!((p.value - E.powi(3)).abs() < 1e-9);
        assert_eq!(p.pattern, Pattern::Exponential);
        assert_eq!(p.confidence, 0.8);

        assert_eq!(DetectorKind::Exponential.detect([0.0, 1.0, 2.0]), Err(Rejection::NonPositiveTerm));
        assert_eq!(DetectorKind::Exponential.detect([1.0, 2.0, 3.0]), Err(Rejection::NoFit));
    }

    #[test]
    fn factorial_table_windows() {
        let p = DetectorKind::Factorial.detect([1.0, 2.0, 6.0]).unwrap();
        assert_eq!((p.value, p.pattern, p.confidence), (24.0, Pattern::Factorial, 0.9));
        assert_eq!(DetectorKind::Factorial.detect([24.0, 120.0, 720.0]).unwrap().value, 5040.0);
        assert_eq!(DetectorKind::Factorial.detect([1.0, 1.0, 2.0]).unwrap().value, 6.0);
        // the last window has no following entry
        assert_eq!(DetectorKind::Factorial.detect([120.0, 720.0, 5040.0]), Err(Rejection::NoFit));
    }

    #[test]
    fn power_names_the_base() {
        let p = DetectorKind::Power.detect([2.0, 4.0, 8.0]).unwrap();
        assert_eq!((p.value, p.confidence), (16.0, 0.85));
        assert_eq!(p.pattern, Pattern::Powers { base: 2 });
        assert_eq!(p.pattern.to_string(), "Powers of 2");

        let p = DetectorKind::Power.detect([3.0, 9.0, 27.0]).unwrap();
        assert_eq!((p.value, p.pattern), (81.0, Pattern::Powers { base: 3 }));

        // log2 steps by two, so base 4 is the first to match
        let p = DetectorKind::Power.detect([4.0, 16.0, 64.0]).unwrap();
        assert_eq!((p.value, p.pattern), (256.0, Pattern::Powers { base: 4 }));

        let p = DetectorKind::Power.detect([1.0, 10.0, 100.0]).unwrap();
        assert_eq!((p.value, p.pattern), (1000.0, Pattern::Powers { base: 10 }));

        assert_eq!(DetectorKind::Power.detect([-2.0, 4.0, 8.0]), Err(Rejection::NonPositiveTerm));
        assert_eq!(DetectorKind::Power.detect([2.0, 8.0, 32.0]), Err(Rejection::NoFit));
    }

    #[test]
    fn harmonic_reciprocals() {
        let p = DetectorKind::Harmonic.detect([1.0, 0.5, 1.0 / 3.0]).unwrap();
        assert!((p.value - 0.25).abs() < 1e-12);
        assert_eq!((p.pattern, p.confidence), (Pattern::Harmonic, 0.8));

        // reciprocals 3, 2, 1 run out at zero
        let p = DetectorKind::Harmonic.detect([1.0 / 3.0, 0.5, 1.0]).unwrap();
        assert_eq!(p.value, f64::INFINITY);

        assert_eq!(DetectorKind::Harmonic.detect([1.0, 0.0, 2.0]), Err(Rejection::ZeroTerm));
    }

    #[test]
    fn custom_alternating_then_polynomial_fit() {
        let p = DetectorKind::Custom.detect([1.0, -1.0, 1.0]).unwrap();
        assert_eq!(p.value, -1.0);
        assert_eq!(p.pattern.to_string(), "Alternating Arithmetic Sequence");
        assert_close(p.confidence, 0.95 * 0.8);

        let p = DetectorKind::Custom.detect([-2.0, 4.0, -6.0]).unwrap();
        assert_eq!(p.value, 8.0);

        // |1|, |-2|, |4| is not arithmetic, so the quadratic fit answers
        let p = DetectorKind::Custom.detect([1.0, -2.0, 4.0]).unwrap();
        assert_eq!((p.value, p.pattern, p.confidence), (19.0, Pattern::HigherOrderPolynomial, 0.6));

        let p = DetectorKind::Custom.detect([1.0, 4.0, 9.0]).unwrap();
        assert_eq!(p.value, 16.0);
    }

    #[test]
    fn nan_extrapolation_is_rejected() {
        // the quadratic fit overflows to inf - inf
        let huge = f64::MAX;
        assert_eq!(DetectorKind::Custom.detect([0.0, huge, huge]), Err(Rejection::Undefined));
    }

    #[test]
    fn detector_names_round_trip() {
        for kind in DetectorKind::ALL {
            assert_eq!(kind.name().parse::<DetectorKind>(), Ok(kind));
        }
        assert_eq!(" Harmonic ".parse::<DetectorKind>(), Ok(DetectorKind::Harmonic));
        assert!("prime".parse::<DetectorKind>().is_err());
    }
}
