//! Next-term prediction for three-term sequences.
//!
//! A [`Predictor`] runs an ordered registry of [`DetectorKind`]s against the
//! same three terms and keeps the candidate with the strictly greatest
//! confidence; on a tie the earliest registered detector wins. When nothing
//! matches, a linear extrapolation at confidence 0.3 is returned.
//!
//! Quick start
//! ```
//! use sequence_predictor::predictor::{Pattern, Predictor};
//!
//! let predictor = Predictor::new();
//! let p = predictor.predict(&[2.0, 6.0, 18.0]).unwrap();
//! assert_eq!(p.value, 54.0);
//! assert_eq!(p.pattern, Pattern::Geometric);
//! assert!(p.confidence > 0.9);
//! ```
//!
//! Notes
//! - Predictions are pure functions of the input; `Predictor` is `Send + Sync`
//!   and can be shared across threads without locking.
//! - [`Predictor::predict_many`] fans a batch out over rayon's global pool.

use std::borrow::Cow;
use std::fmt;

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

mod detectors;
mod poly;

pub use detectors::{Detection, DetectorKind, Rejection, UnknownDetector, EPSILON};

/// Three observed terms, oldest first.
pub type Sequence = [f64; 3];

/// Confidence reported by the linear-extrapolation fallback.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Registry order used by [`Predictor::new`].
///
/// Shape-specific detectors come before the generic finite-difference fit
/// so they win confidence ties against it.
pub const DEFAULT_DETECTORS: [DetectorKind; 10] = [
    DetectorKind::Arithmetic,
    DetectorKind::Geometric,
    DetectorKind::Fibonacci,
    DetectorKind::Quadratic,
    DetectorKind::Exponential,
    DetectorKind::Factorial,
    DetectorKind::Power,
    DetectorKind::Harmonic,
    DetectorKind::Polynomial,
    DetectorKind::Custom,
];

/// Pattern recognised in a sequence. `Display` gives the human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Arithmetic,
    ApproximateArithmetic,
    Geometric,
    ApproximateGeometric,
    LinearPolynomial,
    QuadraticPolynomial,
    Fibonacci,
    WeightedFibonacci,
    PerfectSquares,
    Triangular,
    Exponential,
    Factorial,
    Powers { base: u32 },
    Harmonic,
    Alternating(Box<Pattern>),
    HigherOrderPolynomial,
    LinearExtrapolation,
}

impl Pattern {
    /// True for arithmetic patterns, including their alternating-sign forms.
    pub fn is_arithmetic(&self) -> bool {
        match self {
            Pattern::Arithmetic | Pattern::ApproximateArithmetic => true,
            Pattern::Alternating(inner) => inner.is_arithmetic(),
            _ => false,
        }
    }

    pub fn is_geometric(&self) -> bool {
        match self {
            Pattern::Geometric | Pattern::ApproximateGeometric => true,
            Pattern::Alternating(inner) => inner.is_geometric(),
            _ => false,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Arithmetic => f.write_str("Arithmetic Sequence"),
            Pattern::ApproximateArithmetic => f.write_str("Approximate Arithmetic"),
            Pattern::Geometric => f.write_str("Geometric Sequence"),
            Pattern::ApproximateGeometric => f.write_str("Approximate Geometric"),
            Pattern::LinearPolynomial => f.write_str("Linear Polynomial"),
            Pattern::QuadraticPolynomial => f.write_str("Quadratic Polynomial"),
            Pattern::Fibonacci => f.write_str("Fibonacci-like"),
            Pattern::WeightedFibonacci => f.write_str("Weighted Fibonacci"),
            Pattern::PerfectSquares => f.write_str("Perfect Squares"),
            Pattern::Triangular => f.write_str("Triangular Numbers"),
            Pattern::Exponential => f.write_str("Exponential"),
            Pattern::Factorial => f.write_str("Factorial"),
            Pattern::Powers { base } => write!(f, "Powers of {base}"),
            Pattern::Harmonic => f.write_str("Harmonic"),
            Pattern::Alternating(inner) => write!(f, "Alternating {inner}"),
            Pattern::HigherOrderPolynomial => f.write_str("Higher Order Polynomial"),
            Pattern::LinearExtrapolation => f.write_str("Linear Extrapolation"),
        }
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A predicted next term.
///
/// - `value` is finite or an explicit infinity, never NaN for finite input.
/// - `confidence` is a ranking score in [0, 1], not a probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub value: f64,
    pub pattern: Pattern,
    pub confidence: f64,
}

impl Prediction {
    #[inline]
    pub fn new(value: f64, pattern: Pattern, confidence: f64) -> Self {
        Self { value, pattern, confidence }
    }
}

/// One detector's verdict on a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub detector: DetectorKind,
    pub outcome: Detection,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("exactly 3 numbers are required for prediction, got {0}")]
    InvalidLength(usize),
    #[error("term {index} is not a finite number: {value}")]
    NonFinite { index: usize, value: f64 },
}

/// Which detectors run, in which order. Defaults to [`DEFAULT_DETECTORS`].
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    pub detectors: Vec<DetectorKind>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self { detectors: DEFAULT_DETECTORS.to_vec() }
    }
}

impl PredictorConfig {
    /// Keep only `kinds`, preserving the current registry order.
    pub fn only(mut self, kinds: &[DetectorKind]) -> Self {
        self.detectors.retain(|kind| kinds.contains(kind));
        self
    }

    /// Drop `kinds` from the registry.
    pub fn without(mut self, kinds: &[DetectorKind]) -> Self {
        self.detectors.retain(|kind| !kinds.contains(kind));
        self
    }
}

/// Best-confidence selection over a fixed detector registry.
#[derive(Debug, Clone)]
pub struct Predictor {
    detectors: Cow<'static, [DetectorKind]>,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new()
    }
}

impl Predictor {
    pub fn new() -> Self {
        Self { detectors: Cow::Borrowed(&DEFAULT_DETECTORS) }
    }

    pub fn with_config(cfg: PredictorConfig) -> Self {
        Self { detectors: Cow::Owned(cfg.detectors) }
    }

    pub fn detectors(&self) -> &[DetectorKind] {
        &self.detectors
    }

    /// Validate `terms` and predict the next one.
    ///
    /// Fails before any detector runs when `terms` is not exactly three
    /// finite numbers.
    pub fn predict(&self, terms: &[f64]) -> Result<Prediction, PredictError> {
        let seq: Sequence = terms.try_into().map_err(|_| PredictError::InvalidLength(terms.len()))?;
        if let Some((index, &value)) = seq.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(PredictError::NonFinite { index, value });
        }
        Ok(self.predict_sequence(seq))
    }

    /// Run every registered detector and keep the most confident candidate.
    pub fn predict_sequence(&self, seq: Sequence) -> Prediction {
        let mut best: Option<Prediction> = None;
        for &detector in self.detectors.iter() {
            match detector.detect(seq) {
                Ok(candidate) => {
                    trace!(%detector, pattern = %candidate.pattern, confidence = candidate.confidence, "candidate");
                    let best_confidence = best.as_ref().map_or(0.0, |b| b.confidence);
                    if candidate.confidence > best_confidence {
                        best = Some(candidate);
                    }
                }
                Err(reason) => trace!(%detector, %reason, "rejected"),
            }
        }
        match best {
            Some(prediction) => {
                debug!(?seq, value = prediction.value, pattern = %prediction.pattern, confidence = prediction.confidence, "selected");
                prediction
            }
            None => {
                debug!(?seq, "no detector matched, extrapolating");
                fallback(seq)
            }
        }
    }

    /// Every registered detector's verdict, in registry order.
    pub fn candidates(&self, seq: Sequence) -> Vec<Candidate> {
        self.detectors
            .iter()
            .map(|&detector| Candidate { detector, outcome: detector.detect(seq) })
            .collect()
    }

    /// Predict a batch in parallel; results keep the input order.
    pub fn predict_many(&self, sequences: &[Sequence]) -> Vec<Prediction> {
        sequences.par_iter().map(|&seq| self.predict_sequence(seq)).collect()
    }
}

/// Linear extrapolation from the mean of the first differences.
pub fn fallback(seq: Sequence) -> Prediction {
    let [d1, d2] = poly::differences(seq);
    Prediction::new(seq[2] + (d1 + d2) / 2.0, Pattern::LinearExtrapolation, FALLBACK_CONFIDENCE)
}

/// Predict with the default registry.
///
/// ```
/// let p = sequence_predictor::predict(&[1.0, 2.0, 6.0]).unwrap();
/// assert_eq!(p.value, 24.0);
/// assert!(sequence_predictor::predict(&[1.0, 2.0]).is_err());
/// ```
pub fn predict(terms: &[f64]) -> Result<Prediction, PredictError> {
    Predictor::new().predict(terms)
}
