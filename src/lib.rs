//! sequence-predictor: guess the next term of a three-number sequence
//!
//! This crate provides:
//! - A battery of pattern detectors (arithmetic, geometric, Fibonacci-like,
//!   perfect squares, factorial, powers, harmonic, ...) in the `predictor` module
//! - A `Predictor` that keeps the most confident detector result and falls back
//!   to linear extrapolation
//! - A line-oriented console front-end (`console` module) used by the binary
//!
//! Quick start:
//! ```
//! use sequence_predictor::{Pattern, Predictor};
//!
//! let predictor = Predictor::new();
//! let p = predictor.predict(&[1.0, 3.0, 5.0]).unwrap();
//! assert_eq!(p.value, 7.0);
//! assert_eq!(p.pattern, Pattern::Arithmetic);
//! assert!(p.confidence > 0.9);
//! ```
//!
//! Restricting the registry:
//! ```
//! use sequence_predictor::{DetectorKind, Pattern, Predictor, PredictorConfig};
//!
//! let cfg = PredictorConfig::default().without(&[DetectorKind::Geometric]);
//! let p = Predictor::with_config(cfg).predict(&[3.0, 9.0, 27.0]).unwrap();
//! assert_eq!(p.value, 81.0);
//! assert_eq!(p.pattern, Pattern::Powers { base: 3 });
//! ```
//!
//! Note: inputs must be exactly three finite numbers; anything else is a
//! `PredictError` and no detector runs.
//!
pub mod console;
pub mod predictor;

pub use predictor::{
    predict,
    Candidate,
    DetectorKind,
    Pattern,
    PredictError,
    Prediction,
    Predictor,
    PredictorConfig,
    Rejection,
    Sequence,
};
