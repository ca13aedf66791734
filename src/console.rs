//! Line-oriented console front-end.
//!
//! Parses whitespace-separated triples, renders predictions as text or JSON
//! lines, and drives the interactive, demo and batch modes of the binary.
//! Everything writes to a caller-supplied `Write` so sessions can be tested
//! against in-memory buffers.

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use serde::Serialize;
use tracing::{debug, warn};

use crate::predictor::{DetectorKind, Prediction, Predictor, Sequence};

/// Words that end an interactive session, compared case-insensitively.
pub const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

/// Example sequences shown by the `demo` mode.
pub const DEMO_SEQUENCES: [(&str, Sequence); 10] = [
    ("Simple arithmetic", [1.0, 2.0, 3.0]),
    ("Perfect squares", [1.0, 4.0, 9.0]),
    ("Fibonacci", [1.0, 1.0, 2.0]),
    ("Geometric (x3)", [2.0, 6.0, 18.0]),
    ("Factorial", [1.0, 2.0, 6.0]),
    ("Powers of 2", [2.0, 4.0, 8.0]),
    ("Triangular numbers", [1.0, 3.0, 6.0]),
    ("Halving sequence", [1.0, 0.5, 0.25]),
    ("Decreasing arithmetic", [10.0, 7.0, 4.0]),
    ("Alternating pattern", [1.0, -1.0, 1.0]),
];

const LOW_CONFIDENCE: f64 = 0.5;
const HIGH_CONFIDENCE: f64 = 0.8;

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Quit,
    Terms(Sequence),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("please enter exactly 3 numbers (got {0})")]
    WrongCount(usize),
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("'{0}' is not a finite number")]
    NonFinite(String),
}

/// Parse one line: a quit word, or exactly three finite numbers.
pub fn parse_line(line: &str) -> Result<Input, InputError> {
    let trimmed = line.trim();
    if QUIT_WORDS.iter().any(|word| trimmed.eq_ignore_ascii_case(word)) {
        return Ok(Input::Quit);
    }
    let mut terms = Vec::with_capacity(3);
    for token in trimmed.split_whitespace() {
        let value: f64 = token.parse().map_err(|_| InputError::NotANumber(token.to_string()))?;
        if !value.is_finite() {
            return Err(InputError::NonFinite(token.to_string()));
        }
        terms.push(value);
    }
    let count = terms.len();
    let seq: Sequence = terms.try_into().map_err(|_| InputError::WrongCount(count))?;
    Ok(Input::Terms(seq))
}

/// Coarse reading of a confidence score for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    Low,
    Moderate,
    High,
}

impl ConfidenceBand {
    pub fn of(confidence: f64) -> Self {
        if confidence < LOW_CONFIDENCE {
            ConfidenceBand::Low
        } else if confidence > HIGH_CONFIDENCE {
            ConfidenceBand::High
        } else {
            ConfidenceBand::Moderate
        }
    }
}

/// Format like C's `%.6g`: six significant digits, trailing zeros dropped.
pub fn format_number(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    // %g picks its style from the exponent after rounding to six digits.
    let sci = format!("{x:.5e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exp.parse().unwrap_or(0);
    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_zeros(mantissa), exponent.abs());
    }
    let decimals = (5 - exponent).max(0) as usize;
    trim_zeros(&format!("{x:.decimals$}")).to_string()
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Human-readable report for one prediction.
pub fn render(seq: Sequence, prediction: &Prediction) -> String {
    let [a, b, c] = seq;
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "Sequence: {} -> {} -> {} -> ?",
        format_number(a),
        format_number(b),
        format_number(c)
    );
    let _ = writeln!(out, "Next number: {}", format_number(prediction.value));
    let _ = writeln!(out, "Pattern detected: {}", prediction.pattern);
    let _ = writeln!(out, "Confidence: {:.1}%", prediction.confidence * 100.0);
    match ConfidenceBand::of(prediction.confidence) {
        ConfidenceBand::Low => {
            let _ = writeln!(out, "Low confidence - the pattern might not be reliable");
        }
        ConfidenceBand::High => {
            let _ = writeln!(out, "High confidence - strong pattern detected!");
        }
        ConfidenceBand::Moderate => {}
    }
    if prediction.pattern.is_arithmetic() {
        let _ = writeln!(out, "Common difference: {}", format_number(b - a));
    } else if prediction.pattern.is_geometric() && a != 0.0 {
        let _ = writeln!(out, "Common ratio: {}", format_number(b / a));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub format: OutputFormat,
    /// Also report every detector's verdict.
    pub explain: bool,
}

/// Counters for a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub predictions: usize,
    pub rejected: usize,
}

#[derive(Serialize)]
struct Verdict {
    detector: DetectorKind,
    #[serde(flatten)]
    prediction: Option<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected: Option<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    sequence: Sequence,
    #[serde(flatten)]
    prediction: &'a Prediction,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    detectors: Vec<Verdict>,
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    error: &'a str,
}

pub struct Console<'a> {
    predictor: &'a Predictor,
    opts: SessionOptions,
}

impl<'a> Console<'a> {
    pub fn new(predictor: &'a Predictor, opts: SessionOptions) -> Self {
        Self { predictor, opts }
    }

    fn is_text(&self) -> bool {
        self.opts.format == OutputFormat::Text
    }

    fn verdicts(&self, seq: Sequence) -> Vec<Verdict> {
        if !self.opts.explain {
            return Vec::new();
        }
        self.predictor
            .candidates(seq)
            .into_iter()
            .map(|candidate| match candidate.outcome {
                Ok(prediction) => Verdict { detector: candidate.detector, prediction: Some(prediction), rejected: None },
                Err(reason) => Verdict { detector: candidate.detector, prediction: None, rejected: Some(reason.to_string()) },
            })
            .collect()
    }

    /// Write one prediction in the configured format.
    pub fn report<W: Write>(&self, out: &mut W, label: Option<&str>, seq: Sequence, prediction: &Prediction) -> io::Result<()> {
        let detectors = self.verdicts(seq);
        if !self.is_text() {
            let report = Report { label, sequence: seq, prediction, detectors };
            serde_json::to_writer(&mut *out, &report)?;
            return writeln!(out);
        }
        if let Some(label) = label {
            writeln!(out, "{label}")?;
        }
        out.write_all(render(seq, prediction).as_bytes())?;
        if !detectors.is_empty() {
            writeln!(out, "Detectors:")?;
            for verdict in &detectors {
                match (&verdict.prediction, &verdict.rejected) {
                    (Some(p), _) => writeln!(
                        out,
                        "  {:<12} {} ({}, {:.1}%)",
                        verdict.detector.name(),
                        format_number(p.value),
                        p.pattern,
                        p.confidence * 100.0
                    )?,
                    (None, reason) => writeln!(
                        out,
                        "  {:<12} rejected: {}",
                        verdict.detector.name(),
                        reason.as_deref().unwrap_or("no match")
                    )?,
                }
            }
        }
        Ok(())
    }

    fn report_error<W: Write>(&self, out: &mut W, message: &str) -> io::Result<()> {
        if self.is_text() {
            writeln!(out, "Error: {message}")?;
            writeln!(out, "Please enter valid numbers.")
        } else {
            serde_json::to_writer(&mut *out, &ErrorReport { error: message })?;
            writeln!(out)
        }
    }

    /// Prompt-and-predict loop. Ends on a quit word or end of input.
    pub fn interactive<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> io::Result<SessionStats> {
        let mut stats = SessionStats::default();
        if self.is_text() {
            writeln!(out, "NUMBER SEQUENCE PREDICTOR")?;
            writeln!(out, "{}", "=".repeat(50))?;
            writeln!(out, "Enter 3 numbers and I'll predict the next one!")?;
            writeln!(out, "Supports: arithmetic, geometric, polynomial, Fibonacci, and more patterns")?;
            writeln!(out, "{}", "-".repeat(50))?;
        }
        let mut lines = input.lines();
        loop {
            if self.is_text() {
                write!(out, "\nEnter 3 numbers (or 'quit' to exit):\nNumbers (space-separated): ")?;
                out.flush()?;
            }
            let Some(line) = lines.next() else { break };
            match parse_line(&line?) {
                Ok(Input::Quit) => {
                    if self.is_text() {
                        writeln!(out, "Thanks for using the Number Predictor!")?;
                    }
                    break;
                }
                Ok(Input::Terms(seq)) => {
                    let prediction = self.predictor.predict_sequence(seq);
                    if self.is_text() {
                        writeln!(out)?;
                    }
                    self.report(out, None, seq, &prediction)?;
                    stats.predictions += 1;
                }
                Err(e) => {
                    debug!(error = %e, "rejected input line");
                    self.report_error(out, &e.to_string())?;
                    stats.rejected += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Predict every entry of [`DEMO_SEQUENCES`].
    pub fn demo<W: Write>(&self, out: &mut W) -> io::Result<SessionStats> {
        let mut stats = SessionStats::default();
        for (label, seq) in DEMO_SEQUENCES {
            let prediction = self.predictor.predict_sequence(seq);
            self.report(out, Some(label), seq, &prediction)?;
            if self.is_text() {
                writeln!(out)?;
            }
            stats.predictions += 1;
        }
        Ok(stats)
    }

    /// One triple per line; blank and `#` lines are skipped, bad lines are
    /// logged and counted. Valid triples are predicted in parallel.
    pub fn batch<R: BufRead, W: Write>(&self, input: R, out: &mut W) -> io::Result<SessionStats> {
        let mut stats = SessionStats::default();
        let mut sequences = Vec::new();
        for (idx, line) in input.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match parse_line(trimmed) {
                Ok(Input::Terms(seq)) => sequences.push(seq),
                Ok(Input::Quit) => break,
                Err(e) => {
                    warn!(line = idx + 1, error = %e, "skipping batch line");
                    stats.rejected += 1;
                }
            }
        }
        let predictions = self.predictor.predict_many(&sequences);
        for (seq, prediction) in sequences.iter().zip(predictions.iter()) {
            self.report(out, None, *seq, prediction)?;
            if self.is_text() {
                writeln!(out)?;
            }
        }
        stats.predictions = predictions.len();
        Ok(stats)
    }
}
