use super::Sequence;

/// First differences `[b - a, c - b]`.
#[inline]
pub(crate) fn differences(seq: Sequence) -> [f64; 2] {
    [seq[1] - seq[0], seq[2] - seq[1]]
}

/// Fit `y = a*x^2 + b*x + c` through the points `(0, y0)`, `(1, y1)`, `(2, y2)`.
///
/// Coefficients are returned highest degree first, ready for [`eval_polynomial`].
pub(crate) fn fit_quadratic(ys: Sequence) -> [f64; 3] {
    let c = ys[0];
    let a_plus_b = ys[1] - c;
    let four_a_plus_two_b = ys[2] - c;
    let b = 2.0 * a_plus_b - four_a_plus_two_b / 2.0;
    let a = a_plus_b - b;
    [a, b, c]
}

/// Horner evaluation; `coeffs` are ordered highest degree first.
#[inline]
pub(crate) fn eval_polynomial(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &k| acc * x + k)
}

/// Round `x` to the nearest integer when it sits within `tolerance` of one.
///
/// The result stays an `f64` whole number, so magnitudes past `i64::MAX`
/// are kept instead of saturating.
#[inline]
pub(crate) fn nearest_integer(x: f64, tolerance: f64) -> Option<f64> {
    let rounded = x.round();
    ((x - rounded).abs() < tolerance).then_some(rounded)
}

/// Step of a whole-number progression, if the three values form one.
#[inline]
pub(crate) fn common_step(ints: [f64; 3]) -> Option<f64> {
    let step = ints[1] - ints[0];
    (ints[2] - ints[1] == step).then_some(step)
}
