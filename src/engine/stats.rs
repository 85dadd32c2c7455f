//! Statistical primitives shared by the rolling and matrix paths.
//!
//! One set of formulas, used everywhere: population moments (denominator N),
//! and degenerate denominators resolved to `0.0` instead of NaN. A NaN leaked
//! here would silently poison every downstream window, so the contract is
//! that these functions never return one for finite input.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population covariance between two equal-length slices (denominator N).
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "covariance inputs must be equal length");
    if a.is_empty() {
        return 0.0;
    }
    let mean_a = mean(a);
    let mean_b = mean(b);
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / a.len() as f64
}

/// Population variance (denominator N).
pub fn variance(values: &[f64]) -> f64 {
    covariance(values, values)
}

/// Pearson correlation coefficient.
///
/// Defined as 0.0 when either series is flat over the sample (zero squared
/// deviation), rather than dividing by zero.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "correlation inputs must be equal length");
    if a.is_empty() {
        return 0.0;
    }
    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut cross = 0.0;
    let mut sq_a = 0.0;
    let mut sq_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let da = x - mean_a;
        let db = y - mean_b;
        cross += da * db;
        sq_a += da * da;
        sq_b += db * db;
    }

    if sq_a == 0.0 || sq_b == 0.0 {
        return 0.0;
    }
    cross / (sq_a * sq_b).sqrt()
}

/// OLS beta of `a` against the reference series `b`: cov(a, b) / var(b).
///
/// Defined as 0.0 when the reference has zero variance.
pub fn beta(a: &[f64], b: &[f64]) -> f64 {
    let var_b = variance(b);
    if var_b == 0.0 {
        return 0.0;
    }
    covariance(a, b) / var_b
}
