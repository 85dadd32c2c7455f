//! n-period simple percent change.
//!
//! Raw simple returns, no smoothing and no clipping, so the numbers match
//! the percent-change figures shown elsewhere in the product exactly.

use super::EngineError;

/// Converts a value series into an n-period percent-change series.
///
/// `output[i] = input[i + periods] / input[i] - 1`, so the output is
/// `periods` entries shorter than the input. When `periods >= input.len()`
/// the result is empty.
///
/// # Errors
/// Returns `EngineError::DivisionByZero` carrying the index of the first
/// zero base value. A zero close is upstream garbage, not a 100% loss, so
/// the caller is expected to drop or report the affected index rather than
/// let a bogus return through.
pub fn pct_change(values: &[f64], periods: usize) -> Result<Vec<f64>, EngineError> {
    if periods == 0 || periods >= values.len() {
        return Ok(Vec::new());
    }

    let mut changes = Vec::with_capacity(values.len() - periods);
    for i in 0..values.len() - periods {
        let base = values[i];
        if base == 0.0 {
            return Err(EngineError::DivisionByZero {
                asset: None,
                index: i,
            });
        }
        changes.push(values[i + periods] / base - 1.0);
    }

    Ok(changes)
}
