//! Linear interpolation of invalid (NaN) samples.
//!
//! Matches `numpy.interp` over the sample-index axis: every NaN run strictly
//! between two valid samples is filled with the straight line joining them;
//! NaN runs before the first or after the last valid sample are clamped to
//! the nearest valid boundary value.

use crate::error::{Error, Result};
use ndarray::Array1;

/// Fill every NaN sample of `x` in place by linear interpolation against its
/// nearest valid neighbours.
///
/// The signal is mutated in place; no copy is returned. Returns
/// [`Error::InvalidInput`] if `x` contains no valid sample at all.
pub fn interp_nan_inplace(x: &mut Array1<f64>) -> Result<()> {
    let n = x.len();
    let first = x
        .iter()
        .position(|v| !v.is_nan())
        .ok_or_else(|| Error::InvalidInput("cannot interpolate a signal with no valid samples".into()))?;
    let last = x.iter().rposition(|v| !v.is_nan()).unwrap_or(first);

    // Flat extrapolation beyond the first/last valid sample.
    let (head, tail) = (x[first], x[last]);
    for i in 0..first {
        x[i] = head;
    }
    for i in last + 1..n {
        x[i] = tail;
    }

    // Interior gaps: walk valid anchors pairwise.
    let mut i = first;
    while i < last {
        if !x[i + 1].is_nan() {
            i += 1;
            continue;
        }
        let mut j = i + 2;
        while x[j].is_nan() {
            j += 1;
        }
        let (a, b) = (x[i], x[j]);
        let span = (j - i) as f64;
        for k in i + 1..j {
            x[k] = a + (b - a) * (k - i) as f64 / span;
        }
        i = j;
    }
    Ok(())
}
