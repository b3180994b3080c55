//! Dilation-speed computation for pupil traces.
//!
//! Follows the artifact-rejection scheme of Kret & Sjak-Shie (2019): the
//! per-sample dilation speed is the larger of the absolute forward and
//! backward finite differences, divided by the sample period. At the first
//! sample the backward difference has no neighbour (and at the last sample
//! the forward one), so the max degenerates to the single defined side.
//! NaN samples propagate: a difference against an invalid neighbour is NaN
//! and is ignored by the max, matching `numpy.nanmax`.

use crate::error::{Error, Result};
use ndarray::{Array1, ArrayView1};

/// Compute the per-sample dilation speed of a 1-D pupil-size signal.
///
/// `times` are the uniform sample timestamps in seconds; only the first
/// interval is used as the sample period. Returns a signal of the same
/// length as `pupil`. A sample is NaN only when both its neighbours are
/// invalid (or the signal has a single sample).
pub fn dilation_speed(pupil: ArrayView1<f64>, times: ArrayView1<f64>) -> Result<Array1<f64>> {
    let n = pupil.len();
    if n < 2 {
        return Err(Error::InvalidInput(format!(
            "dilation speed needs at least 2 samples, got {n}"
        )));
    }
    if times.len() != n {
        return Err(Error::DimensionMismatch(format!(
            "times has {} samples but signal has {n}",
            times.len()
        )));
    }
    let dt = times[1] - times[0];
    if !(dt > 0.0) {
        return Err(Error::InvalidInput(format!("non-positive sample period: {dt}")));
    }

    let mut speed = Array1::<f64>::zeros(n);
    for i in 0..n {
        let fwd = if i + 1 < n {
            ((pupil[i + 1] - pupil[i]) / dt).abs()
        } else {
            f64::NAN
        };
        let bwd = if i > 0 {
            ((pupil[i] - pupil[i - 1]) / dt).abs()
        } else {
            f64::NAN
        };
        // f64::max ignores a single NaN operand; both-NaN stays NaN.
        speed[i] = fwd.max(bwd);
    }
    Ok(speed)
}
