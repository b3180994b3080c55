//! MAD-based outlier detection.
//!
//! Flags samples above `median + k · MAD`, one-sided: only large positive
//! excursions count, since dilation-speed spikes are artifacts while fast
//! constriction is legitimate. NaN samples are excluded from the median and
//! MAD and are never flagged.

use crate::error::{Error, Result};
use ndarray::ArrayView1;

/// Default threshold factor, per Kret & Sjak-Shie (2019).
pub const DEFAULT_THRESHOLD_FACTOR: f64 = 4.0;

/// Indices of samples strictly above `median + threshold_factor · MAD`.
///
/// With `threshold_factor = 0` this flags every sample strictly above the
/// median (the comparison is strict `>`). Returns [`Error::InvalidInput`]
/// if no valid sample exists.
pub fn mad_outlier_indices(data: ArrayView1<f64>, threshold_factor: f64) -> Result<Vec<usize>> {
    let valid: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    if valid.is_empty() {
        return Err(Error::InvalidInput(
            "cannot compute MAD of a signal with no valid samples".into(),
        ));
    }

    let med = median(&valid);
    let deviations: Vec<f64> = valid.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations);
    let thresh = med + threshold_factor * mad;

    Ok(data
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan() && **v > thresh)
        .map(|(i, _)| i)
        .collect())
}

/// Median of a non-empty slice; the mean of the two middle values for even
/// lengths, matching `numpy.median`.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
