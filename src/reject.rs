//! Dilation-speed artifact rejection.
//!
//! Per channel: compute the dilation speed, flag MAD outliers on the speed
//! signal, and mark the flagged samples invalid (NaN) in the original size
//! signal. Gap filling is a separate explicit step
//! ([`crate::interpolate::interp_nan_inplace`]) so that marking and filling
//! stay independently testable.

use crate::dilation::dilation_speed;
use crate::error::Result;
use crate::outliers::mad_outlier_indices;
use crate::recording::Recording;
use log::info;
use ndarray::{Array1, ArrayView1};

/// Per-channel rejection summary, reported for observability.
#[derive(Debug, Clone)]
pub struct RejectionReport {
    pub channel: String,
    pub n_rejected: usize,
    pub n_total: usize,
}

impl RejectionReport {
    pub fn percent(&self) -> f64 {
        100.0 * self.n_rejected as f64 / self.n_total as f64
    }
}

/// Clean one size signal: returns a new signal with dilation-speed outliers
/// set to NaN, plus the rejection counts. The input is not modified.
pub fn reject_dilation_outliers(
    signal: ArrayView1<f64>,
    times: ArrayView1<f64>,
    threshold_factor: f64,
) -> Result<(Array1<f64>, usize)> {
    let speed = dilation_speed(signal, times)?;
    let outliers = mad_outlier_indices(speed.view(), threshold_factor)?;
    let mut cleaned = signal.to_owned();
    for &i in &outliers {
        cleaned[i] = f64::NAN;
    }
    Ok((cleaned, outliers.len()))
}

/// Run dilation-speed rejection over the named channels of a recording,
/// independently per channel (per eye), replacing each with its cleaned
/// version. Annotations are untouched.
pub fn dilation_speed_rejection(
    rec: &mut Recording,
    channels: &[&str],
    threshold_factor: f64,
) -> Result<Vec<RejectionReport>> {
    let times = rec.times();
    let mut reports = Vec::with_capacity(channels.len());
    for &name in channels {
        let signal = rec
            .channel(name)
            .ok_or_else(|| crate::error::Error::InvalidInput(format!("no channel named {name}")))?
            .data
            .clone();
        let (cleaned, n_rejected) =
            reject_dilation_outliers(signal.view(), times.view(), threshold_factor)?;
        rec.replace_channel(name, cleaned)?;
        let report = RejectionReport {
            channel: name.to_string(),
            n_rejected,
            n_total: rec.n_times(),
        };
        info!(
            "{}: rejected {} of {} samples ({:.2}%)",
            report.channel,
            report.n_rejected,
            report.n_total,
            report.percent()
        );
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Channel, Recording};
    use ndarray::Array1;

    fn trace(n: usize) -> Array1<f64> {
        Array1::from_iter((0..n).map(|i| 2.0 + 0.1 * (i as f64 * 0.05).sin()))
    }

    fn times(n: usize) -> Array1<f64> {
        Array1::from_iter((0..n).map(|i| i as f64 / 100.0))
    }

    #[test]
    fn spike_is_marked_nan_in_size_signal() {
        let mut x = trace(200);
        x[50] = 30.0;
        let (cleaned, n) = reject_dilation_outliers(x.view(), times(200).view(), 4.0).unwrap();
        assert!(n >= 1);
        assert!(cleaned[50].is_nan());
        // Far-away samples survive.
        assert!(!cleaned[0].is_nan());
        assert!(!cleaned[199].is_nan());
    }

    #[test]
    fn clean_signal_is_untouched() {
        let x = trace(200);
        let (cleaned, n) = reject_dilation_outliers(x.view(), times(200).view(), 4.0).unwrap();
        assert_eq!(n, 0);
        assert_eq!(cleaned, x);
    }

    #[test]
    fn channels_are_cleaned_independently() {
        let mut left = trace(200);
        left[80] = 40.0;
        let right = trace(200);
        let mut rec = Recording::new(
            vec![
                Channel { name: "LPupil".into(), data: left },
                Channel { name: "RPupil".into(), data: right },
            ],
            vec![],
            100.0,
        )
        .unwrap();
        let reports = dilation_speed_rejection(&mut rec, &["LPupil", "RPupil"], 4.0).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].n_rejected >= 1);
        assert_eq!(reports[1].n_rejected, 0);
        assert!(rec.channel("LPupil").unwrap().data[80].is_nan());
        assert!(!rec.channel("RPupil").unwrap().data[80].is_nan());
    }

    #[test]
    fn unknown_channel_is_an_error() {
        let mut rec = Recording::new(
            vec![Channel { name: "LPupil".into(), data: trace(50) }],
            vec![],
            100.0,
        )
        .unwrap();
        assert!(dilation_speed_rejection(&mut rec, &["XPupil"], 4.0).is_err());
    }

    #[test]
    fn report_percent() {
        let r = RejectionReport { channel: "LPupil".into(), n_rejected: 5, n_total: 200 };
        approx::assert_abs_diff_eq!(r.percent(), 2.5, epsilon = 1e-12);
    }
}
