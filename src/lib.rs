//! # pupil — pupillometry preprocessing and cluster statistics in pure Rust
//!
//! `pupil` implements the offline analysis pipeline for eye-tracking
//! (pupillometry) recordings from a psychophysics experiment: artifact
//! rejection on the continuous pupil trace, event-locked epoching, and
//! nonparametric cluster-based permutation statistics across subjects.
//!
//! ## Pipeline overview
//!
//! ```text
//! sub-XX recording (channels + eyelink annotations)
//!   │
//!   ├─ reject::dilation_speed_rejection()   MAD outliers on dilation speed → NaN
//!   ├─ interpolate::interp_nan_inplace()    linear fill of NaN gaps
//!   ├─ events::extract_eyelink_events()     blink/saccade regressor channels
//!   ├─ epoch::epoch_channel()               event-locked windows + condition tags
//!   ├─ TrialSet::apply_baseline()           mean / ratio / percent / ...
//!   └─ TrialSet::evoked()                   per-subject per-condition average
//!        │
//!        └─→ evoked::group_evoked_pair()    [subjects, time] per condition
//!              └─→ cluster::cluster_1samp_across_sub()
//!                    clusters + permutation p-values + group means
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use pupil::{clean_pupil, io::load_recording, outliers::DEFAULT_THRESHOLD_FACTOR};
//! use std::path::Path;
//!
//! let mut rec = load_recording(Path::new("sub-01_eyetrack.safetensors")).unwrap();
//! let reports = clean_pupil(&mut rec, &["LPupil", "RPupil"], DEFAULT_THRESHOLD_FACTOR).unwrap();
//! for r in &reports {
//!     println!("{}: {:.2}% rejected", r.channel, r.percent());
//! }
//! ```
//!
//! The statistical core never performs I/O; loading recordings and writing
//! figures stay in the binaries and the [`io`] helpers.

pub mod cluster;
pub mod condition;
pub mod config;
pub mod dilation;
pub mod epoch;
pub mod error;
pub mod events;
pub mod evoked;
pub mod interpolate;
pub mod io;
pub mod outliers;
pub mod recording;
pub mod reject;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `pupil::Foo` without having to know the internal module layout.

pub use cluster::{cluster_1samp_across_sub, Cluster, ClusterTest, Tail};
pub use condition::{ConditionQuery, ConditionTag};
pub use config::AnalysisParameters;
pub use dilation::dilation_speed;
pub use epoch::{epoch_channel, BaselineMode, Event, Trial, TrialSet};
pub use error::{Error, Result};
pub use events::{event_regressor, extract_eyelink_events, Interval};
pub use evoked::{group_evoked_pair, GroupEvoked};
pub use interpolate::interp_nan_inplace;
pub use outliers::{mad_outlier_indices, DEFAULT_THRESHOLD_FACTOR};
pub use recording::{Annotation, Channel, Recording};
pub use reject::{dilation_speed_rejection, RejectionReport};

/// Run the per-subject pupil cleaning pass on a recording.
///
/// For each named channel (one per eye), dilation-speed outliers are marked
/// invalid and the resulting gaps (plus any pre-existing NaN samples, e.g.
/// blink losses) are filled by linear interpolation. The two stages stay
/// separately callable; this is the convenience chaining used by every
/// subject-level script.
///
/// Both stages run on a working copy and the channel is written back only
/// once both succeed, so an error leaves the failing channel untouched,
/// channels before it fully cleaned, and channels after it unprocessed.
///
/// Returns one [`RejectionReport`] per channel, in argument order.
pub fn clean_pupil(
    rec: &mut Recording,
    channels: &[&str],
    threshold_factor: f64,
) -> Result<Vec<RejectionReport>> {
    let times = rec.times();
    let mut reports = Vec::with_capacity(channels.len());
    for &name in channels {
        let signal = rec
            .channel(name)
            .ok_or_else(|| Error::InvalidInput(format!("no channel named {name}")))?
            .data
            .clone();
        let (mut cleaned, n_rejected) =
            reject::reject_dilation_outliers(signal.view(), times.view(), threshold_factor)?;
        interpolate::interp_nan_inplace(&mut cleaned)?;
        rec.replace_channel(name, cleaned)?;
        let report =
            RejectionReport { channel: name.to_string(), n_rejected, n_total: rec.n_times() };
        log::info!(
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
    use ndarray::Array1;

    #[test]
    fn clean_pupil_leaves_no_nan() {
        let mut data = Array1::from_iter((0..500).map(|i| 2.0 + ((i % 13) as f64) * 0.002));
        data[100] = 25.0;
        data[101] = f64::NAN; // pre-existing blink loss
        let mut rec = Recording::new(
            vec![Channel { name: "LPupil".into(), data }],
            vec![],
            250.0,
        )
        .unwrap();
        let reports = clean_pupil(&mut rec, &["LPupil"], DEFAULT_THRESHOLD_FACTOR).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].n_rejected >= 1);
        assert!(rec.channel("LPupil").unwrap().data.iter().all(|v| !v.is_nan()));
    }
}
