//! Eyelink event intervals and dense regressor channels.
//!
//! The eye-tracker parser annotates blinks, saccades and fixations as
//! onset/duration pairs. For rejection and regression downstream these are
//! converted to continuous 0/1 indicator signals on the sampling grid, one
//! channel per eye and event kind.

use crate::error::{Error, Result};
use crate::recording::Recording;
use log::debug;
use ndarray::Array1;

/// A half-open sample range `[onset, offset)` on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub onset: usize,
    pub offset: usize,
}

impl Interval {
    /// Convert a second-domain onset/duration pair to samples.
    pub fn from_times(onset_s: f64, duration_s: f64, sfreq: f64) -> Self {
        let onset = (onset_s * sfreq) as usize;
        let offset = ((onset_s + duration_s) * sfreq) as usize;
        Self { onset, offset }
    }
}

/// Build a binary indicator signal of length `len`: 1 inside every interval,
/// 0 elsewhere. Overlapping intervals OR together. Runs in time linear in the
/// total interval coverage, not `n_intervals × len`.
pub fn event_regressor(intervals: &[Interval], len: usize) -> Result<Array1<f64>> {
    let mut out = Array1::<f64>::zeros(len);
    for iv in intervals {
        if iv.onset > iv.offset {
            return Err(Error::InvalidInput(format!(
                "interval onset {} after offset {}",
                iv.onset, iv.offset
            )));
        }
        let stop = iv.offset.min(len);
        for i in iv.onset.min(len)..stop {
            out[i] = 1.0;
        }
    }
    Ok(out)
}

/// Convert the annotations matching `"{description}_{eye}"` (e.g. `blink_L`)
/// into a regressor channel named `"{eye}{description}"` (e.g. `Lblink`),
/// appended to the recording, one per eye.
pub fn extract_eyelink_events(
    rec: &mut Recording,
    description: &str,
    eyes: &[&str],
) -> Result<()> {
    let n = rec.n_times();
    let sfreq = rec.sfreq;
    for eye in eyes {
        let tag = format!("{description}_{eye}");
        let intervals: Vec<Interval> = rec
            .annotations
            .iter()
            .filter(|a| a.description == tag)
            .map(|a| Interval::from_times(a.onset, a.duration, sfreq))
            .collect();
        debug!("{tag}: {} annotated events", intervals.len());
        let regressor = event_regressor(&intervals, n)?;
        rec.add_channel(&format!("{eye}{description}"), regressor)?;
    }
    Ok(())
}
