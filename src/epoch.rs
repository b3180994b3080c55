//! Event-locked epoching and trial selection.
//!
//! Cuts fixed-length windows out of a cleaned recording relative to event
//! onsets, tags each window with its experimental condition, and groups
//! them per subject into a [`TrialSet`]. Trials whose window would leave
//! the recording are dropped.

use crate::condition::{ConditionQuery, ConditionTag};
use crate::error::{Error, Result};
use crate::recording::Recording;
use log::debug;
use ndarray::Array1;

/// An experimental event to epoch around: onset in seconds plus its label.
#[derive(Debug, Clone)]
pub struct Event {
    pub onset: f64,
    pub tag: ConditionTag,
}

/// One epoch: a fixed-length window with its condition label.
#[derive(Debug, Clone)]
pub struct Trial {
    pub tag: ConditionTag,
    pub data: Array1<f64>,
}

/// One subject's epoched trials on a shared time axis.
#[derive(Debug, Clone)]
pub struct TrialSet {
    trials: Vec<Trial>,
    /// Time of each sample relative to the event onset, in seconds.
    pub times: Array1<f64>,
}

/// Cut `[tmin, tmax)` windows (seconds relative to each event onset) from
/// one channel of the recording.
pub fn epoch_channel(
    rec: &Recording,
    channel: &str,
    events: &[Event],
    tmin: f64,
    tmax: f64,
) -> Result<TrialSet> {
    if tmax <= tmin {
        return Err(Error::InvalidInput(format!("empty epoch window [{tmin}, {tmax})")));
    }
    let data = &rec
        .channel(channel)
        .ok_or_else(|| Error::InvalidInput(format!("no channel named {channel}")))?
        .data;
    let n_samples = ((tmax - tmin) * rec.sfreq).round() as usize;
    let offset = (tmin * rec.sfreq).round() as i64;

    let mut trials = Vec::with_capacity(events.len());
    let mut n_dropped = 0usize;
    for ev in events {
        let onset = (ev.onset * rec.sfreq).round() as i64;
        let start = onset + offset;
        let stop = start + n_samples as i64;
        if start < 0 || stop > rec.n_times() as i64 {
            n_dropped += 1;
            continue;
        }
        let window = data.slice(ndarray::s![start as usize..stop as usize]).to_owned();
        trials.push(Trial { tag: ev.tag.clone(), data: window });
    }
    if n_dropped > 0 {
        debug!("{channel}: dropped {n_dropped} of {} events outside the recording", events.len());
    }

    let times = Array1::from_iter((0..n_samples).map(|i| tmin + i as f64 / rec.sfreq));
    Ok(TrialSet { trials, times })
}

impl TrialSet {
    pub fn from_trials(trials: Vec<Trial>, times: Array1<f64>) -> Result<Self> {
        let n = times.len();
        for t in &trials {
            if t.data.len() != n {
                return Err(Error::DimensionMismatch(format!(
                    "trial {} has {} samples, time axis has {n}",
                    t.tag,
                    t.data.len()
                )));
            }
        }
        Ok(Self { trials, times })
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    /// All trials whose tag matches the query, at any specificity.
    pub fn select(&self, query: &ConditionQuery) -> Vec<&Trial> {
        self.trials.iter().filter(|t| query.matches(&t.tag)).collect()
    }

    /// Across-trial mean for the queried condition, or `None` when no trial
    /// matches (the subject is then excluded from the group contrast).
    pub fn evoked(&self, query: &ConditionQuery) -> Option<Array1<f64>> {
        let selected = self.select(query);
        if selected.is_empty() {
            return None;
        }
        let mut mean = Array1::<f64>::zeros(self.n_times());
        for t in &selected {
            mean += &t.data;
        }
        mean /= selected.len() as f64;
        Some(mean)
    }

    /// Restrict every trial (and the time axis) to `[tmin, tmax]`.
    pub fn crop(&mut self, tmin: f64, tmax: f64) -> Result<()> {
        let keep: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter(|(_, &t)| t >= tmin && t <= tmax)
            .map(|(i, _)| i)
            .collect();
        let (start, stop) = match (keep.first(), keep.last()) {
            (Some(&a), Some(&b)) => (a, b + 1),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "crop window [{tmin}, {tmax}] leaves no samples"
                )))
            }
        };
        self.times = self.times.slice(ndarray::s![start..stop]).to_owned();
        for t in &mut self.trials {
            t.data = t.data.slice(ndarray::s![start..stop]).to_owned();
        }
        Ok(())
    }

    /// Apply baseline correction to every trial. See [`BaselineMode`].
    pub fn apply_baseline(
        &mut self,
        mode: BaselineMode,
        window: (Option<f64>, Option<f64>),
    ) -> Result<()> {
        let lo = window.0.unwrap_or(f64::NEG_INFINITY);
        let hi = window.1.unwrap_or(f64::INFINITY);
        let idx: Vec<usize> = self
            .times
            .iter()
            .enumerate()
            .filter(|(_, &t)| t >= lo && t <= hi)
            .map(|(i, _)| i)
            .collect();
        if idx.is_empty() {
            return Err(Error::InvalidInput(format!(
                "baseline window [{lo}, {hi}] contains no samples"
            )));
        }
        for trial in &mut self.trials {
            let base: Vec<f64> = idx.iter().map(|&i| trial.data[i]).collect();
            let m = base.iter().sum::<f64>() / base.len() as f64;
            match mode {
                BaselineMode::Mean => trial.data.mapv_inplace(|v| v - m),
                BaselineMode::Ratio => trial.data.mapv_inplace(|v| v / m),
                BaselineMode::Percent => trial.data.mapv_inplace(|v| (v - m) / m),
                BaselineMode::LogRatio => trial.data.mapv_inplace(|v| (v / m).log10()),
                BaselineMode::ZScore => {
                    let var =
                        base.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / base.len() as f64;
                    let sd = var.sqrt();
                    trial.data.mapv_inplace(|v| (v - m) / sd);
                }
            }
        }
        Ok(())
    }
}

/// Baseline-correction method, matching the MNE `rescale` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineMode {
    /// `x - mean(base)`
    Mean,
    /// `x / mean(base)`
    Ratio,
    /// `(x - mean(base)) / mean(base)`
    Percent,
    /// `log10(x / mean(base))`
    LogRatio,
    /// `(x - mean(base)) / std(base)`
    ZScore,
}

impl BaselineMode {
    /// Parse the method name used in analysis parameter files.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "mean" => Ok(Self::Mean),
            "ratio" => Ok(Self::Ratio),
            "percent" => Ok(Self::Percent),
            "logratio" => Ok(Self::LogRatio),
            "zscore" => Ok(Self::ZScore),
            other => Err(Error::Config(format!("unknown baseline method: {other}"))),
        }
    }
}
