//! Group-level evoked averages.
//!
//! Each subject contributes one across-trial mean per condition; the group
//! stacks them as a `[subjects, time]` matrix. Subjects missing either
//! condition of a contrast are excluded from both sides, consistently, so
//! the paired test always sees the same subject set.

use crate::condition::ConditionQuery;
use crate::epoch::TrialSet;
use crate::error::{Error, Result};
use log::debug;
use ndarray::{Array1, Array2, Axis};

/// Across-subject collection of evoked averages for one condition.
#[derive(Debug, Clone)]
pub struct GroupEvoked {
    /// `[subjects, time]`, one row per subject, in subject order.
    pub data: Array2<f64>,
    /// Subject identifiers, row-aligned with `data`.
    pub subjects: Vec<String>,
}

impl GroupEvoked {
    pub fn n_subjects(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Across-subject mean at each time sample.
    pub fn mean(&self) -> Array1<f64> {
        self.data.sum_axis(Axis(0)) / self.n_subjects() as f64
    }

    /// Standard error of the mean at each time sample (ddof = 1).
    pub fn sem(&self) -> Array1<f64> {
        let n = self.n_subjects() as f64;
        let mean = self.mean();
        let mut sem = Array1::<f64>::zeros(self.n_times());
        for j in 0..self.n_times() {
            let var = self
                .data
                .column(j)
                .iter()
                .map(|v| (v - mean[j]) * (v - mean[j]))
                .sum::<f64>()
                / (n - 1.0);
            sem[j] = (var / n).sqrt();
        }
        sem
    }

    /// Confidence band `mean ± z · sem` (z = 1.96 for a 95% interval).
    pub fn ci(&self, z: f64) -> (Array1<f64>, Array1<f64>) {
        let mean = self.mean();
        let margin = self.sem().mapv(|s| z * s);
        (&mean - &margin, &mean + &margin)
    }
}

/// Assemble the paired group matrices for a two-condition contrast from
/// per-subject trial sets. Subjects in `subjects` order; a subject without
/// trials for either condition is dropped from both.
pub fn group_evoked_pair(
    subjects: &[(String, TrialSet)],
    cond_a: &ConditionQuery,
    cond_b: &ConditionQuery,
) -> Result<(GroupEvoked, GroupEvoked)> {
    let n_times = subjects
        .first()
        .map(|(_, ts)| ts.n_times())
        .ok_or_else(|| Error::InvalidInput("no subjects supplied".into()))?;

    let mut kept = Vec::new();
    let mut rows_a = Vec::new();
    let mut rows_b = Vec::new();
    for (sub, ts) in subjects {
        if ts.n_times() != n_times {
            return Err(Error::DimensionMismatch(format!(
                "subject {sub} has {} time samples, expected {n_times}",
                ts.n_times()
            )));
        }
        match (ts.evoked(cond_a), ts.evoked(cond_b)) {
            (Some(a), Some(b)) => {
                kept.push(sub.clone());
                rows_a.push(a);
                rows_b.push(b);
            }
            _ => debug!("subject {sub} has no trials for {cond_a} or {cond_b}, excluded"),
        }
    }

    let stack = |rows: Vec<Array1<f64>>| -> Array2<f64> {
        let mut m = Array2::<f64>::zeros((rows.len(), n_times));
        for (i, row) in rows.into_iter().enumerate() {
            m.row_mut(i).assign(&row);
        }
        m
    };

    Ok((
        GroupEvoked { data: stack(rows_a), subjects: kept.clone() },
        GroupEvoked { data: stack(rows_b), subjects: kept },
    ))
}
