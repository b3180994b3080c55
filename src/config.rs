//! Analysis parameter files.
//!
//! One JSON file per analysis, submitted as an independent job. The core
//! treats the parameters as plain values; the filter/detector components
//! keep their own internal defaults (`threshold_factor = 4`), while the
//! permutation count, cluster threshold and tail have no library defaults
//! and must come from this file or the caller.

use crate::cluster::Tail;
use crate::epoch::BaselineMode;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Recognized options of one analysis configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisParameters {
    pub session: String,
    pub task: String,
    pub data_type: String,
    pub epoch_name: String,
    /// Task-relevance labels, contrasted pairwise (first vs second).
    pub task_relevance: Vec<String>,
    /// Duration-bucket labels analysed separately.
    pub duration: Vec<String>,
    /// Crop window (start, end) in seconds, applied after loading.
    pub crop: Option<(f64, f64)>,
    /// Channels to analyse.
    pub picks: Vec<String>,
    /// Baseline method name (see [`BaselineMode::parse`]).
    pub baseline: String,
    /// Baseline window (start, end) in seconds; `null` means open-ended.
    pub baseline_window: (Option<f64>, Option<f64>),
    pub n_permutations: usize,
    /// Cluster-forming statistic threshold.
    pub threshold: f64,
    /// Statistic tail: -1, 0 or 1.
    pub tail: i8,
}

impl AnalysisParameters {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let params: Self =
            serde_json::from_str(text).map_err(|e| Error::Config(format!("invalid parameter file: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        if self.task_relevance.len() != 2 {
            return Err(Error::Config(format!(
                "task_relevance must name exactly 2 conditions to contrast, got {}",
                self.task_relevance.len()
            )));
        }
        if self.n_permutations == 0 {
            return Err(Error::Config("n_permutations must be positive".into()));
        }
        if !(self.threshold > 0.0) {
            return Err(Error::Config(format!(
                "cluster threshold must be positive, got {}",
                self.threshold
            )));
        }
        if let Some((start, end)) = self.crop {
            if end <= start {
                return Err(Error::Config(format!("empty crop window ({start}, {end})")));
            }
        }
        // Fail fast on the enum-like fields too.
        self.baseline_mode()?;
        self.statistic_tail()?;
        Ok(())
    }

    pub fn baseline_mode(&self) -> Result<BaselineMode> {
        BaselineMode::parse(&self.baseline)
    }

    pub fn statistic_tail(&self) -> Result<Tail> {
        Tail::from_int(self.tail)
    }
}
