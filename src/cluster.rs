//! One-sample cluster-based permutation test across subjects.
//!
//! Given paired per-subject evoked averages for two conditions, tests the
//! difference against zero at every time sample with a one-sample t, forms
//! clusters of contiguous suprathreshold samples, and corrects for multiple
//! comparisons with a max-cluster-mass sign-flip permutation null
//! (Maris & Oostenveld, 2007).
//!
//! The permutation loop is the dominant cost (`O(P × subjects × time)`) and
//! runs in parallel over permutations; determinism is preserved by deriving
//! one RNG per permutation from the base seed.

use crate::error::{Error, Result};
use crate::evoked::GroupEvoked;
use log::info;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::ops::Range;

/// Which direction of effect forms clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// Clusters where `t < -threshold`.
    Negative,
    /// Clusters in both directions, split at sign changes.
    TwoSided,
    /// Clusters where `t > threshold`.
    Positive,
}

impl Tail {
    /// Parse the integer encoding used in analysis parameter files
    /// (-1, 0, 1).
    pub fn from_int(tail: i8) -> Result<Self> {
        match tail {
            -1 => Ok(Self::Negative),
            0 => Ok(Self::TwoSided),
            1 => Ok(Self::Positive),
            other => Err(Error::Config(format!("tail must be -1, 0 or 1, got {other}"))),
        }
    }
}

/// One suprathreshold cluster with its permutation p-value.
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Contiguous time indices forming the cluster.
    pub span: Range<usize>,
    /// Sum of the t statistic over the cluster (signed).
    pub mass: f64,
    pub p_value: f64,
}

/// Full outcome of the cluster test, ordered along the time axis.
#[derive(Debug, Clone)]
pub struct ClusterTest {
    /// Observed one-sample t statistic at every time sample.
    pub t_obs: Array1<f64>,
    pub clusters: Vec<Cluster>,
    /// Across-subject mean difference (condition A − condition B).
    pub mean_diff: Array1<f64>,
}

impl ClusterTest {
    /// Clusters with `p_value <= alpha`, for shading by the plotting layer.
    pub fn significant(&self, alpha: f64) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(move |c| c.p_value <= alpha)
    }
}

/// Run the one-sample cluster permutation test on a paired two-condition
/// contrast across subjects.
///
/// `threshold` is the cluster-forming statistic value (its magnitude is
/// used; the tail fixes the direction). `seed` makes the sign-flip
/// permutations reproducible: identical inputs and seed give bit-identical
/// p-values.
pub fn cluster_1samp_across_sub(
    cond_a: &GroupEvoked,
    cond_b: &GroupEvoked,
    n_permutations: usize,
    threshold: f64,
    tail: Tail,
    seed: u64,
) -> Result<ClusterTest> {
    if cond_a.n_subjects() != cond_b.n_subjects() {
        return Err(Error::DimensionMismatch(format!(
            "condition A has {} subjects, condition B has {}",
            cond_a.n_subjects(),
            cond_b.n_subjects()
        )));
    }
    if cond_a.n_times() != cond_b.n_times() {
        return Err(Error::DimensionMismatch(format!(
            "condition A has {} time samples, condition B has {}",
            cond_a.n_times(),
            cond_b.n_times()
        )));
    }
    let n_sub = cond_a.n_subjects();
    if n_sub < 2 {
        return Err(Error::InsufficientData { required: 2, available: n_sub });
    }

    // Per-subject paired difference.
    let diff: Array2<f64> = &cond_a.data - &cond_b.data;

    let t_obs = one_sample_t(&diff);
    let observed = find_clusters(t_obs.view(), threshold, tail);

    // Max-statistic null: one sign-flip surrogate per permutation, keeping
    // only its largest cluster score.
    let null: Vec<f64> = (0..n_permutations)
        .into_par_iter()
        .map(|p| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(p as u64 + 1));
            let mut flipped = diff.clone();
            for mut row in flipped.rows_mut() {
                if rng.gen::<bool>() {
                    row.mapv_inplace(|v| -v);
                }
            }
            let t_perm = one_sample_t(&flipped);
            find_clusters(t_perm.view(), threshold, tail)
                .into_iter()
                .map(|(_, mass)| cluster_score(mass, tail))
                .fold(0.0, f64::max)
        })
        .collect();

    let clusters: Vec<Cluster> = observed
        .into_iter()
        .map(|(span, mass)| {
            let score = cluster_score(mass, tail);
            let n_exceeding = null.iter().filter(|&&m| m >= score).count();
            let p_value = (n_exceeding + 1) as f64 / (n_permutations + 1) as f64;
            Cluster { span, mass, p_value }
        })
        .collect();

    info!(
        "cluster test: {} subjects, {} permutations, {} clusters ({} at p<=0.05)",
        n_sub,
        n_permutations,
        clusters.len(),
        clusters.iter().filter(|c| c.p_value <= 0.05).count()
    );

    let mean_diff = diff.sum_axis(Axis(0)) / n_sub as f64;
    Ok(ClusterTest { t_obs, clusters, mean_diff })
}

/// One-sample t statistic across rows (subjects) at each column (time).
///
/// At a time point with zero variance the statistic is 0 when the mean is
/// also 0, otherwise signed infinity.
fn one_sample_t(data: &Array2<f64>) -> Array1<f64> {
    let n = data.nrows() as f64;
    let n_times = data.ncols();
    let mut t = Array1::<f64>::zeros(n_times);
    for j in 0..n_times {
        let col = data.column(j);
        let mean = col.sum() / n;
        let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
        let denom = (var / n).sqrt();
        t[j] = if denom == 0.0 {
            if mean == 0.0 {
                0.0
            } else {
                mean.signum() * f64::INFINITY
            }
        } else {
            mean / denom
        };
    }
    t
}

/// Maximal contiguous runs of suprathreshold samples and their summed mass.
/// For the two-sided tail, runs are split where the sign changes.
fn find_clusters(t: ndarray::ArrayView1<f64>, threshold: f64, tail: Tail) -> Vec<(Range<usize>, f64)> {
    let thr = threshold.abs();
    // Sign of the cluster a sample can belong to: +1, -1, or 0 (none).
    let membership = |v: f64| -> i8 {
        match tail {
            Tail::Positive => (v > thr) as i8,
            Tail::Negative => -((v < -thr) as i8),
            Tail::TwoSided => {
                if v > thr {
                    1
                } else if v < -thr {
                    -1
                } else {
                    0
                }
            }
        }
    };

    let mut clusters = Vec::new();
    let mut start = 0usize;
    let mut mass = 0.0;
    let mut current: i8 = 0;
    for (i, &v) in t.iter().enumerate() {
        let m = membership(v);
        if m == current && m != 0 {
            mass += v;
            continue;
        }
        if current != 0 {
            clusters.push((start..i, mass));
        }
        if m != 0 {
            start = i;
            mass = v;
        }
        current = m;
    }
    if current != 0 {
        clusters.push((start..t.len(), mass));
    }
    clusters
}

/// Scalar a cluster is ranked by under the given tail.
fn cluster_score(mass: f64, tail: Tail) -> f64 {
    match tail {
        Tail::Positive => mass,
        Tail::Negative => -mass,
        Tail::TwoSided => mass.abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn group(data: Array2<f64>) -> GroupEvoked {
        let subjects = (0..data.nrows()).map(|i| format!("s{i}")).collect();
        GroupEvoked { data, subjects }
    }

    #[test]
    fn find_clusters_positive_runs() {
        let t = array![0.0, 3.0, 4.0, 0.0, 5.0, 0.0];
        let c = find_clusters(t.view(), 2.0, Tail::Positive);
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].0, 1..3);
        approx::assert_abs_diff_eq!(c[0].1, 7.0, epsilon = 1e-12);
        assert_eq!(c[1].0, 4..5);
    }

    #[test]
    fn two_sided_runs_split_at_sign_changes() {
        let t = array![3.0, 4.0, -3.0, -4.0, 3.0];
        let c = find_clusters(t.view(), 2.0, Tail::TwoSided);
        assert_eq!(c.len(), 3);
        assert_eq!(c[0].0, 0..2);
        assert_eq!(c[1].0, 2..4);
        approx::assert_abs_diff_eq!(c[1].1, -7.0, epsilon = 1e-12);
        assert_eq!(c[2].0, 4..5);
    }

    #[test]
    fn negative_tail_ignores_positive_excursions() {
        let t = array![5.0, -5.0, -6.0, 5.0];
        let c = find_clusters(t.view(), 2.0, Tail::Negative);
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].0, 1..3);
    }

    #[test]
    fn t_statistic_of_constant_offset() {
        // Two subjects, both +1 at every time point: mean 1, sd 0 → +inf.
        let d = Array2::from_elem((2, 3), 1.0);
        let t = one_sample_t(&d);
        assert!(t.iter().all(|v| v.is_infinite() && v.is_sign_positive()));
    }

    #[test]
    fn t_statistic_of_zero_difference_is_zero() {
        let d = Array2::zeros((4, 6));
        let t = one_sample_t(&d);
        assert!(t.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn identical_conditions_yield_no_clusters() {
        let a = group(array![[1.0, 2.0, 3.0], [2.0, 1.0, 0.5], [0.0, 3.0, 1.0]]);
        let b = a.clone();
        let out = cluster_1samp_across_sub(&a, &b, 100, 2.0, Tail::Positive, 7).unwrap();
        assert!(out.t_obs.iter().all(|&v| v == 0.0));
        assert!(out.clusters.is_empty());
        assert!(out.mean_diff.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn same_seed_reproduces_p_values() {
        let a = group(Array2::from_shape_fn((8, 30), |(i, j)| {
            ((i * 13 + j * 7) as f64).sin() + if (10..20).contains(&j) { 1.0 } else { 0.0 }
        }));
        let b = group(Array2::from_shape_fn((8, 30), |(i, j)| ((i * 13 + j * 7) as f64).sin()));
        let r1 = cluster_1samp_across_sub(&a, &b, 200, 2.0, Tail::Positive, 42).unwrap();
        let r2 = cluster_1samp_across_sub(&a, &b, 200, 2.0, Tail::Positive, 42).unwrap();
        assert_eq!(r1.clusters.len(), r2.clusters.len());
        for (c1, c2) in r1.clusters.iter().zip(r2.clusters.iter()) {
            assert_eq!(c1.p_value.to_bits(), c2.p_value.to_bits());
            assert_eq!(c1.span, c2.span);
        }
    }

    #[test]
    fn subject_count_mismatch_is_rejected() {
        let a = group(Array2::zeros((3, 5)));
        let b = group(Array2::zeros((4, 5)));
        assert!(matches!(
            cluster_1samp_across_sub(&a, &b, 10, 2.0, Tail::Positive, 0),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn time_axis_mismatch_is_rejected() {
        let a = group(Array2::zeros((3, 5)));
        let b = group(Array2::zeros((3, 6)));
        assert!(matches!(
            cluster_1samp_across_sub(&a, &b, 10, 2.0, Tail::Positive, 0),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn single_subject_is_rejected() {
        let a = group(Array2::zeros((1, 5)));
        let b = group(Array2::zeros((1, 5)));
        assert!(matches!(
            cluster_1samp_across_sub(&a, &b, 10, 2.0, Tail::Positive, 0),
            Err(Error::InsufficientData { .. })
        ));
    }

    #[test]
    fn p_values_never_reach_zero_and_decrease_with_mass() {
        // One strong and one weak effect window on a common noise floor.
        let a = group(Array2::from_shape_fn((10, 60), |(i, j)| {
            let noise = ((i * 31 + j * 17) as f64).sin() * 0.3;
            let gain = 1.0 + 0.1 * i as f64;
            let strong = if (5..15).contains(&j) { 3.0 * gain } else { 0.0 };
            let weak = if (40..44).contains(&j) { 1.2 * gain } else { 0.0 };
            noise + strong + weak
        }));
        let b = group(Array2::from_shape_fn((10, 60), |(i, j)| {
            ((i * 31 + j * 17) as f64).sin() * 0.3
        }));
        let out = cluster_1samp_across_sub(&a, &b, 500, 2.0, Tail::Positive, 123).unwrap();
        assert!(!out.clusters.is_empty());
        for c in &out.clusters {
            assert!(c.p_value > 0.0 && c.p_value <= 1.0);
        }
        // Monotonic: heavier mass never gets a larger p-value.
        let mut by_mass: Vec<&Cluster> = out.clusters.iter().collect();
        by_mass.sort_by(|x, y| x.mass.partial_cmp(&y.mass).unwrap());
        for pair in by_mass.windows(2) {
            assert!(pair[0].p_value >= pair[1].p_value);
        }
    }

    #[test]
    fn strong_effect_is_significant() {
        let a = group(Array2::from_shape_fn((12, 40), |(i, j)| {
            let noise = ((i * 7 + j * 3) as f64).sin() * 0.2;
            let gain = 1.0 + 0.05 * i as f64;
            noise + if (10..30).contains(&j) { 2.0 * gain } else { 0.0 }
        }));
        let b = group(Array2::from_shape_fn((12, 40), |(i, j)| {
            ((i * 7 + j * 3) as f64).sin() * 0.2
        }));
        let out = cluster_1samp_across_sub(&a, &b, 1000, 2.0, Tail::Positive, 99).unwrap();
        assert!(out.significant(0.05).next().is_some());
    }
}
