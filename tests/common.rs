//! Shared builders for synthetic pupillometry data.

use ndarray::{Array1, Array2};
use pupil::{Annotation, Channel, GroupEvoked, Recording};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SFREQ: f64 = 250.0;

/// A plausible pupil trace: slow drift plus small jitter, around 3 mm.
#[allow(unused)]
pub fn pupil_trace(n: usize, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array1::from_iter((0..n).map(|i| {
        3.0 + 0.2 * (i as f64 / SFREQ * 0.5).sin() + rng.gen_range(-0.01..0.01)
    }))
}

/// Insert a blink: a NaN gap with sharp artifacts at the edges, plus the
/// matching annotation.
#[allow(unused)]
pub fn insert_blink(
    data: &mut Array1<f64>,
    annotations: &mut Vec<Annotation>,
    start: usize,
    len: usize,
    eye: &str,
) {
    data[start - 1] += 1.5;
    for i in start..start + len {
        data[i] = f64::NAN;
    }
    data[start + len] -= 1.5;
    annotations.push(Annotation {
        onset: start as f64 / SFREQ,
        duration: len as f64 / SFREQ,
        description: format!("blink_{eye}"),
    });
}

/// Two-eye recording with one blink per eye.
#[allow(unused)]
pub fn blinky_recording(n: usize) -> Recording {
    let mut annotations = Vec::new();
    let mut left = pupil_trace(n, 11);
    insert_blink(&mut left, &mut annotations, n / 4, 40, "L");
    let mut right = pupil_trace(n, 22);
    insert_blink(&mut right, &mut annotations, n / 2, 55, "R");
    Recording::new(
        vec![
            Channel { name: "LPupil".into(), data: left },
            Channel { name: "RPupil".into(), data: right },
        ],
        annotations,
        SFREQ,
    )
    .unwrap()
}

/// Group matrix of evoked rows: per-subject noise plus `amplitude` inside
/// `effect` (with a little between-subject spread so the variance is real).
#[allow(unused)]
pub fn group_with_effect(
    n_subjects: usize,
    n_times: usize,
    effect: std::ops::Range<usize>,
    amplitude: f64,
    seed: u64,
) -> GroupEvoked {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = Array2::from_shape_fn((n_subjects, n_times), |(i, j)| {
        let noise: f64 = rng.gen_range(-0.2..0.2);
        let gain = 1.0 + 0.1 * i as f64;
        noise + if effect.contains(&j) { amplitude * gain } else { 0.0 }
    });
    GroupEvoked {
        data,
        subjects: (0..n_subjects).map(|i| format!("SX{:03}", 100 + i)).collect(),
    }
}
