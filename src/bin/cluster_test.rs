use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use pupil::{
    cluster::cluster_1samp_across_sub,
    config::AnalysisParameters,
    io::{load_group_pair, write_cluster_report},
};

#[derive(Parser)]
#[command(
    name = "cluster_test",
    about = "Cluster-based permutation test on a two-condition group contrast"
)]
struct Args {
    /// Analysis parameter file (JSON).
    #[arg(long)]
    params: PathBuf,

    /// Group evoked file with cond_a / cond_b [subjects, time] (safetensors).
    #[arg(long)]
    input: PathBuf,

    /// Cluster report output path (JSON).
    #[arg(long)]
    output: PathBuf,

    /// Permutation seed (same seed + same inputs = identical p-values).
    #[arg(long, default_value_t = 20220927)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = AnalysisParameters::load(&args.params)
        .with_context(|| format!("loading {}", args.params.display()))?;
    let (cond_a, cond_b, times) = load_group_pair(&args.input)?;
    println!(
        "Contrast {} vs {}: {} subjects × {} samples ({:.2}..{:.2} s)",
        params.task_relevance[0],
        params.task_relevance[1],
        cond_a.n_subjects(),
        cond_a.n_times(),
        times.first().copied().unwrap_or(f64::NAN),
        times.last().copied().unwrap_or(f64::NAN),
    );

    let test = cluster_1samp_across_sub(
        &cond_a,
        &cond_b,
        params.n_permutations,
        params.threshold,
        params.statistic_tail()?,
        args.seed,
    )?;

    if test.clusters.is_empty() {
        println!("No suprathreshold clusters at threshold {}", params.threshold);
    }
    for (i, c) in test.clusters.iter().enumerate() {
        println!(
            "cluster {i}: samples {}..{} mass {:.3} p = {:.4}",
            c.span.start, c.span.end, c.mass, c.p_value
        );
    }

    write_cluster_report(&test, &args.output)?;
    println!("Written → {}", args.output.display());
    Ok(())
}
