use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use pupil::{
    clean_pupil,
    events::extract_eyelink_events,
    io::{load_recording, write_recording},
    outliers::DEFAULT_THRESHOLD_FACTOR,
};

#[derive(Parser)]
#[command(name = "pupil_clean", about = "Per-subject pupil artifact rejection")]
struct Args {
    /// Input recording (safetensors).
    #[arg(long)]
    input: PathBuf,

    /// Cleaned recording output path.
    #[arg(long)]
    output: PathBuf,

    /// Pupil channels to clean (comma-separated).
    #[arg(long, default_value = "LPupil,RPupil")]
    channels: String,

    /// Dilation-speed MAD threshold factor.
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_FACTOR)]
    threshold_factor: f64,

    /// Eyelink event kinds to convert to regressor channels (comma-separated,
    /// empty to skip).
    #[arg(long, default_value = "blink,saccade")]
    events: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut rec = load_recording(&args.input)?;
    println!(
        "Loaded {} channels × {} samples @ {} Hz, {} annotations",
        rec.channel_names().count(),
        rec.n_times(),
        rec.sfreq,
        rec.annotations.len()
    );

    let channels: Vec<&str> = args.channels.split(',').filter(|s| !s.is_empty()).collect();
    let reports = clean_pupil(&mut rec, &channels, args.threshold_factor)?;
    for r in &reports {
        println!(
            "{}: rejected {} of {} samples ({:.2}%)",
            r.channel,
            r.n_rejected,
            r.n_total,
            r.percent()
        );
    }

    for kind in args.events.split(',').filter(|s| !s.is_empty()) {
        extract_eyelink_events(&mut rec, kind, &["L", "R"])?;
    }

    write_recording(&rec, &args.output)?;
    println!("Written → {}", args.output.display());
    Ok(())
}
