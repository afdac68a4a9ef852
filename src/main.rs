use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, Level};
use twostep_core::{GeneratorParams, RewardGenerator, TrialRecord};
use twostep_experiment::{load_generator_params, save_history, TaskConfig};
use winit::event_loop::EventLoop;

mod app;
mod assets;
mod renderer;

use app::App;
use assets::{Assets, IMAGE_SCALE};
use renderer::ExperimentRenderer;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GeneratorKind {
    Brownian,
    Blocked,
}

impl GeneratorKind {
    fn preset(self) -> GeneratorParams {
        match self {
            GeneratorKind::Brownian => GeneratorParams::brownian_preset(),
            GeneratorKind::Blocked => GeneratorParams::blocked_preset(),
        }
    }
}

/// Two-step decision task with drifting reward probabilities
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Trial attempts in the session, timed-out ones included
    #[arg(long, default_value_t = 201)]
    n_trials: usize,

    /// Reward probability schedule
    #[arg(long, value_enum, default_value_t = GeneratorKind::Brownian)]
    generator: GeneratorKind,

    /// JSON file with generator parameters, overrides --generator
    #[arg(long)]
    generator_config: Option<PathBuf>,

    /// Seconds allowed for the first choice
    #[arg(long, default_value_t = 2.0)]
    step1_timeout: f64,

    /// Seconds allowed for the second choice
    #[arg(long, default_value_t = 3.0)]
    step2_timeout: f64,

    /// History is written to <OUTPUT>.csv
    #[arg(long, default_value = "two-step")]
    output: String,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,

    /// Seed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,

    /// Directory holding the card and feedback images
    #[arg(long, default_value = "images")]
    images: PathBuf,

    #[arg(long)]
    fullscreen: bool,
}

fn timeout(secs: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| format!("invalid {flag}: {secs}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.quiet { Level::WARN } else { Level::INFO })
        .with_target(false)
        .init();

    let params = match &args.generator_config {
        Some(path) => load_generator_params(path)?,
        None => args.generator.preset(),
    };
    let generator = params.build().context("invalid generator parameters")?;
    info!(kind = generator.kind(), step2flip = generator.step2flip(), "reward generator ready");

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let config = TaskConfig {
        n_trials: args.n_trials,
        step1_timeout: timeout(args.step1_timeout, "--step1-timeout")?,
        step2_timeout: timeout(args.step2_timeout, "--step2-timeout")?,
        ..TaskConfig::default()
    };

    let assets = Assets::load(&args.images, IMAGE_SCALE)?;
    let renderer = ExperimentRenderer::new(assets);
    let mut app = App::new(config, generator, rng, renderer, args.fullscreen);

    let event_loop = EventLoop::new()?;
    let loop_error = event_loop.run_app(&mut app).err().map(anyhow::Error::from);

    let (history, failure) = app.into_parts();
    for record in &history {
        info!("{}", record.fields().join(","));
    }
    finish_session(&args.output, &history, failure.or(loop_error))?;
    Ok(())
}

/// Saves the collected history, then reports the failure that ended the
/// session, if any. A failed save never hides that failure.
fn finish_session(
    output: &str,
    history: &[TrialRecord],
    failure: Option<anyhow::Error>,
) -> Result<PathBuf> {
    let saved = save_history(output, history);
    if let Some(e) = failure {
        if let Err(save_error) = &saved {
            error!("cannot save history: {save_error}");
        }
        return Err(e);
    }
    Ok(saved?)
}
