//! Offline render command.

use super::common::{apply_overrides, demo_score, load_patch, parse_global};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use timbral_config::Score;
use timbral_io::{WavSink, WavSpec};
use timbral_synth::{OfflineRenderer, SynthEngine};

#[derive(Args)]
pub struct RenderArgs {
    /// Score file (TOML). Renders the built-in demo when omitted
    score: Option<PathBuf>,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Patch name or path (overrides the score's patch)
    #[arg(short, long)]
    patch: Option<String>,

    /// Global parameter override, e.g. "cutoff=1200"
    #[arg(long = "set", value_parser = parse_global, number_of_values = 1)]
    set: Vec<(String, f32)>,

    /// Sample rate (overrides the score's)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Output channels (overrides the score's)
    #[arg(long)]
    channels: Option<u16>,

    /// Output bit depth (16 or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Frames per render block
    #[arg(long, default_value = "512")]
    block_size: usize,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if !matches!(args.bit_depth, 16 | 32) {
        anyhow::bail!("bit depth must be 16 or 32, got {}", args.bit_depth);
    }

    let score = match &args.score {
        Some(path) => Score::load(path)?,
        None => demo_score(),
    };
    let sample_rate = args.sample_rate.unwrap_or(score.sample_rate);
    let channels = args.channels.unwrap_or(score.channels).max(1);

    let mut patch = load_patch(args.patch.as_deref().or(score.patch.as_deref()))?;
    apply_overrides(&mut patch, &args.set)?;

    let config = patch.engine_config(sample_rate as f32)?;
    let (mut engine, handle) = SynthEngine::new(config)?;
    patch.apply(handle.globals());
    engine.snap_globals();

    let events = score.timed_events(sample_rate)?;
    let total_frames = score.total_frames(sample_rate);

    println!("Rendering '{}' with patch '{}'", score.name, patch.name);
    println!(
        "  {} events, {:.2}s at {} Hz, {} channel(s)",
        events.len(),
        score.duration_secs(),
        sample_rate,
        channels
    );

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: args.bit_depth,
    };
    let mut sink = WavSink::create(&args.output, spec)?;

    let pb = ProgressBar::new(total_frames);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut renderer = OfflineRenderer::new(usize::from(channels), args.block_size);
    let mut write_error = None;
    let mut peak = 0.0f32;
    let applied = renderer.render(&mut engine, events, total_frames, |block| {
        peak = block.iter().fold(peak, |p, s| p.max(s.abs()));
        if write_error.is_none()
            && let Err(e) = sink.write(block)
        {
            write_error = Some(e);
        }
        pb.inc((block.len() / usize::from(channels)) as u64);
    });
    pb.finish_and_clear();

    if let Some(e) = write_error {
        return Err(e.into());
    }
    sink.finalize()?;

    let stats = engine.stats();
    tracing::debug!(?stats, "render finished");
    println!("Wrote {}", args.output.display());
    println!(
        "  {} events applied, {} notes, {} stolen, {} dropped, peak {:.3}",
        applied, stats.notes_assigned, stats.voices_stolen, stats.notes_dropped, peak
    );

    Ok(())
}
