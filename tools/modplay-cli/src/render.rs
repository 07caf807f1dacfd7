//! `modplay render`: render a module to a 32-bit float WAV file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use hound::{SampleFormat, WavSpec, WavWriter};
use nether_modplay::{
    EndBehaviour, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, Module, Player, RenderConfig,
};
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64;

use crate::{format_duration, load_module, parse_controls};

/// Frames rendered per read call
const CHUNK_FRAMES: usize = 4096;

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// XM or MOD file
    pub file: PathBuf,

    /// Output WAV file (default: input path with a .wav extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long, default_value_t = 44100)]
    pub rate: u32,

    /// Subsong to render
    #[arg(long, default_value_t = 0)]
    pub subsong: i32,

    /// Extra passes through the song (-1 loops until --seconds)
    #[arg(long, allow_negative_numbers = true)]
    pub repeat: Option<i32>,

    /// Stop after this many seconds of output
    #[arg(long)]
    pub seconds: Option<f64>,

    /// Render config TOML file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Control as key=value (repeatable); applied after --config
    #[arg(long = "ctl", value_name = "KEY=VALUE")]
    pub ctl: Vec<String>,

    /// Print an xxh3 hash of the rendered samples
    #[arg(long)]
    pub checksum: bool,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let controls = parse_controls(&args.ctl)?;
    let module = load_module(&args.file, &controls)?;

    let config = match &args.config {
        Some(path) => {
            let mut config = RenderConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            controls
                .apply_to(&mut config)
                .context("Failed to apply --ctl on top of the config file")?;
            config
        }
        None => module.default_config().clone(),
    };
    debug!(?config, "render config");

    let samples = render_samples(&module, config, &args)?;
    let frames = samples.len() / 2;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.file.with_extension("wav"));
    write_wav(&output, args.rate, &samples)?;

    info!(
        output = %output.display(),
        frames,
        duration = %format_duration(frames as f64 / args.rate as f64),
        "rendered"
    );
    if args.checksum {
        println!("{:016x}", checksum(&samples));
    }
    Ok(())
}

/// Render interleaved stereo samples for the given arguments
pub fn render_samples(module: &Module, config: RenderConfig, args: &RenderArgs) -> Result<Vec<f32>> {
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&args.rate) {
        bail!(
            "Sample rate {} outside {MIN_SAMPLE_RATE}..={MAX_SAMPLE_RATE}",
            args.rate
        );
    }

    let mut player = Player::with_config(module.clone(), config);
    player
        .select_subsong(args.subsong)
        .with_context(|| format!("Invalid subsong {}", args.subsong))?;
    if let Some(repeat) = args.repeat {
        player
            .set_repeat_count(repeat)
            .with_context(|| format!("Invalid repeat count {repeat}"))?;
    }

    let endless = player.repeat_count() == -1 || player.config().end_behaviour == EndBehaviour::Continue;
    let limit = match args.seconds {
        Some(seconds) if seconds.is_finite() && seconds >= 0.0 => {
            Some((seconds * args.rate as f64).round() as usize)
        }
        Some(seconds) => bail!("Invalid --seconds {seconds}"),
        None if endless => bail!("Playback never ends with these settings; pass --seconds"),
        None => None,
    };

    player.play();
    let mut samples = Vec::new();
    let mut buffer = vec![0.0f32; CHUNK_FRAMES * 2];
    let mut restarted = false;
    loop {
        let want = limit.map_or(CHUNK_FRAMES, |l| (l - samples.len() / 2).min(CHUNK_FRAMES));
        if want == 0 {
            break;
        }
        let frames = player.read_interleaved_stereo(args.rate, &mut buffer[..want * 2]);
        if frames == 0 {
            // Continue mode restarts on the next read; a song with no rows never produces any
            if player.is_playing() && !restarted {
                restarted = true;
                continue;
            }
            break;
        }
        restarted = false;
        samples.extend_from_slice(&buffer[..frames * 2]);
    }

    Ok(samples)
}

/// Stereo 32-bit float WAV
pub fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer =
        WavWriter::create(path, spec).with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finish {}", path.display()))?;
    Ok(())
}

/// xxh3 of the raw sample bytes
pub fn checksum(samples: &[f32]) -> u64 {
    xxh3_64(bytemuck::cast_slice(samples))
}
