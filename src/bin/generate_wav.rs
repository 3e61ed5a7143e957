use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use swrmeter::config::MeterConfig;
use swrmeter::save_wav;
use swrmeter::simulation::{
    AdditiveNoiseConfig, ImpulseNoiseConfig, Keying, NoiseConfig, Scenario, apply_noise,
    generate_detector_signal,
};

#[derive(Parser, Debug)]
#[command(name = "generate_wav")]
#[command(about = "Generate synthetic SWR meter detector recordings with configurable noise")]
struct Args {
    /// TOML file with optional [noise] and [keying] sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Meter configuration whose calibration tables shape the voltages
    #[arg(long)]
    meter_config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Load SWR values: comma-separated (e.g., "1.0,1.5,3") or range (e.g., "1-3:0.5")
    #[arg(long, default_value = "1-3:0.5")]
    swr: String,

    /// Forward power in dBm
    #[arg(short, long, default_value_t = 50.0)]
    forward_dbm: f32,

    /// Number of trials per SWR value
    #[arg(short, long, default_value_t = 1)]
    trials: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Recording duration in seconds
    #[arg(short, long, default_value_t = 2.0)]
    duration: f32,

    /// Converter sample rate in Hz
    #[arg(long, default_value_t = 1000)]
    sample_rate: u32,

    /// Converter full-scale voltage used to normalize samples
    #[arg(long, default_value_t = 3.3)]
    full_scale_volts: f32,

    /// Output filename prefix
    #[arg(long, default_value = "synth")]
    prefix: String,

    /// Generate manifest.json
    #[arg(long)]
    manifest: bool,

    /// Gaussian noise RMS in volts (CLI override)
    #[arg(long)]
    noise_rms: Option<f32>,

    /// Converter glitch rate in Hz (CLI override)
    #[arg(long)]
    impulse_rate: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    noise: Option<NoiseSection>,
    keying: Option<Keying>,
}

#[derive(Debug, Deserialize)]
struct NoiseSection {
    rms_volts: Option<f32>,
    impulse_rate_hz: Option<f32>,
    impulse_amplitude_volts: Option<f32>,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    swr: f32,
    trial: u32,
    seed: u64,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    sample_rate: u32,
    forward_dbm: f32,
    duration: f32,
    full_scale_volts: f32,
    files: Vec<ManifestEntry>,
}

fn parse_swr_values(s: &str) -> Result<Vec<f32>> {
    let values: Vec<f32> = match s.split_once(':') {
        Some((range, step)) => {
            let (start, end) = range
                .split_once('-')
                .context("SWR range must look like 'start-end:step'")?;
            let start: f32 = start.trim().parse().context("Invalid range start")?;
            let end: f32 = end.trim().parse().context("Invalid range end")?;
            let step: f32 = step.trim().parse().context("Invalid range step")?;
            if step.is_nan() || step <= 0.0 {
                anyhow::bail!("Range step must be positive, got {}", step);
            }

            let steps = ((end - start) / step + 1e-3).floor();
            if steps < 0.0 {
                Vec::new()
            } else {
                (0..=steps as u32).map(|i| start + i as f32 * step).collect()
            }
        }
        None => s
            .split(',')
            .map(|v| v.trim().parse::<f32>().context("Invalid SWR value"))
            .collect::<Result<_>>()?,
    };

    if values.is_empty() {
        anyhow::bail!("No SWR values in '{}'", s);
    }
    if let Some(bad) = values.iter().find(|&&v| v.is_nan() || v < 1.0) {
        anyhow::bail!("SWR must be at least 1.0, got {}", bad);
    }
    Ok(values)
}

fn load_generator_config(path: &Path) -> Result<TomlConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read generator config {}", path.display()))?;
    toml::from_str(&text).context("Invalid generator config")
}

fn build_noise_config(toml: &TomlConfig, args: &Args, seed: u64) -> NoiseConfig {
    let mut config = NoiseConfig::default().with_seed(seed);
    let section = toml.noise.as_ref();

    if let Some(rms_volts) = args.noise_rms.or(section.and_then(|n| n.rms_volts)) {
        config.additive = Some(AdditiveNoiseConfig { rms_volts });
    }

    if let Some(rate_hz) = args.impulse_rate.or(section.and_then(|n| n.impulse_rate_hz)) {
        config.impulse = Some(ImpulseNoiseConfig {
            rate_hz,
            amplitude_volts: section
                .and_then(|n| n.impulse_amplitude_volts)
                .unwrap_or(1.0),
        });
    }

    config
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let toml_config = match args.config.as_deref() {
        Some(path) => load_generator_config(path)?,
        None => TomlConfig::default(),
    };

    let meter_config = match args.meter_config {
        Some(ref path) => MeterConfig::load(path).context("Failed to load meter configuration")?,
        None => MeterConfig::default(),
    };

    let swr_values = parse_swr_values(&args.swr)?;
    let base_seed = args.seed.unwrap_or(0);

    let mut manifest_entries = Vec::new();
    let total_files = swr_values.len() * args.trials as usize;
    let mut file_count = 0;

    for (swr_index, &swr) in swr_values.iter().enumerate() {
        for trial in 0..args.trials {
            let seed = base_seed + trial as u64 * 1000 + swr_index as u64;
            let noise_config = build_noise_config(&toml_config, &args, seed);

            let scenario = Scenario {
                forward_dbm: args.forward_dbm,
                swr,
                sample_rate: args.sample_rate,
                duration_secs: args.duration,
                keying: toml_config.keying.clone(),
            };

            let mut samples = generate_detector_signal(
                &scenario,
                &meter_config.calibration.forward,
                &meter_config.calibration.reverse,
            );
            apply_noise(&mut samples, &noise_config, args.sample_rate as f32);

            let filename = format!("{}_swr{:04.2}_t{:02}.wav", args.prefix, swr, trial);
            let filepath = args.output_dir.join(&filename);

            save_wav(&filepath, &samples, args.sample_rate, args.full_scale_volts)
                .context("Failed to write WAV file")?;

            manifest_entries.push(ManifestEntry {
                file: filename,
                swr,
                trial,
                seed,
            });

            file_count += 1;
            eprint!("\rGenerating: {}/{}", file_count, total_files);
        }
    }
    eprintln!();

    if args.manifest {
        let manifest = Manifest {
            sample_rate: args.sample_rate,
            forward_dbm: args.forward_dbm,
            duration: args.duration,
            full_scale_volts: args.full_scale_volts,
            files: manifest_entries,
        };
        let manifest_path = args.output_dir.join("manifest.json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        total_files,
        args.output_dir.display()
    );
    Ok(())
}
