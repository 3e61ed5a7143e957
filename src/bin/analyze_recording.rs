use clap::Parser;
use rolling_stats::Stats;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use swrmeter::acquisition::{CsvSource, SampleSource, WavFileSource};
use swrmeter::config::{AdcInput, HoldDuration, MeterConfig};
use swrmeter::processing::MeterProcessor;

#[derive(Parser, Debug)]
#[command(name = "analyze_recording")]
#[command(about = "Replay detector recordings through the meter pipeline and summarize", long_about = None)]
struct Args {
    /// Recordings to analyze (.wav stereo, or .csv with time_ms,ch0,ch1)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format: text, csv, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Meter configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Swap forward/reverse inputs
    #[arg(short = 's', long)]
    swap_channels: bool,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Peak hold time (e.g., "1500", "800ms", "2s")
    #[arg(long)]
    hold: Option<HoldDuration>,

    /// Median window override (both channels)
    #[arg(long)]
    median_window: Option<usize>,

    /// Moving-average window override (both channels)
    #[arg(long)]
    average_window: Option<usize>,

    /// Converter full-scale voltage for WAV recordings
    #[arg(long, default_value = "3.3")]
    full_scale_volts: f32,

    /// Ignore cycles before this time while the filters settle, in ms
    #[arg(long, default_value = "0")]
    settle_ms: u64,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct StatsSummary {
    count: usize,
    mean: f32,
    std_dev: f32,
    min: f32,
    max: f32,
}

impl StatsSummary {
    fn from_stats(stats: &Stats<f32>) -> Option<Self> {
        if stats.count == 0 {
            return None;
        }
        Some(Self {
            count: stats.count,
            mean: stats.mean,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
struct FileAnalysis {
    filename: String,
    sample_count: usize,
    forward_watts: Option<StatsSummary>,
    reverse_watts: Option<StatsSummary>,
    swr: Option<StatsSummary>,
    return_loss_db: Option<StatsSummary>,
    invalid_cycles: usize,
    peak_forward_watts: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match args.config {
        Some(ref path) => MeterConfig::load(path)?,
        None => MeterConfig::default(),
    };

    if args.swap_channels {
        config.input.forward_channel = AdcInput::Ch1;
        config.input.reverse_channel = AdcInput::Ch0;
    }
    if let Some(hold) = args.hold {
        config.peak_hold.hold_ms = hold.as_millis();
    }
    if let Some(median) = args.median_window {
        config.forward_filter.median_window = median;
        config.reverse_filter.median_window = median;
    }
    if let Some(average) = args.average_window {
        config.forward_filter.average_window = average;
        config.reverse_filter.average_window = average;
    }

    let settle = Duration::from_millis(args.settle_ms);
    let results: Vec<FileAnalysis> = args
        .files
        .iter()
        .map(|path| analyze_file(path, &config, args.full_scale_volts, settle))
        .collect();

    match args.format {
        OutputFormat::Text => print_text(&results),
        OutputFormat::Csv => print_csv(&results),
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn open_source(path: &Path, full_scale_volts: f32) -> anyhow::Result<Box<dyn SampleSource>> {
    const BLOCK_SIZE: usize = 1024;
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(Box::new(CsvSource::open(path, BLOCK_SIZE)?))
    } else {
        Ok(Box::new(WavFileSource::new(path, BLOCK_SIZE, full_scale_volts)?))
    }
}

fn analyze_file(
    path: &Path,
    config: &MeterConfig,
    full_scale_volts: f32,
    settle: Duration,
) -> FileAnalysis {
    match analyze_file_impl(path, config, full_scale_volts, settle) {
        Ok(analysis) => analysis,
        Err(e) => FileAnalysis {
            filename: display_name(path),
            sample_count: 0,
            forward_watts: None,
            reverse_watts: None,
            swr: None,
            return_loss_db: None,
            invalid_cycles: 0,
            peak_forward_watts: None,
            error: Some(e.to_string()),
        },
    }
}

fn analyze_file_impl(
    path: &Path,
    config: &MeterConfig,
    full_scale_volts: f32,
    settle: Duration,
) -> anyhow::Result<FileAnalysis> {
    let mut source = open_source(path, full_scale_volts)?;
    let mut processor = MeterProcessor::new(config);

    let mut forward_stats: Stats<f32> = Stats::new();
    let mut reverse_stats: Stats<f32> = Stats::new();
    let mut swr_stats: Stats<f32> = Stats::new();
    let mut return_loss_stats: Stats<f32> = Stats::new();
    let mut sample_count = 0;
    let mut invalid_cycles = 0;
    let mut peak_forward: Option<f32> = None;

    while let Some(block) = source.next_block()? {
        sample_count += block.len();
        for snapshot in processor.process_block(&block) {
            if snapshot.timestamp < settle {
                continue;
            }

            forward_stats.update(snapshot.forward_watts);
            reverse_stats.update(snapshot.reverse_watts);
            peak_forward = Some(peak_forward.map_or(snapshot.forward_peak_watts, |p| {
                p.max(snapshot.forward_peak_watts)
            }));

            if snapshot.is_valid() {
                swr_stats.update(snapshot.swr);
            } else {
                invalid_cycles += 1;
            }
            if snapshot.swr_report().has_return_loss() {
                return_loss_stats.update(snapshot.return_loss_db);
            }
        }
    }

    log::info!(
        "{}: {} samples, {} invalid cycles",
        path.display(),
        sample_count,
        invalid_cycles
    );

    Ok(FileAnalysis {
        filename: display_name(path),
        sample_count,
        forward_watts: StatsSummary::from_stats(&forward_stats),
        reverse_watts: StatsSummary::from_stats(&reverse_stats),
        swr: StatsSummary::from_stats(&swr_stats),
        return_loss_db: StatsSummary::from_stats(&return_loss_stats),
        invalid_cycles,
        peak_forward_watts: peak_forward,
        error: None,
    })
}

fn mean_or_dash(stats: &Option<StatsSummary>, precision: usize) -> String {
    stats
        .as_ref()
        .map(|s| format!("{:.*}", precision, s.mean))
        .unwrap_or_else(|| "-".to_string())
}

fn print_text(results: &[FileAnalysis]) {
    println!(
        "{:<40} {:>10} {:>10} {:>8} {:>8} {:>10} {:>8}",
        "File", "Fwd W", "Rev W", "SWR", "RL dB", "Peak W", "Samples"
    );
    println!("{}", "-".repeat(100));

    for result in results {
        if let Some(ref err) = result.error {
            println!("{:<40} ERROR: {}", result.filename, err);
            continue;
        }

        let peak = result
            .peak_forward_watts
            .map(|p| format!("{:.3}", p))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<40} {:>10} {:>10} {:>8} {:>8} {:>10} {:>8}",
            result.filename,
            mean_or_dash(&result.forward_watts, 3),
            mean_or_dash(&result.reverse_watts, 4),
            mean_or_dash(&result.swr, 2),
            mean_or_dash(&result.return_loss_db, 1),
            peak,
            result.sample_count
        );
    }

    for result in results {
        if result.error.is_some() {
            continue;
        }

        if let Some(ref swr) = result.swr {
            eprintln!();
            eprintln!("SWR statistics for {}:", result.filename);
            eprintln!("  Mean: {:.3}", swr.mean);
            eprintln!("  Std dev: {:.3}", swr.std_dev);
            eprintln!("  Min: {:.3}", swr.min);
            eprintln!("  Max: {:.3}", swr.max);
        }
        if result.invalid_cycles > 0 {
            eprintln!(
                "  {} cycles had no valid SWR (no forward power or reflected >= forward)",
                result.invalid_cycles
            );
        }
    }
}

fn print_csv(results: &[FileAnalysis]) {
    println!(
        "filename,fwd_w_mean,fwd_w_std,rev_w_mean,rev_w_std,swr_mean,swr_std,swr_min,swr_max,return_loss_mean,invalid_cycles,peak_fwd_w,sample_count,error"
    );
    let field = |s: &Option<StatsSummary>, f: fn(&StatsSummary) -> f32| {
        s.as_ref().map(|s| format!("{:.6}", f(s))).unwrap_or_default()
    };
    for result in results {
        let peak = result
            .peak_forward_watts
            .map(|p| format!("{:.6}", p))
            .unwrap_or_default();
        let error = result.error.as_deref().unwrap_or("");

        println!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            result.filename,
            field(&result.forward_watts, |s| s.mean),
            field(&result.forward_watts, |s| s.std_dev),
            field(&result.reverse_watts, |s| s.mean),
            field(&result.reverse_watts, |s| s.std_dev),
            field(&result.swr, |s| s.mean),
            field(&result.swr, |s| s.std_dev),
            field(&result.swr, |s| s.min),
            field(&result.swr, |s| s.max),
            field(&result.return_loss_db, |s| s.mean),
            result.invalid_cycles,
            peak,
            result.sample_count,
            error
        );
    }
}

fn print_json(results: &[FileAnalysis]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
