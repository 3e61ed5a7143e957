use clap::Parser;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use swrmeter::acquisition::{CsvSource, SampleSource, SourceReader, WavFileSource};
use swrmeter::config::{AdcInput, HoldDuration, MeterConfig};
use swrmeter::output::{OutputFormat, create_formatter, iso8601_timestamp};
use swrmeter::processing::{MeasurementSnapshot, MeterProcessor};

const BLOCK_SIZE: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "swrmeter")]
#[command(about = "SWR / power meter: filters detector voltages and reports power, SWR and return loss")]
struct Args {
    /// Detector recording (.wav stereo or .csv time_ms,ch0,ch1); reads CSV from stdin when omitted
    input: Option<PathBuf>,

    /// Meter configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Peak hold time (e.g., "1500", "800ms", "2s")
    #[arg(long)]
    hold: Option<HoldDuration>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Show voltages, dBm and return loss in text output
    #[arg(short, long)]
    verbose: bool,

    /// Reports per second of recorded time
    #[arg(long, default_value_t = 10.0)]
    output_rate_hz: f32,

    /// Converter full-scale voltage for WAV recordings
    #[arg(long, default_value_t = 3.3)]
    full_scale_volts: f32,

    /// Swap forward/reverse inputs
    #[arg(short, long)]
    swap_channels: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => MeterConfig::load(path)?,
        None => MeterConfig::default(),
    };
    if let Some(hold) = args.hold {
        config.peak_hold.hold_ms = hold.as_millis();
    }
    if args.swap_channels {
        config.input.forward_channel = AdcInput::Ch1;
        config.input.reverse_channel = AdcInput::Ch0;
    }
    config.validate()?;

    if args.output_rate_hz.is_nan() || args.output_rate_hz <= 0.0 {
        anyhow::bail!("Output rate must be positive");
    }

    log::info!(
        "Forward input {:?}, reverse input {:?}, peak hold {} ms",
        config.input.forward_channel,
        config.input.reverse_channel,
        config.peak_hold.hold_ms
    );
    log::info!(
        "Filters: forward median {} / average {}, reverse median {} / average {}",
        config.forward_filter.median_window,
        config.forward_filter.average_window,
        config.reverse_filter.median_window,
        config.reverse_filter.average_window
    );

    let source = open_source(&args)?;
    let reader = SourceReader::spawn(source, 8);

    let (snapshot_tx, snapshot_rx) = bounded(64);
    let processing_config = config.clone();
    let processing = thread::spawn(move || {
        let cycles = run_processing_loop(&reader, processing_config, snapshot_tx);
        (cycles, reader)
    });

    let interval = Duration::from_secs_f32(1.0 / args.output_rate_hz);
    run_output_loop(snapshot_rx, &args, &config, interval)?;

    let (cycles, reader) = processing
        .join()
        .map_err(|_| anyhow::anyhow!("processing thread panicked"))?;
    let samples = reader.join()?;
    log::info!("Processed {} cycles from {} samples", cycles, samples);

    Ok(())
}

fn open_source(args: &Args) -> anyhow::Result<Box<dyn SampleSource>> {
    let Some(ref path) = args.input else {
        log::info!("Reading CSV samples from stdin");
        return Ok(Box::new(CsvSource::new(
            BufReader::new(std::io::stdin()),
            BLOCK_SIZE,
        )));
    };

    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        log::info!("Reading CSV samples from {}", path.display());
        Ok(Box::new(CsvSource::open(path, BLOCK_SIZE)?))
    } else {
        let source = WavFileSource::new(path, BLOCK_SIZE, args.full_scale_volts)?;
        log::info!(
            "Reading {} samples at {} Hz from {}",
            source.len(),
            source.sample_rate(),
            path.display()
        );
        Ok(Box::new(source))
    }
}

/// Filters every sample pair and hands snapshots to the output loop
///
/// Returns the number of cycles processed.
fn run_processing_loop(
    reader: &SourceReader,
    config: MeterConfig,
    snapshot_tx: Sender<MeasurementSnapshot>,
) -> usize {
    let mut processor = MeterProcessor::new(&config);
    let mut cycles = 0;

    while let Some(block) = reader.recv() {
        for sample in &block {
            let snapshot = processor.process_sample(sample);
            cycles += 1;
            if snapshot_tx.send(snapshot).is_err() {
                log::warn!("Output loop closed");
                return cycles;
            }
        }
    }

    cycles
}

/// Prints snapshots, throttled to one per `interval` of recorded time
fn run_output_loop(
    snapshot_rx: Receiver<MeasurementSnapshot>,
    args: &Args,
    config: &MeterConfig,
    interval: Duration,
) -> anyhow::Result<()> {
    let formatter = create_formatter(args.format, args.verbose, &config.display);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Some(header) = formatter.header() {
        writeln!(out, "{}", header)?;
    }

    let mut next_report: Option<Duration> = None;
    let mut last: Option<MeasurementSnapshot> = None;

    for snapshot in snapshot_rx.iter() {
        last = Some(snapshot);
        if next_report.is_some_and(|t| snapshot.timestamp < t) {
            continue;
        }
        next_report = Some(snapshot.timestamp + interval);
        writeln!(out, "{}", formatter.format(&snapshot))?;
    }

    if let Some(snapshot) = last {
        log::info!(
            "Final reading at {}: {}",
            iso8601_timestamp(),
            formatter.format(&snapshot)
        );
    }
    out.flush()?;
    Ok(())
}
