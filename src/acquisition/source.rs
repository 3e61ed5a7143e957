use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use hound::WavReader;

use super::RawSample;
use crate::error::{MeterError, Result};

/// Supplier of raw sample pairs, in arrival order
pub trait SampleSource: Send {
    /// Next block of samples, or `None` when the source is exhausted
    fn next_block(&mut self) -> Result<Option<Vec<RawSample>>>;
}

/// Replays a stereo WAV recording of the two converter inputs
///
/// Samples are treated as normalized converter readings (-1.0 to 1.0 for
/// float files, full code range for integer files) and scaled by the
/// converter's full-scale voltage. Timestamps follow from the sample index.
pub struct WavFileSource {
    samples: Vec<f32>,
    position: usize,
    block_size: usize,
    sample_rate: u32,
    full_scale_volts: f32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(path: P, block_size: usize, full_scale_volts: f32) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels != 2 {
            return Err(MeterError::Recording(format!(
                "Expected stereo WAV file, got {} channels",
                spec.channels
            )));
        }

        let sample_rate = spec.sample_rate;
        let samples = Self::read_samples(reader, &spec)?;
        log::info!(
            "Loaded {} sample pairs at {} Hz from {}",
            samples.len() / 2,
            sample_rate,
            path.as_ref().display()
        );

        Ok(Self {
            samples,
            position: 0,
            block_size: block_size.max(1),
            sample_rate,
            full_scale_volts,
        })
    }

    fn read_samples(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
    ) -> Result<Vec<f32>> {
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max_val = 2_i64.pow(spec.bits_per_sample as u32 - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };
        Ok(samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total number of sample pairs in the recording
    pub fn len(&self) -> usize {
        self.samples.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() < 2
    }

    fn timestamp(&self, pair_index: usize) -> Duration {
        Duration::from_secs_f64(pair_index as f64 / self.sample_rate as f64)
    }
}

impl SampleSource for WavFileSource {
    fn next_block(&mut self) -> Result<Option<Vec<RawSample>>> {
        let pairs = self.samples.len() / 2;
        if self.position >= pairs {
            return Ok(None);
        }

        let end = (self.position + self.block_size).min(pairs);
        let block = (self.position..end)
            .map(|i| {
                RawSample::new(
                    self.timestamp(i),
                    self.samples[2 * i] * self.full_scale_volts,
                    self.samples[2 * i + 1] * self.full_scale_volts,
                )
            })
            .collect();
        self.position = end;

        Ok(Some(block))
    }
}

/// Reads `time_ms,ch0,ch1` lines (volts), e.g. from a serial logger
///
/// Blank lines, `#` comments and a leading header line are skipped.
pub struct CsvSource<R> {
    reader: R,
    block_size: usize,
    line_number: usize,
    line: String,
}

impl CsvSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, block_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), block_size))
    }
}

impl<R: BufRead> CsvSource<R> {
    pub fn new(reader: R, block_size: usize) -> Self {
        Self {
            reader,
            block_size: block_size.max(1),
            line_number: 0,
            line: String::new(),
        }
    }

    fn parse_line(&self, line: &str) -> Result<RawSample> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(MeterError::Recording(format!(
                "line {}: expected 3 fields, got {}",
                self.line_number,
                fields.len()
            )));
        }

        let parse = |field: &str, name: &str| -> Result<f64> {
            field.parse::<f64>().map_err(|_| {
                MeterError::Recording(format!(
                    "line {}: invalid {} '{}'",
                    self.line_number, name, field
                ))
            })
        };

        let time_ms = parse(fields[0], "time")?;
        if !time_ms.is_finite() || time_ms < 0.0 {
            return Err(MeterError::Recording(format!(
                "line {}: time must be a non-negative number",
                self.line_number
            )));
        }
        let ch0 = parse(fields[1], "ch0")? as f32;
        let ch1 = parse(fields[2], "ch1")? as f32;

        Ok(RawSample::new(
            Duration::from_secs_f64(time_ms / 1000.0),
            ch0,
            ch1,
        ))
    }
}

impl<R: BufRead + Send> SampleSource for CsvSource<R> {
    fn next_block(&mut self) -> Result<Option<Vec<RawSample>>> {
        let mut block = Vec::with_capacity(self.block_size);

        while block.len() < self.block_size {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                break;
            }
            self.line_number += 1;

            let line = self.line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if self.line_number == 1 && line.starts_with(|c: char| c.is_ascii_alphabetic()) {
                continue;
            }

            let sample = self.parse_line(line)?;
            block.push(sample);
        }

        if block.is_empty() {
            Ok(None)
        } else {
            Ok(Some(block))
        }
    }
}
