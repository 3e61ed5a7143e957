use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::acquisition::RawSample;
use crate::error::Result;

/// Write samples as a stereo float WAV (ch0 left, ch1 right)
///
/// Voltages are normalized by `full_scale_volts`, the inverse of what
/// [`WavFileSource`](crate::acquisition::WavFileSource) does on replay.
pub fn save_wav<P: AsRef<Path>>(
    path: P,
    samples: &[RawSample],
    sample_rate: u32,
    full_scale_volts: f32,
) -> Result<()> {
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for sample in samples {
        writer.write_sample(sample.ch0 / full_scale_volts)?;
        writer.write_sample(sample.ch1 / full_scale_volts)?;
    }

    writer.finalize()?;
    Ok(())
}
