use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::acquisition::RawSample;

/// Converter noise model applied to both inputs
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub impulse: Option<ImpulseNoiseConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_gaussian(mut self, rms_volts: f32) -> Self {
        self.additive = Some(AdditiveNoiseConfig { rms_volts });
        self
    }

    pub fn with_impulse(mut self, rate_hz: f32, amplitude_volts: f32) -> Self {
        self.impulse = Some(ImpulseNoiseConfig {
            rate_hz,
            amplitude_volts,
        });
        self
    }
}

/// White Gaussian noise on every sample
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub rms_volts: f32,
}

/// Single-sample converter glitches at random times
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ImpulseNoiseConfig {
    /// Average glitch rate per input in Hz
    pub rate_hz: f32,
    /// Glitch size in volts (sign is random)
    pub amplitude_volts: f32,
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

fn apply_additive_noise(
    samples: &mut [RawSample],
    config: &AdditiveNoiseConfig,
    rng: &mut ChaCha8Rng,
) {
    if config.rms_volts <= 0.0 {
        return;
    }
    let Ok(normal) = Normal::new(0.0, config.rms_volts as f64) else {
        log::warn!("Invalid noise level {}", config.rms_volts);
        return;
    };

    for sample in samples.iter_mut() {
        sample.ch0 += normal.sample(rng) as f32;
        sample.ch1 += normal.sample(rng) as f32;
    }
}

fn apply_impulse_noise(
    samples: &mut [RawSample],
    config: &ImpulseNoiseConfig,
    sample_rate: f32,
    rng: &mut ChaCha8Rng,
) {
    let n = samples.len();
    if n == 0 || config.rate_hz <= 0.0 {
        return;
    }

    let avg_samples_between_impulses = sample_rate / config.rate_hz;

    for channel in 0..2 {
        let mut pos = 0usize;
        loop {
            let interval = (rng.random::<f32>() * 2.0 * avg_samples_between_impulses) as usize;
            pos += interval.max(1);

            if pos >= n {
                break;
            }

            let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
            let glitch = sign * config.amplitude_volts;
            match channel {
                0 => samples[pos].ch0 += glitch,
                _ => samples[pos].ch1 += glitch,
            }
        }
    }
}

/// Add noise to a generated signal in-place
pub fn apply_noise(samples: &mut [RawSample], config: &NoiseConfig, sample_rate: f32) {
    let mut rng = create_rng(config.seed);

    if let Some(ref additive) = config.additive {
        apply_additive_noise(samples, additive, &mut rng);
    }
    if let Some(ref impulse) = config.impulse {
        apply_impulse_noise(samples, impulse, sample_rate, &mut rng);
    }
}
