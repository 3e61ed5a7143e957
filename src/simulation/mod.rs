mod noise;
mod signal;

pub use noise::{AdditiveNoiseConfig, ImpulseNoiseConfig, NoiseConfig, apply_noise};
pub use signal::{Keying, Scenario, generate_detector_signal, reverse_dbm_for_swr};
