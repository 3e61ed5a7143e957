pub mod acquisition;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod output;
pub mod power;
pub mod processing;
pub mod signal_processing;
pub mod wav;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use calibration::CalibrationTable;
pub use config::MeterConfig;
pub use error::{MeterError, Result};
pub use processing::{MeasurementSnapshot, MeterProcessor};
pub use wav::save_wav;
