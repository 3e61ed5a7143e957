#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use swrmeter::acquisition::RawSample;
use swrmeter::config::MeterConfig;
use swrmeter::processing::{MeasurementSnapshot, MeterProcessor};
use swrmeter::simulation::{Scenario, generate_detector_signal};

/// Clean detector voltages for `scenario` using the tables in `config`
pub fn detector_signal(scenario: &Scenario, config: &MeterConfig) -> Vec<RawSample> {
    generate_detector_signal(
        scenario,
        &config.calibration.forward,
        &config.calibration.reverse,
    )
}

/// Run every sample through a fresh processor
pub fn run_pipeline(samples: &[RawSample], config: &MeterConfig) -> Vec<MeasurementSnapshot> {
    let mut processor = MeterProcessor::new(config);
    processor.process_block(samples)
}

/// Snapshot at or just after `at`
pub fn snapshot_at(snapshots: &[MeasurementSnapshot], at: Duration) -> MeasurementSnapshot {
    *snapshots
        .iter()
        .find(|s| s.timestamp >= at)
        .expect("no snapshot at requested time")
}

/// Snapshots after the filters have settled
pub fn settled(snapshots: &[MeasurementSnapshot], after: Duration) -> Vec<MeasurementSnapshot> {
    snapshots
        .iter()
        .filter(|s| s.timestamp >= after)
        .copied()
        .collect()
}

/// Unique scratch path in the system temp directory
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("swrmeter_{}_{}", std::process::id(), name))
}
