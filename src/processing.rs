use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::acquisition::RawSample;
use crate::calibration::CalibrationTable;
use crate::config::{InputConfig, MeterConfig};
use crate::power::{Degeneracy, SwrReport, compute_swr_and_return_loss, dbm_to_watts};
use crate::signal_processing::{NoiseFilter, PeakTracker};

/// Result of one acquisition cycle
///
/// Plain `Copy` data: hand it to other threads by value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasurementSnapshot {
    /// Cycle timestamp (offset from the acquisition origin)
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub timestamp: Duration,
    /// Forward detector voltage after filtering
    pub forward_voltage: f32,
    /// Reverse detector voltage after filtering
    pub reverse_voltage: f32,
    pub forward_dbm: f32,
    pub reverse_dbm: f32,
    pub forward_watts: f32,
    pub reverse_watts: f32,
    /// SWR in `[1.0, 99.0]`, 99.0 when invalid
    pub swr: f32,
    /// Return loss in dB, 99.9 when undefined
    pub return_loss_db: f32,
    /// Why `swr` is the sentinel, if it is
    pub degeneracy: Option<Degeneracy>,
    /// Held forward power peak for display
    pub forward_peak_watts: f32,
    /// Held reverse power peak for display
    pub reverse_peak_watts: f32,
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

impl MeasurementSnapshot {
    pub fn is_valid(&self) -> bool {
        self.degeneracy.is_none()
    }

    pub fn swr_report(&self) -> SwrReport {
        SwrReport {
            swr: self.swr,
            return_loss_db: self.return_loss_db,
            degeneracy: self.degeneracy,
        }
    }
}

/// Sample pipeline for one forward/reverse detector pair
///
/// Each cycle runs raw voltage -> median -> moving average -> calibration ->
/// watts -> SWR / return loss -> peak hold, and returns a snapshot. All
/// mutable state is owned here; configuration changes go through
/// [`apply_config`](Self::apply_config) between cycles.
pub struct MeterProcessor {
    input: InputConfig,
    forward_filter: NoiseFilter,
    reverse_filter: NoiseFilter,
    forward_calibration: CalibrationTable,
    reverse_calibration: CalibrationTable,
    forward_peak: PeakTracker,
    reverse_peak: PeakTracker,
    last_valid: Option<bool>,
}

impl MeterProcessor {
    pub fn new(config: &MeterConfig) -> Self {
        let hold = config.peak_hold.hold();
        let processor = Self {
            input: config.input.clone(),
            forward_filter: NoiseFilter::new(&config.forward_filter),
            reverse_filter: NoiseFilter::new(&config.reverse_filter),
            forward_calibration: config.calibration.forward,
            reverse_calibration: config.calibration.reverse,
            forward_peak: PeakTracker::new(hold),
            reverse_peak: PeakTracker::new(hold),
            last_valid: None,
        };
        processor.check_calibration();
        processor
    }

    /// Replace the configuration between cycles
    ///
    /// Filter stages lose their history only if their window size changed.
    /// Peak hold keeps the current peak; the new hold time applies from the
    /// next cycle.
    pub fn apply_config(&mut self, config: &MeterConfig) {
        self.input = config.input.clone();
        self.forward_filter.reconfigure(&config.forward_filter);
        self.reverse_filter.reconfigure(&config.reverse_filter);
        self.forward_calibration = config.calibration.forward;
        self.reverse_calibration = config.calibration.reverse;
        self.forward_peak.set_hold(config.peak_hold.hold());
        self.reverse_peak.set_hold(config.peak_hold.hold());

        log::info!(
            "Configuration applied: forward {:?}, reverse {:?}, hold {} ms",
            self.forward_filter.config(),
            self.reverse_filter.config(),
            config.peak_hold.hold_ms
        );
        self.check_calibration();
    }

    fn check_calibration(&self) {
        if !self.forward_calibration.is_monotonic() {
            log::warn!("Forward calibration table is not monotonic; readings may be wrong");
        }
        if !self.reverse_calibration.is_monotonic() {
            log::warn!("Reverse calibration table is not monotonic; readings may be wrong");
        }
    }

    /// Run one cycle
    ///
    /// # Arguments
    /// * `ch0`, `ch1` - Raw converter voltages, mapped through `InputConfig`
    /// * `timestamp` - Monotonic cycle time
    pub fn process(&mut self, ch0: f32, ch1: f32, timestamp: Duration) -> MeasurementSnapshot {
        let (forward_raw, reverse_raw) = self.input.split(ch0, ch1);

        let forward_voltage = self.forward_filter.update(forward_raw);
        let reverse_voltage = self.reverse_filter.update(reverse_raw);

        let forward_dbm = self.forward_calibration.to_dbm(forward_voltage);
        let reverse_dbm = self.reverse_calibration.to_dbm(reverse_voltage);

        let forward_watts = dbm_to_watts(forward_dbm);
        let reverse_watts = dbm_to_watts(reverse_dbm);

        let report = compute_swr_and_return_loss(forward_watts, reverse_watts);
        self.note_validity(&report);

        let forward_peak_watts = self.forward_peak.update(forward_watts, timestamp);
        let reverse_peak_watts = self.reverse_peak.update(reverse_watts, timestamp);

        log::trace!(
            "{:?}: fwd {:.4} V {:.2} dBm, rev {:.4} V {:.2} dBm, SWR {:.2}",
            timestamp,
            forward_voltage,
            forward_dbm,
            reverse_voltage,
            reverse_dbm,
            report.swr
        );

        MeasurementSnapshot {
            timestamp,
            forward_voltage,
            reverse_voltage,
            forward_dbm,
            reverse_dbm,
            forward_watts,
            reverse_watts,
            swr: report.swr,
            return_loss_db: report.return_loss_db,
            degeneracy: report.degeneracy,
            forward_peak_watts,
            reverse_peak_watts,
        }
    }

    pub fn process_sample(&mut self, sample: &RawSample) -> MeasurementSnapshot {
        self.process(sample.ch0, sample.ch1, sample.timestamp)
    }

    /// Run a block of cycles in arrival order
    pub fn process_block(&mut self, samples: &[RawSample]) -> Vec<MeasurementSnapshot> {
        samples.iter().map(|s| self.process_sample(s)).collect()
    }

    fn note_validity(&mut self, report: &SwrReport) {
        let valid = report.is_valid();
        if self.last_valid != Some(valid) {
            match report.degeneracy {
                Some(reason) => log::debug!("SWR reading invalid: {:?}", reason),
                None => log::debug!("SWR reading valid"),
            }
            self.last_valid = Some(valid);
        }
    }

    /// Clear filter and peak history, keeping configuration
    pub fn reset(&mut self) {
        self.forward_filter.reset();
        self.reverse_filter.reset();
        self.forward_peak.reset();
        self.reverse_peak.reset();
        self.last_valid = None;
    }

    pub fn forward_calibration(&self) -> &CalibrationTable {
        &self.forward_calibration
    }

    pub fn reverse_calibration(&self) -> &CalibrationTable {
        &self.reverse_calibration
    }

    pub fn forward_peak_watts(&self) -> Option<f32> {
        self.forward_peak.peak()
    }

    pub fn reverse_peak_watts(&self) -> Option<f32> {
        self.reverse_peak.peak()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AdcInput, FilterConfig};
    use crate::constants::{RETURN_LOSS_UNDEFINED_DB, SWR_INVALID};
    use approx::assert_relative_eq;

    fn passthrough_config() -> MeterConfig {
        let mut config = MeterConfig::default();
        config.forward_filter = FilterConfig {
            average_window: 1,
            median_window: 1,
        };
        config.reverse_filter = config.forward_filter;
        config
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_matched_load() {
        let config = passthrough_config();
        let table = config.calibration.forward;
        let mut processor = MeterProcessor::new(&config);

        // 50 dBm forward (100 W), reverse below the table floor
        let snap = processor.process(table.to_voltage(50.0), table.voltages()[0], ms(0));
        assert_relative_eq!(snap.forward_dbm, 50.0, epsilon = 1e-3);
        assert_relative_eq!(snap.forward_watts, 100.0, max_relative = 1e-3);
        assert_eq!(snap.reverse_dbm, -40.0);
        assert!(snap.swr < 1.01);
        assert!(snap.is_valid());
    }

    #[test]
    fn test_two_to_one_mismatch() {
        let config = passthrough_config();
        let table = config.calibration.forward;
        let mut processor = MeterProcessor::new(&config);

        // 9.54 dB return loss is SWR 2:1
        let rl = 10.0 * 9f32.log10();
        let snap = processor.process(table.to_voltage(40.0), table.to_voltage(40.0 - rl), ms(0));
        assert_relative_eq!(snap.swr, 2.0, max_relative = 1e-3);
        assert_relative_eq!(snap.return_loss_db, rl, epsilon = 1e-3);
    }

    #[test]
    fn test_reverse_above_forward_is_sentinel() {
        let config = passthrough_config();
        let mut processor = MeterProcessor::new(&config);

        let snap = processor.process(1.0, 2.0, ms(0));
        assert_eq!(snap.swr, SWR_INVALID);
        assert_eq!(snap.degeneracy, Some(Degeneracy::ReflectedNotBelowForward));
        assert!(!snap.is_valid());
        assert!(snap.swr_report().has_return_loss());
    }

    #[test]
    fn test_swapped_inputs() {
        let mut config = passthrough_config();
        config.input.forward_channel = AdcInput::Ch1;
        config.input.reverse_channel = AdcInput::Ch0;
        let mut processor = MeterProcessor::new(&config);

        let snap = processor.process(0.5, 2.5, ms(0));
        assert_eq!(snap.forward_voltage, 2.5);
        assert_eq!(snap.reverse_voltage, 0.5);
        assert!(snap.is_valid());
    }

    #[test]
    fn test_peaks_follow_power() {
        let mut config = passthrough_config();
        config.peak_hold.hold_ms = 100;
        let mut processor = MeterProcessor::new(&config);

        let high = processor.process(2.5, 0.5, ms(0));
        let low = processor.process(2.0, 0.5, ms(50));
        assert_eq!(low.forward_peak_watts, high.forward_watts);

        let decayed = processor.process(2.0, 0.5, ms(101));
        assert_eq!(decayed.forward_peak_watts, decayed.forward_watts);
    }

    #[test]
    fn test_apply_config_changes_hold_and_filters() {
        let mut config = passthrough_config();
        config.peak_hold.hold_ms = 10_000;
        let mut processor = MeterProcessor::new(&config);

        processor.process(2.5, 0.5, ms(0));

        config.peak_hold.hold_ms = 10;
        config.forward_filter.average_window = 4;
        processor.apply_config(&config);

        let snap = processor.process(2.0, 0.5, ms(20));
        assert_eq!(snap.forward_voltage, 2.0);
        assert_eq!(snap.forward_peak_watts, snap.forward_watts);
    }

    #[test]
    fn test_uncalibrated_tables_give_sentinel() {
        let mut config = passthrough_config();
        // A flat table gives the same level for every voltage
        config.calibration.forward =
            CalibrationTable::new([1.0; crate::constants::CALIBRATION_POINTS]);
        config.calibration.reverse = config.calibration.forward;
        let mut processor = MeterProcessor::new(&config);

        let snap = processor.process(0.0, 0.0, ms(0));
        assert_eq!(snap.swr, SWR_INVALID);
        assert!(snap.forward_dbm.is_finite());
        assert!(snap.return_loss_db.is_finite());
        assert_ne!(snap.return_loss_db, RETURN_LOSS_UNDEFINED_DB);
    }

    #[test]
    fn test_process_block_in_order() {
        let config = MeterConfig::default();
        let mut processor = MeterProcessor::new(&config);

        let samples: Vec<RawSample> = (0..10)
            .map(|i| RawSample::new(ms(i), 2.0, 0.8))
            .collect();
        let snaps = processor.process_block(&samples);
        assert_eq!(snaps.len(), 10);
        assert!(snaps.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(snaps[9].forward_voltage, 2.0);
    }
}
