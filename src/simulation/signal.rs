use std::time::Duration;

use crate::acquisition::RawSample;
use crate::calibration::CalibrationTable;
use crate::constants::CALIBRATION_BASE_DBM;

/// Level used for "no signal": well below the bottom of the table
const NO_SIGNAL_DBM: f32 = CALIBRATION_BASE_DBM - 20.0;

/// On/off keying of the carrier (CW or SSB-like bursts)
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Keying {
    /// Key period in milliseconds
    pub period_ms: f32,
    /// Fraction of each period the carrier is on
    pub duty: f32,
}

/// Transmitter and load description for synthetic detector voltages
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Scenario {
    /// Forward power while keyed, in dBm
    pub forward_dbm: f32,
    /// Load SWR (>= 1.0)
    pub swr: f32,
    /// Converter sample rate in Hz
    pub sample_rate: u32,
    /// Length in seconds
    pub duration_secs: f32,
    /// Continuous carrier when `None`
    #[serde(default)]
    pub keying: Option<Keying>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            forward_dbm: 50.0,
            swr: 1.5,
            sample_rate: 1000,
            duration_secs: 1.0,
            keying: None,
        }
    }
}

/// Reflected level for a forward level and load SWR
///
/// A perfect match reflects nothing; that is reported as a level below the
/// calibration table.
pub fn reverse_dbm_for_swr(forward_dbm: f32, swr: f32) -> f32 {
    let rho = (swr.max(1.0) - 1.0) / (swr.max(1.0) + 1.0);
    if rho <= 0.0 {
        return NO_SIGNAL_DBM;
    }
    let return_loss_db = -20.0 * rho.log10();
    (forward_dbm - return_loss_db).max(NO_SIGNAL_DBM)
}

/// Generate clean detector voltages for a scenario
///
/// Voltages come from the inverse of each channel's calibration, so feeding
/// them back through a processor using the same tables reproduces the
/// scenario's levels. Forward goes on ch0, reverse on ch1.
pub fn generate_detector_signal(
    scenario: &Scenario,
    forward_table: &CalibrationTable,
    reverse_table: &CalibrationTable,
) -> Vec<RawSample> {
    let sample_rate = scenario.sample_rate.max(1) as f64;
    let n = (scenario.duration_secs.max(0.0) as f64 * sample_rate).round() as usize;

    let keyed_forward = forward_table.to_voltage(scenario.forward_dbm);
    let reflected_dbm = reverse_dbm_for_swr(scenario.forward_dbm, scenario.swr);
    let keyed_reverse = reverse_table.to_voltage(reflected_dbm);
    let idle_forward = forward_table.to_voltage(NO_SIGNAL_DBM);
    let idle_reverse = reverse_table.to_voltage(NO_SIGNAL_DBM);

    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let on = match &scenario.keying {
                Some(keying) if keying.period_ms > 0.0 => {
                    let phase = (t * 1000.0 / keying.period_ms as f64).fract();
                    phase < keying.duty as f64
                }
                _ => true,
            };
            let (fwd, rev) = if on {
                (keyed_forward, keyed_reverse)
            } else {
                (idle_forward, idle_reverse)
            };
            RawSample::new(Duration::from_secs_f64(t), fwd, rev)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_level_for_two_to_one() {
        // SWR 2:1 is 9.54 dB return loss
        let rev = reverse_dbm_for_swr(40.0, 2.0);
        assert!((rev - (40.0 - 9.5424)).abs() < 1e-3);
    }

    #[test]
    fn test_matched_load_has_no_reflection() {
        assert_eq!(reverse_dbm_for_swr(40.0, 1.0), NO_SIGNAL_DBM);
        assert_eq!(reverse_dbm_for_swr(40.0, 0.5), NO_SIGNAL_DBM);
    }

    #[test]
    fn test_sample_count_and_timestamps() {
        let scenario = Scenario {
            sample_rate: 500,
            duration_secs: 0.2,
            ..Scenario::default()
        };
        let table = CalibrationTable::default();
        let samples = generate_detector_signal(&scenario, &table, &table);
        assert_eq!(samples.len(), 100);
        assert_eq!(samples[0].timestamp, Duration::ZERO);
        assert_eq!(samples[50].timestamp, Duration::from_millis(100));
    }

    #[test]
    fn test_keying_duty_cycle() {
        let scenario = Scenario {
            sample_rate: 1000,
            duration_secs: 1.0,
            keying: Some(Keying {
                period_ms: 100.0,
                duty: 0.25,
            }),
            ..Scenario::default()
        };
        let table = CalibrationTable::default();
        let samples = generate_detector_signal(&scenario, &table, &table);
        let keyed = table.to_voltage(scenario.forward_dbm);
        let on = samples.iter().filter(|s| s.ch0 == keyed).count();
        assert!((240..=260).contains(&on), "on samples: {}", on);
    }
}
