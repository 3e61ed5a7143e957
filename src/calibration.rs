//! Voltage to power calibration.
//!
//! Each detector channel has a table of measured voltages at fixed reference
//! levels (-40 dBm to +60 dBm in 10 dB steps). Readings between two points are
//! linearly interpolated; readings outside the table are extrapolated with the
//! slope of the nearest segment.
//!
//! The table is expected to rise with reference level but this is never
//! enforced. A non-monotonic table interpolates on the first segment that
//! brackets the voltage, which may not be what the operator intended.
//! [`CalibrationTable::is_monotonic`] exists so callers can warn about it.

use serde::Deserialize;

use crate::constants::{
    CALIBRATION_BASE_DBM, CALIBRATION_POINTS, CALIBRATION_STEP_DB, REFERENCE_LEVELS_DBM,
};
use crate::error::{MeterError, Result};

/// Measured detector voltages at the fixed reference levels
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f32>")]
pub struct CalibrationTable {
    voltages: [f32; CALIBRATION_POINTS],
}

impl CalibrationTable {
    pub fn new(voltages: [f32; CALIBRATION_POINTS]) -> Self {
        Self { voltages }
    }

    pub fn from_slice(voltages: &[f32]) -> Result<Self> {
        let voltages: [f32; CALIBRATION_POINTS] =
            voltages
                .try_into()
                .map_err(|_| MeterError::InvalidCalibration {
                    expected: CALIBRATION_POINTS,
                    got: voltages.len(),
                })?;
        Ok(Self::new(voltages))
    }

    /// Nominal table for a logarithmic detector with the given slope
    ///
    /// # Arguments
    /// * `volts_at_base` - Detector output at the lowest reference level (-40 dBm)
    /// * `volts_per_db` - Detector slope
    pub fn nominal(volts_at_base: f32, volts_per_db: f32) -> Self {
        let mut voltages = [0.0; CALIBRATION_POINTS];
        for (i, v) in voltages.iter_mut().enumerate() {
            *v = volts_at_base + volts_per_db * CALIBRATION_STEP_DB * i as f32;
        }
        Self { voltages }
    }

    pub fn voltages(&self) -> &[f32; CALIBRATION_POINTS] {
        &self.voltages
    }

    /// Reference level of calibration point `index` in dBm
    pub fn reference_level(index: usize) -> f32 {
        REFERENCE_LEVELS_DBM[index]
    }

    /// Overwrite a single calibration point
    pub fn set_voltage(&mut self, index: usize, voltage: f32) -> Result<()> {
        let slot = self
            .voltages
            .get_mut(index)
            .ok_or_else(|| MeterError::Config(format!("calibration index {} out of range", index)))?;
        *slot = voltage;
        Ok(())
    }

    /// True when voltages never decrease with reference level
    pub fn is_monotonic(&self) -> bool {
        self.voltages.windows(2).all(|w| w[0] <= w[1])
    }

    /// Convert a filtered detector voltage to a power level in dBm
    ///
    /// Never returns NaN or infinity for finite input: a zero-width segment
    /// (duplicate calibration voltages) yields the segment's lower reference
    /// level instead of dividing by zero.
    pub fn to_dbm(&self, voltage: f32) -> f32 {
        let v = &self.voltages;
        let r = &REFERENCE_LEVELS_DBM;
        let last = CALIBRATION_POINTS - 1;

        if voltage <= v[0] {
            let span = v[1] - v[0];
            if span == 0.0 {
                return r[0];
            }
            return r[0] + (voltage - v[0]) * CALIBRATION_STEP_DB / span;
        }

        if voltage >= v[last] {
            let span = v[last] - v[last - 1];
            if span == 0.0 {
                return r[last];
            }
            return r[last] + (voltage - v[last]) * CALIBRATION_STEP_DB / span;
        }

        for i in 0..last {
            if v[i] <= voltage && voltage <= v[i + 1] {
                let span = v[i + 1] - v[i];
                if span == 0.0 {
                    return r[i];
                }
                return r[i] + (voltage - v[i]) / span * (r[i + 1] - r[i]);
            }
        }

        // Only reachable with NaN in the input or the table
        r[0]
    }

    /// Inverse of [`to_dbm`](Self::to_dbm) for a monotonic table
    ///
    /// Returns the detector voltage expected at `dbm`, extrapolating beyond
    /// the table with the end-segment slopes.
    pub fn to_voltage(&self, dbm: f32) -> f32 {
        let v = &self.voltages;
        let r = &REFERENCE_LEVELS_DBM;
        let last = CALIBRATION_POINTS - 1;

        let segment = if dbm <= r[0] {
            0
        } else if dbm >= r[last] {
            last - 1
        } else {
            (((dbm - CALIBRATION_BASE_DBM) / CALIBRATION_STEP_DB).floor() as usize).min(last - 1)
        };

        let fraction = (dbm - r[segment]) / CALIBRATION_STEP_DB;
        v[segment] + fraction * (v[segment + 1] - v[segment])
    }
}

impl Default for CalibrationTable {
    /// Log detector at 25 mV/dB with 0.5 V at -40 dBm
    fn default() -> Self {
        Self::nominal(0.5, 0.025)
    }
}

impl TryFrom<Vec<f32>> for CalibrationTable {
    type Error = MeterError;

    fn try_from(voltages: Vec<f32>) -> Result<Self> {
        Self::from_slice(&voltages)
    }
}

/// Records one calibration point
///
/// While a known reference level is applied to the coupler, feed the filtered
/// detector voltage in every cycle; `commit` stores the mean into the table.
pub struct CalibrationCapture {
    index: usize,
    sum: f64,
    count: usize,
}

impl CalibrationCapture {
    /// Start capturing the point for reference level `index` (0 = -40 dBm)
    pub fn new(index: usize) -> Result<Self> {
        if index >= CALIBRATION_POINTS {
            return Err(MeterError::Config(format!(
                "calibration index {} out of range (0..{})",
                index, CALIBRATION_POINTS
            )));
        }
        Ok(Self {
            index,
            sum: 0.0,
            count: 0,
        })
    }

    /// Start capturing the point whose reference level is `dbm`
    pub fn for_level(dbm: f32) -> Result<Self> {
        let index = REFERENCE_LEVELS_DBM
            .iter()
            .position(|&r| r == dbm)
            .ok_or_else(|| MeterError::Config(format!("{} dBm is not a calibration level", dbm)))?;
        Self::new(index)
    }

    pub fn add(&mut self, voltage: f32) {
        self.sum += voltage as f64;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f32> {
        (self.count > 0).then(|| (self.sum / self.count as f64) as f32)
    }

    /// Write the captured mean into `table`. Returns the stored voltage, or
    /// `None` if nothing was captured.
    pub fn commit(self, table: &mut CalibrationTable) -> Option<f32> {
        let mean = self.mean()?;
        table.voltages[self.index] = mean;
        log::info!(
            "Calibration point {} dBm set to {:.4} V ({} samples)",
            REFERENCE_LEVELS_DBM[self.index],
            mean,
            self.count
        );
        if !table.is_monotonic() {
            log::warn!("Calibration table is no longer monotonic");
        }
        Some(mean)
    }
}
