//! Numeric constants shared across the measurement pipeline.
//!
//! The sentinel values are part of the public contract: the core never
//! signals errors per cycle, so consumers compare against these to decide
//! whether a reading should be rendered as a real measurement.

/// Number of points in a per-channel calibration table.
pub const CALIBRATION_POINTS: usize = 11;

/// Reference level of the first calibration point in dBm.
pub const CALIBRATION_BASE_DBM: f32 = -40.0;

/// Spacing between calibration reference levels in dB.
pub const CALIBRATION_STEP_DB: f32 = 10.0;

/// Fixed reference levels for the calibration table, -40 dBm to +60 dBm.
pub const REFERENCE_LEVELS_DBM: [f32; CALIBRATION_POINTS] = [
    -40.0, -30.0, -20.0, -10.0, 0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0,
];

/// Lowest valid SWR (perfect match).
pub const SWR_MIN: f32 = 1.0;

/// SWR sentinel meaning "invalid or unbounded". Also the upper clamp.
pub const SWR_INVALID: f32 = 99.0;

/// Return-loss sentinel meaning "no measurable reflection / undefined".
pub const RETURN_LOSS_UNDEFINED_DB: f32 = 99.9;

/// Floor returned by `watts_to_dbm` for non-positive power.
pub const MIN_DBM: f32 = -200.0;

/// Largest accepted filter window. Larger requests are clamped.
pub const MAX_FILTER_WINDOW: usize = 127;
