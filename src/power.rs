//! Power conversions and derived mismatch figures.
//!
//! Invalid measurements are not errors here. The display needs a number
//! every cycle, so degenerate inputs produce the sentinel constants
//! [`SWR_INVALID`] and [`RETURN_LOSS_UNDEFINED_DB`]. [`SwrReport::degeneracy`]
//! tells callers why, for those that want to render it differently.

use serde::Serialize;

use crate::constants::{MIN_DBM, RETURN_LOSS_UNDEFINED_DB, SWR_INVALID, SWR_MIN};

/// Convert dBm to watts (0 dBm = 1 mW)
pub fn dbm_to_watts(dbm: f32) -> f32 {
    10f32.powf((dbm - 30.0) / 10.0)
}

/// Convert watts to dBm
///
/// Non-positive power has no logarithm; it maps to [`MIN_DBM`].
pub fn watts_to_dbm(watts: f32) -> f32 {
    if watts <= 0.0 || watts.is_nan() {
        return MIN_DBM;
    }
    (10.0 * watts.log10() + 30.0).max(MIN_DBM)
}

/// Why an SWR reading could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degeneracy {
    /// Forward power is zero, negative or not a number
    NoForwardPower,
    /// Reflected power is at or above forward power
    ReflectedNotBelowForward,
}

/// SWR and return loss for one forward/reverse power pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwrReport {
    /// SWR in `[1.0, 99.0]`; exactly [`SWR_INVALID`] when degenerate
    pub swr: f32,
    /// Return loss in dB, or [`RETURN_LOSS_UNDEFINED_DB`]
    pub return_loss_db: f32,
    /// Set when `swr` is the sentinel rather than a measurement
    pub degeneracy: Option<Degeneracy>,
}

impl SwrReport {
    pub fn is_valid(&self) -> bool {
        self.degeneracy.is_none()
    }

    /// True when return loss holds a real value
    pub fn has_return_loss(&self) -> bool {
        self.return_loss_db != RETURN_LOSS_UNDEFINED_DB
    }
}

/// Compute SWR and return loss from forward and reverse power in watts
///
/// * `reverse >= forward` or `forward <= 0` gives SWR [`SWR_INVALID`].
/// * Otherwise `r = sqrt(reverse / forward)` and `swr = (1 + r) / (1 - r)`,
///   clamped to `[SWR_MIN, SWR_INVALID]`.
/// * Return loss is `10 * log10(forward / reverse)` when both powers are
///   positive, else [`RETURN_LOSS_UNDEFINED_DB`].
pub fn compute_swr_and_return_loss(forward_watts: f32, reverse_watts: f32) -> SwrReport {
    let return_loss_db = if forward_watts > 0.0 && reverse_watts > 0.0 {
        let rl = 10.0 * (forward_watts / reverse_watts).log10();
        if rl.is_finite() {
            rl
        } else {
            RETURN_LOSS_UNDEFINED_DB
        }
    } else {
        RETURN_LOSS_UNDEFINED_DB
    };

    let degeneracy = if forward_watts.is_nan() || forward_watts <= 0.0 {
        Some(Degeneracy::NoForwardPower)
    } else if reverse_watts.is_nan() || reverse_watts >= forward_watts {
        Some(Degeneracy::ReflectedNotBelowForward)
    } else {
        None
    };

    let swr = match degeneracy {
        Some(_) => SWR_INVALID,
        None => {
            let r = (reverse_watts.max(0.0) / forward_watts).sqrt();
            let swr = (1.0 + r) / (1.0 - r);
            if swr.is_nan() {
                SWR_INVALID
            } else {
                swr.clamp(SWR_MIN, SWR_INVALID)
            }
        }
    };

    SwrReport {
        swr,
        return_loss_db,
        degeneracy,
    }
}

/// Reflection coefficient magnitude for a given SWR
pub fn swr_to_reflection_coefficient(swr: f32) -> f32 {
    if swr < SWR_MIN {
        return 0.0;
    }
    (swr - 1.0) / (swr + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dbm_to_watts_reference_points() {
        assert_eq!(dbm_to_watts(30.0), 1.0);
        assert_relative_eq!(dbm_to_watts(0.0), 0.001, max_relative = 1e-6);
        assert_relative_eq!(dbm_to_watts(50.0), 100.0, max_relative = 1e-5);
        assert_relative_eq!(dbm_to_watts(-30.0), 1e-6, max_relative = 1e-5);
    }

    #[test]
    fn test_watts_to_dbm() {
        assert_eq!(watts_to_dbm(1.0), 30.0);
        assert_relative_eq!(watts_to_dbm(100.0), 50.0, max_relative = 1e-6);
        assert_eq!(watts_to_dbm(0.0), MIN_DBM);
        assert_eq!(watts_to_dbm(-3.0), MIN_DBM);
    }

    #[test]
    fn test_no_reflection() {
        let report = compute_swr_and_return_loss(100.0, 0.0);
        assert_eq!(report.swr, 1.0);
        assert_eq!(report.return_loss_db, RETURN_LOSS_UNDEFINED_DB);
        assert!(report.is_valid());
        assert!(!report.has_return_loss());
    }

    #[test]
    fn test_equal_powers_invalid() {
        let report = compute_swr_and_return_loss(100.0, 100.0);
        assert_eq!(report.swr, SWR_INVALID);
        assert_eq!(
            report.degeneracy,
            Some(Degeneracy::ReflectedNotBelowForward)
        );
        assert_relative_eq!(report.return_loss_db, 0.0);
    }

    #[test]
    fn test_no_forward_power() {
        for forward in [0.0, -1.0, f32::NAN] {
            let report = compute_swr_and_return_loss(forward, 0.5);
            assert_eq!(report.swr, SWR_INVALID);
            assert_eq!(report.degeneracy, Some(Degeneracy::NoForwardPower));
            assert_eq!(report.return_loss_db, RETURN_LOSS_UNDEFINED_DB);
        }
    }

    #[test]
    fn test_known_mismatch() {
        // 100 W forward, 11.11 W reflected: |rho| = 1/3, SWR 2:1
        let report = compute_swr_and_return_loss(100.0, 100.0 / 9.0);
        assert_relative_eq!(report.swr, 2.0, max_relative = 1e-5);
        assert_relative_eq!(report.return_loss_db, 9.5424, max_relative = 1e-4);
    }

    #[test]
    fn test_near_total_reflection_clamped() {
        let report = compute_swr_and_return_loss(100.0, 99.9999);
        assert!(report.swr <= SWR_INVALID);
        assert!(report.swr >= SWR_MIN);
        assert!(report.is_valid());
    }

    #[test]
    fn test_swr_never_below_one() {
        for reverse in [0.0, 1e-9, 0.01, 1.0, 50.0, 99.0] {
            let report = compute_swr_and_return_loss(100.0, reverse);
            assert!(report.swr >= SWR_MIN && report.swr <= SWR_INVALID);
        }
    }

    #[test]
    fn test_reflection_coefficient() {
        assert_eq!(swr_to_reflection_coefficient(1.0), 0.0);
        assert_relative_eq!(swr_to_reflection_coefficient(3.0), 0.5);
    }
}
