//! Configuration for the SWR / power meter core.
//!
//! ## Channel Assignment
//!
//! Which ADC input carries the forward detector and which carries the
//! reverse detector is set by `InputConfig`:
//!
//! ```ignore
//! forward_channel: AdcInput::Ch0,  // or AdcInput::Ch1
//! reverse_channel: AdcInput::Ch1,  // or AdcInput::Ch0
//! ```
//!
//! ## File format
//!
//! Every section is optional; missing values fall back to defaults.
//!
//! ```toml
//! [input]
//! forward_channel = "ch0"
//! reverse_channel = "ch1"
//!
//! [forward_filter]
//! average_window = 8
//! median_window = 5
//!
//! [peak_hold]
//! hold_ms = 1500
//!
//! [calibration]
//! forward = [0.50, 0.75, 1.00, 1.25, 1.50, 1.75, 2.00, 2.25, 2.50, 2.75, 3.00]
//!
//! [display]
//! full_scale_watts = 100.0
//! total_bars = 20
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::calibration::CalibrationTable;
use crate::constants::MAX_FILTER_WINDOW;
use crate::error::{MeterError, Result};

/// Peak-hold duration
///
/// Parsed from the command line or a config file as either milliseconds or
/// seconds.
///
/// # Parsing formats
/// - `1500` - milliseconds (no suffix)
/// - `1500ms` - milliseconds (explicit)
/// - `1.5s` - seconds
///
/// # Example
/// ```
/// use swrmeter::config::HoldDuration;
///
/// let hold: HoldDuration = "1.5s".parse().unwrap();
/// assert_eq!(hold.as_millis(), 1500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldDuration(Duration);

impl HoldDuration {
    /// Create from milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    /// Get the duration in whole milliseconds
    pub fn as_millis(&self) -> u64 {
        self.0.as_millis() as u64
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for HoldDuration {
    fn default() -> Self {
        Self::from_millis(1500)
    }
}

impl fmt::Display for HoldDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis())
    }
}

impl FromStr for HoldDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        // "ms" has to be checked before the bare "s" suffix
        if let Some(num) = s.strip_suffix("ms") {
            let ms: f64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid hold duration: {}", s))?;
            return seconds(ms / 1000.0).map(Self);
        }

        if let Some(num) = s.strip_suffix('s') {
            let secs: f64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid hold duration: {}", s))?;
            return seconds(secs).map(Self);
        }

        let ms: u64 = s
            .parse()
            .map_err(|_| format!("invalid hold duration: {}", s))?;
        Ok(Self::from_millis(ms))
    }
}

fn seconds(secs: f64) -> std::result::Result<Duration, String> {
    if secs < 0.0 {
        return Err("hold duration must not be negative".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid hold duration: {}", e))
}

/// ADC input selector for a two-input converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdcInput {
    /// First converter input (index 0 of a raw pair)
    Ch0,
    /// Second converter input (index 1 of a raw pair)
    Ch1,
}

/// Full meter configuration
///
/// Everything the core needs between cycles. Apply changes with
/// [`MeterProcessor::apply_config`](crate::processing::MeterProcessor::apply_config),
/// never mid-cycle.
///
/// # Example
/// ```
/// use swrmeter::config::MeterConfig;
///
/// let mut config = MeterConfig::default();
/// config.peak_hold.hold_ms = 3000;
/// config.forward_filter.median_window = 7;
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// ADC channel assignment
    pub input: InputConfig,
    /// Noise filter for the forward detector
    pub forward_filter: FilterConfig,
    /// Noise filter for the reverse detector
    pub reverse_filter: FilterConfig,
    /// Peak-hold behaviour for the display values
    pub peak_hold: PeakHoldConfig,
    /// Per-channel calibration tables
    pub calibration: CalibrationConfig,
    /// Bar-graph scaling
    pub display: DisplayConfig,
}

impl MeterConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: MeterConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Reject settings that cannot be clamped into something meaningful.
    ///
    /// Filter windows are not checked here; they are corrected when applied.
    pub fn validate(&self) -> Result<()> {
        if self.input.forward_channel == self.input.reverse_channel {
            return Err(MeterError::Config(format!(
                "forward and reverse detectors both assigned to {:?}",
                self.input.forward_channel
            )));
        }
        if self.display.full_scale_watts.is_nan() || self.display.full_scale_watts <= 0.0 {
            return Err(MeterError::Config(format!(
                "full_scale_watts must be positive, got {}",
                self.display.full_scale_watts
            )));
        }
        if self.display.total_bars == 0 {
            return Err(MeterError::Config("total_bars must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// ADC input assignment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Input carrying the forward detector voltage
    pub forward_channel: AdcInput,
    /// Input carrying the reverse detector voltage
    pub reverse_channel: AdcInput,
}

impl InputConfig {
    /// Map a raw converter pair to (forward, reverse)
    pub fn split(&self, ch0: f32, ch1: f32) -> (f32, f32) {
        let pick = |input: AdcInput| match input {
            AdcInput::Ch0 => ch0,
            AdcInput::Ch1 => ch1,
        };
        (pick(self.forward_channel), pick(self.reverse_channel))
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            forward_channel: AdcInput::Ch0,
            reverse_channel: AdcInput::Ch1,
        }
    }
}

/// Noise filter window sizes for one detector channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Moving-average window (>= 1)
    pub average_window: usize,
    /// Median window (odd, >= 1)
    pub median_window: usize,
}

impl FilterConfig {
    /// Return a copy with both windows forced into their valid ranges.
    ///
    /// Windows are clamped to `1..=MAX_FILTER_WINDOW`; an even median window
    /// is bumped to the next odd size.
    pub fn sanitized(&self) -> Self {
        let average_window = self.average_window.clamp(1, MAX_FILTER_WINDOW);
        if average_window != self.average_window {
            log::warn!(
                "Average window {} out of range, using {}",
                self.average_window,
                average_window
            );
        }

        let mut median_window = self.median_window.clamp(1, MAX_FILTER_WINDOW);
        if median_window % 2 == 0 {
            median_window += 1;
        }
        if median_window != self.median_window {
            log::warn!(
                "Median window {} invalid, using {}",
                self.median_window,
                median_window
            );
        }

        Self {
            average_window,
            median_window,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            average_window: 8,
            median_window: 5,
        }
    }
}

/// Peak-hold configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeakHoldConfig {
    /// How long a peak is held without a new maximum, in milliseconds
    pub hold_ms: u64,
}

impl PeakHoldConfig {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

impl Default for PeakHoldConfig {
    fn default() -> Self {
        Self {
            hold_ms: HoldDuration::default().as_millis(),
        }
    }
}

/// Calibration tables for both detectors
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub forward: CalibrationTable,
    pub reverse: CalibrationTable,
}

/// Bar-graph scaling. Not used by any power or SWR computation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Power in watts that fills the bar graph
    pub full_scale_watts: f32,
    /// Number of segments in the bar graph
    pub total_bars: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            full_scale_watts: 100.0,
            total_bars: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_duration_bare_millis() {
        let hold: HoldDuration = "1500".parse().unwrap();
        assert_eq!(hold.as_millis(), 1500);
    }

    #[test]
    fn test_hold_duration_suffixes() {
        let hold: HoldDuration = "250ms".parse().unwrap();
        assert_eq!(hold.as_millis(), 250);

        let hold: HoldDuration = "2s".parse().unwrap();
        assert_eq!(hold.as_millis(), 2000);

        let hold: HoldDuration = " 0.5s ".parse().unwrap();
        assert_eq!(hold.as_millis(), 500);
    }

    #[test]
    fn test_hold_duration_invalid() {
        assert!("abc".parse::<HoldDuration>().is_err());
        assert!("-1s".parse::<HoldDuration>().is_err());
        assert!("-5ms".parse::<HoldDuration>().is_err());
        assert!("NaNs".parse::<HoldDuration>().is_err());
        assert!("infms".parse::<HoldDuration>().is_err());
    }

    #[test]
    fn test_sanitize_zero_windows() {
        let cfg = FilterConfig {
            average_window: 0,
            median_window: 0,
        }
        .sanitized();
        assert_eq!(cfg.average_window, 1);
        assert_eq!(cfg.median_window, 1);
    }

    #[test]
    fn test_sanitize_even_median() {
        let cfg = FilterConfig {
            average_window: 4,
            median_window: 6,
        }
        .sanitized();
        assert_eq!(cfg.average_window, 4);
        assert_eq!(cfg.median_window, 7);
    }

    #[test]
    fn test_sanitize_oversized() {
        let cfg = FilterConfig {
            average_window: 10_000,
            median_window: 10_000,
        }
        .sanitized();
        assert_eq!(cfg.average_window, MAX_FILTER_WINDOW);
        assert_eq!(cfg.median_window, MAX_FILTER_WINDOW);
        assert_eq!(cfg.median_window % 2, 1);
    }

    #[test]
    fn test_split_channels() {
        let mut input = InputConfig::default();
        assert_eq!(input.split(1.0, 2.0), (1.0, 2.0));

        input.forward_channel = AdcInput::Ch1;
        input.reverse_channel = AdcInput::Ch0;
        assert_eq!(input.split(1.0, 2.0), (2.0, 1.0));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = MeterConfig::from_toml_str(
            r#"
            [forward_filter]
            median_window = 9

            [peak_hold]
            hold_ms = 2500
            "#,
        )
        .unwrap();

        assert_eq!(config.forward_filter.median_window, 9);
        assert_eq!(config.forward_filter.average_window, 8);
        assert_eq!(config.reverse_filter, FilterConfig::default());
        assert_eq!(config.peak_hold.hold(), Duration::from_millis(2500));
    }

    #[test]
    fn test_reject_same_channel_assignment() {
        let result = MeterConfig::from_toml_str(
            r#"
            [input]
            forward_channel = "ch1"
            reverse_channel = "ch1"
            "#,
        );
        assert!(matches!(result, Err(MeterError::Config(_))));
    }

    #[test]
    fn test_reject_wrong_calibration_length() {
        let result = MeterConfig::from_toml_str(
            r#"
            [calibration]
            forward = [0.1, 0.2, 0.3]
            "#,
        );
        assert!(matches!(result, Err(MeterError::ConfigParse(_))));
    }

    #[test]
    fn test_reject_non_positive_full_scale() {
        let result = MeterConfig::from_toml_str(
            r#"
            [display]
            full_scale_watts = 0.0
            "#,
        );
        assert!(result.is_err());
    }
}
