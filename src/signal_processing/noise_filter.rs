use super::{MedianFilter, MovingAverage, SampleFilter};
use crate::config::FilterConfig;

/// Per-channel noise filter: median followed by moving average
///
/// The median stage removes isolated spikes; the average stage then smooths
/// what is left. Window sizes come from a [`FilterConfig`], corrected into
/// range on construction and on every reconfiguration.
pub struct NoiseFilter {
    median: MedianFilter,
    average: MovingAverage,
    config: FilterConfig,
}

impl NoiseFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let config = config.sanitized();
        Self {
            median: MedianFilter::new(config.median_window),
            average: MovingAverage::new(config.average_window),
            config,
        }
    }

    /// Filter one raw detector voltage
    pub fn update(&mut self, value: f32) -> f32 {
        let despiked = self.median.update(value);
        self.average.update(despiked)
    }

    /// Apply new window sizes
    ///
    /// Only a stage whose window actually changes is resized (and loses its
    /// history); the other stage keeps running undisturbed.
    pub fn reconfigure(&mut self, config: &FilterConfig) {
        let config = config.sanitized();

        if config.median_window != self.config.median_window {
            log::debug!(
                "Median window {} -> {}",
                self.config.median_window,
                config.median_window
            );
            self.median.resize(config.median_window);
        }
        if config.average_window != self.config.average_window {
            log::debug!(
                "Average window {} -> {}",
                self.config.average_window,
                config.average_window
            );
            self.average.resize(config.average_window);
        }

        self.config = config;
    }

    pub fn reset(&mut self) {
        self.median.reset();
        self.average.reset();
    }

    /// Effective (sanitized) window sizes
    pub fn config(&self) -> FilterConfig {
        self.config
    }
}
