//! Bar-graph quantization and sentinel-aware number formatting for
//! rendering collaborators.

use crate::constants::{RETURN_LOSS_UNDEFINED_DB, SWR_INVALID};

/// Number of lit bars for `value` on a `total_bars` graph spanning
/// `0..=full_scale`
///
/// `round(value / full_scale * total_bars)` clamped to `[0, total_bars]`.
/// A non-positive full scale or a NaN value lights nothing.
pub fn bar_count(value: f32, full_scale: f32, total_bars: usize) -> usize {
    if full_scale.is_nan() || full_scale <= 0.0 || value.is_nan() {
        return 0;
    }
    let bars = (value / full_scale * total_bars as f32).round();
    bars.clamp(0.0, total_bars as f32) as usize
}

/// Quantized bar graph with an optional peak marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarGraph {
    /// Lit bars for the current value
    pub bars: usize,
    /// Position of the peak marker, present only when it lies beyond `bars`
    pub peak_bar: Option<usize>,
    pub total_bars: usize,
}

impl BarGraph {
    pub fn new(value: f32, peak: f32, full_scale: f32, total_bars: usize) -> Self {
        let bars = bar_count(value, full_scale, total_bars);
        let peak = bar_count(peak, full_scale, total_bars);
        Self {
            bars,
            peak_bar: (peak > bars).then_some(peak),
            total_bars,
        }
    }

    /// Text rendering, e.g. `[#######     |      ]`
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.total_bars + 2);
        out.push('[');
        for i in 1..=self.total_bars {
            let c = if i <= self.bars {
                '#'
            } else if Some(i) == self.peak_bar {
                '|'
            } else {
                ' '
            };
            out.push(c);
        }
        out.push(']');
        out
    }
}

/// SWR as text, `---` for the invalid sentinel
pub fn format_swr(swr: f32) -> String {
    if swr >= SWR_INVALID || swr.is_nan() {
        "---".to_string()
    } else {
        format!("{:.2}", swr)
    }
}

/// Return loss as text, `---` for the undefined sentinel
pub fn format_return_loss(return_loss_db: f32) -> String {
    if return_loss_db == RETURN_LOSS_UNDEFINED_DB || return_loss_db.is_nan() {
        "---".to_string()
    } else {
        format!("{:.1}", return_loss_db)
    }
}

/// Power with an auto-selected unit
pub fn format_watts(watts: f32) -> String {
    if watts >= 1.0 {
        format!("{:.1} W", watts)
    } else if watts >= 1e-3 {
        format!("{:.1} mW", watts * 1e3)
    } else {
        format!("{:.1} uW", watts * 1e6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_count_rounds_and_clamps() {
        assert_eq!(bar_count(50.0, 100.0, 20), 10);
        assert_eq!(bar_count(52.6, 100.0, 20), 11);
        assert_eq!(bar_count(0.0, 100.0, 20), 0);
        assert_eq!(bar_count(-5.0, 100.0, 20), 0);
        assert_eq!(bar_count(250.0, 100.0, 20), 20);
    }

    #[test]
    fn test_bar_count_degenerate_scale() {
        assert_eq!(bar_count(10.0, 0.0, 20), 0);
        assert_eq!(bar_count(10.0, -1.0, 20), 0);
        assert_eq!(bar_count(f32::NAN, 100.0, 20), 0);
    }

    #[test]
    fn test_peak_marker_only_above_value() {
        let graph = BarGraph::new(50.0, 80.0, 100.0, 10);
        assert_eq!(graph.bars, 5);
        assert_eq!(graph.peak_bar, Some(8));

        let graph = BarGraph::new(50.0, 52.0, 100.0, 10);
        assert_eq!(graph.peak_bar, None);
    }

    #[test]
    fn test_render() {
        let graph = BarGraph::new(30.0, 60.0, 100.0, 10);
        assert_eq!(graph.render(), "[###  |    ]");
    }

    #[test]
    fn test_sentinels_render_as_dashes() {
        assert_eq!(format_swr(SWR_INVALID), "---");
        assert_eq!(format_swr(1.5), "1.50");
        assert_eq!(format_return_loss(RETURN_LOSS_UNDEFINED_DB), "---");
        assert_eq!(format_return_loss(14.04), "14.0");
    }

    #[test]
    fn test_format_watts_units() {
        assert_eq!(format_watts(100.0), "100.0 W");
        assert_eq!(format_watts(0.25), "250.0 mW");
        assert_eq!(format_watts(2e-5), "20.0 uW");
    }
}
