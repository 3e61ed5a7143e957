use super::Formatter;
use crate::config::DisplayConfig;
use crate::display::{BarGraph, format_return_loss, format_swr, format_watts};
use crate::processing::MeasurementSnapshot;

pub struct TextFormatter {
    verbose: bool,
    display: DisplayConfig,
}

impl TextFormatter {
    pub fn new(verbose: bool, display: DisplayConfig) -> Self {
        Self { verbose, display }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, s: &MeasurementSnapshot) -> String {
        let bar = BarGraph::new(
            s.forward_watts,
            s.forward_peak_watts,
            self.display.full_scale_watts,
            self.display.total_bars,
        );
        if self.verbose {
            format!(
                "FWD {:>9} (pk {:>9}) REV {:>9} SWR {:>5} RL {:>5} dB {} [{:.4} V / {:.4} V, {:.1} / {:.1} dBm]",
                format_watts(s.forward_watts),
                format_watts(s.forward_peak_watts),
                format_watts(s.reverse_watts),
                format_swr(s.swr),
                format_return_loss(s.return_loss_db),
                bar.render(),
                s.forward_voltage,
                s.reverse_voltage,
                s.forward_dbm,
                s.reverse_dbm
            )
        } else {
            format!(
                "FWD {:>9} REV {:>9} SWR {:>5} {}",
                format_watts(s.forward_watts),
                format_watts(s.reverse_watts),
                format_swr(s.swr),
                bar.render()
            )
        }
    }
}
