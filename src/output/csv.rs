use super::{Formatter, iso8601_timestamp};
use crate::processing::MeasurementSnapshot;

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, s: &MeasurementSnapshot) -> String {
        format!(
            "{},{:.3},{:.4},{:.4},{:.2},{:.2},{:.4},{:.4},{:.2},{:.1},{},{:.4},{:.4}",
            iso8601_timestamp(),
            s.timestamp.as_secs_f64() * 1000.0,
            s.forward_voltage,
            s.reverse_voltage,
            s.forward_dbm,
            s.reverse_dbm,
            s.forward_watts,
            s.reverse_watts,
            s.swr,
            s.return_loss_db,
            s.is_valid(),
            s.forward_peak_watts,
            s.reverse_peak_watts
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some(
            "ts,elapsed_ms,fwd_v,rev_v,fwd_dbm,rev_dbm,fwd_w,rev_w,swr,return_loss_db,valid,fwd_peak_w,rev_peak_w",
        )
    }
}
