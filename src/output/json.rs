use serde::Serialize;

use super::{Formatter, iso8601_timestamp};
use crate::processing::MeasurementSnapshot;

pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonRecord<'a> {
    ts: String,
    valid: bool,
    #[serde(flatten)]
    snapshot: &'a MeasurementSnapshot,
}

impl Formatter for JsonFormatter {
    fn format(&self, snapshot: &MeasurementSnapshot) -> String {
        let record = JsonRecord {
            ts: iso8601_timestamp(),
            valid: snapshot.is_valid(),
            snapshot,
        };
        serde_json::to_string(&record).unwrap_or_else(|e| format!(r#"{{"error":"{}"}}"#, e))
    }
}
