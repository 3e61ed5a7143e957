mod csv;
mod json;
mod text;

use chrono::Utc;

use crate::config::DisplayConfig;
use crate::processing::MeasurementSnapshot;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub trait Formatter: Send {
    fn format(&self, snapshot: &MeasurementSnapshot) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(
    format: OutputFormat,
    verbose: bool,
    display: &DisplayConfig,
) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(verbose, display.clone())),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Csv => Box::new(CsvFormatter),
    }
}

pub fn iso8601_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
