use thiserror::Error;

#[derive(Error, Debug)]
pub enum MeterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recording error: {0}")]
    Recording(String),

    #[error("Calibration table needs {expected} points, got {got}")]
    InvalidCalibration { expected: usize, got: usize },
}

impl From<hound::Error> for MeterError {
    fn from(e: hound::Error) -> Self {
        MeterError::Recording(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MeterError>;
