use std::time::Duration;

/// One raw converter reading: both inputs sampled in the same cycle
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RawSample {
    /// Monotonic time of the cycle
    pub timestamp: Duration,
    /// Voltage on converter input 0
    pub ch0: f32,
    /// Voltage on converter input 1
    pub ch1: f32,
}

impl RawSample {
    pub fn new(timestamp: Duration, ch0: f32, ch1: f32) -> Self {
        Self { timestamp, ch0, ch1 }
    }
}
