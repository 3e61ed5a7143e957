use std::time::Duration;

/// Peak tracker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakState {
    /// The latest value set a new maximum
    TrackingNewMax,
    /// The peak is older than the latest value
    Holding,
}

/// Peak-hold tracker for display values
///
/// Keeps the highest recent value for a configurable hold time. Once the hold
/// time passes without a new maximum, the peak drops straight to the current
/// value (a hard reset, not a gradual decay) and follows it until the next
/// new maximum restarts the hold.
///
/// Timestamps are offsets from any fixed monotonic origin.
pub struct PeakTracker {
    peak: Option<f32>,
    last_max_time: Duration,
    hold: Duration,
    state: PeakState,
}

impl PeakTracker {
    /// Create a new peak tracker
    ///
    /// # Arguments
    /// * `hold` - How long a peak survives without a new maximum
    pub fn new(hold: Duration) -> Self {
        Self {
            peak: None,
            last_max_time: Duration::ZERO,
            hold,
            state: PeakState::Holding,
        }
    }

    /// Feed the current value and return the peak to display
    ///
    /// # Arguments
    /// * `value` - Instantaneous value for this cycle
    /// * `now` - Cycle timestamp
    pub fn update(&mut self, value: f32, now: Duration) -> f32 {
        let peak = match self.peak {
            Some(peak) if value <= peak => {
                self.state = PeakState::Holding;
                if now.saturating_sub(self.last_max_time) > self.hold {
                    value
                } else {
                    peak
                }
            }
            _ => {
                self.state = PeakState::TrackingNewMax;
                self.last_max_time = now;
                value
            }
        };
        self.peak = Some(peak);
        peak
    }

    /// Change the hold time. Applies from the next `update`.
    pub fn set_hold(&mut self, hold: Duration) {
        self.hold = hold;
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Current peak, or `None` before the first update
    pub fn peak(&self) -> Option<f32> {
        self.peak
    }

    pub fn state(&self) -> PeakState {
        self.state
    }

    pub fn reset(&mut self) {
        self.peak = None;
        self.last_max_time = Duration::ZERO;
        self.state = PeakState::Holding;
    }
}
