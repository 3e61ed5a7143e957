use super::SampleFilter;

/// Simple moving average filter for detector smoothing
///
/// Computes the arithmetic mean of the last N values in a sliding window.
///
/// The filter maintains a circular buffer and a running sum, so each update
/// is O(1). Until the window has filled once, the average is taken over the
/// samples seen so far rather than over N, so early output is not dragged
/// toward zero.
pub struct MovingAverage {
    buffer: Vec<f32>,
    index: usize,
    count: usize,
    sum: f64,
}

impl MovingAverage {
    /// Create a new moving average filter
    ///
    /// # Arguments
    /// * `window_size` - Number of samples to average; 0 is treated as 1
    pub fn new(window_size: usize) -> Self {
        Self {
            buffer: vec![0.0; window_size.max(1)],
            index: 0,
            count: 0,
            sum: 0.0,
        }
    }

    /// Add a new value to the moving average and return the updated average
    pub fn add(&mut self, value: f32) -> f32 {
        let evicted = self.buffer[self.index];
        self.sum -= evicted as f64;
        self.buffer[self.index] = value;
        self.sum += value as f64;

        self.index = (self.index + 1) % self.buffer.len();
        if self.count < self.buffer.len() {
            self.count += 1;
        }

        // Re-derive the sum once per lap so rounding cannot accumulate
        if self.index == 0 {
            self.sum = self.buffer.iter().map(|&x| x as f64).sum();
        }

        self.average()
    }

    /// Get the current average without adding a new value
    ///
    /// Returns 0.0 before the first sample.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum / self.count as f64) as f32
    }

    /// Number of samples currently contributing to the average
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl SampleFilter for MovingAverage {
    fn update(&mut self, value: f32) -> f32 {
        self.add(value)
    }

    fn resize(&mut self, window_size: usize) {
        *self = Self::new(window_size);
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.count = 0;
        self.sum = 0.0;
    }

    fn window_size(&self) -> usize {
        self.buffer.len()
    }
}
