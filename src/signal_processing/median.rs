use super::SampleFilter;

/// Sliding-window median filter for spike rejection
///
/// Replaces each sample with the median of the last N samples. A single
/// out-of-range reading (converter glitch, arcing) is removed entirely
/// instead of being smeared across the window as a moving average would.
///
/// Each update copies the valid part of the window into a scratch buffer and
/// sorts it, so the cost is O(N log N). Windows are small, so this stays well
/// inside a cycle.
///
/// Before the window fills, the median is taken over the samples seen so
/// far; with an even count the two middle values are averaged.
pub struct MedianFilter {
    buffer: Vec<f32>,
    scratch: Vec<f32>,
    index: usize,
    count: usize,
}

impl MedianFilter {
    /// Create a new median filter
    ///
    /// # Arguments
    /// * `window_size` - Number of samples in the window (odd for a true
    ///   median once full); 0 is treated as 1
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            buffer: vec![0.0; window_size],
            scratch: Vec::with_capacity(window_size),
            index: 0,
            count: 0,
        }
    }

    /// Median of the current window, or 0.0 before the first sample
    pub fn median(&mut self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }

        // Slots fill from index 0, so the first `count` entries are valid
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.buffer[..self.count]);
        self.scratch.sort_unstable_by(f32::total_cmp);

        let mid = self.count / 2;
        if self.count % 2 == 1 {
            self.scratch[mid]
        } else {
            (self.scratch[mid - 1] + self.scratch[mid]) / 2.0
        }
    }
}

impl SampleFilter for MedianFilter {
    fn update(&mut self, value: f32) -> f32 {
        self.buffer[self.index] = value;
        self.index = (self.index + 1) % self.buffer.len();
        if self.count < self.buffer.len() {
            self.count += 1;
        }
        self.median()
    }

    fn resize(&mut self, window_size: usize) {
        *self = Self::new(window_size);
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.count = 0;
    }

    fn window_size(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_steady_state() {
        let mut filter = MedianFilter::new(3);
        filter.update(1.0);
        filter.update(5.0);
        assert_eq!(filter.update(2.0), 2.0);
        assert_eq!(filter.update(9.0), 5.0); // [9, 5, 2]
        assert_eq!(filter.update(7.0), 7.0); // [9, 7, 2]
    }

    #[test]
    fn test_partial_window_even_count() {
        let mut filter = MedianFilter::new(5);
        assert_eq!(filter.update(4.0), 4.0);
        assert_eq!(filter.update(2.0), 3.0);
        assert_eq!(filter.update(9.0), 4.0);
        assert_eq!(filter.update(1.0), 3.0);
    }

    #[test]
    fn test_rejects_single_spike() {
        for n in (3..=31).step_by(2) {
            for spike_at in 0..n {
                let mut filter = MedianFilter::new(n);
                let mut out = 0.0;
                for i in 0..n {
                    let v = if i == spike_at { 1000.0 } else { 1.25 };
                    out = filter.update(v);
                }
                assert_eq!(out, 1.25, "window {} spike at {}", n, spike_at);
            }
        }
    }

    #[test]
    fn test_negative_spike_rejected() {
        let mut filter = MedianFilter::new(5);
        let outputs: Vec<f32> = [2.0, 2.0, -50.0, 2.0, 2.0, 2.0]
            .into_iter()
            .map(|v| filter.update(v))
            .collect();
        assert_eq!(outputs[4], 2.0);
        assert_eq!(outputs[5], 2.0);
    }

    #[test]
    fn test_nan_does_not_poison_median() {
        let mut filter = MedianFilter::new(3);
        filter.update(1.0);
        filter.update(f32::NAN);
        assert_eq!(filter.update(1.0), 1.0);
    }

    #[test]
    fn test_resize_discards_history() {
        let mut filter = MedianFilter::new(5);
        for _ in 0..5 {
            filter.update(8.0);
        }
        filter.resize(3);
        assert_eq!(filter.window_size(), 3);
        assert_eq!(filter.update(1.0), 1.0);
    }

    #[test]
    fn test_process_buffer() {
        let mut filter = MedianFilter::new(3);
        let mut buffer = vec![1.0, 1.0, 50.0, 1.0, 1.0];
        filter.process_buffer(&mut buffer);
        assert_eq!(buffer[2], 1.0);
        assert_eq!(buffer[3], 1.0);
    }
}
