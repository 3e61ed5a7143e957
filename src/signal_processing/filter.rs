/// Common trait for the sliding-window noise filters
///
/// Implemented by MovingAverage and MedianFilter.
pub trait SampleFilter {
    /// Push one sample and return the filtered output
    fn update(&mut self, value: f32) -> f32;

    /// Change the window size. History is discarded.
    fn resize(&mut self, window_size: usize);

    /// Clear history, keeping the current window size
    fn reset(&mut self);

    fn window_size(&self) -> usize;

    /// Filter a buffer of samples in-place
    fn process_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.update(*sample);
        }
    }
}
