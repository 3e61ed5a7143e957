pub mod filter;
pub mod median;
pub mod moving_average;
pub mod noise_filter;
pub mod peak_hold;

pub use filter::SampleFilter;
pub use median::MedianFilter;
pub use moving_average::MovingAverage;
pub use noise_filter::NoiseFilter;
pub use peak_hold::{PeakState, PeakTracker};
