pub mod reader;
pub mod sample;
pub mod source;

pub use reader::SourceReader;
pub use sample::RawSample;
pub use source::{CsvSource, SampleSource, WavFileSource};
