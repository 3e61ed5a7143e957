use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded};

use super::{RawSample, SampleSource};
use crate::error::{MeterError, Result};

/// Runs a [`SampleSource`] on its own thread
///
/// Blocks are delivered in order over a bounded channel, so a slow consumer
/// applies back-pressure to the reader instead of growing a queue.
pub struct SourceReader {
    rx: Receiver<Vec<RawSample>>,
    handle: Option<JoinHandle<Result<usize>>>,
}

impl SourceReader {
    pub fn spawn(mut source: Box<dyn SampleSource>, queue_depth: usize) -> Self {
        let (tx, rx) = bounded(queue_depth.max(1));
        let handle = thread::spawn(move || Self::run(source.as_mut(), tx));
        Self {
            rx,
            handle: Some(handle),
        }
    }

    fn run(source: &mut dyn SampleSource, tx: Sender<Vec<RawSample>>) -> Result<usize> {
        let mut total = 0;
        while let Some(block) = source.next_block()? {
            total += block.len();
            if tx.send(block).is_err() {
                log::warn!("Sample receiver dropped");
                break;
            }
        }
        log::debug!("Source exhausted after {} samples", total);
        Ok(total)
    }

    /// Next block, or `None` once the source is done
    pub fn recv(&self) -> Option<Vec<RawSample>> {
        self.rx.recv().ok()
    }

    /// Wait for the reader thread; returns the number of samples read
    pub fn join(mut self) -> Result<usize> {
        // Unblock the reader if it is waiting on a full channel
        drop(std::mem::replace(&mut self.rx, crossbeam_channel::never()));
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| MeterError::Recording("reader thread panicked".to_string()))?,
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::CsvSource;
    use std::io::Cursor;

    #[test]
    fn test_reader_delivers_in_order() {
        let text: String = (0..25).map(|i| format!("{},{},0.1\n", i, i)).collect();
        let source = CsvSource::new(Cursor::new(text), 10);
        let reader = SourceReader::spawn(Box::new(source), 2);

        let mut received = Vec::new();
        while let Some(block) = reader.recv() {
            received.extend(block);
        }

        assert_eq!(received.len(), 25);
        assert!(received.iter().enumerate().all(|(i, s)| s.ch0 == i as f32));
        assert_eq!(reader.join().unwrap(), 25);
    }
}
