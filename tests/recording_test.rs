mod common;

use std::io::Cursor;

use approx::assert_relative_eq;
use swrmeter::acquisition::{CsvSource, SampleSource, SourceReader, WavFileSource};
use swrmeter::config::MeterConfig;
use swrmeter::processing::MeterProcessor;
use swrmeter::save_wav;
use swrmeter::simulation::Scenario;

#[test]
fn test_wav_round_trip() {
    let config = MeterConfig::default();
    let scenario = Scenario {
        forward_dbm: 47.0,
        swr: 1.8,
        sample_rate: 2000,
        duration_secs: 0.5,
        ..Scenario::default()
    };
    let samples = common::detector_signal(&scenario, &config);

    let path = common::temp_path("round_trip.wav");
    save_wav(&path, &samples, scenario.sample_rate, 3.3).unwrap();

    let mut source = WavFileSource::new(&path, 300, 3.3).unwrap();
    assert_eq!(source.sample_rate(), 2000);
    assert_eq!(source.len(), samples.len());

    let mut replayed = Vec::new();
    while let Some(block) = source.next_block().unwrap() {
        assert!(block.len() <= 300);
        replayed.extend(block);
    }
    std::fs::remove_file(&path).ok();

    assert_eq!(replayed.len(), samples.len());
    for (original, read) in samples.iter().zip(&replayed) {
        assert_eq!(original.timestamp, read.timestamp);
        assert_relative_eq!(original.ch0, read.ch0, max_relative = 1e-5);
        assert_relative_eq!(original.ch1, read.ch1, max_relative = 1e-5);
    }

    let last = *common::run_pipeline(&replayed, &config)
        .last()
        .expect("no snapshots");
    assert_relative_eq!(last.swr, 1.8, max_relative = 1e-3);
    assert_relative_eq!(last.forward_dbm, 47.0, max_relative = 1e-4);
}

#[test]
fn test_wav_rejects_mono() {
    let path = common::temp_path("mono.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 1000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..10 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();

    let result = WavFileSource::new(&path, 64, 3.3);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
}

#[test]
fn test_csv_log_through_reader_thread() {
    let config = MeterConfig::default();
    let scenario = Scenario {
        forward_dbm: 30.0,
        swr: 3.0,
        duration_secs: 0.4,
        ..Scenario::default()
    };
    let samples = common::detector_signal(&scenario, &config);

    let mut text = String::from("time_ms,ch0,ch1\n# bench log\n");
    for s in &samples {
        text.push_str(&format!(
            "{},{:.6},{:.6}\n",
            s.timestamp.as_secs_f64() * 1000.0,
            s.ch0,
            s.ch1
        ));
    }

    let reader = SourceReader::spawn(Box::new(CsvSource::new(Cursor::new(text), 64)), 4);
    let mut processor = MeterProcessor::new(&config);
    let mut last = None;
    let mut count = 0;
    while let Some(block) = reader.recv() {
        count += block.len();
        last = processor.process_block(&block).last().copied();
    }
    assert_eq!(reader.join().unwrap(), samples.len());
    assert_eq!(count, samples.len());

    let last = last.expect("no snapshots");
    assert_relative_eq!(last.swr, 3.0, max_relative = 1e-3);
    assert_relative_eq!(last.forward_watts, 1.0, max_relative = 1e-3);
}

#[test]
fn test_csv_malformed_line_reported() {
    let text = "0,1.0,0.5\n1,oops,0.5\n";
    let mut source = CsvSource::new(Cursor::new(text), 16);
    assert!(source.next_block().is_err());
}
