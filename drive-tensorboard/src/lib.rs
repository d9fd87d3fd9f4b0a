//! Writes training metrics as TensorBoard event files.
use drive_core::record::{Record, RecordValue, Recorder};
use log::warn;
use std::path::Path;
use tensorboard_rs::summary_writer::SummaryWriter;

/// Writes records to TFRecord.
///
/// Scalars of a record are written with the [`RecordValue::Step`] of the step key
/// of the same record as the step, `frame` by default.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    step_key: String,
}

impl TensorboardRecorder {
    /// Constructs a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            step_key: "frame".to_string(),
        }
    }

    /// Sets the key of the step in records.
    pub fn step_key(mut self, step_key: impl Into<String>) -> Self {
        self.step_key = step_key.into();
        self
    }

    /// Flushes the event file.
    pub fn flush(&mut self) {
        self.writer.flush();
    }

    fn step(&self, record: &Record) -> Option<usize> {
        match record.get(&self.step_key) {
            Some(RecordValue::Step(v)) => Some(*v),
            _ => None,
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Writes a given [`Record`] into a TFRecord.
    ///
    /// Only [`RecordValue::Scalar`] values are written, others are discarded.
    /// Records without the step key are dropped with a warning.
    fn write(&mut self, record: Record) {
        let step = match self.step(&record) {
            Some(step) => step,
            None => {
                warn!("Record without step {:?} was dropped", self.step_key);
                return;
            }
        };

        for (k, v) in record.iter() {
            if *k != self.step_key {
                if let RecordValue::Scalar(v) = v {
                    self.writer.add_scalar(k, *v, step);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_write_scalars() {
        let dir = TempDir::new("tensorboard").unwrap();
        let mut recorder = TensorboardRecorder::new(dir.path());
        let frame = (1 << 24) + 1;
        let mut record = Record::from_scalar("Reward", 1.5);
        record.insert("frame", RecordValue::Step(frame));
        assert_eq!(recorder.step(&record), Some(frame));
        recorder.write(record);

        // Dropped, no step or a scalar one.
        let mut record = Record::from_scalar("Average100", 0.5);
        assert_eq!(recorder.step(&record), None);
        record.insert("frame", RecordValue::Scalar(10.0));
        assert_eq!(recorder.step(&record), None);
        recorder.write(record);
        recorder.flush();

        let n_files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(n_files, 1);
    }
}
