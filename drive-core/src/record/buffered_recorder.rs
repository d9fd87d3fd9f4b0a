use super::{Record, Recorder};

/// Buffered recorder.
///
/// Keeps all the records in memory. This is used for inspecting the metrics
/// written by the training loop.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.buf.iter()
    }

    /// Returns the `(frame, value)` series of a scalar tag.
    ///
    /// Records without the tag or without a `frame` step are skipped.
    pub fn scalar_series(&self, tag: &str) -> Vec<(usize, f32)> {
        self.buf
            .iter()
            .filter_map(|record| {
                let frame = record.get_step("frame").ok()?;
                let value = record.get_scalar(tag).ok()?;
                Some((frame, value))
            })
            .collect()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::record::RecordValue;

    #[test]
    fn test_scalar_series() {
        let mut recorder = BufferedRecorder::new();
        let frame = (1usize << 24) + 1;
        let mut record = Record::from_scalar("Reward", 2.0);
        record.insert("frame", RecordValue::Step(frame));
        recorder.write(record);
        recorder.write(Record::from_scalar("Reward", 3.0));

        assert_eq!(recorder.iter().count(), 2);
        assert_eq!(recorder.scalar_series("Reward"), vec![(frame, 2.0)]);
        assert!(recorder.scalar_series("Average100").is_empty());
    }
}
