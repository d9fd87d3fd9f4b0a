//! Types and traits for recording training metrics.
//!
//! * [`Record`] - A container of key-value pairs of various data types
//! * [`RecordValue`] - The types of values stored in a record
//! * [`Recorder`] - A trait for writing records to a sink
//! * [`BufferedRecorder`] - A recorder keeping records in memory
//! * [`NullRecorder`] - A recorder that discards all records
//!
//! # Basic Usage
//!
//! ```rust
//! use drive_core::record::{Record, RecordValue};
//!
//! let frame = 1000;
//! let average = 12.5f32;
//!
//! let mut record = Record::from_scalar("Average100", average);
//! record.insert("frame", RecordValue::Step(frame));
//! ```
//!
//! Metrics written by the training loop carry a `frame` key, which recorders use
//! as the step index of the time series.
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
