//! Records of metrics.
use crate::error::DriveError;
use std::collections::{hash_map::Iter, HashMap};

/// Represents possible types of values that can be stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, typically used for metrics like loss or return.
    Scalar(f32),

    /// An index of a time series, like the frame count.
    Step(usize),
}

/// A container for storing key-value pairs of various data types.
///
/// # Examples
///
/// ```rust
/// use drive_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("loss", 0.5);
/// record.insert("frame", RecordValue::Step(100));
///
/// assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
/// assert_eq!(record.get_step("frame").unwrap(), 100);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Gets a scalar value from the record.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or the value is not a scalar.
    pub fn get_scalar(&self, k: &str) -> Result<f32, DriveError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(DriveError::RecordValueTypeError("Scalar".to_string())),
            None => Err(DriveError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a step index from the record.
    pub fn get_step(&self, k: &str) -> Result<usize, DriveError> {
        match self.0.get(k) {
            Some(RecordValue::Step(v)) => Ok(*v),
            Some(_) => Err(DriveError::RecordValueTypeError("Step".to_string())),
            None => Err(DriveError::RecordKeyError(k.to_string())),
        }
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
