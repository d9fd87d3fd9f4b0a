use crate::util::OutDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Cnn`](super::Cnn).
pub struct CnnConfig {
    /// Shape of an input image, `[height, width, channel]`.
    pub in_shape: [i64; 3],

    /// Dimension of the output feature vector.
    pub out_dim: i64,
}

impl CnnConfig {
    /// Creates a configuration.
    pub fn new(in_shape: [i64; 3], out_dim: i64) -> Self {
        Self { in_shape, out_dim }
    }
}

impl OutDim for CnnConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }

    fn set_out_dim(&mut self, v: i64) {
        self.out_dim = v;
    }
}
