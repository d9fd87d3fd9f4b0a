//! The IQN agent implemented with [tch](https://crates.io/crates/tch).
//!
//! The agent [`Iqn`](iqn::Iqn) owns an online and a target quantile network
//! ([`IqnModel`](iqn::IqnModel)), the replay memory of `drive-core` and one n-step
//! accumulator per environment worker. The quantile network is composed of a feature
//! extractor ([`Mlp`](mlp::Mlp) for vector observations, [`Cnn`](cnn::Cnn) for lidar
//! images), the cosine embedding of quantile fractions, and a head whose structure
//! (dueling, noisy) is selected by configuration flags.
pub mod cnn;
pub mod iqn;
pub mod mlp;
pub mod model;
pub mod noisy;
pub mod opt;
mod tensor_batch;
pub mod util;
use serde::{Deserialize, Serialize};
pub use tensor_batch::TensorBatch;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device on which networks are placed.
///
/// This enum is added because [`tch::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given index.
    Cuda(usize),
}

impl From<tch::Device> for Device {
    fn from(device: tch::Device) -> Self {
        match device {
            tch::Device::Cuda(n) => Self::Cuda(n),
            _ => Self::Cpu,
        }
    }
}

impl From<Device> for tch::Device {
    fn from(device: Device) -> Self {
        match device {
            Device::Cpu => tch::Device::Cpu,
            Device::Cuda(n) => tch::Device::Cuda(n),
        }
    }
}
