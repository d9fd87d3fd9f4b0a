//! Convolutional neural network, the feature extractor for lidar images.
//!
//! The input is a batch of images in `[batch, height, width, channel]` layout. It is
//! cast from `u8` to `f32` and scaled by 1 / 255 for normalizing pixel intensities.
mod base;
mod config;
pub use base::Cnn;
pub use config::CnnConfig;
