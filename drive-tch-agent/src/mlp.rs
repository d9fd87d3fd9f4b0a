//! Multilayer perceptron, the feature extractor for vector observations.
mod base;
mod config;
pub use base::Mlp;
pub use config::MlpConfig;
