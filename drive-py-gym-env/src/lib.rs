//! A wrapper of gym environments on Python, the CARLA driving gym in particular.
//!
//! [`GymEnv`] implements [`Env`](drive_core::Env) of `drive-core` based on
//! [`PyO3`](https://github.com/PyO3/pyo3). The Python environment is built with
//! `gym.make(name, params=...)`, where the parameter dictionary is given in
//! [`GymEnvConfig`].
//!
//! ## Observation
//!
//! The observation of the CARLA gym is a dictionary of arrays. The array under
//! [`GymEnvConfig::obs_key`], the lidar image by default, is extracted and
//! converted to [`GymObs`]. Arrays of any of `f32`, `f64` and `u8` dtypes are
//! accepted.
//!
//! ## Action
//!
//! Actions are discrete indices ([`GymAct`]), passed to Python as an integer.
//!
//! With the `tch` feature, which is enabled by default, observations are
//! converted into [`TensorBatch`](drive_tch_agent::TensorBatch) to be stored
//! in the replay memory.
mod act;
mod base;
mod config;
mod obs;
pub mod util;
pub use act::GymAct;
pub use base::{GymEnv, GymInfo};
pub use config::{GymEnvConfig, ParamValue};
pub use obs::GymObs;
