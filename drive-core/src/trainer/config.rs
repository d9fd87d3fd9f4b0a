//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// Frame counts are totals over all the workers of the vectorized environment.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of environment frames to train for.
    pub frames: usize,

    /// Interval of evaluation in frames.
    pub eval_every: usize,

    /// Frames over which epsilon decays linearly from 1 to `min_eps`.
    pub eps_frames: usize,

    /// Final value of epsilon.
    pub min_eps: f64,

    /// If `true`, epsilon is fixed at 0, as for agents exploring with noisy layers.
    pub eps_fixed: bool,

    /// Number of episodes in the trailing window of training returns.
    pub window_size: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            frames: 500_000,
            eval_every: 10_000,
            eps_frames: 75_000,
            min_eps: 0.025,
            eps_fixed: false,
            window_size: 100,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of frames.
    pub fn frames(mut self, v: usize) -> Self {
        self.frames = v;
        self
    }

    /// Sets the interval of evaluation in frames.
    pub fn eval_every(mut self, v: usize) -> Self {
        self.eval_every = v;
        self
    }

    /// Sets the number of frames of epsilon decay.
    pub fn eps_frames(mut self, v: usize) -> Self {
        self.eps_frames = v;
        self
    }

    /// Sets the final value of epsilon.
    pub fn min_eps(mut self, v: f64) -> Self {
        self.min_eps = v;
        self
    }

    /// Fixes epsilon at 0.
    pub fn eps_fixed(mut self, v: bool) -> Self {
        self.eps_fixed = v;
        self
    }

    /// Sets the size of the window of training returns.
    pub fn window_size(mut self, v: usize) -> Self {
        self.window_size = v;
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        log::info!("Load config of trainer from {}", path_.to_str().unwrap_or("?"));
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        log::info!("Save config of trainer into {}", path_.to_str().unwrap_or("?"));
        Ok(())
    }
}
