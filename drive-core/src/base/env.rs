//! Environment.
use super::{Act, Info, Obs, Step};
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// An environment takes a discrete action and emits an observation, a scalar reward
/// and a flag denoting the end of the episode.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [self::Step] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performes an environment step.
    fn step(&mut self, a: &Self::Act) -> Result<Step<Self>>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Shape of observations.
    fn obs_shape(&self) -> Vec<usize>;

    /// Number of discrete actions.
    fn n_actions(&self) -> i64;

    /// Performes an environment step and resets the environment if the episode ends.
    ///
    /// When the episode ends, the observation of the returned [`Step`] is replaced
    /// with the initial observation of the next episode. `is_done` is kept, so the
    /// observation is not used for bootstrapping.
    fn step_with_reset(&mut self, a: &Self::Act) -> Result<Step<Self>>
    where
        Self: Sized,
    {
        let mut step = self.step(a)?;
        if step.is_done {
            step.obs = self.reset()?;
        }
        Ok(step)
    }
}
