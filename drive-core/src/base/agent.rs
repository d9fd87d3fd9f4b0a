//! Agent.
use super::{Env, Policy, Transition};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Phase of a learning agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Interacting with the environment without learning.
    Collecting,

    /// Interacting with the environment and periodically updating the model.
    Learning,
}

/// Represents a trainable policy on an environment.
///
/// The agent owns its replay memory. The training loop feeds transitions of each
/// worker with [`Agent::step`], and the agent decides when to learn.
pub trait Agent<E: Env>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Current phase of the agent.
    fn state(&self) -> AgentState;

    /// Ingests a transition of the `worker`-th environment and learns if it is time to.
    ///
    /// Returns a record of the learning step when one was performed.
    fn step(
        &mut self,
        worker: usize,
        transition: Transition<E::Obs, E::Act>,
    ) -> Result<Option<Record>>;

    /// Save the parameters of the agent in the given directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
