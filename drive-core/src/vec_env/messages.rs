//! Messages exchanged between [`VecEnv`](super::VecEnv) and its workers.
use crate::{Env, Step};

/// Messages that workers receive.
pub enum WorkerCommand<A> {
    /// Reset the environment.
    Reset,

    /// Step the environment with the action, resetting it if the episode ends.
    Step(A),

    /// Stop the worker.
    Close,
}

/// Messages that workers send back.
pub enum WorkerReply<E: Env> {
    /// The environment was built, with its observation shape and number of actions.
    Ready {
        /// Shape of observations.
        obs_shape: Vec<usize>,
        /// Number of actions.
        n_actions: i64,
    },

    /// Initial observation after a reset.
    Reset(E::Obs),

    /// Result of a step.
    Step(Step<E>),

    /// The environment raised an error; the worker stops after sending it.
    Failed(String),
}
