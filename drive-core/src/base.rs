//! Core functionalities.
mod agent;
mod env;
mod policy;
mod step;
pub use agent::{Agent, AgentState};
pub use env::Env;
pub use policy::Policy;
use std::fmt::Debug;
pub use step::{Info, Step, Transition};

/// A set of observations of an environment.
///
/// Observations are sent across the boundary between environment workers and
/// the training loop, so they must be [`Send`].
pub trait Obs: Clone + Debug + Send + 'static {}

/// A set of actions of the environment.
pub trait Act: Clone + Debug + Send + 'static {}
