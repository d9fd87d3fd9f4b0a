//! IQN agent.
//!
//! The agent learns return quantiles of every action with the quantile Huber loss,
//! bootstrapping from a target network updated softly after every learning step.
//! Prioritized replay, noisy layers, the dueling head and the Munchausen target are
//! orthogonal options selected by [`IqnConfig`] and [`AgentVariant`].
mod base;
mod config;
mod explorer;
mod model;
mod munchausen;
mod target;
pub use base::Iqn;
pub use config::{AgentVariant, IqnConfig};
pub use explorer::EpsilonGreedy;
pub use model::{average, IqnModel, IqnModelConfig, IqnSample};
pub use munchausen::{munchausen_reward, scaled_log_policy, soft_next_value, MunchausenConfig};
pub use target::{bootstrap_target, MunchausenTerm};
