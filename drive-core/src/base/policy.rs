//! Policy.
use super::Env;
use anyhow::Result;

/// A policy on an environment.
///
/// Policy is a mapping from observations to actions. The mapping can be either of
/// deterministic or stochastic. Observations of all the workers of a vectorized
/// environment are given at once, and one action per observation is returned.
pub trait Policy<E: Env> {
    /// Samples actions given observations.
    ///
    /// `eps` is the probability of taking a uniformly random action. Policies
    /// exploring by other means take `eps = 0`.
    fn sample(&mut self, obs: &[E::Obs], eps: f64) -> Result<Vec<E::Act>>;
}
