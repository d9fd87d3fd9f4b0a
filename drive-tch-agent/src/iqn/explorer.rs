//! Exploration strategy of IQN.
use anyhow::Result;
use std::convert::TryFrom;
use tch::Tensor;

/// Epsilon-greedy action selection.
///
/// With probability `eps` an action is drawn uniformly at random, otherwise the one
/// with the largest value is taken. Ties are broken by the first index.
pub struct EpsilonGreedy {
    rng: fastrand::Rng,
}

impl EpsilonGreedy {
    /// Constructs an explorer with a seeded random number generator.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Takes actions given action values of shape `[batch_size, n_actions]`.
    pub fn action(&mut self, q: &Tensor, eps: f64) -> Result<Vec<i64>> {
        let n_actions = q.size()[1];
        let greedy = Vec::<i64>::try_from(&q.argmax(-1, false).to_device(tch::Device::Cpu))?;
        let rng = &mut self.rng;

        Ok(greedy
            .into_iter()
            .map(|a| match rng.f64() < eps {
                true => rng.i64(0..n_actions),
                false => a,
            })
            .collect())
    }
}
