use super::Evaluator;
use crate::{error::DriveError, record::Record, Env, Policy};
use anyhow::Result;
use log::debug;

/// Runs a fixed number of episodes on a held-out environment and records the mean
/// return under the tag `Reward`.
///
/// Actions are taken with a small exploration probability `eps`.
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    eps: f64,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record> {
        let mut r_total = 0f32;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset()?;
            let mut r_episode = 0f32;

            loop {
                let act = policy.sample(std::slice::from_ref(&prev_obs), self.eps)?;
                let step = self.env.step(&act[0])?;
                r_episode += step.reward;
                if step.is_done {
                    break;
                }
                prev_obs = step.obs;
            }
            debug!("Evaluation episode {}: return = {}", ix, r_episode);
            r_total += r_episode;
        }

        Ok(Record::from_scalar("Reward", r_total / self.n_episodes as f32))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs an evaluator with its own environment.
    ///
    /// `n_episodes` must be positive.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        if n_episodes == 0 {
            let msg = "number of evaluation episodes must be positive".to_string();
            return Err(DriveError::InvalidConfig(msg).into());
        }
        Ok(Self {
            n_episodes,
            eps: 0.001,
            env: E::build(config, seed)?,
        })
    }

    /// Sets the exploration probability during evaluation.
    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Mutable reference to the environment of the evaluator.
    pub fn env_mut(&mut self) -> &mut E {
        &mut self.env
    }
}
