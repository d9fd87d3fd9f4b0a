//! A deterministic toy environment, used in tests.
//!
//! The environment has two states and two actions. The state alternates between
//! 0 and 1 at every step regardless of the action, and the reward is 1 when the
//! action equals [`DummyEnvConfig::rewarded_act`], 0 otherwise. An episode ends
//! after `episode_len` steps.
use crate::{Act, Env, Obs, Step};
use anyhow::{bail, Result};

/// Observation of [`DummyEnv`], the one-hot encoding of the state padded with zeros.
#[derive(Clone, Debug, PartialEq)]
pub struct DummyObs(pub Vec<f32>);

impl Obs for DummyObs {}

impl DummyObs {
    fn from_state(state: usize, dim: usize) -> Self {
        let mut v = vec![0f32; dim];
        v[state] = 1.0;
        Self(v)
    }

    /// Index of the state.
    pub fn state(&self) -> usize {
        if self.0[1] > self.0[0] {
            1
        } else {
            0
        }
    }
}

/// Action of [`DummyEnv`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DummyAct(pub i64);

impl Act for DummyAct {}

impl From<i64> for DummyAct {
    fn from(a: i64) -> Self {
        Self(a)
    }
}

impl From<DummyAct> for i64 {
    fn from(a: DummyAct) -> Self {
        a.0
    }
}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Number of steps in an episode.
    pub episode_len: usize,

    /// The action rewarded with 1.
    pub rewarded_act: i64,

    /// If set, [`Env::step`] fails at the given step count.
    pub fail_at_step: Option<usize>,

    /// If set, the environment built with the seed `.0` has observations of
    /// dimension `.1`, at least 2, instead of 2.
    pub obs_dim_at_seed: Option<(i64, usize)>,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            episode_len: 4,
            rewarded_act: 1,
            fail_at_step: None,
            obs_dim_at_seed: None,
        }
    }
}

/// The toy environment.
pub struct DummyEnv {
    config: DummyEnvConfig,
    obs_dim: usize,
    state: usize,
    t: usize,
    n_steps: usize,
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let obs_dim = match config.obs_dim_at_seed {
            Some((s, dim)) if s == seed => dim.max(2),
            _ => 2,
        };
        Ok(Self {
            config: config.clone(),
            obs_dim,
            state: 0,
            t: 0,
            n_steps: 0,
        })
    }

    fn reset(&mut self) -> Result<DummyObs> {
        self.state = 0;
        self.t = 0;
        Ok(DummyObs::from_state(self.state, self.obs_dim))
    }

    fn obs_shape(&self) -> Vec<usize> {
        vec![self.obs_dim]
    }

    fn n_actions(&self) -> i64 {
        2
    }

    fn step(&mut self, a: &DummyAct) -> Result<Step<Self>> {
        if Some(self.n_steps) == self.config.fail_at_step {
            bail!("simulator connection lost");
        }
        if a.0 < 0 || a.0 > 1 {
            bail!("action out of range: {}", a.0);
        }
        self.n_steps += 1;
        self.t += 1;
        self.state = 1 - self.state;
        let reward = if a.0 == self.config.rewarded_act { 1.0 } else { 0.0 };
        let is_done = self.t >= self.config.episode_len;

        let obs = DummyObs::from_state(self.state, self.obs_dim);

        Ok(Step::new(obs, *a, reward, is_done, ()))
    }
}
