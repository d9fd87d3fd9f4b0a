//! Configuration of IQN agent.
use super::{IqnModelConfig, IqnSample, MunchausenConfig};
use crate::Device;
use anyhow::Result;
use drive_core::{
    error::DriveError,
    replay_memory::{PerConfig, ReplayMemoryConfig},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
    str::FromStr,
};

/// Structural options of the agent given by a variant name.
///
/// | name                | dueling | noisy | per   |
/// |---------------------|---------|-------|-------|
/// | `iqn`               |         |       |       |
/// | `iqn+per`           |         |       | x     |
/// | `noisy_iqn`         |         | x     |       |
/// | `noisy_iqn+per`     |         | x     | x     |
/// | `dueling`           | x       |       |       |
/// | `dueling+per`       | x       |       | x     |
/// | `noisy_dueling`     | x       | x     |       |
/// | `noisy_dueling+per` | x       | x     | x     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgentVariant {
    /// Dueling head.
    pub use_dueling: bool,

    /// Noisy layers in the head, replacing epsilon-greedy exploration.
    pub use_noisy: bool,

    /// Prioritized experience replay.
    pub use_per: bool,
}

impl FromStr for AgentVariant {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, use_per) = match s.strip_suffix("+per") {
            Some(base) => (base, true),
            None => (s, false),
        };
        let (use_noisy, use_dueling) = match base {
            "iqn" => (false, false),
            "noisy_iqn" => (true, false),
            "dueling" => (false, true),
            "noisy_dueling" => (true, true),
            _ => return Err(DriveError::InvalidAgentVariant(s.to_string())),
        };

        Ok(Self {
            use_dueling,
            use_noisy,
            use_per,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Iqn`](super::Iqn) agent.
///
/// The type parameter `C` is the configuration of the feature extractor.
pub struct IqnConfig<C> {
    /// Configuration of the quantile network.
    pub model_config: IqnModelConfig<C>,

    /// Configuration of the replay memory. Prioritized sampling is enabled by
    /// [`ReplayMemoryConfig::per_config`].
    pub memory_config: ReplayMemoryConfig,

    /// Number of transitions in a batch.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f64,

    /// Length of multi-step returns.
    pub n_step: usize,

    /// Soft update coefficient of the target network.
    pub tau: f64,

    /// Number of calls of `step` in the learning state per learning step.
    pub update_every: usize,

    /// Quantile fractions for the predictions in the loss.
    pub sample_percents_pred: IqnSample,

    /// Quantile fractions for the targets in the loss.
    pub sample_percents_tgt: IqnSample,

    /// Quantile fractions for action selection.
    pub sample_percents_act: IqnSample,

    /// Munchausen target, disabled if `None`.
    pub munchausen: Option<MunchausenConfig>,

    /// Ceiling of the norm of gradients.
    pub max_grad_norm: f64,

    /// Seed of the random number generator for exploration.
    pub seed: u64,

    /// Device of the networks.
    pub device: Option<Device>,
}

impl<C> Default for IqnConfig<C> {
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            memory_config: Default::default(),
            batch_size: 32,
            discount_factor: 0.99,
            n_step: 1,
            tau: 5e-3,
            update_every: 1,
            sample_percents_pred: IqnSample::Uniform(32),
            sample_percents_tgt: IqnSample::Uniform(32),
            sample_percents_act: IqnSample::Const(32),
            munchausen: None,
            max_grad_norm: 1.0,
            seed: 42,
            device: None,
        }
    }
}

impl<C> IqnConfig<C> {
    /// Sets the configuration of the model.
    pub fn model_config(mut self, v: IqnModelConfig<C>) -> Self {
        self.model_config = v;
        self
    }

    /// Sets the configuration of the replay memory.
    pub fn memory_config(mut self, v: ReplayMemoryConfig) -> Self {
        self.memory_config = v;
        self
    }

    /// Applies the structural options of a variant.
    ///
    /// The priority settings of the replay memory are kept if already given.
    pub fn variant(mut self, v: AgentVariant) -> Self {
        self.model_config = self.model_config.dueling(v.use_dueling).noisy(v.use_noisy);
        let per_config = match v.use_per {
            true => Some(self.memory_config.per_config.take().unwrap_or_default()),
            false => None,
        };
        self.memory_config = self.memory_config.per_config(per_config);
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Length of multi-step returns.
    pub fn n_step(mut self, v: usize) -> Self {
        self.n_step = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Update cadence.
    pub fn update_every(mut self, v: usize) -> Self {
        self.update_every = v;
        self
    }

    /// Sets the number of quantile fractions `N`.
    ///
    /// The predictions and the targets use `N` uniform samples, action selection
    /// uses `N` evenly spaced fractions.
    pub fn n_percent_points(mut self, n: i64) -> Self {
        self.sample_percents_pred = IqnSample::Uniform(n);
        self.sample_percents_tgt = IqnSample::Uniform(n);
        self.sample_percents_act = IqnSample::Const(n);
        self
    }

    /// Sampling quantile fractions for predictions.
    pub fn sample_percents_pred(mut self, v: IqnSample) -> Self {
        self.sample_percents_pred = v;
        self
    }

    /// Sampling quantile fractions for targets.
    pub fn sample_percents_tgt(mut self, v: IqnSample) -> Self {
        self.sample_percents_tgt = v;
        self
    }

    /// Sampling quantile fractions for action selection.
    pub fn sample_percents_act(mut self, v: IqnSample) -> Self {
        self.sample_percents_act = v;
        self
    }

    /// Munchausen target.
    pub fn munchausen(mut self, v: Option<MunchausenConfig>) -> Self {
        self.munchausen = v;
        self
    }

    /// Ceiling of the norm of gradients.
    pub fn max_grad_norm(mut self, v: f64) -> Self {
        self.max_grad_norm = v;
        self
    }

    /// Seed of exploration.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: tch::Device) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Returns `true` if the head has noisy layers.
    pub fn is_noisy(&self) -> bool {
        self.model_config.noisy
    }

    /// Checks the consistency of the configuration.
    pub fn check(&self) -> Result<(), DriveError> {
        let err = |msg: &str| Err(DriveError::InvalidConfig(msg.to_string()));
        if self.batch_size == 0 {
            return err("batch size must be positive");
        }
        if self.memory_config.capacity < self.batch_size {
            return err("replay memory capacity must not be less than batch size");
        }
        if self.n_step == 0 {
            return err("n-step length must be positive");
        }
        if self.update_every == 0 {
            return err("update cadence must be positive");
        }
        if self.model_config.out_dim <= 0 {
            return err("number of actions must be positive");
        }
        Ok(())
    }
}

impl<C> IqnConfig<C>
where
    C: DeserializeOwned + Serialize,
{
    /// Constructs [`IqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`IqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mlp::MlpConfig;
    use tempdir::TempDir;

    #[test]
    fn test_parse_variants() {
        let v: AgentVariant = "noisy_dueling+per".parse().unwrap();
        assert!(v.use_dueling && v.use_noisy && v.use_per);

        let v: AgentVariant = "iqn".parse().unwrap();
        assert_eq!(v, AgentVariant::default());

        let v: AgentVariant = "dueling+per".parse().unwrap();
        assert!(v.use_dueling && !v.use_noisy && v.use_per);

        for s in &["", "dqn", "iqn+", "per", "noisy_iqn+per+per", "IQN"] {
            assert!(matches!(
                s.parse::<AgentVariant>(),
                Err(DriveError::InvalidAgentVariant(_))
            ));
        }
    }

    #[test]
    fn test_variant_sets_flags() {
        let config = IqnConfig::<MlpConfig>::default().variant("noisy_iqn+per".parse().unwrap());
        assert!(config.is_noisy());
        assert!(!config.model_config.dueling);
        assert!(config.memory_config.per_config.is_some());

        let config = config.variant("dueling".parse().unwrap());
        assert!(!config.is_noisy());
        assert!(config.model_config.dueling);
        assert!(config.memory_config.per_config.is_none());
    }

    #[test]
    fn test_check_rejects_small_memory() {
        let config = IqnConfig::<MlpConfig>::default()
            .model_config(IqnModelConfig::default().out_dim(2))
            .batch_size(32)
            .memory_config(ReplayMemoryConfig::default().capacity(16));
        assert!(matches!(config.check(), Err(DriveError::InvalidConfig(_))));
    }

    #[test]
    fn test_serde_iqn_config() -> Result<()> {
        let config = IqnConfig::default()
            .model_config(
                IqnModelConfig::default()
                    .out_dim(9)
                    .f_config(MlpConfig::new(10, vec![64], 512, true)),
            )
            .n_step(3)
            .munchausen(Some(MunchausenConfig::default()))
            .variant("dueling+per".parse()?)
            .device(tch::Device::Cpu);

        let dir = TempDir::new("iqn_config")?;
        let path = dir.path().join("iqn_config.yaml");
        config.save(&path)?;
        let config_ = IqnConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
