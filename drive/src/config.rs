//! Configuration of a training run.
use crate::args::Args;
use anyhow::Result;
use drive_core::{error::DriveError, replay_memory::ReplayMemoryConfig, TrainerConfig};
use drive_py_gym_env::GymEnvConfig;
use drive_tch_agent::{
    iqn::{AgentVariant, IqnConfig, IqnModelConfig, MunchausenConfig},
    util::OutDim,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configurations of all the components of a run.
///
/// `C` is the configuration of the feature extractor of the agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DriveConfig<C> {
    /// Name of the run.
    pub info: String,

    /// Random seed of the run.
    pub seed: i64,

    /// Number of environment workers.
    pub n_workers: usize,

    /// Number of evaluation episodes.
    pub eval_runs: usize,

    /// Environment.
    pub env: GymEnvConfig,

    /// Agent.
    pub agent: IqnConfig<C>,

    /// Training loop.
    pub trainer: TrainerConfig,
}

/// Validates the command line arguments that do not depend on the environment.
pub fn check_args(args: &Args) -> Result<(), DriveError> {
    let err = |msg: &str| Err(DriveError::InvalidConfig(msg.to_string()));
    if args.worker == 0 {
        return err("number of workers must be positive");
    }
    if args.eval_runs == 0 {
        return err("number of evaluation runs must be positive");
    }
    if args.batch_size == 0 {
        return err("batch size must be positive");
    }
    if args.memory_size < args.batch_size {
        return err("replay memory capacity must not be less than batch size");
    }
    if args.n_step == 0 {
        return err("n-step length must be positive");
    }
    Ok(())
}

impl<C: OutDim> DriveConfig<C> {
    /// Assembles the configuration from the command line arguments.
    ///
    /// `f_config` is the feature extractor chosen for the observations and
    /// `n_actions` the size of the action space.
    pub fn from_args(
        args: &Args,
        variant: AgentVariant,
        env: GymEnvConfig,
        f_config: C,
        n_actions: i64,
    ) -> Result<Self, DriveError> {
        check_args(args)?;

        let model_config = IqnModelConfig::default()
            .feature_dim(args.layer_size)
            .hidden_dim(args.layer_size)
            .out_dim(n_actions)
            .learning_rate(args.lr)
            .f_config(f_config);
        let memory_config = ReplayMemoryConfig::default()
            .capacity(args.memory_size)
            .seed(args.seed as u64);
        let munchausen = match args.munchausen {
            true => Some(MunchausenConfig::default()),
            false => None,
        };
        let agent = IqnConfig::default()
            .model_config(model_config)
            .memory_config(memory_config)
            .variant(variant)
            .batch_size(args.batch_size)
            .discount_factor(args.gamma)
            .n_step(args.n_step)
            .tau(args.tau)
            .update_every(args.worker)
            .n_percent_points(args.n_quantiles)
            .munchausen(munchausen)
            .seed(args.seed as u64)
            .device(tch::Device::cuda_if_available());
        agent.check()?;

        let trainer = TrainerConfig::default()
            .frames(args.frames)
            .eval_every(args.eval_every)
            .eps_frames(args.eps_frames)
            .min_eps(args.min_eps)
            .eps_fixed(variant.use_noisy);

        Ok(Self {
            info: args.info.clone(),
            seed: args.seed,
            n_workers: args.worker,
            eval_runs: args.eval_runs,
            env,
            agent,
            trainer,
        })
    }
}

impl<C: Serialize + DeserializeOwned> DriveConfig<C> {
    /// Loads [`DriveConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DriveConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;
    use drive_tch_agent::{cnn::CnnConfig, mlp::MlpConfig};
    use tempdir::TempDir;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("drive").chain(argv.iter().copied()))
    }

    #[test]
    fn test_noisy_per_variant() -> Result<()> {
        let args = args(&["--agent", "noisy_dueling+per", "--worker", "4", "--munchausen"]);
        let variant = args.agent.parse()?;
        let f_config = CnnConfig::new([64, 64, 3], 0);
        let config = DriveConfig::from_args(&args, variant, GymEnvConfig::default(), f_config, 9)?;

        assert!(config.agent.model_config.dueling);
        assert!(config.agent.model_config.noisy);
        assert!(config.agent.memory_config.per_config.is_some());
        assert!(config.agent.munchausen.is_some());
        assert_eq!(config.agent.update_every, 4);
        assert_eq!(config.agent.model_config.out_dim, 9);
        assert_eq!(config.agent.model_config.f_config.unwrap().out_dim, 512);
        assert!(config.trainer.eps_fixed);
        Ok(())
    }

    #[test]
    fn test_plain_variant() -> Result<()> {
        let args = args(&["--memory-size", "1000", "--eps-frames", "500"]);
        let variant = args.agent.parse()?;
        let f_config = MlpConfig::new(4, vec![], 0, true);
        let config = DriveConfig::from_args(&args, variant, GymEnvConfig::default(), f_config, 2)?;

        assert!(!config.agent.model_config.dueling);
        assert!(!config.agent.model_config.noisy);
        assert!(config.agent.memory_config.per_config.is_none());
        assert_eq!(config.agent.memory_config.capacity, 1000);
        assert_eq!(config.agent.update_every, 1);
        assert!(!config.trainer.eps_fixed);
        assert_eq!(config.trainer.eps_frames, 500);
        Ok(())
    }

    #[test]
    fn test_invalid_configs() {
        let f_config = MlpConfig::new(4, vec![], 0, true);
        let variant = AgentVariant::default();

        let args_ = args(&["--worker", "0"]);
        assert!(matches!(
            DriveConfig::from_args(&args_, variant, GymEnvConfig::default(), f_config.clone(), 2),
            Err(DriveError::InvalidConfig(_))
        ));

        let args_ = args(&["--memory-size", "16", "--batch-size", "32"]);
        assert!(matches!(
            DriveConfig::from_args(&args_, variant, GymEnvConfig::default(), f_config, 2),
            Err(DriveError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_check_args() {
        assert!(check_args(&args(&[])).is_ok());
        for argv in [
            ["--worker", "0"],
            ["--eval-runs", "0"],
            ["--batch-size", "0"],
            ["--n-step", "0"],
        ]
        .iter()
        {
            assert!(matches!(
                check_args(&args(argv)),
                Err(DriveError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let args = args(&["--agent", "dueling+per"]);
        let variant = args.agent.parse()?;
        let f_config = MlpConfig::new(4, vec![], 0, true);
        let config = DriveConfig::from_args(&args, variant, GymEnvConfig::default(), f_config, 2)?;

        let dir = TempDir::new("drive_config")?;
        let path = dir.path().join("config.yaml");
        config.save(&path)?;
        let config_ = DriveConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
