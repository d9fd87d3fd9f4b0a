//! Trains an IQN agent on the CARLA driving gym.
mod args;
mod config;
use anyhow::Result;
use args::Args;
use clap::Parser;
use config::{check_args, DriveConfig};
use drive_core::{error::DriveError, evaluator::DefaultEvaluator, vec_env::VecEnv, Env, Trainer};
use drive_py_gym_env::{GymEnv, GymEnvConfig};
use drive_tch_agent::{
    cnn::{Cnn, CnnConfig},
    iqn::{AgentVariant, Iqn},
    mlp::{Mlp, MlpConfig},
    model::{ModelBase, SubModel},
    util::OutDim,
};
use drive_tensorboard::TensorboardRecorder;
use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path};
use tch::Tensor;

type Evaluator = DefaultEvaluator<GymEnv>;

fn train<F>(
    args: &Args,
    variant: AgentVariant,
    env_config: GymEnvConfig,
    f_config: F::Config,
    mut evaluator: Evaluator,
) -> Result<()>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: OutDim + DeserializeOwned + Serialize + Clone,
{
    let n_actions = evaluator.env_mut().n_actions();
    let config = DriveConfig::from_args(args, variant, env_config, f_config, n_actions)?;
    let mut envs = VecEnv::<GymEnv>::build(&config.env, config.n_workers, config.seed)?;
    envs.check_shape(&evaluator.env_mut().obs_shape(), n_actions)?;

    let model_dir = Path::new(&args.model_dir);
    fs::create_dir_all(model_dir)?;
    config.save(model_dir.join("config.yaml"))?;

    let mut agent = Iqn::<GymEnv, F>::build(config.agent.clone())?;
    let mut recorder = TensorboardRecorder::new(Path::new(&args.log_dir).join(&config.info));
    let mut trainer = Trainer::build(config.trainer.clone());

    let session = trainer.train(&mut agent, &mut envs, &mut evaluator, &mut recorder)?;
    recorder.flush();
    info!(
        "Finished {} frames, {} learning steps",
        session.frame * config.n_workers,
        agent.n_opts()
    );

    if args.save_model {
        let path = model_dir.join(format!("{}.pt", config.info));
        agent.model().save(path)?;
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let variant: AgentVariant = args.agent.parse()?;
    check_args(&args)?;
    info!("Agent variant {:?}", variant);
    tch::manual_seed(args.seed);

    let env_config = GymEnvConfig::default();
    let mut evaluator = Evaluator::new(&env_config, args.seed + 1, args.eval_runs)?;
    let n_actions = evaluator.env_mut().n_actions();
    let shape = evaluator
        .env_mut()
        .obs_shape()
        .iter()
        .map(|&d| d as i64)
        .collect::<Vec<_>>();
    info!("Observation shape {:?}, {} actions", shape, n_actions);

    match shape.as_slice() {
        &[dim] => {
            let f_config = MlpConfig::new(dim, vec![], args.layer_size, true);
            train::<Mlp>(&args, variant, env_config, f_config, evaluator)
        }
        &[h, w, c] => {
            let f_config = CnnConfig::new([h, w, c], args.layer_size);
            train::<Cnn>(&args, variant, env_config, f_config, evaluator)
        }
        _ => {
            let msg = format!("unsupported observation shape {:?}", shape);
            Err(DriveError::InvalidConfig(msg).into())
        }
    }
}
