use anyhow::Result;
use drive_core::{
    dummy::{DummyAct, DummyEnv, DummyEnvConfig, DummyObs},
    evaluator::DefaultEvaluator,
    record::{BufferedRecorder, NullRecorder},
    replay_memory::ReplayMemoryConfig,
    vec_env::VecEnv,
    Agent, AgentState, Policy, Trainer, TrainerConfig, Transition,
};
use drive_tch_agent::{
    iqn::{Iqn, IqnConfig, IqnModelConfig, IqnSample, MunchausenConfig},
    mlp::{Mlp, MlpConfig},
    model::ModelBase,
    util::track,
    TensorBatch,
};
use std::convert::TryFrom;
use tch::Tensor;
use tempdir::TempDir;

type DummyIqn = Iqn<DummyEnv, Mlp>;

fn iqn_config(variant: &str, batch_size: usize) -> IqnConfig<MlpConfig> {
    let model_config = IqnModelConfig::default()
        .feature_dim(16)
        .embed_dim(8)
        .hidden_dim(16)
        .out_dim(2)
        .learning_rate(1e-3)
        .f_config(MlpConfig::new(2, vec![16], 16, true));

    IqnConfig::default()
        .model_config(model_config)
        .memory_config(ReplayMemoryConfig::default().capacity(100))
        .batch_size(batch_size)
        .n_percent_points(8)
        .variant(variant.parse().unwrap())
}

fn obs(state: usize) -> DummyObs {
    let mut v = vec![0f32; 2];
    v[state] = 1.0;
    DummyObs(v)
}

fn transition(t: usize, act: i64) -> Transition<DummyObs, DummyAct> {
    let reward = if act == 1 { 1.0 } else { 0.0 };
    Transition::new(obs(t % 2), DummyAct(act), reward, obs((t + 1) % 2), t % 4 == 3)
}

fn variables(model: &impl ModelBase) -> Vec<(String, Tensor)> {
    let mut vars = model.get_var_store().variables().into_iter().collect::<Vec<_>>();
    vars.sort_by(|a, b| a.0.cmp(&b.0));
    vars
}

fn same_variables(m1: &impl ModelBase, m2: &impl ModelBase) -> bool {
    variables(m1)
        .iter()
        .zip(variables(m2).iter())
        .all(|((n1, v1), (n2, v2))| n1 == n2 && v1.equal(v2))
}

#[test]
fn test_collecting_until_batch_size_then_one_learning_step() -> Result<()> {
    tch::manual_seed(42);
    let batch_size = 4;
    let mut agent = DummyIqn::build(iqn_config("iqn", batch_size))?;
    agent.train();

    for t in 0..batch_size {
        assert!(agent.step(0, transition(t, 1))?.is_none());
    }
    assert_eq!(agent.state(), AgentState::Collecting);
    assert_eq!(agent.memory().len(), batch_size);
    assert_eq!(agent.n_opts(), 0);

    let record = agent.step(0, transition(batch_size, 1))?;
    assert_eq!(agent.state(), AgentState::Learning);
    assert_eq!(agent.n_opts(), 1);
    assert!(record.unwrap().get_scalar("loss")?.is_finite());
    Ok(())
}

#[test]
fn test_update_cadence() -> Result<()> {
    tch::manual_seed(42);
    let config = iqn_config("iqn", 2).update_every(3);
    let mut agent = DummyIqn::build(config)?;

    for t in 0..2 {
        agent.step(0, transition(t, 0))?;
    }
    let n_learned = (2..11)
        .map(|t| agent.step(t % 3, transition(t, 0)).map(|r| r.is_some()))
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(
        n_learned,
        vec![false, false, true, false, false, true, false, false, true]
    );
    assert_eq!(agent.n_opts(), 3);
    Ok(())
}

#[test]
fn test_soft_update() -> Result<()> {
    let agent = DummyIqn::build(iqn_config("iqn", 2))?;
    let other = DummyIqn::build(iqn_config("iqn", 2))?;
    let mut tgt = other.model().try_clone()?;
    assert!(!same_variables(&tgt, agent.model()));

    let before = variables(&tgt)
        .into_iter()
        .map(|(n, v)| (n, v.copy()))
        .collect::<Vec<_>>();
    track(&mut tgt, agent.model(), 0.0);
    assert!(variables(&tgt)
        .iter()
        .zip(before.iter())
        .all(|((_, v1), (_, v2))| v1.equal(v2)));

    track(&mut tgt, agent.model(), 1.0);
    assert!(same_variables(&tgt, agent.model()));
    Ok(())
}

#[test]
fn test_target_network_tracks_online_network() -> Result<()> {
    tch::manual_seed(42);
    let config = iqn_config("iqn", 2).tau(1.0);
    let mut agent = DummyIqn::build(config)?;
    assert!(same_variables(agent.model(), agent.target_model()));

    for t in 0..3 {
        agent.step(0, transition(t, 1))?;
    }
    assert_eq!(agent.n_opts(), 1);
    // With tau = 1, the target network equals the online network after learning.
    assert!(same_variables(agent.model(), agent.target_model()));
    Ok(())
}

#[test]
fn test_greedy_action_is_reproducible() -> Result<()> {
    let observations = vec![obs(0), obs(1), obs(0)];
    let mut agent1 = DummyIqn::build(iqn_config("dueling", 2))?;
    let mut agent2 = DummyIqn::build(iqn_config("dueling", 2).seed(1))?;

    let dir = TempDir::new("iqn_greedy")?;
    agent1.save_params(dir.path())?;
    agent2.load_params(dir.path())?;

    // Same parameters and constant quantile fractions give the same actions.
    let a1 = agent1.sample(&observations, 0.0)?;
    assert_eq!(a1, agent1.sample(&observations, 0.0)?);
    assert_eq!(a1, agent2.sample(&observations, 0.0)?);
    assert_eq!(a1[0], a1[2]);
    Ok(())
}

#[test]
fn test_per_updates_priorities() -> Result<()> {
    tch::manual_seed(42);
    let mut agent = DummyIqn::build(iqn_config("iqn+per", 4))?;
    for t in 0..4 {
        agent.step(0, transition(t, (t % 2) as i64))?;
    }
    assert!((0..4).all(|ix| agent.memory().priority(ix) == Some(1.0)));
    let beta_0 = agent.memory().beta().unwrap();

    let record = agent.step(0, transition(4, 0))?.unwrap();
    assert!(record.get_scalar("mean_weight")? <= 1.0);
    assert!(agent.memory().beta().unwrap() > beta_0);
    // Sampled transitions got |td| + eps.
    assert!((0..5).any(|ix| agent.memory().priority(ix) != Some(1.0)));
    Ok(())
}

#[test]
fn test_non_finite_loss_is_an_error() -> Result<()> {
    tch::manual_seed(42);
    let mut agent = DummyIqn::build(iqn_config("iqn", 2))?;
    let nan_transition = |t| {
        let mut tr = transition(t, 0);
        tr.reward = f32::NAN;
        tr
    };
    for t in 0..2 {
        agent.step(0, nan_transition(t))?;
    }
    assert!(agent.step(0, nan_transition(2)).is_err());
    Ok(())
}

#[test]
fn test_save_and_load_params() -> Result<()> {
    tch::manual_seed(42);
    let mut agent = DummyIqn::build(iqn_config("noisy_dueling", 2))?;
    for t in 0..5 {
        agent.step(0, transition(t, 1))?;
    }

    let dir = TempDir::new("iqn")?;
    agent.save_params(dir.path())?;
    assert!(dir.path().join("iqn.pt").exists());
    assert!(dir.path().join("iqn_tgt.pt").exists());

    tch::manual_seed(0);
    let mut agent_ = DummyIqn::build(iqn_config("noisy_dueling", 2))?;
    assert!(!same_variables(agent.model(), agent_.model()));
    agent_.load_params(dir.path())?;
    assert!(same_variables(agent.model(), agent_.model()));
    assert!(same_variables(agent.target_model(), agent_.target_model()));
    Ok(())
}

#[test]
fn test_n_step_transitions_are_stored_per_worker() -> Result<()> {
    tch::manual_seed(42);
    let config = iqn_config("iqn", 32).n_step(3).discount_factor(0.5);
    let mut agent = DummyIqn::build(config)?;

    // Two workers interleaved; nothing is ready before each has 3 transitions.
    for t in 0..2 {
        agent.step(0, transition(t, 1))?;
        agent.step(1, transition(t, 0))?;
    }
    assert_eq!(agent.memory().len(), 0);

    agent.step(0, transition(2, 1))?;
    assert_eq!(agent.memory().len(), 1);
    let rewards = agent.memory().contents().reward;
    assert_eq!(rewards, vec![1.0 + 0.5 + 0.25]);

    // Episode end of worker 1 flushes its 3 partial returns.
    agent.step(1, transition(3, 0))?;
    assert_eq!(agent.memory().len(), 4);
    Ok(())
}

#[test]
fn test_train_all_options_on_dummy_env() -> Result<()> {
    tch::manual_seed(42);
    let env_config = DummyEnvConfig::default();
    let n_workers = 2;
    let config = iqn_config("noisy_dueling+per", 8)
        .n_step(2)
        .update_every(n_workers)
        .munchausen(Some(MunchausenConfig::default()))
        .sample_percents_act(IqnSample::Median);
    let mut agent = DummyIqn::build(config)?;
    let mut envs = VecEnv::<DummyEnv>::build(&env_config, n_workers, 0)?;
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&env_config, 1, 1)?;
    let mut recorder = BufferedRecorder::new();
    let mut trainer = Trainer::build(
        TrainerConfig::default()
            .frames(60)
            .eval_every(20)
            .eps_fixed(true),
    );

    let session = trainer.train(&mut agent, &mut envs, &mut evaluator, &mut recorder)?;
    assert_eq!(session.frame, 30);
    assert_eq!(agent.state(), AgentState::Learning);
    assert!(agent.n_opts() > 0);
    assert!(!recorder.scalar_series("Reward").is_empty());
    Ok(())
}

#[test]
fn test_learns_rewarded_action() -> Result<()> {
    tch::manual_seed(42);
    let env_config = DummyEnvConfig::default();
    let mut config = iqn_config("iqn", 16).discount_factor(0.0).tau(0.1);
    config.model_config = config.model_config.learning_rate(3e-3);
    let mut agent = DummyIqn::build(config)?;
    let mut envs = VecEnv::<DummyEnv>::build(&env_config, 1, 0)?;
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&env_config, 1, 1)?;
    let mut trainer = Trainer::build(
        TrainerConfig::default()
            .frames(1000)
            .eval_every(1000)
            .eps_frames(300)
            .min_eps(0.5),
    );
    trainer.train(&mut agent, &mut envs, &mut evaluator, &mut NullRecorder {})?;

    // With gamma = 0, the quantiles of action 1 concentrate at 1 and those of action 0 at 0.
    let q = drive_tch_agent::iqn::average(
        &TensorBatch::cat(vec![obs(0).into(), obs(1).into()])?.into_tensor()?,
        agent.model(),
        &IqnSample::Const(8),
    );
    let q = Vec::<f32>::try_from(&q.flatten(0, -1))?;
    assert!(q[1] > q[0] + 0.5, "{:?}", q);
    assert!(q[3] > q[2] + 0.5, "{:?}", q);
    assert_eq!(agent.sample(&[obs(0), obs(1)], 0.0)?, vec![DummyAct(1), DummyAct(1)]);
    Ok(())
}

#[test]
fn test_evaluation_keeps_exploration_of_training() -> Result<()> {
    let mut agent1 = DummyIqn::build(iqn_config("iqn", 2))?;
    let mut agent2 = DummyIqn::build(iqn_config("iqn", 2))?;
    let batch = [obs(0), obs(1), obs(0)];
    agent1.train();
    agent2.train();

    let (mut acts1, mut acts2) = (vec![], vec![]);
    for _ in 0..5 {
        acts1.extend(agent1.sample(&batch, 1.0)?);
        agent2.eval();
        agent2.sample(&batch, 1.0)?;
        agent2.train();
        acts2.extend(agent2.sample(&batch, 1.0)?);
    }

    assert!(agent2.is_train());
    assert_eq!(acts1, acts2);
    Ok(())
}
