use anyhow::Result;
use drive_core::{
    dummy::{DummyAct, DummyEnv, DummyEnvConfig, DummyObs},
    error::DriveError,
    evaluator::DefaultEvaluator,
    record::{BufferedRecorder, Record},
    vec_env::VecEnv,
    Agent, AgentState, Policy, Trainer, TrainerConfig, Transition,
};
use std::path::Path;

/// Always takes the rewarded action and keeps track of what the trainer gives it.
#[derive(Default)]
struct ScriptedAgent {
    train: bool,
    eps_history: Vec<f64>,
    eval_calls: usize,
    transitions: Vec<(usize, Transition<DummyObs, DummyAct>)>,
}

impl Policy<DummyEnv> for ScriptedAgent {
    fn sample(&mut self, obs: &[DummyObs], eps: f64) -> Result<Vec<DummyAct>> {
        if self.train {
            self.eps_history.push(eps);
        } else {
            self.eval_calls += 1;
        }
        Ok(obs.iter().map(|_| DummyAct(1)).collect())
    }
}

impl Agent<DummyEnv> for ScriptedAgent {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn state(&self) -> AgentState {
        AgentState::Collecting
    }

    fn step(
        &mut self,
        worker: usize,
        transition: Transition<DummyObs, DummyAct>,
    ) -> Result<Option<Record>> {
        self.transitions.push((worker, transition));
        Ok(None)
    }

    fn save_params(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

fn env_config() -> DummyEnvConfig {
    DummyEnvConfig {
        episode_len: 5,
        ..Default::default()
    }
}

#[test]
fn test_training_loop_metrics() -> Result<()> {
    let n_workers = 2;
    let mut envs = VecEnv::<DummyEnv>::build(&env_config(), n_workers, 0)?;
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&env_config(), 1, 2)?;
    let mut recorder = BufferedRecorder::new();
    let mut agent = ScriptedAgent::default();
    let config = TrainerConfig::default()
        .frames(40)
        .eval_every(10)
        .eps_frames(20)
        .min_eps(0.1);
    let mut trainer = Trainer::build(config);

    let session = trainer.train(&mut agent, &mut envs, &mut evaluator, &mut recorder)?;

    // 20 iterations of 2 workers.
    assert_eq!(session.frame, 20);
    assert_eq!(agent.transitions.len(), 40);
    assert_eq!(agent.transitions.iter().filter(|(w, _)| *w == 1).count(), 20);
    assert!(agent.transitions.iter().all(|(_, tr)| tr.reward == 1.0));

    // Evaluation at the first iteration and every 5 iterations.
    let rewards = recorder.scalar_series("Reward");
    let frames = rewards.iter().map(|(f, _)| *f).collect::<Vec<_>>();
    assert_eq!(frames, vec![2, 10, 20, 30, 40]);
    assert!(rewards.iter().all(|(_, r)| *r == 5.0));

    // Both workers finish an episode every 5 iterations, the shared score is the
    // sum of mean rewards over the episode.
    let averages = recorder.scalar_series("Average100");
    assert_eq!(averages.len(), 4);
    assert_eq!(averages[0], (10, 5.0));
    assert_eq!(session.episode, 4);
    assert_eq!(session.score, 0.0);

    // Epsilon decays linearly over 10 iterations down to 0.1.
    assert_eq!(agent.eps_history[0], 1.0);
    assert!((agent.eps_history[5] - 0.55).abs() < 1e-9);
    assert_eq!(*agent.eps_history.last().unwrap(), 0.1);
    assert!(agent.is_train());
    Ok(())
}

#[test]
fn test_epsilon_fixed_for_noisy_exploration() -> Result<()> {
    let mut envs = VecEnv::<DummyEnv>::build(&env_config(), 1, 0)?;
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&env_config(), 1, 1)?;
    let mut recorder = BufferedRecorder::new();
    let mut agent = ScriptedAgent::default();
    let config = TrainerConfig::default()
        .frames(12)
        .eval_every(100)
        .eps_frames(6)
        .eps_fixed(true);

    Trainer::build(config).train(&mut agent, &mut envs, &mut evaluator, &mut recorder)?;

    assert_eq!(agent.eps_history.len(), 12);
    assert!(agent.eps_history.iter().all(|&eps| eps == 0.0));
    assert_eq!(recorder.scalar_series("Reward").len(), 1);
    Ok(())
}

#[test]
fn test_evaluator_needs_an_episode() {
    let err = DefaultEvaluator::<DummyEnv>::new(&env_config(), 1, 0)
        .err()
        .unwrap();
    assert!(matches!(
        err.downcast_ref::<DriveError>(),
        Some(DriveError::InvalidConfig(_))
    ));
}
