//! Training loop.
mod config;
mod session;
use crate::{
    evaluator::Evaluator,
    record::{Record, RecordValue, Recorder},
    vec_env::VecEnv,
    Agent, Env, Transition,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, trace};
pub use session::{EpsilonSchedule, TrainingSession};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop.
///
/// At every iteration, the agent selects actions for the observations of all the
/// workers, the vectorized environment steps the workers in lockstep, and the
/// transition of each worker is fed to the agent, which learns when it is time to.
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|actions|B[VecEnv]
///     B-->|obs, reward, done|A
///     A-->C[ReplayMemory]
///     C-->|batch|A
/// ```
///
/// The number of frames, evaluation interval and epsilon decay are given in total
/// frames over the `K` workers, so the loop runs `frames / K` iterations and
/// metrics are indexed by `iteration * K`. The following metrics are written to
/// the recorder:
///
/// * `Reward` - mean return of evaluation episodes, at the first iteration and
///   every `eval_every` frames,
/// * `Average100` - average of the trailing window of training scores, whenever
///   the episode of any worker ends.
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Configuration of the trainer.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    fn write_metric<R: Recorder>(recorder: &mut R, mut record: Record, frame: usize) {
        record.insert("frame", RecordValue::Step(frame));
        recorder.write(record);
    }

    fn evaluate<E, A, D, R>(
        agent: &mut A,
        evaluator: &mut D,
        recorder: &mut R,
        frame: usize,
    ) -> Result<()>
    where
        E: Env,
        A: Agent<E>,
        D: Evaluator<E>,
        R: Recorder,
    {
        agent.eval();
        let record = evaluator.evaluate(agent)?;
        agent.train();
        if let Ok(reward) = record.get_scalar("Reward") {
            info!("Evaluation at frame {}: Reward = {:.2}", frame, reward);
        }
        Self::write_metric(recorder, record, frame);
        Ok(())
    }

    /// Trains the agent.
    ///
    /// Returns the state of the session at the end of the run. Any error of the
    /// environment workers, the agent or the evaluator aborts the run.
    pub fn train<E, A, D, R>(
        &mut self,
        agent: &mut A,
        envs: &mut VecEnv<E>,
        evaluator: &mut D,
        recorder: &mut R,
    ) -> Result<TrainingSession>
    where
        E: Env + 'static,
        E::Config: Send + 'static,
        A: Agent<E>,
        D: Evaluator<E>,
        R: Recorder,
    {
        let n_workers = envs.n_workers();
        let n_iters = self.config.frames / n_workers;
        let eval_every = (self.config.eval_every / n_workers).max(1);
        let eps_frames = self.config.eps_frames / n_workers;
        let schedule = EpsilonSchedule::new(1.0, self.config.min_eps, eps_frames);
        let eps_start = if self.config.eps_fixed { 0.0 } else { 1.0 };
        let mut session = TrainingSession::new(eps_start, self.config.window_size);

        agent.train();
        let mut obs = envs.reset()?;

        for frame in 1..=n_iters {
            let acts = agent.sample(&obs, session.eps)?;
            let step = envs.step(&acts)?;

            for (worker, (((prev_obs, act), next_obs), (&reward, &is_done))) in obs
                .into_iter()
                .zip(acts.into_iter())
                .zip(step.obs.iter())
                .zip(step.reward.iter().zip(step.is_done.iter()))
                .enumerate()
            {
                let tr = Transition::new(prev_obs, act, reward, next_obs.clone(), is_done);
                if let Some(record) = agent.step(worker, tr)? {
                    trace!("Learning step at frame {}: {:?}", frame * n_workers, record);
                }
            }

            session.frame = frame;
            session.add_rewards(step.mean_reward());
            if !self.config.eps_fixed {
                session.eps = schedule.value(frame);
            }

            if frame % eval_every == 0 || frame == 1 {
                Self::evaluate::<E, _, _, _>(agent, evaluator, recorder, frame * n_workers)?;
            }

            if step.any_done() {
                let average = session.end_episode();
                let record = Record::from_scalar("Average100", average);
                Self::write_metric(recorder, record, frame * n_workers);
                info!(
                    "Episode {}\tFrame {}\tAverage100 Score: {:.2}",
                    session.episode * n_workers,
                    frame * n_workers,
                    average
                );
            }

            obs = step.obs;
        }

        Ok(session)
    }
}
