use super::{WorkerCommand, WorkerReply};
use crate::{error::DriveError, Env, Step};
use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, warn};
use std::thread::{self, JoinHandle};

/// Results of a step of all the workers, ordered by worker index.
pub struct VecStep<E: Env> {
    /// Next observations, or initial observations of workers whose episode ended.
    pub obs: Vec<E::Obs>,

    /// Actions taken by the workers.
    pub act: Vec<E::Act>,

    /// Rewards.
    pub reward: Vec<f32>,

    /// Episode end flags.
    pub is_done: Vec<bool>,

    /// Information of the steps.
    pub info: Vec<E::Info>,
}

impl<E: Env> VecStep<E> {
    /// Returns `true` if the episode of any worker ended.
    pub fn any_done(&self) -> bool {
        self.is_done.iter().any(|&d| d)
    }

    /// Mean of the rewards over the workers.
    pub fn mean_reward(&self) -> f32 {
        self.reward.iter().sum::<f32>() / self.reward.len() as f32
    }
}

struct Worker<E: Env> {
    tx: Sender<WorkerCommand<E::Act>>,
    rx: Receiver<WorkerReply<E>>,
    handle: Option<JoinHandle<()>>,
}

/// Runs `K` environments in worker threads and steps them in lockstep.
///
/// Each worker owns its environment, which is built inside the worker thread, so
/// the environment itself does not need to be [`Send`]. Workers communicate with
/// [`VecEnv`] only through a pair of channels.
///
/// Environments that call into Python, like `GymEnv`, share one interpreter and
/// hold the GIL while stepping. Their steps are serialized: the workers wait on
/// the simulator concurrently only where the Python side releases the GIL.
pub struct VecEnv<E: Env> {
    workers: Vec<Worker<E>>,
    obs_shape: Vec<usize>,
    n_actions: i64,
}

fn run_worker<E: Env>(
    id: usize,
    config: E::Config,
    seed: i64,
    rx: Receiver<WorkerCommand<E::Act>>,
    tx: Sender<WorkerReply<E>>,
) {
    let mut env = match E::build(&config, seed) {
        Ok(env) => env,
        Err(e) => {
            let _ = tx.send(WorkerReply::Failed(format!("{:?}", e)));
            return;
        }
    };
    let ready = WorkerReply::Ready {
        obs_shape: env.obs_shape(),
        n_actions: env.n_actions(),
    };
    if tx.send(ready).is_err() {
        return;
    }
    debug!("Worker {} started with seed {}", id, seed);

    for cmd in rx.iter() {
        let reply = match cmd {
            WorkerCommand::Reset => env.reset().map(WorkerReply::Reset),
            WorkerCommand::Step(act) => env.step_with_reset(&act).map(WorkerReply::Step),
            WorkerCommand::Close => break,
        };
        match reply {
            Ok(reply) => {
                if tx.send(reply).is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(WorkerReply::Failed(format!("{:?}", e)));
                break;
            }
        }
    }
    debug!("Worker {} stopped", id);
}

impl<E> VecEnv<E>
where
    E: Env + 'static,
    E::Config: Send + 'static,
{
    /// Spawns `n_workers` workers. The `i`-th worker builds its environment with `seed + i`.
    ///
    /// Returns after all the environments were built. If any of them fails, the
    /// error is returned and the other workers are stopped. All the environments
    /// must agree on the observation shape and the number of actions, otherwise
    /// [`DriveError::InvalidConfig`] is returned.
    pub fn build(config: &E::Config, n_workers: usize, seed: i64) -> Result<Self> {
        if n_workers == 0 {
            let msg = "number of workers must be positive".to_string();
            return Err(DriveError::InvalidConfig(msg).into());
        }

        let mut workers = Vec::with_capacity(n_workers);
        for id in 0..n_workers {
            let (tx_cmd, rx_cmd) = bounded(1);
            let (tx_reply, rx_reply) = bounded(1);
            let config = config.clone();
            let seed = seed + id as i64;
            let handle = thread::Builder::new()
                .name(format!("env-worker-{}", id))
                .spawn(move || run_worker::<E>(id, config, seed, rx_cmd, tx_reply))?;
            workers.push(Worker {
                tx: tx_cmd,
                rx: rx_reply,
                handle: Some(handle),
            });
        }
        let mut vec_env = Self {
            workers,
            obs_shape: vec![],
            n_actions: 0,
        };

        for id in 0..n_workers {
            let (obs_shape, n_actions) = match vec_env.recv(id)? {
                WorkerReply::Ready {
                    obs_shape,
                    n_actions,
                } => (obs_shape, n_actions),
                _ => return Err(DriveError::WorkerDisconnected(id).into()),
            };
            if id == 0 {
                vec_env.obs_shape = obs_shape;
                vec_env.n_actions = n_actions;
            } else if vec_env.obs_shape != obs_shape || vec_env.n_actions != n_actions {
                let msg = format!(
                    "worker {}: observation shape {:?} with {} actions, worker 0: {:?} with {}",
                    id, obs_shape, n_actions, vec_env.obs_shape, vec_env.n_actions
                );
                return Err(DriveError::InvalidConfig(msg).into());
            }
        }

        Ok(vec_env)
    }

    /// Number of workers.
    pub fn n_workers(&self) -> usize {
        self.workers.len()
    }

    /// Shape of observations, shared by all the workers.
    pub fn obs_shape(&self) -> &[usize] {
        &self.obs_shape
    }

    /// Number of actions, shared by all the workers.
    pub fn n_actions(&self) -> i64 {
        self.n_actions
    }

    /// Fails with [`DriveError::InvalidConfig`] unless the environments have the
    /// given observation shape and number of actions.
    pub fn check_shape(&self, obs_shape: &[usize], n_actions: i64) -> Result<(), DriveError> {
        if self.obs_shape != obs_shape || self.n_actions != n_actions {
            let msg = format!(
                "workers have observation shape {:?} with {} actions, expected {:?} with {}",
                self.obs_shape, self.n_actions, obs_shape, n_actions
            );
            return Err(DriveError::InvalidConfig(msg));
        }
        Ok(())
    }

    fn send(&self, id: usize, cmd: WorkerCommand<E::Act>) -> Result<()> {
        self.workers[id]
            .tx
            .send(cmd)
            .map_err(|_| DriveError::WorkerDisconnected(id).into())
    }

    fn recv(&self, id: usize) -> Result<WorkerReply<E>> {
        match self.workers[id].rx.recv() {
            Ok(WorkerReply::Failed(message)) => {
                Err(DriveError::WorkerFailed { worker: id, message }.into())
            }
            Ok(reply) => Ok(reply),
            Err(_) => Err(DriveError::WorkerDisconnected(id).into()),
        }
    }

    /// Resets all the environments and returns their initial observations.
    pub fn reset(&mut self) -> Result<Vec<E::Obs>> {
        for id in 0..self.n_workers() {
            self.send(id, WorkerCommand::Reset)?;
        }

        (0..self.n_workers())
            .map(|id| -> Result<E::Obs> {
                match self.recv(id)? {
                    WorkerReply::Reset(obs) => Ok(obs),
                    _ => Err(DriveError::WorkerDisconnected(id).into()),
                }
            })
            .collect()
    }

    /// Steps all the environments, one action per worker.
    ///
    /// Blocks until every worker returned its result.
    pub fn step(&mut self, acts: &[E::Act]) -> Result<VecStep<E>> {
        if acts.len() != self.n_workers() {
            return Err(DriveError::ActionCountMismatch {
                expected: self.n_workers(),
                got: acts.len(),
            }
            .into());
        }

        for (id, act) in acts.iter().enumerate() {
            self.send(id, WorkerCommand::Step(act.clone()))?;
        }

        let n = self.n_workers();
        let mut vec_step = VecStep {
            obs: Vec::with_capacity(n),
            act: Vec::with_capacity(n),
            reward: Vec::with_capacity(n),
            is_done: Vec::with_capacity(n),
            info: Vec::with_capacity(n),
        };
        for id in 0..n {
            let step: Step<E> = match self.recv(id)? {
                WorkerReply::Step(step) => step,
                _ => return Err(DriveError::WorkerDisconnected(id).into()),
            };
            vec_step.obs.push(step.obs);
            vec_step.act.push(step.act);
            vec_step.reward.push(step.reward);
            vec_step.is_done.push(step.is_done);
            vec_step.info.push(step.info);
        }

        Ok(vec_step)
    }
}

impl<E: Env> Drop for VecEnv<E> {
    fn drop(&mut self) {
        for worker in self.workers.iter() {
            let _ = worker.tx.send(WorkerCommand::Close);
        }
        for (id, worker) in self.workers.iter_mut().enumerate() {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    warn!("Worker {} panicked", id);
                }
            }
        }
    }
}
