//! IQN agent implemented with tch-rs.
use super::{
    average, bootstrap_target, EpsilonGreedy, IqnConfig, IqnModel, IqnSample, MunchausenConfig,
    MunchausenTerm,
};
use crate::{
    model::{ModelBase, SubModel},
    util::{quantile_loss, track},
    TensorBatch,
};
use anyhow::Result;
use drive_core::{
    error::DriveError,
    record::{Record, RecordValue},
    replay_memory::{NStepAccumulator, ReplayMemory, TransitionBatch, VecBatch},
    Agent, AgentState, Env, Policy, Transition,
};
use log::{debug, trace};
use serde::{de::DeserializeOwned, Serialize};
use std::{convert::TryFrom, fs, marker::PhantomData, path::Path};
use tch::{no_grad, Device, Kind::Float, Tensor};

type Memory = ReplayMemory<TensorBatch, VecBatch<i64>>;

/// IQN agent implemented with tch-rs.
///
/// The type parameter `F` is a feature extractor, which takes a batch of
/// observations and returns feature vectors.
///
/// The agent is *collecting* until its replay memory holds `batch_size`
/// transitions, and *learning* afterwards. The state is evaluated at the start of
/// [`Agent::step`], before the given transition is stored. In the learning state, a
/// learning step runs every `update_every` calls of [`Agent::step`]:
///
/// 1. the noise of noisy layers is resampled,
/// 2. a batch is sampled and the quantile Huber loss is minimized with clipped
///    gradients,
/// 3. with prioritized replay, the priorities of the sampled transitions are set
///    to the mean magnitude of their TD errors,
/// 4. the target network is softly updated.
pub struct Iqn<E, F>
where
    E: Env,
    F: SubModel<Input = Tensor, Output = Tensor>,
{
    iqn: IqnModel<F>,
    iqn_tgt: IqnModel<F>,
    memory: Memory,
    nstep: Vec<NStepAccumulator<E::Obs, E::Act>>,
    explorer: EpsilonGreedy,
    explorer_eval: EpsilonGreedy,
    state: AgentState,
    n_calls: usize,
    n_opts: usize,
    batch_size: usize,
    discount_factor: f64,
    n_step: usize,
    tau: f64,
    update_every: usize,
    max_grad_norm: f64,
    sample_percents_pred: IqnSample,
    sample_percents_tgt: IqnSample,
    sample_percents_act: IqnSample,
    munchausen: Option<MunchausenConfig>,
    train: bool,
    device: Device,
    phantom: PhantomData<E>,
}

impl<E, F> Iqn<E, F>
where
    E: Env,
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + Clone,
    E::Obs: Into<TensorBatch>,
    E::Act: From<i64> + Into<i64>,
{
    /// Constructs an IQN agent.
    ///
    /// Fails if the configuration is inconsistent.
    pub fn build(config: IqnConfig<F::Config>) -> Result<Self> {
        config.check()?;
        let device = config.device.map(Into::into).unwrap_or(Device::Cpu);
        let iqn = IqnModel::build(config.model_config, device)?;
        let iqn_tgt = iqn.try_clone()?;
        let memory = ReplayMemory::build(&config.memory_config)?;

        Ok(Self {
            iqn,
            iqn_tgt,
            memory,
            nstep: vec![],
            explorer: EpsilonGreedy::new(config.seed),
            explorer_eval: EpsilonGreedy::new(config.seed.wrapping_add(1)),
            state: AgentState::Collecting,
            n_calls: 0,
            n_opts: 0,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            n_step: config.n_step,
            tau: config.tau,
            update_every: config.update_every,
            max_grad_norm: config.max_grad_norm,
            sample_percents_pred: config.sample_percents_pred,
            sample_percents_tgt: config.sample_percents_tgt,
            sample_percents_act: config.sample_percents_act,
            munchausen: config.munchausen,
            train: false,
            device,
            phantom: PhantomData,
        })
    }

    /// The online network.
    pub fn model(&self) -> &IqnModel<F> {
        &self.iqn
    }

    /// The target network.
    pub fn target_model(&self) -> &IqnModel<F> {
        &self.iqn_tgt
    }

    /// The replay memory.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Number of learning steps performed.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Stores a raw transition of the `worker`-th environment, through its n-step
    /// accumulator.
    fn push_transition(&mut self, worker: usize, tr: Transition<E::Obs, E::Act>) -> Result<()> {
        while self.nstep.len() <= worker {
            self.nstep
                .push(NStepAccumulator::new(self.n_step, self.discount_factor as f32));
        }

        for tr in self.nstep[worker].push(tr) {
            let Transition {
                obs,
                act,
                reward,
                next_obs,
                is_done,
            } = tr;
            let act = VecBatch::single(act.into());
            let tr = Transition::new(obs.into(), act, reward, next_obs.into(), is_done);
            self.memory.push(TransitionBatch::from(tr))?;
        }
        Ok(())
    }

    fn update_critic(&mut self) -> Result<Record> {
        trace!("Iqn::update_critic()");
        let batch = self.memory.sample(self.batch_size)?;
        let TransitionBatch {
            obs,
            act,
            next_obs,
            reward,
            is_done,
            weight,
            ix_sample,
        } = batch;
        let device = self.device;
        let obs = obs.into_tensor()?.to_device(device);
        let next_obs = next_obs.into_tensor()?.to_device(device);
        let act = Tensor::from_slice(act.as_slice()).to_device(device);
        let reward = Tensor::from_slice(&reward[..]).to_device(device);
        let not_done = is_done.iter().map(|&d| 1f32 - d as f32).collect::<Vec<_>>();
        let not_done = Tensor::from_slice(&not_done[..]).to_device(device);

        let batch_size = self.batch_size as i64;
        let gamma_n = self.discount_factor.powi(self.n_step as i32);

        // Target values, [batch_size, n_percent_points_tgt]
        let tgt = no_grad(|| {
            let tau = self.sample_percents_tgt.sample(batch_size).to_device(device);
            let z_next = self.iqn_tgt.forward(&next_obs, &tau);
            match &self.munchausen {
                None => bootstrap_target(&z_next, &reward, &not_done, gamma_n, None),
                Some(config) => {
                    let tau = self.sample_percents_tgt.sample(batch_size).to_device(device);
                    let q = self
                        .iqn_tgt
                        .forward(&obs, &tau)
                        .mean_dim(&[1i64][..], false, Float);
                    let term = MunchausenTerm {
                        config,
                        q: &q,
                        act: &act,
                    };
                    bootstrap_target(&z_next, &reward, &not_done, gamma_n, Some(term))
                }
            }
        });

        // Predictions of z(s, a) with a from the batch, [batch_size, n_percent_points_pred]
        let tau = self.sample_percents_pred.sample(batch_size).to_device(device);
        let n_percent_points = tau.size()[1];
        let z = self.iqn.forward(&obs, &tau);
        let a = act
            .reshape(&[-1, 1, 1])
            .expand(&[batch_size, n_percent_points, 1], false);
        let pred = z.gather(-1, &a, false).squeeze_dim(-1);

        // TD errors, [batch_size, n_percent_points_pred, n_percent_points_tgt]
        let td = tgt.unsqueeze(1) - pred.unsqueeze(-1);
        let loss = quantile_loss(&td, &tau);
        let loss = match &weight {
            Some(w) => (loss * Tensor::from_slice(&w[..]).to_device(device)).mean(Float),
            None => loss.mean(Float),
        };

        let loss_value = f32::try_from(&loss)?;
        if !loss_value.is_finite() {
            return Err(DriveError::NonFiniteLoss(loss_value).into());
        }
        self.iqn.backward_step(&loss, self.max_grad_norm);

        if let (true, Some(ixs)) = (self.memory.is_per(), ix_sample) {
            let td_err = td
                .detach()
                .abs()
                .mean_dim(&[1i64, 2][..], false, Float)
                .to_device(Device::Cpu);
            self.memory
                .update_priorities(&ixs, &Vec::<f32>::try_from(&td_err)?);
        }

        let mut record = Record::from_scalar("loss", loss_value);
        if let Some(w) = weight {
            let mean_weight = w.iter().sum::<f32>() / w.len() as f32;
            record.insert("mean_weight", RecordValue::Scalar(mean_weight));
        }
        Ok(record)
    }

    fn learn(&mut self) -> Result<Record> {
        self.iqn.resample_noise();
        self.iqn_tgt.resample_noise();
        let record = self.update_critic()?;
        track(&mut self.iqn_tgt, &self.iqn, self.tau);
        self.n_opts += 1;
        Ok(record)
    }
}

impl<E, F> Policy<E> for Iqn<E, F>
where
    E: Env,
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + Clone,
    E::Obs: Into<TensorBatch>,
    E::Act: From<i64> + Into<i64>,
{
    /// Takes actions by the online network with epsilon-greedy exploration.
    ///
    /// Action values are averaged over the quantile fractions given by
    /// `sample_percents_act`. Random actions in evaluation mode come from their own
    /// generator, so evaluation leaves the exploration of training unchanged.
    fn sample(&mut self, obs: &[E::Obs], eps: f64) -> Result<Vec<E::Act>> {
        let obs = obs.iter().cloned().map(Into::into).collect::<Vec<TensorBatch>>();
        let obs = TensorBatch::cat(obs)?.into_tensor()?.to_device(self.device);
        let q = no_grad(|| average(&obs, &self.iqn, &self.sample_percents_act));
        let explorer = match self.train {
            true => &mut self.explorer,
            false => &mut self.explorer_eval,
        };
        let acts = explorer.action(&q, eps)?;
        Ok(acts.into_iter().map(E::Act::from).collect())
    }
}

impl<E, F> Agent<E> for Iqn<E, F>
where
    E: Env,
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: DeserializeOwned + Serialize + Clone,
    E::Obs: Into<TensorBatch>,
    E::Act: From<i64> + Into<i64>,
{
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
        self.state
    }

    fn step(
        &mut self,
        worker: usize,
        transition: Transition<E::Obs, E::Act>,
    ) -> Result<Option<Record>> {
        if self.memory.len() >= self.batch_size && self.state == AgentState::Collecting {
            debug!("Start learning with {} transitions", self.memory.len());
            self.state = AgentState::Learning;
        }
        self.push_transition(worker, transition)?;

        if self.state == AgentState::Collecting {
            return Ok(None);
        }
        self.n_calls += 1;
        if self.n_calls % self.update_every != 0 {
            return Ok(None);
        }

        self.learn().map(Some)
    }

    /// Saves the online and target networks as `iqn.pt` and `iqn_tgt.pt` in `path`.
    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.iqn.save(path.join("iqn.pt"))?;
        self.iqn_tgt.save(path.join("iqn_tgt.pt"))?;
        Ok(())
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.iqn.load(path.join("iqn.pt"))?;
        self.iqn_tgt.load(path.join("iqn_tgt.pt"))?;
        Ok(())
    }
}
