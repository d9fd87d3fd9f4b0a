//! Quantile network.
mod config;
use crate::{
    model::{ModelBase, SubModel},
    noisy::NoisyLinear,
    opt::Optimizer,
};
use anyhow::{Context, Result};
pub use config::IqnModelConfig;
use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, path::Path};
use tch::{
    nn,
    nn::{Module, VarStore},
    Device,
    Kind::Float,
    Tensor,
};

/// A linear layer of the head, plain or noisy.
enum Layer {
    Linear(nn::Linear),
    Noisy(NoisyLinear),
}

impl Layer {
    fn new(p: nn::Path, in_dim: i64, out_dim: i64, noisy: bool) -> Self {
        match noisy {
            true => Self::Noisy(NoisyLinear::new(p, in_dim, out_dim)),
            false => Self::Linear(nn::linear(p, in_dim, out_dim, Default::default())),
        }
    }

    fn forward(&self, xs: &Tensor) -> Tensor {
        match self {
            Self::Linear(l) => l.forward(xs),
            Self::Noisy(l) => l.forward(xs),
        }
    }

    fn resample_noise(&mut self) {
        if let Self::Noisy(l) = self {
            l.resample_noise();
        }
    }

    fn copy_noise(&mut self, other: &Self) {
        if let (Self::Noisy(l), Self::Noisy(o)) = (self, other) {
            l.copy_noise(o);
        }
    }
}

enum HeadOut {
    Plain(Layer),
    Dueling { value: Layer, advantage: Layer },
}

/// Maps merged features to action values: a hidden layer with ReLU followed by a
/// plain or dueling output.
struct IqnHead {
    hidden: Layer,
    out: HeadOut,
}

impl IqnHead {
    /// Builds the head. The flags are orthogonal; `noisy` replaces every layer of
    /// the head, `dueling` splits the output.
    fn build(
        p: &nn::Path,
        feature_dim: i64,
        hidden_dim: i64,
        out_dim: i64,
        dueling: bool,
        noisy: bool,
    ) -> Self {
        let hidden = Layer::new(p / "ff1", feature_dim, hidden_dim, noisy);
        let out = match dueling {
            true => HeadOut::Dueling {
                value: Layer::new(p / "value", hidden_dim, 1, noisy),
                advantage: Layer::new(p / "advantage", hidden_dim, out_dim, noisy),
            },
            false => HeadOut::Plain(Layer::new(p / "ff2", hidden_dim, out_dim, noisy)),
        };
        Self { hidden, out }
    }

    fn forward(&self, xs: &Tensor) -> Tensor {
        let xs = self.hidden.forward(xs).relu();
        match &self.out {
            HeadOut::Plain(l) => l.forward(&xs),
            HeadOut::Dueling { value, advantage } => {
                let a = advantage.forward(&xs);
                let v = value.forward(&xs);
                v + &a - a.mean_dim(&[-1i64][..], true, Float)
            }
        }
    }

    fn layers_mut(&mut self) -> Vec<&mut Layer> {
        let mut layers = vec![&mut self.hidden];
        match &mut self.out {
            HeadOut::Plain(l) => layers.push(l),
            HeadOut::Dueling { value, advantage } => {
                layers.push(value);
                layers.push(advantage);
            }
        }
        layers
    }

    fn layers(&self) -> Vec<&Layer> {
        let mut layers = vec![&self.hidden];
        match &self.out {
            HeadOut::Plain(l) => layers.push(l),
            HeadOut::Dueling { value, advantage } => {
                layers.push(value);
                layers.push(advantage);
            }
        }
        layers
    }
}

/// Quantile network.
///
/// Takes observations and quantile fractions and returns the quantile values of
/// every action. The feature vector of an observation, computed by the feature
/// extractor `F`, is multiplied elementwise by the cosine embedding of each
/// quantile fraction, and the product goes through the head.
pub struct IqnModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
{
    device: Device,
    var_store: nn::VarStore,
    config: IqnModelConfig<F::Config>,

    // Feature extractor
    psi: F,

    // Cos embedding
    phi: nn::Sequential,

    head: IqnHead,

    opt: Optimizer,
}

impl<F> IqnModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
    F::Config: Clone,
{
    /// Constructs [`IqnModel`].
    pub fn build(config: IqnModelConfig<F::Config>, device: Device) -> Result<Self> {
        let f_config = config.f_config.clone().context("f_config is not set.")?;
        let var_store = nn::VarStore::new(device);
        let psi = F::build(&var_store, f_config);
        Self::build_with_psi(config, var_store, psi)
    }

    fn build_with_psi(
        config: IqnModelConfig<F::Config>,
        var_store: VarStore,
        psi: F,
    ) -> Result<Self> {
        let device = var_store.device();
        let phi = Self::cos_embed_nn(&var_store, config.feature_dim, config.embed_dim);
        let head = IqnHead::build(
            &(var_store.root() / "head"),
            config.feature_dim,
            config.hidden_dim,
            config.out_dim,
            config.dueling,
            config.noisy,
        );
        let opt = config.opt_config.build(&var_store)?;

        Ok(Self {
            device,
            var_store,
            config,
            psi,
            phi,
            head,
            opt,
        })
    }

    /// Returns a copy of the network with its own variables.
    ///
    /// The parameters and the noise of noisy layers are copied. The state of the
    /// optimizer is not.
    pub fn try_clone(&self) -> Result<Self> {
        let var_store = nn::VarStore::new(self.device);
        let psi = self.psi.clone_with_var_store(&var_store);
        let mut model = Self::build_with_psi(self.config.clone(), var_store, psi)?;
        model.var_store.copy(&self.var_store)?;
        for (l, o) in model.head.layers_mut().into_iter().zip(self.head.layers()) {
            l.copy_noise(o);
        }
        Ok(model)
    }
}

impl<F> IqnModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
{
    // Cosine embedding.
    fn cos_embed_nn(var_store: &VarStore, feature_dim: i64, embed_dim: i64) -> nn::Sequential {
        let p = &var_store.root();
        let device = p.device();
        nn::seq()
            .add_fn(move |tau| {
                let batch_size = tau.size()[0];
                let n_percent_points = tau.size()[1];
                let tau = tau.unsqueeze(-1);
                let i = Tensor::arange_start(1, embed_dim + 1, (Float, device))
                    .unsqueeze(0)
                    .unsqueeze(0);
                let cos = (tau * (PI * i)).cos();
                debug_assert_eq!(cos.size(), &[batch_size, n_percent_points, embed_dim]);

                cos.reshape(&[-1, embed_dim])
            })
            .add(nn::linear(
                p / "iqn_cos_to_feature",
                embed_dim,
                feature_dim,
                Default::default(),
            ))
            .add_fn(|x| x.relu())
    }

    /// Returns the tensor of action-value quantiles.
    ///
    /// * The shape of `psi(x)` (feature vector) is `[batch_size, feature_dim]`.
    /// * The shape of `tau` is `[batch_size, n_percent_points]`.
    /// * The shape of the output is `[batch_size, n_percent_points, n_actions]`.
    pub fn forward(&self, x: &Tensor, tau: &Tensor) -> Tensor {
        let feature_dim = self.config.feature_dim;
        let n_percent_points = tau.size()[1];

        let psi = self.psi.forward(x);
        let batch_size = psi.size()[0];
        debug_assert_eq!(psi.size(), &[batch_size, feature_dim]);

        let phi = self
            .phi
            .forward(&tau.to_device(self.device))
            .reshape(&[batch_size, n_percent_points, feature_dim]);

        // Merge features and embedded quantiles by elementwise multiplication
        let m = (psi.unsqueeze(1) * phi).reshape(&[-1, feature_dim]);

        self.head
            .forward(&m)
            .reshape(&[batch_size, n_percent_points, self.config.out_dim])
    }

    /// Draws new noise for the noisy layers. This is a no-op without them.
    pub fn resample_noise(&mut self) {
        for l in self.head.layers_mut() {
            l.resample_noise();
        }
    }

    /// Number of actions.
    pub fn out_dim(&self) -> i64 {
        self.config.out_dim
    }

    /// Device of the network.
    pub fn device(&self) -> Device {
        self.device
    }
}

impl<F> ModelBase for IqnModel<F>
where
    F: SubModel<Input = Tensor, Output = Tensor>,
{
    fn backward_step(&mut self, loss: &Tensor, max_norm: f64) {
        self.opt.backward_step_clip_norm(loss, max_norm);
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }

    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.var_store.save(&path)?;
        info!("Save IQN model to {:?}", path.as_ref());
        for (name, _) in self.var_store.variables().iter() {
            trace!("Save variable {}", name);
        }
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load IQN model from {:?}", path.as_ref());
        Ok(())
    }
}

/// The way of taking quantile fractions.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum IqnSample {
    /// The given number of samples from the uniform distribution on `[0, 1)`.
    Uniform(i64),

    /// The given number `n` of evenly spaced fractions `(i + 0.5) / n`.
    ///
    /// The fractions are constants, so action selection is reproducible.
    Const(i64),

    /// Single fraction, the median.
    Median,
}

impl IqnSample {
    /// Returns quantile fractions of shape `[batch_size, n_percent_points]`.
    pub fn sample(&self, batch_size: i64) -> Tensor {
        match self {
            Self::Uniform(n) => Tensor::rand(&[batch_size, *n], tch::kind::FLOAT_CPU),
            Self::Const(n) => ((Tensor::arange(*n, tch::kind::FLOAT_CPU) + 0.5) / (*n as f64))
                .unsqueeze(0)
                .repeat(&[batch_size, 1]),
            Self::Median => Tensor::from_slice(&[0.5f32])
                .unsqueeze(0)
                .repeat(&[batch_size, 1]),
        }
    }

    /// Returns the number of fractions generated by this way.
    pub fn n_percent_points(&self) -> i64 {
        match self {
            Self::Uniform(n) | Self::Const(n) => *n,
            Self::Median => 1,
        }
    }
}

/// Takes an average of action values over quantile fractions specified by `mode`.
///
/// Returns a tensor of shape `[batch_size, n_actions]`.
pub fn average<F>(obs: &Tensor, iqn: &IqnModel<F>, mode: &IqnSample) -> Tensor
where
    F: SubModel<Input = Tensor, Output = Tensor>,
{
    let batch_size = obs.size()[0];
    let tau = mode.sample(batch_size).to_device(iqn.device);
    let averaged_action_value = iqn.forward(obs, &tau).mean_dim(&[1i64][..], false, Float);
    debug_assert_eq!(averaged_action_value.size(), &[batch_size, iqn.out_dim()]);
    averaged_action_value
}
