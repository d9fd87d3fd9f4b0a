//! Configuration of the quantile network.
use crate::{opt::OptimizerConfig, util::OutDim};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`IqnModel`](super::IqnModel).
///
/// The type parameter `F` is the configuration of the feature extractor, whose
/// output dimension is `feature_dim`.
pub struct IqnModelConfig<F> {
    /// Dimension of feature vectors.
    pub feature_dim: i64,

    /// Dimension of the cosine embedding of quantile fractions.
    pub embed_dim: i64,

    /// Width of the hidden layer of the head.
    pub hidden_dim: i64,

    /// Number of actions.
    pub out_dim: i64,

    /// Splits the head into state-value and advantage streams.
    pub dueling: bool,

    /// Replaces the linear layers of the head with noisy ones.
    pub noisy: bool,

    /// Configuration of the feature extractor.
    pub f_config: Option<F>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<F> Default for IqnModelConfig<F> {
    fn default() -> Self {
        Self {
            feature_dim: 512,
            embed_dim: 64,
            hidden_dim: 512,
            out_dim: 0,
            dueling: false,
            noisy: false,
            f_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<F> IqnModelConfig<F>
where
    F: OutDim,
{
    /// Sets the configuration of the feature extractor.
    ///
    /// The output dimension of the feature extractor is set to `feature_dim`.
    pub fn f_config(mut self, mut v: F) -> Self {
        v.set_out_dim(self.feature_dim);
        self.f_config = Some(v);
        self
    }

    /// Sets the dimension of feature vectors.
    pub fn feature_dim(mut self, v: i64) -> Self {
        self.feature_dim = v;
        if let Some(f_config) = &mut self.f_config {
            f_config.set_out_dim(v);
        }
        self
    }
}

impl<F> IqnModelConfig<F> {
    /// Sets the dimension of the cosine embedding.
    pub fn embed_dim(mut self, v: i64) -> Self {
        self.embed_dim = v;
        self
    }

    /// Sets the width of the hidden layer of the head.
    pub fn hidden_dim(mut self, v: i64) -> Self {
        self.hidden_dim = v;
        self
    }

    /// Sets the number of actions.
    pub fn out_dim(mut self, v: i64) -> Self {
        self.out_dim = v;
        self
    }

    /// Sets the dueling flag.
    pub fn dueling(mut self, v: bool) -> Self {
        self.dueling = v;
        self
    }

    /// Sets the noisy flag.
    pub fn noisy(mut self, v: bool) -> Self {
        self.noisy = v;
        self
    }

    /// Sets the configuration of the optimizer.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.opt_config = self.opt_config.learning_rate(v);
        self
    }
}

impl<F> IqnModelConfig<F>
where
    F: Serialize + DeserializeOwned,
{
    /// Constructs [`IqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`IqnModelConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
