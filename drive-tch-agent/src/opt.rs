//! Optimizers.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tch::{
    nn::{Adam, Optimizer as TchOptimizer, OptimizerConfig as _, VarStore},
    Tensor,
};

/// Configures the optimizer of the quantile network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 1e-4 }
    }
}

impl OptimizerConfig {
    /// Returns a copy with the learning rate replaced.
    pub fn learning_rate(self, v: f64) -> Self {
        match self {
            Self::Adam { .. } => Self::Adam { lr: v },
        }
    }

    /// Constructs an optimizer on the trainable variables of `vs`.
    pub fn build(&self, vs: &VarStore) -> Result<Optimizer> {
        let opt = match *self {
            Self::Adam { lr } => Adam::default().build(vs, lr)?,
        };
        Ok(Optimizer(opt))
    }
}

/// A thin wrapper of [`tch::nn::Optimizer`].
pub struct Optimizer(TchOptimizer);

impl Optimizer {
    /// Applies a backward pass and an optimization step.
    ///
    /// The norm of the gradients of all the variables is clipped at `max_norm`
    /// before the step.
    pub fn backward_step_clip_norm(&mut self, loss: &Tensor, max_norm: f64) {
        self.0.backward_step_clip_norm(loss, max_norm);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryFrom;
    use tch::{nn, Device, Kind};

    #[test]
    fn test_step_moves_parameters() -> Result<()> {
        let vs = VarStore::new(Device::Cpu);
        let w = vs.root().var("w", &[2], nn::Init::Const(1.0));
        let config = OptimizerConfig::default().learning_rate(0.1);
        assert_eq!(config, OptimizerConfig::Adam { lr: 0.1 });

        let mut opt = config.build(&vs)?;
        let loss = (&w * &w).sum(Kind::Float);
        opt.backward_step_clip_norm(&loss, 10.0);

        // The first Adam step moves every weight by about the learning rate.
        let w = Vec::<f32>::try_from(&w.detach())?;
        assert!(w.iter().all(|&v| (v - 0.9).abs() < 1e-3));
        Ok(())
    }
}
