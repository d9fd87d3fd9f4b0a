use super::MlpConfig;
use crate::model::SubModel;
use tch::{nn, nn::Module, Device, Kind, Tensor};

/// Multilayer perceptron with ReLU activation function.
///
/// The input is cast to `f32` and moved to the device of the network.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    seq: nn::Sequential,
}

impl Mlp {
    fn create_net(var_store: &nn::VarStore, config: &MlpConfig) -> nn::Sequential {
        let p = &(var_store.root() / "mlp");
        let mut seq = nn::seq();
        let mut in_dim = config.in_dim;

        for (i, &out_dim) in config.units.iter().enumerate() {
            seq = seq.add(nn::linear(
                p / format!("ln{}", i),
                in_dim,
                out_dim,
                Default::default(),
            ));
            seq = seq.add_fn(|x| x.relu());
            in_dim = out_dim;
        }

        seq = seq.add(nn::linear(
            p / format!("ln{}", config.units.len()),
            in_dim,
            config.out_dim,
            Default::default(),
        ));

        if config.activation_out {
            seq = seq.add_fn(|x| x.relu());
        }

        seq
    }
}

impl SubModel for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        self.seq.forward(&x.to_device(self.device).to_kind(Kind::Float))
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let device = var_store.device();
        let seq = Self::create_net(var_store, &config);

        Self {
            config,
            device,
            seq,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build(var_store, self.config.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn test_mlp_output_shape() {
        let vs = nn::VarStore::new(Device::Cpu);
        let mlp = Mlp::build(&vs, MlpConfig::new(4, vec![16, 8], 3, true));
        let y = mlp.forward(&Tensor::rand(&[5, 4], tch::kind::FLOAT_CPU));

        assert_eq!(y.size(), vec![5, 3]);
        // ReLU on the output layer.
        assert!(f64::try_from(y.min()).unwrap() >= 0.0);
    }
}
