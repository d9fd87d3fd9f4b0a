use super::CnnConfig;
use crate::model::SubModel;
use tch::{nn, nn::Module, Device, Kind, Tensor};

// (out_channels, kernel_size, stride) of the convolutional layers.
const CONVS: [(i64, i64, i64); 3] = [(32, 8, 4), (64, 4, 2), (64, 3, 1)];

/// Convolutional network with three convolutional layers and a linear output layer,
/// followed by ReLU.
pub struct Cnn {
    config: CnnConfig,
    device: Device,
    seq: nn::Sequential,
}

impl Cnn {
    /// Number of features after the convolutional layers.
    fn conv_out_dim(config: &CnnConfig) -> i64 {
        let [h, w, _] = config.in_shape;
        let (h, w) = CONVS
            .iter()
            .fold((h, w), |(h, w), &(_, k, s)| ((h - k) / s + 1, (w - k) / s + 1));
        CONVS[CONVS.len() - 1].0 * h * w
    }

    fn create_net(var_store: &nn::VarStore, config: &CnnConfig) -> nn::Sequential {
        let p = &(var_store.root() / "cnn");
        let mut seq = nn::seq()
            .add_fn(|xs| xs.permute(&[0, 3, 1, 2]).to_kind(Kind::Float) / 255.0);
        let mut in_channels = config.in_shape[2];

        for (i, &(out_channels, k, s)) in CONVS.iter().enumerate() {
            let conv_config = nn::ConvConfig {
                stride: s,
                ..Default::default()
            };
            let path = p / format!("c{}", i + 1);
            seq = seq
                .add(nn::conv2d(path, in_channels, out_channels, k, conv_config))
                .add_fn(|xs| xs.relu());
            in_channels = out_channels;
        }

        seq.add_fn(|xs| xs.flat_view())
            .add(nn::linear(
                p / "l1",
                Self::conv_out_dim(config),
                config.out_dim,
                Default::default(),
            ))
            .add_fn(|xs| xs.relu())
    }
}

impl SubModel for Cnn {
    type Config = CnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        self.seq.forward(&x.to_device(self.device))
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
