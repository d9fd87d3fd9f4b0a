//! Linear layer with factorized Gaussian noise.
use tch::{nn, nn::Init, Device, Kind, Tensor};

/// Linear layer whose weights and biases are perturbed by factorized Gaussian noise.
///
/// The effective parameters are `mu + sigma * eps`, where `mu` and `sigma` are
/// trainable and `eps` is the noise. For input dimension `p` and output dimension
/// `q`, the noise is built from `p + q` standard normal samples transformed by
/// `f(x) = sgn(x) sqrt(|x|)`: `eps_w = f(e_out) f(e_in)^T`, `eps_b = f(e_out)`.
///
/// The noise is not a part of the [`VarStore`](tch::nn::VarStore). It is redrawn only
/// by [`NoisyLinear::resample_noise`], so the forward pass is deterministic between
/// two calls.
#[derive(Debug)]
pub struct NoisyLinear {
    in_dim: i64,
    out_dim: i64,
    device: Device,
    weight_mu: Tensor,
    weight_sigma: Tensor,
    bias_mu: Tensor,
    bias_sigma: Tensor,
    weight_eps: Tensor,
    bias_eps: Tensor,
}

fn scale_noise(x: Tensor) -> Tensor {
    x.sign() * x.abs().sqrt()
}

impl NoisyLinear {
    /// Initial value of `sigma` scaled by `1 / sqrt(in_dim)`.
    pub const SIGMA_0: f64 = 0.5;

    /// Creates a layer with parameters registered under `p`.
    pub fn new<'a, T: std::borrow::Borrow<nn::Path<'a>>>(p: T, in_dim: i64, out_dim: i64) -> Self {
        let p = p.borrow();
        let bound = 1.0 / (in_dim as f64).sqrt();
        let sigma = Self::SIGMA_0 / (in_dim as f64).sqrt();
        let uniform = Init::Uniform {
            lo: -bound,
            up: bound,
        };
        let mut layer = Self {
            in_dim,
            out_dim,
            device: p.device(),
            weight_mu: p.var("weight_mu", &[out_dim, in_dim], uniform),
            weight_sigma: p.var("weight_sigma", &[out_dim, in_dim], Init::Const(sigma)),
            bias_mu: p.var("bias_mu", &[out_dim], uniform),
            bias_sigma: p.var("bias_sigma", &[out_dim], Init::Const(sigma)),
            weight_eps: Tensor::zeros(&[out_dim, in_dim], (Kind::Float, p.device())),
            bias_eps: Tensor::zeros(&[out_dim], (Kind::Float, p.device())),
        };
        layer.resample_noise();
        layer
    }

    /// Draws new noise.
    pub fn resample_noise(&mut self) {
        let options = (Kind::Float, self.device);
        let eps_in = scale_noise(Tensor::randn(&[self.in_dim], options));
        let eps_out = scale_noise(Tensor::randn(&[self.out_dim], options));
        self.weight_eps = eps_out.unsqueeze(1) * eps_in.unsqueeze(0);
        self.bias_eps = eps_out;
    }

    /// Copies the noise of another layer of the same shape.
    pub fn copy_noise(&mut self, other: &Self) {
        self.weight_eps = other.weight_eps.copy();
        self.bias_eps = other.bias_eps.copy();
    }
}

impl nn::Module for NoisyLinear {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let weight = &self.weight_mu + &self.weight_sigma * &self.weight_eps;
        let bias = &self.bias_mu + &self.bias_sigma * &self.bias_eps;
        xs.linear(&weight, Some(&bias))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tch::nn::Module;

    #[test]
    fn test_noise_is_fixed_until_resampled() {
        let vs = nn::VarStore::new(Device::Cpu);
        let mut layer = NoisyLinear::new(vs.root() / "noisy", 8, 4);
        let x = Tensor::rand(&[3, 8], tch::kind::FLOAT_CPU);

        let y1 = layer.forward(&x);
        let y2 = layer.forward(&x);
        assert!(y1.equal(&y2));

        layer.resample_noise();
        let y3 = layer.forward(&x);
        assert!(!y1.equal(&y3));
        assert_eq!(y3.size(), vec![3, 4]);
    }

    #[test]
    fn test_noise_is_not_a_variable() {
        let vs = nn::VarStore::new(Device::Cpu);
        let _layer = NoisyLinear::new(vs.root() / "noisy", 8, 4);
        let mut names = vs.variables().into_keys().collect::<Vec<_>>();
        names.sort();

        assert_eq!(
            names,
            vec![
                "noisy.bias_mu",
                "noisy.bias_sigma",
                "noisy.weight_mu",
                "noisy.weight_sigma"
            ]
        );
    }
}
