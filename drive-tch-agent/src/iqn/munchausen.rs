//! Munchausen regularization of the bootstrap target.
//!
//! The policy is the softmax of quantile-averaged action values `q` at the
//! temperature `entropy_tau`. The reward is augmented with the clipped, scaled
//! log-policy of the taken action in the current state, and the bootstrap value is
//! the policy-weighted, entropy-regularized value of the next state.
use serde::{Deserialize, Serialize};
use tch::{Kind::Float, Tensor};

/// Parameters of the Munchausen target.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MunchausenConfig {
    /// Temperature of the softmax policy.
    pub entropy_tau: f64,

    /// Scaling coefficient of the log-policy added to the reward.
    pub alpha: f64,

    /// Lower bound of the clipped log-policy.
    pub lo: f64,
}

impl Default for MunchausenConfig {
    fn default() -> Self {
        Self {
            entropy_tau: 0.03,
            alpha: 0.9,
            lo: -1.0,
        }
    }
}

impl MunchausenConfig {
    /// Sets the temperature.
    pub fn entropy_tau(mut self, v: f64) -> Self {
        self.entropy_tau = v;
        self
    }

    /// Sets the scaling coefficient.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Sets the clipping bound.
    pub fn lo(mut self, v: f64) -> Self {
        self.lo = v;
        self
    }
}

/// Returns `entropy_tau * log softmax(q / entropy_tau)` along the last axis.
///
/// Computed as `q - max(q) - entropy_tau * logsumexp((q - max(q)) / entropy_tau)`,
/// which stays finite for small temperatures.
pub fn scaled_log_policy(q: &Tensor, entropy_tau: f64) -> Tensor {
    let (v_max, _) = q.max_dim(-1, true);
    let adv = q - v_max;
    let lse = (&adv / entropy_tau)
        .exp()
        .sum_dim_intlist(&[-1i64][..], true, Float)
        .log();
    adv - lse * entropy_tau
}

/// Returns the soft value of the next state for every target quantile.
///
/// * `z_next` - quantile values of the next state, `[batch_size, n_tgt, n_actions]`.
/// * `q_next` - quantile-averaged action values of the next state, `[batch_size, n_actions]`.
///
/// The output, of shape `[batch_size, n_tgt]`, is
/// `sum_a pi(a|s') (z(s', a) - entropy_tau * log pi(a|s'))`.
pub fn soft_next_value(z_next: &Tensor, q_next: &Tensor, entropy_tau: f64) -> Tensor {
    let pi = (q_next / entropy_tau).softmax(-1, Float).unsqueeze(1);
    let log_pi = scaled_log_policy(q_next, entropy_tau).unsqueeze(1);
    ((z_next - log_pi) * pi).sum_dim_intlist(&[-1i64][..], false, Float)
}

/// Returns the Munchausen-augmented reward of shape `[batch_size]`.
///
/// * `reward` - rewards, `[batch_size]`.
/// * `q` - quantile-averaged action values of the current state, `[batch_size, n_actions]`.
/// * `act` - taken actions, `[batch_size]` of `i64`.
///
/// With `alpha = 0` the reward is returned unchanged.
pub fn munchausen_reward(
    reward: &Tensor,
    q: &Tensor,
    act: &Tensor,
    config: &MunchausenConfig,
) -> Tensor {
    if config.alpha == 0.0 {
        return reward.shallow_clone();
    }
    let log_pi = scaled_log_policy(q, config.entropy_tau)
        .gather(-1, &act.unsqueeze(-1), false)
        .squeeze_dim(-1);
    reward + log_pi.clamp(config.lo, 0.0) * config.alpha
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scaled_log_policy_is_tau_log_softmax() {
        let q = Tensor::from_slice(&[1.0f32, 2.0, 0.5, -1.0, 0.0, 3.0]).reshape(&[2, 3]);
        let tau = 0.5;
        let expected = (&q / tau).log_softmax(-1, Float) * tau;

        assert!(scaled_log_policy(&q, tau).allclose(&expected, 1e-5, 1e-6, false));
    }

    #[test]
    fn test_scaled_log_policy_is_finite_for_small_temperature() {
        let q = Tensor::from_slice(&[1.0f32, 2.0, 0.5]).unsqueeze(0);
        let log_pi = scaled_log_policy(&q, 1e-4);

        assert_eq!(log_pi.isfinite().all().int64_value(&[]), 1);
        // The greedy action has (almost) zero log-probability.
        assert!(log_pi.double_value(&[0, 1]).abs() < 1e-6);
    }

    #[test]
    fn test_munchausen_reward() {
        let reward = Tensor::from_slice(&[1.0f32, 0.0]);
        let q = Tensor::from_slice(&[1.0f32, 0.0, 0.0, 5.0]).reshape(&[2, 2]);
        let act = Tensor::from_slice(&[0i64, 0]);

        // alpha = 0 returns the reward exactly.
        let config = MunchausenConfig::default().alpha(0.0);
        assert!(munchausen_reward(&reward, &q, &act, &config).equal(&reward));

        // The second sample took a far-from-greedy action, so the term is clipped at lo.
        let config = MunchausenConfig::default();
        let r = munchausen_reward(&reward, &q, &act, &config);
        assert!((r.double_value(&[1]) - 0.9 * -1.0).abs() < 1e-6);
        assert!(r.double_value(&[0]) <= 1.0);
        assert!(r.double_value(&[0]) > 1.0 - 0.9);
    }
}
