//! Bootstrap target of the quantile loss.
use super::munchausen::{munchausen_reward, soft_next_value, MunchausenConfig};
use tch::{Kind::Float, Tensor};

/// Inputs of the Munchausen terms of the bootstrap target.
pub struct MunchausenTerm<'a> {
    /// Parameters.
    pub config: &'a MunchausenConfig,

    /// Quantile-averaged action values of the current state by the target network,
    /// `[batch_size, n_actions]`.
    pub q: &'a Tensor,

    /// Taken actions, `[batch_size]` of `i64`.
    pub act: &'a Tensor,
}

/// Returns the bootstrap target for every target quantile, `[batch_size, n_tgt]`.
///
/// * `z_next` - target network quantile values of the next state, `[batch_size, n_tgt, n_actions]`.
/// * `reward` - n-step returns, `[batch_size]`.
/// * `not_done` - `1 - done`, `[batch_size]`.
/// * `gamma_n` - discount factor raised to the n-step length.
///
/// Without Munchausen terms, the target is `r + gamma_n (1 - d) z(s', a*, j)`, where
/// `a*` maximizes the quantile-averaged values of `z_next`. With them, the reward is
/// augmented by [`munchausen_reward`] and the bootstrap value is [`soft_next_value`].
/// A Munchausen scaling `alpha` of zero gives the target without Munchausen terms.
pub fn bootstrap_target(
    z_next: &Tensor,
    reward: &Tensor,
    not_done: &Tensor,
    gamma_n: f64,
    munchausen: Option<MunchausenTerm>,
) -> Tensor {
    let size = z_next.size();
    let (batch_size, n_tgt) = (size[0], size[1]);
    let q_next = z_next.mean_dim(&[1i64][..], false, Float);

    let (reward, value_next) = match munchausen {
        None => (reward.shallow_clone(), greedy_value(z_next, &q_next)),
        Some(MunchausenTerm { config, .. }) if config.alpha == 0.0 => {
            (reward.shallow_clone(), greedy_value(z_next, &q_next))
        }
        Some(MunchausenTerm { config, q, act }) => (
            munchausen_reward(reward, q, act, config),
            soft_next_value(z_next, &q_next, config.entropy_tau),
        ),
    };
    debug_assert_eq!(value_next.size(), &[batch_size, n_tgt]);

    reward.unsqueeze(-1) + not_done.unsqueeze(-1) * value_next * gamma_n
}

/// Quantiles of the action maximizing `q_next`, `[batch_size, n_tgt]`.
fn greedy_value(z_next: &Tensor, q_next: &Tensor) -> Tensor {
    let size = z_next.size();
    let a_star = q_next
        .argmax(-1, false)
        .reshape(&[-1, 1, 1])
        .expand(&[size[0], size[1], 1], false);
    z_next.gather(-1, &a_star, false).squeeze_dim(-1)
}
