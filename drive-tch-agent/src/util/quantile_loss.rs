//! Quantile loss.
use tch::{Kind, Reduction, Tensor};

/// Returns the elementwise quantile Huber loss with threshold 1.
///
/// `x` and `tau` have the same shape.
pub fn quantile_huber_loss(x: &Tensor, tau: &Tensor) -> Tensor {
    debug_assert_eq!(x.size().as_slice(), tau.size().as_slice());

    let lt_0 = x.lt(0.0).to_kind(Kind::Float).detach();
    let loss = x.smooth_l1_loss(&x.zeros_like(), Reduction::None, 1.0);
    (tau - lt_0).abs() * loss
}

/// Reduces pairwise TD errors to the per-sample quantile loss.
///
/// * `td` - TD errors `target_j - pred_i`, of shape `[batch_size, n_pred, n_tgt]`.
/// * `tau` - quantile fractions of the predictions, of shape `[batch_size, n_pred]`.
///
/// The elementwise loss is summed over predicted quantiles `i` and averaged over
/// target quantiles `j`. The returned tensor has shape `[batch_size]`.
pub fn quantile_loss(td: &Tensor, tau: &Tensor) -> Tensor {
    let size = td.size();
    let (batch_size, n_pred, n_tgt) = (size[0], size[1], size[2]);
    debug_assert_eq!(tau.size().as_slice(), &[batch_size, n_pred]);

    let tau = tau.unsqueeze(-1).expand(&[batch_size, n_pred, n_tgt], false);
    quantile_huber_loss(td, &tau)
        .sum_dim_intlist(&[1i64][..], false, Kind::Float)
        .mean_dim(&[1i64][..], false, Kind::Float)
}
