//! Utilities.
use crate::model::ModelBase;
use log::trace;
mod quantile_loss;
pub use quantile_loss::{quantile_huber_loss, quantile_loss};

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track<M: ModelBase>(dest: &mut M, src: &M, tau: f64) {
    let src = src.get_var_store().variables();
    let mut dest = dest.get_var_store_mut().variables();
    debug_assert_eq!(src.len(), dest.len());

    tch::no_grad(|| {
        for (name, src) in src.iter() {
            if let Some(dest) = dest.get_mut(name) {
                let v = tau * src + (1.0 - tau) * &*dest;
                dest.copy_(&v);
            }
        }
    });
    trace!("soft update with tau = {}", tau);
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: i64);
}
