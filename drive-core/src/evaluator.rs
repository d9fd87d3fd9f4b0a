//! Evaluation of policies.
use crate::{record::Record, Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate a policy.
pub trait Evaluator<E: Env> {
    /// Evaluate the policy and returns a record of the result.
    ///
    /// The caller of this method needs to handle the internal state of the policy,
    /// like training/evaluation mode.
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record>;
}
