//! Replay memory with uniform and prioritized sampling.
//!
//! [`ReplayMemory`] is a fixed-capacity ring buffer of transitions. Once full, a new
//! transition overwrites the oldest slot. Observations and actions are stored in
//! containers implementing [`BatchBase`], so that a backend can keep them in its
//! own tensor type.
//!
//! With [`PerConfig`], transitions are sampled with probability proportional to
//! `p^alpha`, where `p` is the priority of the transition, and importance sampling
//! weights `(N * P(i))^-beta` normalized by their maximum in the batch are returned
//! along with the samples. New transitions get the maximum priority seen so far.
//!
//! [`NStepAccumulator`] aggregates raw transitions of a single worker into n-step
//! transitions before they are pushed into the memory.
mod base;
mod batch;
mod config;
mod iw_scheduler;
mod nstep;
mod sum_tree;
pub use base::ReplayMemory;
pub use batch::{BatchBase, TransitionBatch, VecBatch};
pub use config::{PerConfig, ReplayMemoryConfig};
pub use iw_scheduler::IwScheduler;
pub use nstep::NStepAccumulator;
pub use sum_tree::SumTree;
