//! Vectorized environment.
//!
//! [`VecEnv`] runs `K` environments, each in its own worker thread, and steps them
//! in lockstep: a call sends one message to every worker and returns only after all
//! of them replied. A worker whose episode ended resets its environment on its own
//! and returns the initial observation of the next episode in place of the next
//! observation.
//!
//! Any error raised in a worker is fatal to the whole run.
mod base;
mod messages;
pub use base::{VecEnv, VecStep};
pub use messages::{WorkerCommand, WorkerReply};
