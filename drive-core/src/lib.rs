#![warn(missing_docs)]
//! Core components of a distributional reinforcement learning agent for driving.
//!
//! This crate is independent of any deep learning backend. It provides
//!
//! * the environment contract ([`Env`], [`Step`]) and the vectorized runner
//!   ([`VecEnv`](vec_env::VecEnv)) that steps several environments in lockstep,
//! * the replay memory with uniform and prioritized sampling
//!   ([`ReplayMemory`](replay_memory::ReplayMemory)) and the n-step accumulator,
//! * records and recorders for metrics,
//! * the training loop ([`Trainer`]) and evaluator.
pub mod dummy;
pub mod error;
pub mod evaluator;
pub mod record;
pub mod replay_memory;
pub mod vec_env;

mod base;
pub use base::{Act, Agent, AgentState, Env, Info, Obs, Policy, Step, Transition};

mod trainer;
pub use trainer::{EpsilonSchedule, Trainer, TrainerConfig, TrainingSession};
