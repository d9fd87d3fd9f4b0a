//! Errors in the library.
use thiserror::Error;

/// Errors raised by the components of this crate.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// Sampling from a replay memory holding fewer transitions than the batch size.
    #[error("Replay memory holds {len} transitions, {batch_size} requested")]
    InsufficientTransitions {
        /// Number of stored transitions.
        len: usize,
        /// Requested batch size.
        batch_size: usize,
    },

    /// An environment worker stopped responding.
    #[error("Environment worker {0} disconnected")]
    WorkerDisconnected(usize),

    /// An environment worker reported an error.
    #[error("Environment worker {worker} failed: {message}")]
    WorkerFailed {
        /// Index of the worker.
        worker: usize,
        /// Error reported by the worker.
        message: String,
    },

    /// The number of actions does not match the number of workers.
    #[error("Expected {expected} actions, got {got}")]
    ActionCountMismatch {
        /// Number of workers.
        expected: usize,
        /// Number of given actions.
        got: usize,
    },

    /// Unknown agent variant.
    #[error("Invalid agent variant: {0}")]
    InvalidAgentVariant(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The loss of a learning step is NaN or infinite.
    #[error("Non-finite loss: {0}")]
    NonFiniteLoss(f32),
}
