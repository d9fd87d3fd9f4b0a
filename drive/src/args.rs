use clap::{ArgAction, Parser};

/// Trains an IQN agent on the CARLA driving gym.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Args {
    /// Agent variant: iqn, noisy_iqn, dueling or noisy_dueling, with an optional +per suffix
    #[arg(long, default_value = "iqn")]
    pub agent: String,

    /// Number of environment frames to train, summed over workers
    #[arg(long, default_value_t = 500_000)]
    pub frames: usize,

    /// Evaluation interval in frames
    #[arg(long, default_value_t = 10_000)]
    pub eval_every: usize,

    /// Number of evaluation episodes
    #[arg(long, default_value_t = 2)]
    pub eval_runs: usize,

    /// Random seed
    #[arg(long, default_value_t = 1)]
    pub seed: i64,

    /// Number of quantile fractions
    #[arg(short = 'N', long = "n-quantiles", default_value_t = 32)]
    pub n_quantiles: i64,

    /// Use Munchausen targets
    #[arg(long, default_value_t = false)]
    pub munchausen: bool,

    /// Batch size
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Width of the hidden layers
    #[arg(long, default_value_t = 512)]
    pub layer_size: i64,

    /// Length of n-step returns
    #[arg(long, default_value_t = 1)]
    pub n_step: usize,

    /// Capacity of the replay memory
    #[arg(long, default_value_t = 15_000)]
    pub memory_size: usize,

    /// Learning rate
    #[arg(long, default_value_t = 1e-4)]
    pub lr: f64,

    /// Discount factor
    #[arg(long, default_value_t = 0.99)]
    pub gamma: f64,

    /// Soft update coefficient of the target network
    #[arg(long, default_value_t = 5e-3)]
    pub tau: f64,

    /// Number of frames over which epsilon is annealed
    #[arg(long, default_value_t = 75_000)]
    pub eps_frames: usize,

    /// Final value of epsilon
    #[arg(long, default_value_t = 0.025)]
    pub min_eps: f64,

    /// Name of the run, used for the metrics directory and the saved parameters
    #[arg(long, default_value = "TEST")]
    pub info: String,

    /// Save the parameters of the trained network
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub save_model: bool,

    /// Number of environment workers
    #[arg(long, default_value_t = 1)]
    pub worker: usize,

    /// Directory of the saved configuration and parameters
    #[arg(long, default_value = "model")]
    pub model_dir: String,

    /// Directory of the metrics
    #[arg(long, default_value = "result")]
    pub log_dir: String,
}
