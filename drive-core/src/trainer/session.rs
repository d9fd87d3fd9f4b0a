//! State of a training run.
use std::collections::VecDeque;

/// Linear decay of epsilon from `start` to `end` over `frames` steps.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonSchedule {
    start: f64,
    end: f64,
    frames: usize,
}

impl EpsilonSchedule {
    /// Constructs a schedule.
    pub fn new(start: f64, end: f64, frames: usize) -> Self {
        Self { start, end, frames }
    }

    /// Epsilon after `frame` steps.
    pub fn value(&self, frame: usize) -> f64 {
        if self.frames == 0 {
            return self.end;
        }
        let d = self.start - self.end;
        (self.start - frame as f64 * d / self.frames as f64).max(self.end)
    }
}

/// Counters and statistics of a training run.
///
/// The score is a single scalar shared by all the workers: at every frame the mean
/// reward over the workers is added, and the score is closed into the trailing
/// window whenever the episode of any worker ends.
#[derive(Debug, Clone)]
pub struct TrainingSession {
    /// Loop iterations so far. One iteration steps every worker once.
    pub frame: usize,

    /// Number of episode ends observed.
    pub episode: usize,

    /// Current exploration probability.
    pub eps: f64,

    /// Running score of the current episode.
    pub score: f32,

    scores_window: VecDeque<f32>,
    window_size: usize,
}

impl TrainingSession {
    /// Constructs a session.
    pub fn new(eps: f64, window_size: usize) -> Self {
        Self {
            frame: 0,
            episode: 0,
            eps,
            score: 0.0,
            scores_window: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Adds the rewards of one frame to the score.
    pub fn add_rewards(&mut self, mean_reward: f32) {
        self.score += mean_reward;
    }

    /// Closes the current score into the window and returns the trailing average.
    pub fn end_episode(&mut self) -> f32 {
        if self.scores_window.len() == self.window_size {
            self.scores_window.pop_front();
        }
        self.scores_window.push_back(self.score);
        self.score = 0.0;
        self.episode += 1;
        self.average()
    }

    /// Average of the scores in the window, 0 if no episode ended yet.
    pub fn average(&self) -> f32 {
        match self.scores_window.len() {
            0 => 0.0,
            n => self.scores_window.iter().sum::<f32>() / n as f32,
        }
    }

    /// Scores in the window, from the oldest.
    pub fn scores(&self) -> impl Iterator<Item = &f32> {
        self.scores_window.iter()
    }
}
