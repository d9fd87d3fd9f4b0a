//! N-step aggregation of transitions.
use crate::Transition;
use std::collections::VecDeque;

/// Aggregates the raw transitions of a single worker into n-step transitions.
///
/// An n-step transition starts at the oldest buffered transition `(o_t, a_t)` and
/// carries the discounted return $\sum_{k=0}^{n-1} \gamma^k r_{t+k}$, together with
/// the next observation and the episode end flag of the newest one. When an episode
/// ends, every buffered transition is flushed with its partial return, so that no
/// n-step transition crosses an episode boundary.
///
/// With `n_step = 1` every transition is passed through as is.
pub struct NStepAccumulator<O, A> {
    n_step: usize,
    gamma: f32,
    buf: VecDeque<Transition<O, A>>,
}

impl<O: Clone, A: Clone> NStepAccumulator<O, A> {
    /// Constructs an accumulator.
    pub fn new(n_step: usize, gamma: f32) -> Self {
        debug_assert!(n_step >= 1);
        Self {
            n_step,
            gamma,
            buf: VecDeque::with_capacity(n_step),
        }
    }

    /// Number of buffered raw transitions.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no transition is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Pushes a raw transition and returns the n-step transitions that became ready.
    pub fn push(&mut self, tr: Transition<O, A>) -> Vec<Transition<O, A>> {
        let is_done = tr.is_done;
        self.buf.push_back(tr);

        if is_done {
            let out = (0..self.buf.len()).map(|k| self.aggregate(k)).collect();
            self.buf.clear();
            out
        } else if self.buf.len() == self.n_step {
            let out = vec![self.aggregate(0)];
            self.buf.pop_front();
            out
        } else {
            vec![]
        }
    }

    /// Builds the transition starting at the `start`-th buffered one and ending at the newest.
    fn aggregate(&self, start: usize) -> Transition<O, A> {
        let first = &self.buf[start];
        let last = &self.buf[self.buf.len() - 1];
        let (reward, _) = self
            .buf
            .iter()
            .skip(start)
            .fold((0f32, 1f32), |(r, g), tr| (r + g * tr.reward, g * self.gamma));

        Transition {
            obs: first.obs.clone(),
            act: first.act.clone(),
            reward,
            next_obs: last.next_obs.clone(),
            is_done: last.is_done,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tr(t: i64, reward: f32, is_done: bool) -> Transition<i64, i64> {
        Transition::new(t, t * 10, reward, t + 1, is_done)
    }

    #[test]
    fn test_one_step_passes_through() {
        let mut acc = NStepAccumulator::new(1, 0.9);
        assert_eq!(acc.push(tr(0, 1.0, false)), vec![tr(0, 1.0, false)]);
        assert_eq!(acc.push(tr(1, 2.0, true)), vec![tr(1, 2.0, true)]);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_three_step_return() {
        let mut acc = NStepAccumulator::new(3, 0.5);
        assert!(acc.push(tr(0, 1.0, false)).is_empty());
        assert!(acc.push(tr(1, 2.0, false)).is_empty());
        let out = acc.push(tr(2, 4.0, false));
        assert_eq!(out, vec![Transition::new(0, 0, 1.0 + 0.5 * 2.0 + 0.25 * 4.0, 3, false)]);
        assert_eq!(acc.len(), 2);

        let out = acc.push(tr(3, 8.0, false));
        assert_eq!(out, vec![Transition::new(1, 10, 2.0 + 0.5 * 4.0 + 0.25 * 8.0, 4, false)]);
    }

    #[test]
    fn test_flush_partial_returns_on_episode_end() {
        let mut acc = NStepAccumulator::new(3, 0.5);
        acc.push(tr(0, 1.0, false));
        let out = acc.push(tr(1, 2.0, true));
        assert_eq!(
            out,
            vec![
                Transition::new(0, 0, 1.0 + 0.5 * 2.0, 2, true),
                Transition::new(1, 10, 2.0, 2, true),
            ]
        );
        assert!(acc.is_empty());

        // The next episode starts from scratch.
        assert!(acc.push(tr(5, 1.0, false)).is_empty());
        assert_eq!(acc.len(), 1);
    }
}
