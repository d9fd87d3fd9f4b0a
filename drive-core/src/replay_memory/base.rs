//! Ring buffer of transitions.
use super::{BatchBase, IwScheduler, PerConfig, ReplayMemoryConfig, SumTree, TransitionBatch};
use crate::error::DriveError;
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

struct PerState {
    sum_tree: SumTree,
    iw_scheduler: IwScheduler,
    eps: f32,
}

impl PerState {
    fn new(capacity: usize, per_config: &PerConfig) -> Self {
        Self {
            sum_tree: SumTree::new(capacity, per_config.alpha),
            iw_scheduler: IwScheduler::new(
                per_config.beta_0,
                per_config.beta_final,
                per_config.n_opts_final,
            ),
            eps: per_config.eps,
        }
    }
}

/// A fixed-capacity replay memory.
///
/// Sampling is uniform, or prioritized when the memory is built with a
/// [`PerConfig`].
pub struct ReplayMemory<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,
    i: usize,
    size: usize,
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_done: Vec<i8>,
    rng: StdRng,
    per_state: Option<PerState>,
}

impl<O, A> ReplayMemory<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Builds a replay memory.
    pub fn build(config: &ReplayMemoryConfig) -> Result<Self> {
        let capacity = config.capacity;
        if capacity == 0 {
            let msg = "replay memory capacity must be positive".to_string();
            return Err(DriveError::InvalidConfig(msg).into());
        }
        let per_state = config
            .per_config
            .as_ref()
            .map(|per_config| PerState::new(capacity, per_config));

        Ok(Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_done: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
            per_state,
        })
    }

    /// Number of stored transitions.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if the memory samples with priorities.
    pub fn is_per(&self) -> bool {
        self.per_state.is_some()
    }

    /// Current exponent of importance sampling weights, `None` for uniform sampling.
    pub fn beta(&self) -> Option<f32> {
        self.per_state.as_ref().map(|s| s.iw_scheduler.beta())
    }

    /// Priority of the transition at slot `ix`, `None` for uniform sampling.
    pub fn priority(&self, ix: usize) -> Option<f32> {
        self.per_state.as_ref().map(|s| s.sum_tree.priority(ix))
    }

    /// Pushes transitions, overwriting the oldest ones when the memory is full.
    ///
    /// With prioritized sampling, the new transitions get the maximum priority seen
    /// so far (1.0 for the first transition).
    pub fn push(&mut self, tr: TransitionBatch<O, A>) -> Result<()> {
        let len = tr.len();
        let TransitionBatch {
            obs,
            act,
            next_obs,
            reward,
            is_done,
            ..
        } = tr;
        self.obs.push(self.i, obs);
        self.act.push(self.i, act);
        self.next_obs.push(self.i, next_obs);
        for (k, (r, d)) in reward.into_iter().zip(is_done.into_iter()).enumerate() {
            let j = (self.i + k) % self.capacity;
            self.reward[j] = r;
            self.is_done[j] = d;
        }

        if let Some(per_state) = self.per_state.as_mut() {
            let max_p = per_state.sum_tree.max().unwrap_or(1.0);
            for k in 0..len {
                per_state.sum_tree.add((self.i + k) % self.capacity, max_p);
            }
        }

        self.i = (self.i + len) % self.capacity;
        self.size = (self.size + len).min(self.capacity);

        Ok(())
    }

    /// Samples a batch of transitions.
    ///
    /// Uniform sampling draws indices independently with replacement. Prioritized
    /// sampling also returns the sampled indices and importance sampling weights,
    /// the maximum of which is 1.
    ///
    /// # Errors
    ///
    /// Sampling from a memory holding fewer than `batch_size` transitions fails with
    /// [`DriveError::InsufficientTransitions`].
    pub fn sample(&mut self, batch_size: usize) -> Result<TransitionBatch<O, A>> {
        if self.size < batch_size || batch_size == 0 {
            return Err(DriveError::InsufficientTransitions {
                len: self.size,
                batch_size,
            }
            .into());
        }

        let rng = &mut self.rng;
        let (ixs, weight) = match &self.per_state {
            Some(per_state) => {
                let beta = per_state.iw_scheduler.beta();
                let (ixs, weight) = per_state.sum_tree.sample(batch_size, beta, rng);
                trace!("PER sample with beta = {}", beta);
                (ixs, Some(weight))
            }
            None => {
                let size = self.size;
                let ixs = (0..batch_size)
                    .map(|_| rng.gen_range(0..size))
                    .collect::<Vec<_>>();
                (ixs, None)
            }
        };

        Ok(self.gather(ixs, weight))
    }

    /// Updates priorities of sampled transitions with the magnitudes of their TD errors.
    ///
    /// The new priority is `|td_err| + eps`. This is a no-op for uniform sampling.
    pub fn update_priorities(&mut self, ixs: &[usize], td_errs: &[f32]) {
        if let Some(per_state) = &mut self.per_state {
            debug_assert_eq!(ixs.len(), td_errs.len());
            for (&ix, &td_err) in ixs.iter().zip(td_errs.iter()) {
                per_state.sum_tree.update(ix, td_err.abs() + per_state.eps);
            }
            per_state.iw_scheduler.add_n_opts();
        }
    }

    /// Returns all the stored transitions from the oldest to the newest.
    pub fn contents(&self) -> TransitionBatch<O, A> {
        let ixs = if self.size < self.capacity {
            (0..self.size).collect::<Vec<_>>()
        } else {
            (self.i..self.capacity).chain(0..self.i).collect()
        };
        self.gather(ixs, None)
    }

    fn gather(&self, ixs: Vec<usize>, weight: Option<Vec<f32>>) -> TransitionBatch<O, A> {
        TransitionBatch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: ixs.iter().map(|&ix| self.reward[ix]).collect(),
            is_done: ixs.iter().map(|&ix| self.is_done[ix]).collect(),
            weight,
            ix_sample: Some(ixs),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{replay_memory::VecBatch, Transition};

    type Memory = ReplayMemory<VecBatch<f32>, VecBatch<i64>>;

    fn transition(v: usize) -> TransitionBatch<VecBatch<f32>, VecBatch<i64>> {
        Transition::new(
            VecBatch::single(v as f32),
            VecBatch::single(v as i64),
            v as f32,
            VecBatch::single(v as f32 + 1.0),
            false,
        )
        .into()
    }

    fn per_memory(capacity: usize) -> Memory {
        let config = ReplayMemoryConfig::default()
            .capacity(capacity)
            .per_config(Some(PerConfig::default().alpha(1.0).eps(0.01)));
        Memory::build(&config).unwrap()
    }

    #[test]
    fn test_keeps_most_recent_transitions() -> Result<()> {
        for capacity in [1, 3, 7] {
            let mut memory = Memory::build(&ReplayMemoryConfig::default().capacity(capacity))?;
            for n_pushes in 0..20 {
                memory.push(transition(n_pushes))?;
                assert_eq!(memory.len(), (n_pushes + 1).min(capacity));
                let first = (n_pushes + 1).saturating_sub(capacity);
                let expected = (first..=n_pushes).map(|v| v as i64).collect::<Vec<_>>();
                assert_eq!(memory.contents().act.into_inner(), expected);
            }
        }
        Ok(())
    }

    #[test]
    fn test_sample_fails_when_underfilled() -> Result<()> {
        let mut memory = Memory::build(&ReplayMemoryConfig::default().capacity(10))?;
        memory.push(transition(0))?;
        let err = memory.sample(2).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<DriveError>(),
            Some(DriveError::InsufficientTransitions { len: 1, batch_size: 2 })
        ));
        Ok(())
    }

    #[test]
    fn test_uniform_sampling_covers_memory_evenly() -> Result<()> {
        let n = 10;
        let mut memory = Memory::build(&ReplayMemoryConfig::default().capacity(n))?;
        (0..n).try_for_each(|v| memory.push(transition(v)))?;

        let mut counts = vec![0usize; n];
        let n_draws = 2000;
        for _ in 0..n_draws {
            let batch = memory.sample(5)?;
            assert!(batch.weight.is_none());
            batch.ix_sample.unwrap().iter().for_each(|&ix| counts[ix] += 1);
        }
        let expected = (n_draws * 5 / n) as f32;
        assert!(counts.iter().all(|&c| (c as f32 - expected).abs() < 0.15 * expected));
        Ok(())
    }

    #[test]
    fn test_new_transitions_get_max_priority() -> Result<()> {
        let mut memory = per_memory(8);
        memory.push(transition(0))?;
        assert_eq!(memory.priority(0), Some(1.0));

        memory.update_priorities(&[0], &[4.0]);
        let p0 = memory.priority(0).unwrap();
        assert!((p0 - 4.01).abs() < 1e-6);
        memory.push(transition(1))?;
        assert_eq!(memory.priority(1), Some(p0));
        Ok(())
    }

    #[test]
    fn test_uniform_priority_samples_uniformly() -> Result<()> {
        let n = 8;
        let mut memory = per_memory(n);
        (0..n).try_for_each(|v| memory.push(transition(v)))?;

        let mut counts = vec![0usize; n];
        let n_draws = 2000;
        for _ in 0..n_draws {
            let batch = memory.sample(4)?;
            assert!(batch.weight.unwrap().iter().all(|&w| w == 1.0));
            batch.ix_sample.unwrap().iter().for_each(|&ix| counts[ix] += 1);
        }
        let expected = (n_draws * 4 / n) as f32;
        assert!(counts.iter().all(|&c| (c as f32 - expected).abs() < 0.15 * expected));
        Ok(())
    }

    #[test]
    fn test_high_priority_sampled_proportionally() -> Result<()> {
        let n = 11;
        let mut memory = per_memory(n);
        (0..n).try_for_each(|v| memory.push(transition(v)))?;

        // Priority of slot 3 is 100 times the floor, the others are at the floor.
        let ixs = (0..n).collect::<Vec<_>>();
        let td_errs = ixs
            .iter()
            .map(|&ix| if ix == 3 { 0.99 } else { 0.0 })
            .collect::<Vec<_>>();
        memory.update_priorities(&ixs, &td_errs);

        let n_draws = 5000;
        let mut n_hits = 0;
        for _ in 0..n_draws {
            let batch = memory.sample(1)?;
            if batch.ix_sample.unwrap()[0] == 3 {
                n_hits += 1;
            }
        }
        // 100 / (100 + 10)
        let freq = n_hits as f32 / n_draws as f32;
        assert!((freq - 100.0 / 110.0).abs() < 0.03, "freq = {}", freq);
        Ok(())
    }

    #[test]
    fn test_max_weight_is_one() -> Result<()> {
        let n = 16;
        let mut memory = per_memory(n);
        (0..n).try_for_each(|v| memory.push(transition(v)))?;
        let ixs = (0..n).collect::<Vec<_>>();
        let td_errs = ixs.iter().map(|&ix| ix as f32 * 0.3).collect::<Vec<_>>();
        memory.update_priorities(&ixs, &td_errs);

        for _ in 0..50 {
            let weight = memory.sample(6)?.weight.unwrap();
            let w_max = weight.iter().fold(f32::MIN, |m, &w| w.max(m));
            assert_eq!(w_max, 1.0);
        }
        Ok(())
    }
}
