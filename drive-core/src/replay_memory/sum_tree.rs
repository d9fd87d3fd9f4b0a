//! Sum tree for prioritized sampling.
use rand::Rng;
use segment_tree::{ops::MaxIgnoreNaN, SegmentPoint};

/// A binary tree whose leaves hold `p^alpha` for the priority `p` of each slot and
/// whose inner nodes hold the sum of their children.
///
/// Raw priorities are kept along with the tree, so that the maximum priority can be
/// given to new transitions.
#[derive(Debug)]
pub struct SumTree {
    alpha: f32,
    capacity: usize,
    n_samples: usize,
    tree: Vec<f32>,
    priorities: Vec<f32>,
    max_tree: SegmentPoint<f32, MaxIgnoreNaN>,
}

impl SumTree {
    /// Constructs a sum tree with `capacity` leaves.
    pub fn new(capacity: usize, alpha: f32) -> Self {
        Self {
            alpha,
            capacity,
            n_samples: 0,
            tree: vec![0f32; 2 * capacity - 1],
            priorities: vec![0f32; capacity],
            max_tree: SegmentPoint::build(vec![0f32; capacity], MaxIgnoreNaN),
        }
    }

    fn propagate(&mut self, ix: usize, change: f32) {
        let parent = (ix - 1) / 2;
        self.tree[parent] += change;
        if parent != 0 {
            self.propagate(parent, change);
        }
    }

    fn retrieve(&self, ix: usize, s: f32) -> usize {
        let left = 2 * ix + 1;
        let right = left + 1;

        if left >= self.tree.len() {
            return ix;
        }

        if s <= self.tree[left] || self.tree[right] == 0f32 {
            self.retrieve(left, s)
        } else {
            self.retrieve(right, s - self.tree[left])
        }
    }

    /// Sum of `p^alpha` over all the slots.
    pub fn total(&self) -> f32 {
        self.tree[0]
    }

    /// Number of slots holding a priority.
    pub fn len(&self) -> usize {
        self.n_samples
    }

    /// Returns `true` if no priority has been added.
    pub fn is_empty(&self) -> bool {
        self.n_samples == 0
    }

    /// Maximum raw priority, `None` if the tree is empty.
    pub fn max(&self) -> Option<f32> {
        match self.n_samples {
            0 => None,
            _ => Some(self.max_tree.query(0, self.capacity)),
        }
    }

    /// Raw priority of the `ix`-th slot.
    pub fn priority(&self, ix: usize) -> f32 {
        self.priorities[ix]
    }

    /// Sets the priority of the `ix`-th slot, counting the slot as filled.
    pub fn add(&mut self, ix: usize, p: f32) {
        debug_assert!(ix <= self.n_samples || self.n_samples == self.capacity);

        self.update(ix, p);

        if self.n_samples < self.capacity {
            self.n_samples += 1;
        }
    }

    /// Updates the priority of the `ix`-th slot.
    ///
    /// The tree stores `p^alpha`; the raw value is kept for [`SumTree::max`].
    pub fn update(&mut self, ix: usize, p: f32) {
        debug_assert!(ix < self.capacity);

        self.priorities[ix] = p;
        self.max_tree.modify(ix, p);
        let p = p.powf(self.alpha);
        let ix = ix + self.capacity - 1;
        let change = p - self.tree[ix];
        self.tree[ix] = p;
        if ix > 0 {
            self.propagate(ix, change);
        }
    }

    /// Get the index of the slot at which the cumulative sum of `p^alpha` reaches `s`.
    pub fn get(&self, s: f32) -> usize {
        let ix = self.retrieve(0, s);
        debug_assert!(ix >= (self.capacity - 1));
        (ix + 1 - self.capacity).min(self.n_samples.saturating_sub(1))
    }

    /// Samples indices for batch and returns normalized weights.
    ///
    /// The weight is $w_i=\left(N P(i)\right)^{-\beta}$ with
    /// $P(i) = p_i^\alpha / \sum_k p_k^\alpha$, divided by $\max_i w_i$ in the batch.
    pub fn sample<R: Rng>(
        &self,
        batch_size: usize,
        beta: f32,
        rng: &mut R,
    ) -> (Vec<usize>, Vec<f32>) {
        let p_sum = self.total();
        let ixs = (0..batch_size)
            .map(|_| self.get(p_sum * rng.gen::<f32>()))
            .collect::<Vec<_>>();

        let n = self.n_samples as f32 / p_sum;
        let ws = ixs
            .iter()
            .map(|ix| self.tree[ix + self.capacity - 1])
            .map(|p| (n * p).powf(-beta))
            .collect::<Vec<_>>();
        let w_max = ws.iter().fold(f32::MIN, |m, &w| w.max(m));
        let ws = ws.iter().map(|w| w / w_max).collect();

        (ixs, ws)
    }
}

#[cfg(test)]
mod tests {
    use super::SumTree;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sum_tree_odd() {
        let data = vec![0.5f32, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let mut sum_tree = SumTree::new(8, 1.0);
        for ix in 0..data.len() {
            sum_tree.add(ix, data[ix]);
        }

        assert_eq!(sum_tree.get(0.0), 0);
        assert_eq!(sum_tree.get(0.4), 0);
        assert_eq!(sum_tree.get(0.5), 0);
        assert_eq!(sum_tree.get(0.6), 1);
        assert_eq!(sum_tree.get(1.2), 2);
        assert_eq!(sum_tree.get(1.6), 3);
        assert_eq!(sum_tree.get(2.0), 4);
        assert_eq!(sum_tree.get(2.8), 4);
        assert_eq!(sum_tree.max(), Some(3.9));
        assert!((sum_tree.total() - data.iter().sum::<f32>()).abs() < 1e-5);

        let mut rng = StdRng::seed_from_u64(42);
        let n_samples = 100_000;
        let (ixs, _) = sum_tree.sample(n_samples, 1.0, &mut rng);
        assert!(ixs.iter().all(|&ix| ix < data.len()));
        for ix in 0..data.len() {
            let p = data[ix] / sum_tree.total();
            let freq = ixs.iter().filter(|&&e| e == ix).count() as f32 / n_samples as f32;
            assert!((freq - p).abs() < 0.01, "ix={}: {} vs {}", ix, freq, p);
        }
    }

    #[test]
    fn test_weights_normalized_by_batch_max() {
        let mut sum_tree = SumTree::new(4, 0.6);
        for (ix, p) in [1.0f32, 10.0, 0.1, 3.0].iter().enumerate() {
            sum_tree.add(ix, *p);
        }
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..20 {
            let (_, ws) = sum_tree.sample(8, 0.4, &mut rng);
            let w_max = ws.iter().fold(f32::MIN, |m, &w| w.max(m));
            assert_eq!(w_max, 1.0);
            assert!(ws.iter().all(|&w| w > 0.0 && w <= 1.0));
        }
    }
}
