//! Batches of transitions.
use crate::Transition;

/// Basic operations on a container of observations or actions.
///
/// A container created with [`BatchBase::new`] works as a ring buffer of the given
/// capacity: [`BatchBase::push`] writes items at consecutive slots starting from
/// `ix`, wrapping around at the capacity.
pub trait BatchBase {
    /// Creates a new batch with the specified capacity.
    fn new(capacity: usize) -> Self;

    /// Writes the items of `data` at slots starting from `ix`.
    fn push(&mut self, ix: usize, data: Self);

    /// Returns a new batch consisting of the items at the given indices.
    fn sample(&self, ixs: &[usize]) -> Self;
}

/// A [`BatchBase`] backed by a [`Vec`].
#[derive(Clone, Debug, PartialEq)]
pub struct VecBatch<T> {
    buf: Vec<T>,
    capacity: usize,
}

impl<T> VecBatch<T> {
    /// Creates a batch of a single item.
    pub fn single(item: T) -> Self {
        Self {
            buf: vec![item],
            capacity: 1,
        }
    }

    /// Returns the items in the batch.
    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    /// Consumes the batch and returns its items.
    pub fn into_inner(self) -> Vec<T> {
        self.buf
    }

    /// Number of items in the batch.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if the batch has no item.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl<T: Clone> BatchBase for VecBatch<T> {
    fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, ix: usize, data: Self) {
        for (k, item) in data.buf.into_iter().enumerate() {
            let j = (ix + k) % self.capacity;
            if j < self.buf.len() {
                self.buf[j] = item;
            } else {
                debug_assert_eq!(j, self.buf.len());
                self.buf.push(item);
            }
        }
    }

    fn sample(&self, ixs: &[usize]) -> Self {
        Self {
            buf: ixs.iter().map(|&ix| self.buf[ix].clone()).collect(),
            capacity: ixs.len(),
        }
    }
}

impl<T> From<Vec<T>> for VecBatch<T> {
    fn from(buf: Vec<T>) -> Self {
        let capacity = buf.len();
        Self { buf, capacity }
    }
}

/// Transitions in a batch.
///
/// Batches sampled from a prioritized memory carry the sampled indices and the
/// importance sampling weights.
pub struct TransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Observations.
    pub obs: O,

    /// Actions.
    pub act: A,

    /// Next observations.
    pub next_obs: O,

    /// Rewards, or discounted multi-step returns.
    pub reward: Vec<f32>,

    /// Episode end flags.
    pub is_done: Vec<i8>,

    /// Importance sampling weights for prioritized sampling.
    pub weight: Option<Vec<f32>>,

    /// Indices of sampled transitions.
    pub ix_sample: Option<Vec<usize>>,
}

impl<O, A> TransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Number of transitions in the batch.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}

impl<O, A> From<Transition<O, A>> for TransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Wraps a transition whose observations and action are batches of a single item.
    fn from(tr: Transition<O, A>) -> Self {
        Self {
            obs: tr.obs,
            act: tr.act,
            next_obs: tr.next_obs,
            reward: vec![tr.reward],
            is_done: vec![tr.is_done as i8],
            weight: None,
            ix_sample: None,
        }
    }
}
