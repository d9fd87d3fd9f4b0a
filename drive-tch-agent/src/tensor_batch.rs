use anyhow::{Context, Result};
use drive_core::{dummy::DummyObs, replay_memory::BatchBase};
use tch::{Device, Tensor};

/// A [`BatchBase`] consisting of a [`Tensor`].
///
/// The internal buffer has the shape `[capacity, shape[1..]]`, where `shape` is the
/// shape of the data pushed at the first time. The first axis of pushed data is the
/// batch axis. The buffer stays on the CPU, and its element type follows the pushed
/// data, so that `u8` images are stored without conversion.
pub struct TensorBatch {
    buf: Option<Tensor>,
    capacity: i64,
}

impl TensorBatch {
    /// Wraps a tensor whose first axis is the batch axis.
    pub fn from_tensor(t: Tensor) -> Self {
        let capacity = t.size()[0];
        Self {
            buf: Some(t),
            capacity,
        }
    }

    /// Returns the underlying tensor, failing if nothing was pushed.
    pub fn into_tensor(self) -> Result<Tensor> {
        self.buf.context("empty tensor batch")
    }

    /// Concatenates batches along the batch axis.
    pub fn cat(batches: Vec<TensorBatch>) -> Result<Self> {
        let ts = batches
            .into_iter()
            .map(|b| b.into_tensor())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_tensor(Tensor::cat(&ts, 0)))
    }
}

impl BatchBase for TensorBatch {
    fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity: capacity as _,
        }
    }

    /// Pushes given data.
    ///
    /// If the internal buffer is empty, it will be initialized with the shape
    /// `[capacity, data.size()[1..]]`.
    fn push(&mut self, index: usize, data: Self) {
        let data = match data.buf {
            Some(t) if t.size()[0] > 0 => t,
            _ => return,
        };

        let capacity = self.capacity;
        let buf = self.buf.get_or_insert_with(|| {
            let mut shape = data.size();
            shape[0] = capacity;
            Tensor::zeros(shape.as_slice(), (data.kind(), Device::Cpu))
        });

        let index = index as i64;
        let data = data.to_device(Device::Cpu);
        for k in 0..data.size()[0] {
            let mut row = buf.get((k + index) % capacity);
            row.copy_(&data.get(k));
        }
    }

    fn sample(&self, ixs: &[usize]) -> Self {
        let ixs = ixs.iter().map(|&ix| ix as i64).collect::<Vec<_>>();
        let buf = self
            .buf
            .as_ref()
            .map(|buf| buf.index_select(0, &Tensor::from_slice(&ixs)));
        Self {
            buf,
            capacity: ixs.len() as i64,
        }
    }
}

impl From<Tensor> for TensorBatch {
    fn from(t: Tensor) -> Self {
        Self::from_tensor(t)
    }
}

impl From<DummyObs> for TensorBatch {
    fn from(obs: DummyObs) -> Self {
        Self::from_tensor(Tensor::from_slice(obs.0.as_slice()).unsqueeze(0))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryFrom;
    use tch::Kind;

    fn row(v: f32) -> TensorBatch {
        Tensor::from_slice(&[v, v]).unsqueeze(0).into()
    }

    #[test]
    fn test_push_wraps_around_and_keeps_kind() -> Result<()> {
        let mut b = TensorBatch::new(3);
        for i in 0..5 {
            b.push(i % 3, row(i as f32));
        }
        let t = b.sample(&[0, 1, 2]).into_tensor()?;
        assert_eq!(t.kind(), Kind::Float);
        assert_eq!(
            Vec::<f32>::try_from(&t.flatten(0, -1))?,
            vec![3., 3., 4., 4., 2., 2.]
        );

        let mut b = TensorBatch::new(2);
        b.push(0, Tensor::zeros(&[1, 4, 4, 3], (Kind::Uint8, Device::Cpu)).into());
        assert_eq!(b.sample(&[0]).into_tensor()?.kind(), Kind::Uint8);
        Ok(())
    }

    #[test]
    fn test_empty_batch_has_no_tensor() {
        let b = TensorBatch::new(4);
        assert!(b.sample(&[]).into_tensor().is_err());
    }
}
