use drive_core::Obs;
use ndarray::ArrayD;
#[cfg(feature = "tch")]
use {drive_tch_agent::TensorBatch, tch::Tensor};

/// Observation of [`GymEnv`](crate::GymEnv).
///
/// A lidar image is an array of shape `[height, width, channel]` with values in
/// `[0, 255]`. Vector observations are one-dimensional.
#[derive(Clone, Debug, PartialEq)]
pub struct GymObs(pub ArrayD<f32>);

impl Obs for GymObs {}

impl GymObs {
    /// Shape of the observation.
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }
}

impl From<ArrayD<f32>> for GymObs {
    fn from(obs: ArrayD<f32>) -> Self {
        Self(obs)
    }
}

/// Converts an observation into a batch of size 1.
///
/// Images are stored as `u8` to save the memory of the replay buffer, other
/// observations as `f32`.
#[cfg(feature = "tch")]
impl From<GymObs> for TensorBatch {
    fn from(obs: GymObs) -> Self {
        let mut shape = vec![1i64];
        shape.extend(obs.shape().iter().map(|&d| d as i64));
        let t = if obs.0.ndim() == 3 {
            let v = obs.0.iter().map(|&e| e as u8).collect::<Vec<_>>();
            Tensor::from_slice(&v[..])
        } else {
            let v = obs.0.iter().copied().collect::<Vec<_>>();
            Tensor::from_slice(&v[..])
        };
        TensorBatch::from_tensor(t.reshape(&shape[..]))
    }
}
