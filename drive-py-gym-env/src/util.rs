//! Conversion of Python objects.
use anyhow::{anyhow, Result};
use ndarray::ArrayD;
use numpy::PyArrayDyn;
use pyo3::PyAny;

/// Converts a numpy array into [`ArrayD<f32>`].
///
/// Arrays of `f32`, `f64` and `u8` are supported.
pub fn pyany_to_arrayd(obj: &PyAny) -> Result<ArrayD<f32>> {
    if let Ok(arr) = obj.extract::<&PyArrayDyn<f32>>() {
        Ok(arr.to_owned_array())
    } else if let Ok(arr) = obj.extract::<&PyArrayDyn<f64>>() {
        Ok(arr.to_owned_array().mapv(|e| e as f32))
    } else if let Ok(arr) = obj.extract::<&PyArrayDyn<u8>>() {
        Ok(arr.to_owned_array().mapv(f32::from))
    } else {
        Err(anyhow!("Unsupported observation: {}", obj))
    }
}
