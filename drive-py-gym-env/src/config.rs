//! Configuration of [`GymEnv`](crate::GymEnv).
use anyhow::Result;
use pyo3::{PyObject, Python, ToPyObject};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// A value in the parameter dictionary passed to `gym.make()`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean.
    Bool(bool),

    /// Integer.
    Int(i64),

    /// Floating-point number.
    Float(f64),

    /// List of floating-point numbers.
    List(Vec<f64>),

    /// String.
    Str(String),
}

impl ToPyObject for ParamValue {
    fn to_object(&self, py: Python) -> PyObject {
        match self {
            Self::Bool(v) => v.to_object(py),
            Self::Int(v) => v.to_object(py),
            Self::Float(v) => v.to_object(py),
            Self::List(v) => v.to_object(py),
            Self::Str(v) => v.to_object(py),
        }
    }
}

fn carla_params() -> BTreeMap<String, ParamValue> {
    use ParamValue::*;
    let params = vec![
        ("number_of_vehicles", Int(100)),
        ("number_of_walkers", Int(0)),
        ("display_size", Int(256)),
        ("max_past_step", Int(1)),
        ("dt", Float(0.1)),
        ("discrete", Bool(true)),
        ("discrete_acc", List(vec![-3.0, 0.0, 3.0])),
        ("discrete_steer", List(vec![-0.2, 0.0, 0.2])),
        ("continuous_accel_range", List(vec![-3.0, 3.0])),
        ("continuous_steer_range", List(vec![-0.3, 0.3])),
        ("ego_vehicle_filter", Str("vehicle.lincoln*".into())),
        ("port", Int(2000)),
        ("town", Str("Town03".into())),
        ("task_mode", Str("random".into())),
        ("max_time_episode", Int(1000)),
        ("max_waypt", Int(12)),
        ("obs_range", Int(32)),
        ("lidar_bin", Float(0.125)),
        ("d_behind", Int(12)),
        ("out_lane_thres", Float(2.0)),
        ("desired_speed", Int(8)),
        ("max_ego_spawn_times", Int(200)),
        ("display_route", Bool(true)),
        ("pixor_size", Int(64)),
        ("pixor", Bool(false)),
    ];
    params
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Configuration of [`GymEnv`](crate::GymEnv).
///
/// The default configuration builds the CARLA driving gym with discrete actions
/// and extracts the lidar image from the observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GymEnvConfig {
    /// Name of the environment given to `gym.make()`.
    pub name: String,

    /// Python modules imported before building the environment, e.g., the
    /// module registering the environment.
    pub imports: Vec<String>,

    /// Parameter dictionary given to `gym.make()` as `params`.
    ///
    /// If empty, no parameter is given.
    pub params: BTreeMap<String, ParamValue>,

    /// Key of the observation in the dictionary returned by the environment.
    ///
    /// If `None`, the observation is expected to be an array.
    pub obs_key: Option<String>,

    /// Maximum number of steps in an episode.
    pub max_steps: Option<usize>,
}

impl Default for GymEnvConfig {
    fn default() -> Self {
        Self {
            name: "carla-v0".to_string(),
            imports: vec!["gym_carla".to_string()],
            params: carla_params(),
            obs_key: Some("lidar".to_string()),
            max_steps: None,
        }
    }
}

impl GymEnvConfig {
    /// Sets the name of the environment.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the modules imported before building the environment.
    pub fn imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    /// Sets a parameter, replacing the existing one of the same key.
    pub fn param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Removes all the parameters.
    pub fn clear_params(mut self) -> Self {
        self.params.clear();
        self
    }

    /// Sets the key of the observation.
    pub fn obs_key(mut self, obs_key: Option<String>) -> Self {
        self.obs_key = obs_key;
        self
    }

    /// Sets the maximum number of steps in an episode.
    pub fn max_steps(mut self, v: Option<usize>) -> Self {
        self.max_steps = v;
        self
    }

    /// Loads [`GymEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GymEnvConfig`] to as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
