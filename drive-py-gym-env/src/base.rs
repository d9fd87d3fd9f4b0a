//! Wrapper of gym environments implemented in Python.
use crate::{util::pyany_to_arrayd, GymAct, GymEnvConfig, GymObs};
use anyhow::{anyhow, Result};
use drive_core::{Env, Info, Step};
use log::{debug, info, trace};
use pyo3::{
    types::{IntoPyDict, PyDict, PyTuple},
    PyAny, PyObject, Python,
};

/// Information given at every step of the interaction with the environment.
///
/// Currently, it is empty and used to match the type signature.
pub struct GymInfo {}

impl Info for GymInfo {}

/// An environment in [OpenAI gym](https://github.com/openai/gym) on Python.
///
/// Both the old API, where `reset()` returns an observation and `step()` returns
/// `(obs, reward, done, info)`, and the new one, where `reset()` returns
/// `(obs, info)` and `step()` returns `(obs, reward, terminated, truncated, info)`,
/// are supported.
pub struct GymEnv {
    env: PyObject,
    obs_key: Option<String>,
    n_actions: i64,
    obs_shape: Vec<usize>,
    count_steps: usize,
    max_steps: Option<usize>,
}

impl GymEnv {
    /// Wraps a Python environment object.
    ///
    /// The environment is seeded with `env.seed(seed)` if it has the method.
    pub fn from_pyobject(env: &PyAny, config: &GymEnvConfig, seed: i64) -> Result<Self> {
        if let Ok(seed_fn) = env.getattr("seed") {
            seed_fn.call1((seed,))?;
        }

        let n_actions = env.getattr("action_space")?.getattr("n")?.extract()?;
        let observation_space = env.getattr("observation_space")?;
        let observation_space = match config.obs_key.as_ref() {
            Some(key) => observation_space.get_item(key.as_str())?,
            None => observation_space,
        };
        let obs_shape = observation_space.getattr("shape")?.extract()?;
        debug!(
            "Observation shape = {:?}, number of actions = {}",
            obs_shape, n_actions
        );

        Ok(Self {
            env: env.into(),
            obs_key: config.obs_key.clone(),
            n_actions,
            obs_shape,
            count_steps: 0,
            max_steps: config.max_steps,
        })
    }

    fn to_obs(&self, obs: &PyAny) -> Result<GymObs> {
        let obs = match self.obs_key.as_ref() {
            Some(key) => obs.get_item(key.as_str())?,
            None => obs,
        };
        Ok(GymObs(pyany_to_arrayd(obs)?))
    }
}

impl Env for GymEnv {
    type Config = GymEnvConfig;
    type Obs = GymObs;
    type Act = GymAct;
    type Info = GymInfo;

    /// Constructs [`GymEnv`] with `gym.make(name, params=...)`.
    ///
    /// The modules in [`GymEnvConfig::imports`] are imported before, so that the
    /// environment is registered.
    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Python::with_gil(|py| {
            let ver = py.version();
            info!("Initialize GymEnv {} (Python {})", config.name, ver);

            for module in config.imports.iter() {
                py.import(module.as_str())?;
            }
            let gym = py.import("gym")?;
            let kwargs = if config.params.is_empty() {
                None
            } else {
                let params = PyDict::new(py);
                for (k, v) in config.params.iter() {
                    params.set_item(k, v)?;
                }
                Some(vec![("params", params)].into_py_dict(py))
            };
            let env = gym
                .getattr("make")?
                .call((config.name.as_str(),), kwargs)?;

            Self::from_pyobject(env, config, seed)
        })
    }

    fn reset(&mut self) -> Result<GymObs> {
        trace!("GymEnv::reset()");
        self.count_steps = 0;

        Python::with_gil(|py| {
            let ret = self.env.call_method0(py, "reset")?;
            let ret = ret.as_ref(py);
            let obs = match ret.downcast::<PyTuple>() {
                Ok(tuple) if tuple.len() == 2 => tuple.get_item(0),
                _ => ret,
            };
            self.to_obs(obs)
        })
    }

    /// Shape reported by the observation space.
    fn obs_shape(&self) -> Vec<usize> {
        self.obs_shape.clone()
    }

    fn n_actions(&self) -> i64 {
        self.n_actions
    }

    fn step(&mut self, a: &GymAct) -> Result<Step<Self>> {
        trace!("GymEnv::step()");

        Python::with_gil(|py| {
            let ret = self.env.call_method1(py, "step", (a.0,))?;
            let step: &PyTuple = ret.extract(py)?;
            let obs = self.to_obs(step.get_item(0))?;
            let reward: f32 = step.get_item(1).extract()?;
            let mut is_done: bool = match step.len() {
                4 => step.get_item(2).extract()?,
                5 => {
                    let terminated: bool = step.get_item(2).extract()?;
                    let truncated: bool = step.get_item(3).extract()?;
                    terminated || truncated
                }
                n => return Err(anyhow!("Unexpected length of step(): {}", n)),
            };

            self.count_steps += 1;
            if let Some(max_steps) = self.max_steps {
                if self.count_steps >= max_steps {
                    is_done = true;
                }
            }

            Ok(Step::new(obs, *a, reward, is_done, GymInfo {}))
        })
    }
}
