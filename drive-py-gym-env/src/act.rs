use drive_core::Act;

/// Discrete action of [`GymEnv`](crate::GymEnv), an index into the action space.
///
/// For the CARLA gym, the index enumerates the pairs of discrete acceleration
/// and steering angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GymAct(pub i64);

impl Act for GymAct {}

impl From<i64> for GymAct {
    fn from(a: i64) -> Self {
        Self(a)
    }
}

impl From<GymAct> for i64 {
    fn from(a: GymAct) -> Self {
        a.0
    }
}
