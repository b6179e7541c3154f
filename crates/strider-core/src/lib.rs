// strider-core: Leg indexing, state snapshots, torque commands and errors for strider.

pub mod error;
pub mod types;

pub use error::{ConfigError, KinematicsError, StriderError};
pub use types::{
    JointVector, LEG_COUNT, Leg, MOTOR_COUNT, RobotKinematicState, TorqueCommand, leg_joints,
};
