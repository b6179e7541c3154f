//! Leg kinematics and torque-level trajectory tracking.
//!
//! # Pipeline
//!
//! ```text
//! foot target ──► InverseKinematics ──► q_des ──┐
//!                                               ├──► TrackingController ──► τ[12]
//! RobotKinematicState (q, dq, J, p, rpy) ───────┘
//! ```
//!
//! The controller sums up to three independently toggled terms per leg:
//! joint-space PD, Cartesian PD mapped through `Jᵀ`, and a posture
//! correction that shifts each foot target against body roll and pitch.

pub mod kinematics;
pub mod tracking;

pub use kinematics::{InverseKinematics, LegKinematics};
pub use tracking::{
    ControlGains, ControlToggles, POSTURE_HALF_LENGTH, POSTURE_HALF_WIDTH, TrackingController,
    jacobian_transpose_torques, posture_shift,
};
