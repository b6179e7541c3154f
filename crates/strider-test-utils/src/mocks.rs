//! Mock quadruped for closed-loop tests.
//!
//! [`KinematicQuadruped`] integrates each joint as an independent rotor
//! driven by the commanded torque. The body does not move on its own; its
//! orientation and velocity are set by the test.

use nalgebra::{Matrix3, Vector3};
use strider_control::kinematics::{InverseKinematics, LegKinematics};
use strider_core::error::KinematicsError;
use strider_core::types::{JointVector, Leg, TorqueCommand, leg_joints};
use strider_sim::robot::QuadrupedRobot;

/// Crouched standing pose per leg: `[abduction, thigh, knee]`.
pub const STANDING_POSE: [f64; 3] = [0.0, 0.8, -1.6];

// ---------------------------------------------------------------------------
// KinematicQuadruped
// ---------------------------------------------------------------------------

/// Rigid-base quadruped with first-order joint dynamics.
#[derive(Clone, Debug)]
pub struct KinematicQuadruped {
    kinematics: LegKinematics,
    dt: f64,
    inertia: f64,
    damping: f64,
    torque_limit: f64,
    angles: JointVector,
    velocities: JointVector,
    orientation_rpy: Vector3<f64>,
    linear_velocity: Vector3<f64>,
    applied: JointVector,
    blocked: Option<Leg>,
    steps: u64,
}

impl KinematicQuadruped {
    /// Robot in [`STANDING_POSE`] at rest, stepped every `dt` seconds.
    pub fn new(dt: f64) -> Self {
        Self {
            kinematics: LegKinematics::default(),
            dt,
            inertia: 0.05,
            damping: 0.0,
            torque_limit: f64::INFINITY,
            angles: JointVector::from_fn(|i, _| STANDING_POSE[i % 3]),
            velocities: JointVector::zeros(),
            orientation_rpy: Vector3::zeros(),
            linear_velocity: Vector3::zeros(),
            applied: JointVector::zeros(),
            blocked: None,
            steps: 0,
        }
    }

    /// Rotor inertia per joint (kg·m²).
    #[must_use]
    pub fn with_inertia(mut self, inertia: f64) -> Self {
        self.inertia = inertia;
        self
    }

    /// Viscous joint friction (Nm·s/rad).
    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Symmetric actuator torque limit (Nm).
    #[must_use]
    pub fn with_torque_limit(mut self, limit: f64) -> Self {
        self.torque_limit = limit;
        self
    }

    /// Initial joint angles.
    #[must_use]
    pub fn with_joint_angles(mut self, angles: JointVector) -> Self {
        self.angles = angles;
        self
    }

    /// Body linear velocity reported to the controller.
    #[must_use]
    pub fn with_body_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Body roll, pitch, yaw reported to the controller.
    #[must_use]
    pub fn with_orientation(mut self, rpy: Vector3<f64>) -> Self {
        self.orientation_rpy = rpy;
        self
    }

    pub fn set_body_velocity(&mut self, velocity: Vector3<f64>) {
        self.linear_velocity = velocity;
    }

    pub fn set_orientation(&mut self, rpy: Vector3<f64>) {
        self.orientation_rpy = rpy;
    }

    /// Make every IK request for `leg` fail, or clear with `None`.
    pub fn block_leg(&mut self, leg: Option<Leg>) {
        self.blocked = leg;
    }

    /// Number of completed [`QuadrupedRobot::step`] calls.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    pub const fn kinematics(&self) -> &LegKinematics {
        &self.kinematics
    }
}

impl InverseKinematics for KinematicQuadruped {
    fn inverse_kinematics(
        &self,
        leg: Leg,
        target: &Vector3<f64>,
    ) -> Result<Vector3<f64>, KinematicsError> {
        if self.blocked == Some(leg) {
            return Err(KinematicsError::UnreachableTarget {
                leg,
                target: *target,
            });
        }
        self.kinematics.solve(leg, target)
    }
}

impl QuadrupedRobot for KinematicQuadruped {
    fn motor_angles(&self) -> JointVector {
        self.angles
    }

    fn motor_velocities(&self) -> JointVector {
        self.velocities
    }

    fn base_orientation_rpy(&self) -> Vector3<f64> {
        self.orientation_rpy
    }

    fn base_linear_velocity(&self) -> Vector3<f64> {
        self.linear_velocity
    }

    fn motor_torques(&self) -> JointVector {
        self.applied
    }

    fn jacobian_and_position(&self, leg: Leg) -> (Matrix3<f64>, Vector3<f64>) {
        self.kinematics.jacobian_and_position(leg, &leg_joints(&self.angles, leg))
    }

    fn step(&mut self, tau: &TorqueCommand) {
        let limit = self.torque_limit;
        self.applied = tau.0.map(|t| t.clamp(-limit, limit));
        // Semi-implicit Euler.
        let accel = (self.applied - self.velocities * self.damping) / self.inertia;
        self.velocities += accel * self.dt;
        self.angles += self.velocities * self.dt;
        self.steps += 1;
    }
}
