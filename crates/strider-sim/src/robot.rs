//! Sensor/actuator boundary of the simulated robot.

use nalgebra::{Matrix3, Vector3};
use strider_control::kinematics::InverseKinematics;
use strider_core::types::{JointVector, Leg, RobotKinematicState, TorqueCommand};

/// A quadruped the control loop can read from and command.
///
/// All data is fixed-size. [`QuadrupedRobot::step`] advances the simulator by
/// exactly one fixed timestep.
pub trait QuadrupedRobot: InverseKinematics {
    /// Joint angles (rad), leg-major.
    fn motor_angles(&self) -> JointVector;

    /// Joint velocities (rad/s), leg-major.
    fn motor_velocities(&self) -> JointVector;

    /// Body roll, pitch, yaw (rad).
    fn base_orientation_rpy(&self) -> Vector3<f64>;

    /// Body linear velocity (m/s).
    fn base_linear_velocity(&self) -> Vector3<f64>;

    /// Torques the actuators actually applied on the last step (Nm).
    fn motor_torques(&self) -> JointVector;

    /// Foot Jacobian and foot position of `leg` in its leg frame.
    fn jacobian_and_position(&self, leg: Leg) -> (Matrix3<f64>, Vector3<f64>);

    /// Apply torques and advance one timestep.
    fn step(&mut self, tau: &TorqueCommand);

    /// Read every sensor into one snapshot.
    fn snapshot(&self) -> RobotKinematicState {
        let mut state = RobotKinematicState {
            joint_angles: self.motor_angles(),
            joint_velocities: self.motor_velocities(),
            orientation_rpy: self.base_orientation_rpy(),
            linear_velocity: self.base_linear_velocity(),
            ..Default::default()
        };
        for leg in Leg::ALL {
            let (jacobian, foot) = self.jacobian_and_position(leg);
            state.jacobians[leg.index()] = jacobian;
            state.foot_positions[leg.index()] = foot;
        }
        state
    }
}
