//! Leg indexing, fixed-size joint vectors and the per-tick robot snapshot.
//!
//! Leg order throughout the workspace is FR, FL, RR, RL. Joint vectors are
//! laid out leg-major: `[hip, thigh, calf]` for leg 0, then leg 1, and so on.

use std::fmt;

use nalgebra::{Matrix3, SVector, Vector3};
use serde::{Deserialize, Serialize};

/// Number of legs.
pub const LEG_COUNT: usize = 4;

/// Number of actuated joints (3 per leg).
pub const MOTOR_COUNT: usize = 3 * LEG_COUNT;

/// One value per actuated joint, leg-major.
pub type JointVector = SVector<f64, MOTOR_COUNT>;

// ---------------------------------------------------------------------------
// Leg
// ---------------------------------------------------------------------------

/// A quadruped leg.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    FrontRight,
    FrontLeft,
    RearRight,
    RearLeft,
}

impl Leg {
    /// All legs in index order.
    pub const ALL: [Self; LEG_COUNT] = [
        Self::FrontRight,
        Self::FrontLeft,
        Self::RearRight,
        Self::RearLeft,
    ];

    /// Index into per-leg arrays.
    pub const fn index(self) -> usize {
        match self {
            Self::FrontRight => 0,
            Self::FrontLeft => 1,
            Self::RearRight => 2,
            Self::RearLeft => 3,
        }
    }

    /// Leg for an index in `0..4`.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::FrontRight),
            1 => Some(Self::FrontLeft),
            2 => Some(Self::RearRight),
            3 => Some(Self::RearLeft),
            _ => None,
        }
    }

    /// Lateral sign: body right is negative.
    pub const fn side_sign(self) -> f64 {
        match self {
            Self::FrontRight | Self::RearRight => -1.0,
            Self::FrontLeft | Self::RearLeft => 1.0,
        }
    }

    /// Fore/aft sign: front is positive.
    pub const fn fore_sign(self) -> f64 {
        match self {
            Self::FrontRight | Self::FrontLeft => 1.0,
            Self::RearRight | Self::RearLeft => -1.0,
        }
    }

    /// First joint index of this leg in a [`JointVector`].
    pub const fn joint_offset(self) -> usize {
        3 * self.index()
    }

    /// Two-letter abbreviation.
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::FrontRight => "FR",
            Self::FrontLeft => "FL",
            Self::RearRight => "RR",
            Self::RearLeft => "RL",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Read the three joints of `leg` out of a joint vector.
pub fn leg_joints(v: &JointVector, leg: Leg) -> Vector3<f64> {
    v.fixed_rows::<3>(leg.joint_offset()).into_owned()
}

// ---------------------------------------------------------------------------
// RobotKinematicState
// ---------------------------------------------------------------------------

/// Snapshot of the robot read from the simulator at the start of a tick.
///
/// Refreshed in full every tick; the controller only reads it.
#[derive(Clone, Debug, PartialEq)]
pub struct RobotKinematicState {
    /// Joint angles (rad).
    pub joint_angles: JointVector,
    /// Joint velocities (rad/s).
    pub joint_velocities: JointVector,
    /// Body roll, pitch, yaw (rad).
    pub orientation_rpy: Vector3<f64>,
    /// Body linear velocity in world frame (m/s).
    pub linear_velocity: Vector3<f64>,
    /// Foot Jacobian per leg, in leg frame.
    pub jacobians: [Matrix3<f64>; LEG_COUNT],
    /// Foot position per leg, in leg frame (m).
    pub foot_positions: [Vector3<f64>; LEG_COUNT],
}

impl Default for RobotKinematicState {
    fn default() -> Self {
        Self {
            joint_angles: JointVector::zeros(),
            joint_velocities: JointVector::zeros(),
            orientation_rpy: Vector3::zeros(),
            linear_velocity: Vector3::zeros(),
            jacobians: [Matrix3::zeros(); LEG_COUNT],
            foot_positions: [Vector3::zeros(); LEG_COUNT],
        }
    }
}

impl RobotKinematicState {
    /// Joint angles of one leg.
    pub fn leg_angles(&self, leg: Leg) -> Vector3<f64> {
        leg_joints(&self.joint_angles, leg)
    }

    /// Joint velocities of one leg.
    pub fn leg_velocities(&self, leg: Leg) -> Vector3<f64> {
        leg_joints(&self.joint_velocities, leg)
    }

    /// Foot Jacobian of one leg.
    pub fn jacobian(&self, leg: Leg) -> &Matrix3<f64> {
        &self.jacobians[leg.index()]
    }

    /// Foot position of one leg.
    pub fn foot_position(&self, leg: Leg) -> &Vector3<f64> {
        &self.foot_positions[leg.index()]
    }

    /// Foot velocity of one leg: `J · dq`.
    pub fn foot_velocity(&self, leg: Leg) -> Vector3<f64> {
        self.jacobian(leg) * self.leg_velocities(leg)
    }

    /// Magnitude of the body velocity in the ground plane (m/s).
    pub fn horizontal_speed(&self) -> f64 {
        self.linear_velocity.x.hypot(self.linear_velocity.y)
    }
}

// ---------------------------------------------------------------------------
// TorqueCommand
// ---------------------------------------------------------------------------

/// Joint torques for one tick (Nm), leg-major.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TorqueCommand(pub JointVector);

impl Default for TorqueCommand {
    fn default() -> Self {
        Self::zeros()
    }
}

impl TorqueCommand {
    /// All-zero command.
    pub fn zeros() -> Self {
        Self(JointVector::zeros())
    }

    /// Torques of one leg.
    pub fn leg(&self, leg: Leg) -> Vector3<f64> {
        leg_joints(&self.0, leg)
    }

    /// Overwrite the torques of one leg.
    pub fn set_leg(&mut self, leg: Leg, tau: &Vector3<f64>) {
        self.0.fixed_rows_mut::<3>(leg.joint_offset()).copy_from(tau);
    }

    /// Mechanical power magnitude `|tau · dq|` (W).
    pub fn power(&self, joint_velocities: &JointVector) -> f64 {
        self.0.dot(joint_velocities).abs()
    }

    /// True when every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&t| t == 0.0)
    }

    /// Copy out as a plain array for the actuator boundary.
    pub fn to_array(&self) -> [f64; MOTOR_COUNT] {
        let mut out = [0.0; MOTOR_COUNT];
        out.copy_from_slice(self.0.as_slice());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn leg_index_round_trip() {
        for (i, leg) in Leg::ALL.iter().enumerate() {
            assert_eq!(leg.index(), i);
            assert_eq!(Leg::from_index(i), Some(*leg));
        }
        assert_eq!(Leg::from_index(4), None);
    }

    #[test]
    fn leg_signs() {
        assert_relative_eq!(Leg::FrontRight.side_sign(), -1.0);
        assert_relative_eq!(Leg::FrontLeft.side_sign(), 1.0);
        assert_relative_eq!(Leg::RearRight.side_sign(), -1.0);
        assert_relative_eq!(Leg::RearLeft.side_sign(), 1.0);
        assert_relative_eq!(Leg::FrontLeft.fore_sign(), 1.0);
        assert_relative_eq!(Leg::RearLeft.fore_sign(), -1.0);
    }

    #[test]
    fn leg_display() {
        let names: Vec<String> = Leg::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["FR", "FL", "RR", "RL"]);
    }

    #[test]
    fn leg_slices_of_joint_vector() {
        let v = JointVector::from_fn(|i, _| i as f64);
        let state = RobotKinematicState {
            joint_angles: v,
            ..Default::default()
        };
        assert_eq!(state.leg_angles(Leg::RearRight), Vector3::new(6.0, 7.0, 8.0));
    }

    #[test]
    fn torque_set_leg_only_touches_that_leg() {
        let mut tau = TorqueCommand::zeros();
        tau.set_leg(Leg::FrontLeft, &Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(tau.leg(Leg::FrontLeft), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(tau.leg(Leg::FrontRight), Vector3::zeros());
        assert_eq!(tau.to_array()[3..6], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn torque_power_is_absolute() {
        let tau = TorqueCommand(JointVector::repeat(-2.0));
        let dq = JointVector::repeat(0.5);
        assert_relative_eq!(tau.power(&dq), 12.0, epsilon = 1e-12);
    }

    #[test]
    fn foot_velocity_uses_jacobian() {
        let mut state = RobotKinematicState::default();
        state.jacobians[0] = Matrix3::identity() * 2.0;
        state.joint_velocities[0] = 1.0;
        state.joint_velocities[2] = -1.0;
        assert_eq!(state.foot_velocity(Leg::FrontRight), Vector3::new(2.0, 0.0, -2.0));
    }

    #[test]
    fn horizontal_speed_ignores_vertical() {
        let state = RobotKinematicState {
            linear_velocity: Vector3::new(3.0, 4.0, 10.0),
            ..Default::default()
        };
        assert_relative_eq!(state.horizontal_speed(), 5.0, epsilon = 1e-12);
    }
}
