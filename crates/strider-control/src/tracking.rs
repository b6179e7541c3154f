//! Per-leg torque computation: joint PD, Cartesian PD and posture correction.

use nalgebra::{Matrix3, Vector3};
use strider_core::types::{LEG_COUNT, Leg, RobotKinematicState, TorqueCommand};
use tracing::debug;

/// Lever arm from body centre to the front/rear hips (m).
pub const POSTURE_HALF_LENGTH: f64 = 0.1805;

/// Lever arm from body centre to the feet, laterally (m).
pub const POSTURE_HALF_WIDTH: f64 = 0.1308;

/// Controller gains. Constant for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlGains {
    /// Joint stiffness per joint (Nm/rad).
    pub kp_joint: Vector3<f64>,
    /// Joint damping per joint (Nm·s/rad).
    pub kd_joint: Vector3<f64>,
    /// Cartesian stiffness (N/m), diagonal.
    pub kp_cartesian: Matrix3<f64>,
    /// Cartesian damping (N·s/m), diagonal.
    pub kd_cartesian: Matrix3<f64>,
    /// Posture-correction stiffness (N/m), diagonal.
    pub kp_posture: Matrix3<f64>,
}

impl Default for ControlGains {
    fn default() -> Self {
        Self {
            kp_joint: Vector3::repeat(100.0),
            kd_joint: Vector3::repeat(2.0),
            kp_cartesian: Matrix3::from_diagonal_element(50.0),
            kd_cartesian: Matrix3::from_diagonal_element(2.0),
            kp_posture: Matrix3::from_diagonal_element(100.0),
        }
    }
}

impl ControlGains {
    /// All gains zero.
    pub fn zeros() -> Self {
        Self {
            kp_joint: Vector3::zeros(),
            kd_joint: Vector3::zeros(),
            kp_cartesian: Matrix3::zeros(),
            kd_cartesian: Matrix3::zeros(),
            kp_posture: Matrix3::zeros(),
        }
    }

    /// Build from plain arrays, placing the Cartesian and posture gains on
    /// the diagonal.
    pub fn from_diagonals(
        kp_joint: [f64; 3],
        kd_joint: [f64; 3],
        kp_cartesian: [f64; 3],
        kd_cartesian: [f64; 3],
        kp_posture: [f64; 3],
    ) -> Self {
        Self {
            kp_joint: Vector3::from(kp_joint),
            kd_joint: Vector3::from(kd_joint),
            kp_cartesian: Matrix3::from_diagonal(&Vector3::from(kp_cartesian)),
            kd_cartesian: Matrix3::from_diagonal(&Vector3::from(kd_cartesian)),
            kp_posture: Matrix3::from_diagonal(&Vector3::from(kp_posture)),
        }
    }
}

/// Which contributions are summed into the torque.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlToggles {
    pub joint_pd: bool,
    pub cartesian_pd: bool,
    pub posture_correction: bool,
}

impl Default for ControlToggles {
    fn default() -> Self {
        Self {
            joint_pd: true,
            cartesian_pd: false,
            posture_correction: false,
        }
    }
}

impl ControlToggles {
    /// Every contribution on.
    pub const fn all() -> Self {
        Self {
            joint_pd: true,
            cartesian_pd: true,
            posture_correction: true,
        }
    }

    /// Every contribution off.
    pub const fn none() -> Self {
        Self {
            joint_pd: false,
            cartesian_pd: false,
            posture_correction: false,
        }
    }

    /// True if at least one contribution is on.
    pub const fn any(&self) -> bool {
        self.joint_pd || self.cartesian_pd || self.posture_correction
    }
}

/// Joint torques from a Cartesian force at the foot: `τ = Jᵀ F`.
pub fn jacobian_transpose_torques(jacobian: &Matrix3<f64>, force: &Vector3<f64>) -> Vector3<f64> {
    jacobian.tr_mul(force)
}

/// Foot target shift that levels the body.
///
/// Front and rear legs move in opposite directions for pitch, left and right
/// legs in opposite directions for roll.
pub fn posture_shift(leg: Leg, orientation_rpy: &Vector3<f64>) -> Vector3<f64> {
    let (roll, pitch) = (orientation_rpy.x, orientation_rpy.y);
    let dz = (leg.side_sign() * POSTURE_HALF_WIDTH)
        .mul_add(roll.sin(), -leg.fore_sign() * POSTURE_HALF_LENGTH * pitch.sin());
    Vector3::new(0.0, 0.0, dz)
}

/// Sums joint PD, Cartesian PD and posture correction into joint torques.
#[derive(Clone, Debug)]
pub struct TrackingController {
    gains: ControlGains,
    toggles: ControlToggles,
}

impl TrackingController {
    /// Create a controller.
    pub fn new(gains: ControlGains, toggles: ControlToggles) -> Self {
        if !toggles.any() {
            debug!("All tracking contributions disabled; torque command will be zero");
        }
        Self { gains, toggles }
    }

    /// Gains in use.
    pub const fn gains(&self) -> &ControlGains {
        &self.gains
    }

    /// Enabled contributions.
    pub const fn toggles(&self) -> &ControlToggles {
        &self.toggles
    }

    /// Joint-space PD term: `kp ⊙ (q_des − q) + kd ⊙ (−dq)`.
    pub fn joint_pd(
        &self,
        q_des: &Vector3<f64>,
        q: &Vector3<f64>,
        dq: &Vector3<f64>,
    ) -> Vector3<f64> {
        self.gains.kp_joint.component_mul(&(q_des - q)) + self.gains.kd_joint.component_mul(&(-dq))
    }

    /// Cartesian PD term: `Jᵀ (kp (p_des − p) + kd (−J dq))`.
    pub fn cartesian_pd(
        &self,
        jacobian: &Matrix3<f64>,
        p_des: &Vector3<f64>,
        p: &Vector3<f64>,
        dq: &Vector3<f64>,
    ) -> Vector3<f64> {
        let foot_velocity = jacobian * dq;
        let force =
            self.gains.kp_cartesian * (p_des - p) + self.gains.kd_cartesian * (-foot_velocity);
        jacobian_transpose_torques(jacobian, &force)
    }

    /// Posture term: `Jᵀ (kp_posture Δp)`.
    pub fn posture(
        &self,
        leg: Leg,
        jacobian: &Matrix3<f64>,
        orientation_rpy: &Vector3<f64>,
    ) -> Vector3<f64> {
        let force = self.gains.kp_posture * posture_shift(leg, orientation_rpy);
        jacobian_transpose_torques(jacobian, &force)
    }

    /// Torques for one leg given its desired joint angles and foot position.
    pub fn leg_torque(
        &self,
        leg: Leg,
        q_des: &Vector3<f64>,
        p_des: &Vector3<f64>,
        state: &RobotKinematicState,
    ) -> Vector3<f64> {
        let dq = state.leg_velocities(leg);
        let jacobian = state.jacobian(leg);
        let mut tau = Vector3::zeros();

        if self.toggles.joint_pd {
            tau += self.joint_pd(q_des, &state.leg_angles(leg), &dq);
        }
        if self.toggles.cartesian_pd {
            tau += self.cartesian_pd(jacobian, p_des, state.foot_position(leg), &dq);
        }
        if self.toggles.posture_correction {
            tau += self.posture(leg, jacobian, &state.orientation_rpy);
        }
        tau
    }

    /// Torques for all legs.
    pub fn compute(
        &self,
        desired_angles: &[Vector3<f64>; LEG_COUNT],
        desired_feet: &[Vector3<f64>; LEG_COUNT],
        state: &RobotKinematicState,
    ) -> TorqueCommand {
        let mut tau = TorqueCommand::zeros();
        for leg in Leg::ALL {
            let i = leg.index();
            tau.set_leg(leg, &self.leg_torque(leg, &desired_angles[i], &desired_feet[i], state));
        }
        tau
    }
}
