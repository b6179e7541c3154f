//! Three-joint leg geometry: forward kinematics, foot Jacobian and a
//! closed-form inverse.
//!
//! Each leg has a hip abduction joint about the body x-axis followed by thigh
//! and calf joints about the (abducted) y-axis. In the leg frame, with all
//! joints at zero the foot hangs straight down at
//! `(0, side * hip_length, -(thigh_length + calf_length))`.

use std::f64::consts::{PI, TAU};

use nalgebra::{Matrix3, Rotation3, Vector3};
use strider_core::error::KinematicsError;
use strider_core::types::Leg;

/// Slack allowed on the law-of-cosines bound before a target is rejected.
const REACH_EPS: f64 = 1e-9;

/// Geometric IK contract: foot target in leg frame → joint angles.
///
/// Implementations select one kinematic branch deterministically and fail
/// with [`KinematicsError::UnreachableTarget`] outside the workspace.
pub trait InverseKinematics {
    /// Joint angles `[hip, thigh, calf]` that put the foot of `leg` at `target`.
    fn inverse_kinematics(
        &self,
        leg: Leg,
        target: &Vector3<f64>,
    ) -> Result<Vector3<f64>, KinematicsError>;
}

/// Joint origins, joint axes and foot position for one configuration, all in
/// the leg frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LegFrames {
    pub origins: [Vector3<f64>; 3],
    pub axes: [Vector3<f64>; 3],
    pub foot: Vector3<f64>,
}

/// Link lengths of one leg (m). The same geometry is used for all four legs,
/// mirrored left/right through the hip offset sign.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LegKinematics {
    pub hip_length: f64,
    pub thigh_length: f64,
    pub calf_length: f64,
}

impl Default for LegKinematics {
    fn default() -> Self {
        Self {
            hip_length: 0.0838,
            thigh_length: 0.2,
            calf_length: 0.2,
        }
    }
}

impl LegKinematics {
    /// Create from link lengths.
    pub const fn new(hip_length: f64, thigh_length: f64, calf_length: f64) -> Self {
        Self {
            hip_length,
            thigh_length,
            calf_length,
        }
    }

    /// Signed lateral hip offset for `leg`.
    pub const fn hip_offset(&self, leg: Leg) -> f64 {
        leg.side_sign() * self.hip_length
    }

    /// Joint frames for configuration `q`.
    pub fn joint_frames(&self, leg: Leg, q: &Vector3<f64>) -> LegFrames {
        let abduction = Rotation3::from_axis_angle(&Vector3::x_axis(), q[0]);
        let thigh = abduction * Rotation3::from_axis_angle(&Vector3::y_axis(), q[1]);
        let calf = thigh * Rotation3::from_axis_angle(&Vector3::y_axis(), q[2]);

        let hip_origin = Vector3::zeros();
        let thigh_origin = abduction * Vector3::new(0.0, self.hip_offset(leg), 0.0);
        let knee_origin = thigh_origin + thigh * Vector3::new(0.0, 0.0, -self.thigh_length);
        let foot = knee_origin + calf * Vector3::new(0.0, 0.0, -self.calf_length);

        let pitch_axis = abduction * Vector3::y();
        LegFrames {
            origins: [hip_origin, thigh_origin, knee_origin],
            axes: [Vector3::x(), pitch_axis, pitch_axis],
            foot,
        }
    }

    /// Foot position in the leg frame.
    pub fn forward_kinematics(&self, leg: Leg, q: &Vector3<f64>) -> Vector3<f64> {
        self.joint_frames(leg, q).foot
    }

    /// Foot linear Jacobian: column `i` is `axis_i × (foot − origin_i)`.
    pub fn jacobian(&self, leg: Leg, q: &Vector3<f64>) -> Matrix3<f64> {
        self.jacobian_and_position(leg, q).0
    }

    /// Jacobian and foot position from a single frame evaluation.
    pub fn jacobian_and_position(
        &self,
        leg: Leg,
        q: &Vector3<f64>,
    ) -> (Matrix3<f64>, Vector3<f64>) {
        let frames = self.joint_frames(leg, q);
        let mut j = Matrix3::zeros();
        for i in 0..3 {
            let col = frames.axes[i].cross(&(frames.foot - frames.origins[i]));
            j.set_column(i, &col);
        }
        (j, frames.foot)
    }

    /// Closed-form inverse kinematics on the knee-backward branch
    /// (calf angle in `[-π, 0]`, foot below the abducted hip).
    pub fn solve(&self, leg: Leg, target: &Vector3<f64>) -> Result<Vector3<f64>, KinematicsError> {
        let unreachable = || KinematicsError::UnreachableTarget {
            leg,
            target: *target,
        };
        if !target.iter().all(|v| v.is_finite()) {
            return Err(unreachable());
        }

        let (x, y, z) = (target.x, target.y, target.z);
        let hip = self.hip_offset(leg);

        // Distance from the abduction axis must cover the hip offset.
        let radial_sq = y.mul_add(y, z * z) - hip * hip;
        if radial_sq < -REACH_EPS {
            return Err(unreachable());
        }
        let sagittal_z = -radial_sq.max(0.0).sqrt();

        let (upper, lower) = (self.thigh_length, self.calf_length);
        let reach_sq = x.mul_add(x, sagittal_z * sagittal_z);
        let cos_knee = (reach_sq - upper * upper - lower * lower) / (2.0 * upper * lower);
        if !(-1.0 - REACH_EPS..=1.0 + REACH_EPS).contains(&cos_knee) || reach_sq <= REACH_EPS {
            return Err(unreachable());
        }
        let knee = -cos_knee.clamp(-1.0, 1.0).acos();

        let a = lower.mul_add(knee.cos(), upper);
        let b = lower * knee.sin();
        let thigh = (-x).atan2(-sagittal_z) - b.atan2(a);
        let abduction = z.atan2(y) - sagittal_z.atan2(hip);

        Ok(Vector3::new(wrap_angle(abduction), wrap_angle(thigh), knee))
    }
}

impl InverseKinematics for LegKinematics {
    fn inverse_kinematics(
        &self,
        leg: Leg,
        target: &Vector3<f64>,
    ) -> Result<Vector3<f64>, KinematicsError> {
        self.solve(leg, target)
    }
}

/// Wrap into `(-π, π]`.
fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_configuration(rng: &mut ChaCha8Rng) -> Vector3<f64> {
        Vector3::new(
            rng.gen_range(-0.5..0.5),
            rng.gen_range(-0.3..1.2),
            rng.gen_range(-2.4..-0.6),
        )
    }

    #[test]
    fn zero_configuration_hangs_straight_down() {
        let kin = LegKinematics::default();
        let right = kin.forward_kinematics(Leg::FrontRight, &Vector3::zeros());
        let left = kin.forward_kinematics(Leg::RearLeft, &Vector3::zeros());
        assert_relative_eq!(right, Vector3::new(0.0, -0.0838, -0.4), epsilon = 1e-12);
        assert_relative_eq!(left, Vector3::new(0.0, 0.0838, -0.4), epsilon = 1e-12);
    }

    #[test]
    fn bent_knee_shortens_leg() {
        let kin = LegKinematics::default();
        // Thigh forward by pi/4, knee back by pi/2: the calf points backwards.
        let q = Vector3::new(0.0, std::f64::consts::FRAC_PI_4, -std::f64::consts::FRAC_PI_2);
        let foot = kin.forward_kinematics(Leg::FrontLeft, &q);
        let s = std::f64::consts::FRAC_1_SQRT_2 * 0.2;
        assert_relative_eq!(foot.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(foot.z, -2.0 * s, epsilon = 1e-12);
    }

    #[test]
    fn ik_fk_round_trip_every_leg() {
        let kin = LegKinematics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for leg in Leg::ALL {
            for _ in 0..200 {
                let q = random_configuration(&mut rng);
                let target = kin.forward_kinematics(leg, &q);
                let solved = kin.inverse_kinematics(leg, &target).unwrap();
                let reached = kin.forward_kinematics(leg, &solved);
                assert_relative_eq!(reached, target, epsilon = 1e-4);
                assert_relative_eq!(solved, q, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn ik_nominal_stance() {
        let kin = LegKinematics::default();
        let target = Vector3::new(0.0, -0.0838, -0.25);
        let q = kin.solve(Leg::FrontRight, &target).unwrap();
        assert_relative_eq!(q[0], 0.0, epsilon = 1e-9);
        assert!(q[2] < 0.0, "knee should bend backwards");
        assert_relative_eq!(kin.forward_kinematics(Leg::FrontRight, &q), target, epsilon = 1e-9);
    }

    #[test]
    fn ik_rejects_out_of_reach() {
        let kin = LegKinematics::default();
        let err = kin.solve(Leg::RearRight, &Vector3::new(0.0, -0.0838, -0.5)).unwrap_err();
        assert!(matches!(
            err,
            KinematicsError::UnreachableTarget { leg: Leg::RearRight, .. }
        ));
    }

    #[test]
    fn ik_rejects_inside_hip_offset() {
        let kin = LegKinematics::default();
        assert!(kin.solve(Leg::FrontLeft, &Vector3::new(0.0, 0.0, -0.05)).is_err());
    }

    #[test]
    fn ik_rejects_non_finite() {
        let kin = LegKinematics::default();
        assert!(kin.solve(Leg::FrontLeft, &Vector3::new(f64::NAN, 0.08, -0.25)).is_err());
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let kin = LegKinematics::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let h = 1e-6;
        for leg in Leg::ALL {
            let q = random_configuration(&mut rng);
            let (j, foot) = kin.jacobian_and_position(leg, &q);
            assert_relative_eq!(foot, kin.forward_kinematics(leg, &q), epsilon = 1e-12);
            for col in 0..3 {
                let mut dq = Vector3::zeros();
                dq[col] = h;
                let numeric = (kin.forward_kinematics(leg, &(q + dq))
                    - kin.forward_kinematics(leg, &(q - dq)))
                    / (2.0 * h);
                assert_relative_eq!(j.column(col).into_owned(), numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn straight_leg_vertical_force_gives_no_pitch_torque() {
        let kin = LegKinematics::default();
        let j = kin.jacobian(Leg::FrontRight, &Vector3::zeros());
        let tau = j.transpose() * Vector3::new(0.0, 0.0, 50.0);
        assert_relative_eq!(tau[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(tau[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn wrap_angle_range() {
        assert_relative_eq!(wrap_angle(2.5 * PI), 0.5 * PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-PI), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(0.5), 0.5, epsilon = 1e-12);
    }
}
