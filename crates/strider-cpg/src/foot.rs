//! Map raw CPG offsets to 3-D foot targets in the leg frame.

use nalgebra::Vector3;
use strider_core::types::{LEG_COUNT, Leg};

use crate::gait::Gait;
use crate::hopf::FootOffsets;

/// Lateral distance from the leg frame origin to the foot (m).
pub const HIP_OFFSET: f64 = 0.0838;

/// Forward shift that centres the bounding stride under the hip (m).
///
/// Empirical; tuned on the robot, not derived.
pub const BOUND_FORWARD_BIAS: f64 = -0.077;

/// Stateless mapping from `(x, z)` oscillator output to foot position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootTrajectoryMapper {
    gait: Option<Gait>,
}

impl FootTrajectoryMapper {
    /// Mapper for a canonical gait, or `None` for custom topologies (no bias).
    pub const fn new(gait: Option<Gait>) -> Self {
        Self { gait }
    }

    /// Forward bias applied to `x` for a gait.
    pub const fn forward_bias(gait: Option<Gait>) -> f64 {
        match gait {
            Some(Gait::Bound) => BOUND_FORWARD_BIAS,
            Some(Gait::Trot | Gait::Pace | Gait::Walk | Gait::Pronk) | None => 0.0,
        }
    }

    /// Foot target for one leg.
    pub fn map(&self, leg: Leg, x: f64, z: f64) -> Vector3<f64> {
        Self::map_with(self.gait, leg, x, z)
    }

    /// Foot targets for all legs.
    pub fn map_all(&self, offsets: &FootOffsets) -> [Vector3<f64>; LEG_COUNT] {
        Leg::ALL.map(|leg| {
            let (x, z) = offsets.leg(leg);
            self.map(leg, x, z)
        })
    }

    /// Pure form of [`FootTrajectoryMapper::map`].
    pub fn map_with(gait: Option<Gait>, leg: Leg, x: f64, z: f64) -> Vector3<f64> {
        Vector3::new(
            x + Self::forward_bias(gait),
            leg.side_sign() * HIP_OFFSET,
            z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn lateral_offset_flips_with_side() {
        let mapper = FootTrajectoryMapper::new(Some(Gait::Trot));
        let right = mapper.map(Leg::FrontRight, 0.01, -0.25);
        let left = mapper.map(Leg::FrontLeft, 0.01, -0.25);
        assert_relative_eq!(right.y, -HIP_OFFSET);
        assert_relative_eq!(left.y, HIP_OFFSET);
        assert_relative_eq!(right.x, left.x);
        assert_relative_eq!(right.z, -0.25);
    }

    #[test]
    fn only_bound_is_biased() {
        for gait in Gait::ALL {
            let p = FootTrajectoryMapper::map_with(Some(gait), Leg::RearLeft, 0.0, -0.2);
            let expected = if gait == Gait::Bound { BOUND_FORWARD_BIAS } else { 0.0 };
            assert_relative_eq!(p.x, expected);
        }
        let custom = FootTrajectoryMapper::map_with(None, Leg::RearLeft, 0.02, -0.2);
        assert_relative_eq!(custom.x, 0.02);
    }

    #[test]
    fn map_all_follows_leg_order() {
        let offsets = FootOffsets {
            x: Vector4::new(0.1, 0.2, 0.3, 0.4),
            z: Vector4::new(-0.1, -0.2, -0.3, -0.4),
        };
        let feet = FootTrajectoryMapper::new(Some(Gait::Walk)).map_all(&offsets);
        assert_relative_eq!(feet[2], Vector3::new(0.3, -HIP_OFFSET, -0.3));
        assert_relative_eq!(feet[3], Vector3::new(0.4, HIP_OFFSET, -0.4));
    }
}
