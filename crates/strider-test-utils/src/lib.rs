//! Shared test fixtures for Strider crates.
//!
//! Provides deterministic RNG setup and a kinematic mock quadruped that
//! stands in for a physics simulator.

pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use mocks::{KinematicQuadruped, STANDING_POSE};
pub use rng::{random_joint_vector, seeded_rng};
