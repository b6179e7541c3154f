//! Central pattern generator for quadruped locomotion.
//!
//! Four Hopf oscillators, one per leg, are coupled so that their phases lock
//! into a gait-specific pattern. Each oscillator's amplitude and phase are
//! mapped to a foot offset in the leg frame every control tick:
//!
//! ```text
//! GaitSpecification ──► CpgIntegrator::update() ──► (x, z) per leg
//!                                                       │
//!                       FootTrajectoryMapper ◄──────────┘
//!                               │
//!                               ▼
//!                      (x, y, z) foot target per leg
//! ```
//!
//! The oscillator network is integrated with explicit forward Euler at a fixed
//! timestep.

pub mod foot;
pub mod gait;
pub mod hopf;

pub use foot::{BOUND_FORWARD_BIAS, FootTrajectoryMapper, HIP_OFFSET};
pub use gait::{Gait, GaitConfig, GaitOverrides, GaitParams, GaitSpecification};
pub use hopf::{CpgIntegrator, FootOffsets, INITIAL_AMPLITUDE, OscillatorState};
