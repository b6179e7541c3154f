//! Control loop driving a quadruped through a simulator boundary.
//!
//! One [`SimulationLoop::tick`] runs, strictly in order:
//!
//! 1. advance the CPG one step,
//! 2. map oscillator output to foot targets,
//! 3. snapshot the robot's sensors,
//! 4. solve IK and compute tracking torques per leg,
//! 5. update telemetry (power, cost of transport, rolling speed),
//! 6. send the torques to the actuators and advance time.
//!
//! The simulator itself is external; it is reached only through the
//! [`QuadrupedRobot`] trait.

pub mod config;
pub mod control_loop;
pub mod robot;
pub mod telemetry;

pub use config::{ControllerConfig, GainsConfig, TogglesConfig};
pub use control_loop::{SimulationLoop, TickReport};
pub use robot::QuadrupedRobot;
pub use telemetry::{DEFAULT_SPEED_WINDOW, SpeedWindow, Telemetry, TelemetrySample};
