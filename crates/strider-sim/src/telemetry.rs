//! Per-tick locomotion telemetry.
//!
//! [`Telemetry`] records instantaneous mechanical power, cost of transport and
//! a rolling average of horizontal speed over a fixed [`SpeedWindow`].

use strider_core::error::ConfigError;
use strider_core::types::{RobotKinematicState, TorqueCommand};

/// Default number of speed samples kept.
pub const DEFAULT_SPEED_WINDOW: usize = 1000;

// ---------------------------------------------------------------------------
// SpeedWindow
// ---------------------------------------------------------------------------

/// Fixed-capacity circular buffer of speed samples, overwritten oldest-first.
#[derive(Clone, Debug)]
pub struct SpeedWindow {
    samples: Vec<f64>,
    next: usize,
    len: usize,
}

impl SpeedWindow {
    /// Create an empty window. A zero capacity is rejected.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::invalid("speed_window", "capacity must be > 0"));
        }
        Ok(Self {
            samples: vec![0.0; capacity],
            next: 0,
            len: 0,
        })
    }

    /// Append a sample, overwriting the oldest once full.
    pub fn push(&mut self, speed: f64) {
        self.samples[self.next] = speed;
        self.next = (self.next + 1) % self.samples.len();
        self.len = (self.len + 1).min(self.samples.len());
    }

    /// Number of samples held.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True before the first push.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of samples.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Mean of the samples held, or `None` when empty.
    pub fn average(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        // Until the buffer wraps, the filled slots are exactly 0..len.
        let sum: f64 = self.samples[..self.len].iter().sum();
        #[allow(clippy::cast_precision_loss)]
        Some(sum / self.len as f64)
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.next = 0;
        self.len = 0;
    }
}

impl Default for SpeedWindow {
    fn default() -> Self {
        Self {
            samples: vec![0.0; DEFAULT_SPEED_WINDOW],
            next: 0,
            len: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Values recorded for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TelemetrySample {
    /// Mechanical power `|τ · dq|` (W).
    pub energy: f64,
    /// `energy·dt / (|v|·dt·mass)`, `None` while the body is not moving.
    pub cost_of_transport: Option<f64>,
    /// Horizontal body speed (m/s).
    pub speed: f64,
}

/// Accumulated locomotion telemetry.
#[derive(Clone, Debug)]
pub struct Telemetry {
    mass: f64,
    dt: f64,
    window: SpeedWindow,
    last: Option<TelemetrySample>,
    ticks: u64,
    total_energy: f64,
    cot_sum: f64,
    cot_samples: u64,
}

impl Telemetry {
    /// Create telemetry for a robot of `mass` (kg) stepped every `dt` (s).
    pub fn new(mass: f64, dt: f64, window_capacity: usize) -> Result<Self, ConfigError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(ConfigError::invalid("robot_mass", format!("{mass} must be > 0")));
        }
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::InvalidTimestep(dt));
        }
        Ok(Self {
            mass,
            dt,
            window: SpeedWindow::new(window_capacity)?,
            last: None,
            ticks: 0,
            total_energy: 0.0,
            cot_sum: 0.0,
            cot_samples: 0,
        })
    }

    /// Record one tick from the commanded torques and the sensor snapshot.
    pub fn record(&mut self, tau: &TorqueCommand, state: &RobotKinematicState) -> TelemetrySample {
        let energy = tau.power(&state.joint_velocities);
        let denominator = state.linear_velocity.norm() * self.dt * self.mass;
        let cost_of_transport = (denominator > 0.0).then(|| energy * self.dt / denominator);
        let speed = state.horizontal_speed();

        self.window.push(speed);
        self.ticks += 1;
        self.total_energy += energy * self.dt;
        if let Some(cot) = cost_of_transport {
            self.cot_sum += cot;
            self.cot_samples += 1;
        }

        let sample = TelemetrySample {
            energy,
            cost_of_transport,
            speed,
        };
        self.last = Some(sample);
        sample
    }

    /// Timestep the cost of transport is computed with (s).
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Robot mass (kg).
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Most recent sample.
    pub const fn last(&self) -> Option<&TelemetrySample> {
        self.last.as_ref()
    }

    /// Rolling average horizontal speed.
    pub fn average_speed(&self) -> Option<f64> {
        self.window.average()
    }

    /// The speed window.
    pub const fn speed_window(&self) -> &SpeedWindow {
        &self.window
    }

    /// Ticks recorded.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Integrated mechanical energy `Σ |τ·dq|·dt` (J).
    pub const fn total_energy(&self) -> f64 {
        self.total_energy
    }

    /// Mean cost of transport over ticks where it was defined.
    pub fn mean_cost_of_transport(&self) -> Option<f64> {
        if self.cot_samples == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.cot_sum / self.cot_samples as f64)
    }

    /// Reset all statistics, keeping mass, dt and window capacity.
    pub fn reset(&mut self) {
        self.window.clear();
        self.last = None;
        self.ticks = 0;
        self.total_energy = 0.0;
        self.cot_sum = 0.0;
        self.cot_samples = 0;
    }
}
