//! Network of four coupled Hopf oscillators.
//!
//! Per leg `i`:
//!
//! ```text
//! dr_i/dt     = alpha * (mu - r_i²) * r_i
//! dθ_i/dt     = ω_i + Σ_j r_j * K[i][j] * sin(θ_j − θ_i − φ[i][j])
//! ω_i         = omega_swing if sin(θ_i) > 0, else omega_stance
//! ```
//!
//! and the foot offset in the leg frame is
//!
//! ```text
//! x_i = −des_step_len * r_i * cos(θ_i)
//! z_i = −robot_height + ground_clearance   * sin(θ_i)   if sin(θ_i) > 0
//!     = −robot_height + ground_penetration * sin(θ_i)   otherwise
//! ```

use std::f64::consts::TAU;

use nalgebra::Vector4;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strider_core::error::ConfigError;
use strider_core::types::{LEG_COUNT, Leg};
use tracing::debug;

use crate::gait::{GaitParams, GaitSpecification};

/// Amplitude every oscillator starts from.
///
/// `r = 0` is a fixed point of the amplitude equation, so the network must
/// never be seeded there.
pub const INITIAL_AMPLITUDE: f64 = 0.1;

/// Extra phase added per leg index when seeding, so no two legs start equal.
const PHASE_STAGGER: f64 = 0.01;

/// State of one oscillator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OscillatorState {
    /// Amplitude `r`, never negative.
    pub amplitude: f64,
    /// Phase `θ` in `[0, 2π)`.
    pub phase: f64,
    /// `dr/dt` from the most recent step.
    pub amplitude_rate: f64,
    /// `dθ/dt` from the most recent step.
    pub phase_rate: f64,
}

impl OscillatorState {
    /// Oscillator at rest with the given amplitude and phase.
    pub fn new(amplitude: f64, phase: f64) -> Self {
        Self {
            amplitude,
            phase: wrap_phase(phase),
            amplitude_rate: 0.0,
            phase_rate: 0.0,
        }
    }

    /// True while the foot is in the swing half-cycle.
    pub fn is_swing(&self) -> bool {
        self.phase.sin() > 0.0
    }
}

/// Foot offsets in the leg frame, one entry per leg.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootOffsets {
    pub x: Vector4<f64>,
    pub z: Vector4<f64>,
}

impl FootOffsets {
    /// `(x, z)` for one leg.
    pub fn leg(&self, leg: Leg) -> (f64, f64) {
        (self.x[leg.index()], self.z[leg.index()])
    }
}

/// Wrap an angle into `[0, 2π)`.
fn wrap_phase(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs.
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Forward-Euler integrator for the coupled oscillator network.
///
/// Owned by the control loop and advanced exactly once per tick.
#[derive(Clone, Debug)]
pub struct CpgIntegrator {
    spec: GaitSpecification,
    dt: f64,
    oscillators: [OscillatorState; LEG_COUNT],
    initial: [OscillatorState; LEG_COUNT],
    time: f64,
    ticks: u64,
}

impl CpgIntegrator {
    /// Create an integrator seeded from the gait's phase offsets.
    ///
    /// Every amplitude starts at [`INITIAL_AMPLITUDE`]; phases start at the
    /// first row of `φ` plus a small per-leg stagger.
    pub fn new(spec: GaitSpecification, dt: f64) -> Result<Self, ConfigError> {
        let phi = *spec.phase_offsets();
        let seed = std::array::from_fn(|i| {
            #[allow(clippy::cast_precision_loss)]
            let stagger = PHASE_STAGGER * i as f64;
            OscillatorState::new(INITIAL_AMPLITUDE, phi[(0, i)] + stagger)
        });
        Self::from_state(spec, dt, seed)
    }

    /// Like [`CpgIntegrator::new`], with amplitudes drawn from `(0, 0.1]`.
    ///
    /// Phases get the same per-leg stagger as `new`.
    pub fn with_seed(spec: GaitSpecification, dt: f64, seed: u64) -> Result<Self, ConfigError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let phi = *spec.phase_offsets();
        let state = std::array::from_fn(|i| {
            let amplitude = INITIAL_AMPLITUDE * (1.0 - rng.r#gen::<f64>());
            #[allow(clippy::cast_precision_loss)]
            let stagger = PHASE_STAGGER * i as f64;
            OscillatorState::new(amplitude, phi[(0, i)] + stagger)
        });
        Self::from_state(spec, dt, state)
    }

    /// Create an integrator from an explicit oscillator state.
    ///
    /// `dt` must lie below [`GaitParams::max_timestep`] and every amplitude
    /// below [`GaitParams::max_initial_amplitude`]; outside those bounds an
    /// Euler step can overshoot to `r = 0` and never recover.
    pub fn from_state(
        spec: GaitSpecification,
        dt: f64,
        state: [OscillatorState; LEG_COUNT],
    ) -> Result<Self, ConfigError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::InvalidTimestep(dt));
        }
        let params = spec.params();
        params.validate()?;
        let max_dt = params.max_timestep();
        if dt >= max_dt {
            return Err(ConfigError::invalid(
                "dt",
                format!(
                    "{dt} must be < {max_dt} for alpha = {}, mu = {}",
                    params.alpha, params.mu
                ),
            ));
        }
        let max_amplitude = params.max_initial_amplitude(dt);
        for osc in &state {
            if !(osc.amplitude.is_finite() && osc.amplitude >= 0.0) {
                return Err(ConfigError::invalid(
                    "amplitude",
                    format!("{} must be finite and >= 0", osc.amplitude),
                ));
            }
            if osc.amplitude >= max_amplitude {
                return Err(ConfigError::invalid(
                    "amplitude",
                    format!("{} must be < {max_amplitude} at dt = {dt}", osc.amplitude),
                ));
            }
            if !osc.phase.is_finite() {
                return Err(ConfigError::invalid("phase", "must be finite"));
            }
        }
        let state = state.map(|osc| OscillatorState {
            phase: wrap_phase(osc.phase),
            ..osc
        });

        debug!(
            gait = spec.name(),
            dt,
            mu = spec.params().mu,
            "Built CPG integrator"
        );

        Ok(Self {
            spec,
            dt,
            oscillators: state,
            initial: state,
            time: 0.0,
            ticks: 0,
        })
    }

    /// Advance every oscillator by one step and return the new foot offsets.
    ///
    /// All derivatives are evaluated on the pre-step state before any
    /// oscillator is written, so the coupling sees a consistent snapshot.
    pub fn update(&mut self) -> FootOffsets {
        let params = *self.spec.params();
        let coupling = self.spec.coupling();
        let phi = self.spec.phase_offsets();
        let current = self.oscillators;

        for (i, osc) in self.oscillators.iter_mut().enumerate() {
            let r = current[i].amplitude;
            let theta = current[i].phase;

            let dr = params.alpha * (params.mu - r * r) * r;

            let omega = if theta.sin() > 0.0 {
                params.omega_swing
            } else {
                params.omega_stance
            };
            let mut dtheta = omega;
            for (j, other) in current.iter().enumerate() {
                dtheta += other.amplitude
                    * coupling[(i, j)]
                    * (other.phase - theta - phi[(i, j)]).sin();
            }

            *osc = OscillatorState {
                amplitude: (r + dr * self.dt).max(0.0),
                phase: wrap_phase(theta + dtheta * self.dt),
                amplitude_rate: dr,
                phase_rate: dtheta,
            };
        }

        self.time += self.dt;
        self.ticks += 1;
        self.foot_offsets()
    }

    /// Foot offsets for the current state, without stepping.
    pub fn foot_offsets(&self) -> FootOffsets {
        let params = self.spec.params();
        let mut x = Vector4::zeros();
        let mut z = Vector4::zeros();
        for (i, osc) in self.oscillators.iter().enumerate() {
            let (xi, zi) = foot_offset(params, osc);
            x[i] = xi;
            z[i] = zi;
        }
        FootOffsets { x, z }
    }

    /// Restore the construction-time state.
    pub fn reset(&mut self) {
        self.oscillators = self.initial;
        self.time = 0.0;
        self.ticks = 0;
    }

    /// All four oscillators.
    pub const fn state(&self) -> &[OscillatorState; LEG_COUNT] {
        &self.oscillators
    }

    /// Oscillator of one leg.
    pub const fn oscillator(&self, leg: Leg) -> &OscillatorState {
        &self.oscillators[leg.index()]
    }

    /// Amplitudes `r` per leg.
    pub fn amplitudes(&self) -> Vector4<f64> {
        Vector4::from_fn(|i, _| self.oscillators[i].amplitude)
    }

    /// Phases `θ` per leg.
    pub fn phases(&self) -> Vector4<f64> {
        Vector4::from_fn(|i, _| self.oscillators[i].phase)
    }

    /// Limit-cycle amplitude, `sqrt(mu)`.
    pub fn amplitude_target(&self) -> f64 {
        self.spec.params().mu.sqrt()
    }

    /// Integration timestep (s).
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Integrated time since construction or the last reset (s).
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed updates.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The gait this network runs.
    pub const fn specification(&self) -> &GaitSpecification {
        &self.spec
    }
}

fn foot_offset(params: &GaitParams, osc: &OscillatorState) -> (f64, f64) {
    let (sin_theta, cos_theta) = osc.phase.sin_cos();
    let x = -params.des_step_len * osc.amplitude * cos_theta;
    let lift = if sin_theta > 0.0 {
        params.ground_clearance
    } else {
        params.ground_penetration
    };
    let z = lift.mul_add(sin_theta, -params.robot_height);
    (x, z)
}
