//! TOML-loadable controller configuration.

use serde::{Deserialize, Serialize};
use strider_control::tracking::{ControlGains, ControlToggles, TrackingController};
use strider_core::error::ConfigError;
use strider_cpg::gait::{Gait, GaitConfig};
use strider_cpg::hopf::CpgIntegrator;

use crate::telemetry::{DEFAULT_SPEED_WINDOW, Telemetry};

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_dt() -> f64 {
    0.001
}
const fn default_robot_mass() -> f64 {
    12.454
}
const fn default_speed_window() -> usize {
    DEFAULT_SPEED_WINDOW
}
const fn default_true() -> bool {
    true
}
const fn default_kp_joint() -> [f64; 3] {
    [100.0; 3]
}
const fn default_kd_joint() -> [f64; 3] {
    [2.0; 3]
}
const fn default_kp_cartesian() -> [f64; 3] {
    [50.0; 3]
}
const fn default_kd_cartesian() -> [f64; 3] {
    [2.0; 3]
}
const fn default_kp_posture() -> [f64; 3] {
    [100.0; 3]
}

// ---------------------------------------------------------------------------
// TogglesConfig
// ---------------------------------------------------------------------------

/// Which tracking contributions are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TogglesConfig {
    #[serde(default = "default_true")]
    pub joint_pd: bool,
    #[serde(default)]
    pub cartesian_pd: bool,
    #[serde(default)]
    pub posture_correction: bool,
}

impl Default for TogglesConfig {
    fn default() -> Self {
        Self {
            joint_pd: true,
            cartesian_pd: false,
            posture_correction: false,
        }
    }
}

impl From<TogglesConfig> for ControlToggles {
    fn from(cfg: TogglesConfig) -> Self {
        Self {
            joint_pd: cfg.joint_pd,
            cartesian_pd: cfg.cartesian_pd,
            posture_correction: cfg.posture_correction,
        }
    }
}

// ---------------------------------------------------------------------------
// GainsConfig
// ---------------------------------------------------------------------------

/// Controller gains as plain per-axis arrays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainsConfig {
    #[serde(default = "default_kp_joint")]
    pub kp_joint: [f64; 3],
    #[serde(default = "default_kd_joint")]
    pub kd_joint: [f64; 3],
    /// Diagonal of the Cartesian stiffness matrix.
    #[serde(default = "default_kp_cartesian")]
    pub kp_cartesian: [f64; 3],
    /// Diagonal of the Cartesian damping matrix.
    #[serde(default = "default_kd_cartesian")]
    pub kd_cartesian: [f64; 3],
    #[serde(default = "default_kp_posture")]
    pub kp_posture: [f64; 3],
}

impl Default for GainsConfig {
    fn default() -> Self {
        Self {
            kp_joint: default_kp_joint(),
            kd_joint: default_kd_joint(),
            kp_cartesian: default_kp_cartesian(),
            kd_cartesian: default_kd_cartesian(),
            kp_posture: default_kp_posture(),
        }
    }
}

impl GainsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("gains.kp_joint", &self.kp_joint),
            ("gains.kd_joint", &self.kd_joint),
            ("gains.kp_cartesian", &self.kp_cartesian),
            ("gains.kd_cartesian", &self.kd_cartesian),
            ("gains.kp_posture", &self.kp_posture),
        ];
        for (field, values) in named {
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(ConfigError::invalid(field, "gains must be finite and >= 0"));
            }
        }
        Ok(())
    }
}

impl From<GainsConfig> for ControlGains {
    fn from(cfg: GainsConfig) -> Self {
        Self::from_diagonals(
            cfg.kp_joint,
            cfg.kd_joint,
            cfg.kp_cartesian,
            cfg.kd_cartesian,
            cfg.kp_posture,
        )
    }
}

// ---------------------------------------------------------------------------
// ControllerConfig
// ---------------------------------------------------------------------------

/// Everything needed to build a [`crate::SimulationLoop`] around a robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Control and integration timestep in seconds (default: 0.001).
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Robot mass in kg, used for cost of transport.
    #[serde(default = "default_robot_mass")]
    pub robot_mass: f64,

    /// Number of samples in the rolling speed average.
    #[serde(default = "default_speed_window")]
    pub speed_window: usize,

    /// Seed for randomized initial amplitudes; `None` uses the fixed seed state.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub gait: GaitConfig,

    #[serde(default)]
    pub toggles: TogglesConfig,

    #[serde(default)]
    pub gains: GainsConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            robot_mass: default_robot_mass(),
            speed_window: default_speed_window(),
            seed: None,
            gait: GaitConfig::default(),
            toggles: TogglesConfig::default(),
            gains: GainsConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::InvalidTimestep(self.dt));
        }
        if !(self.robot_mass.is_finite() && self.robot_mass > 0.0) {
            return Err(ConfigError::invalid(
                "robot_mass",
                format!("{} must be > 0", self.robot_mass),
            ));
        }
        if self.speed_window == 0 {
            return Err(ConfigError::invalid("speed_window", "capacity must be > 0"));
        }
        self.gains.validate()?;
        let spec = self.gait.build()?;
        let max_dt = spec.params().max_timestep();
        if self.dt >= max_dt {
            return Err(ConfigError::invalid(
                "dt",
                format!("{} must be < {max_dt} for gait {}", self.dt, spec.name()),
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    ///
    /// The gait name is matched case-insensitively; an unknown name is
    /// reported as [`ConfigError::UnknownGait`].
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = content.parse()?;
        let name = table.get_mut("gait").and_then(|gait| gait.get_mut("gait"));
        if let Some(name) = name {
            if let Some(raw) = name.as_str() {
                let gait: Gait = raw.parse()?;
                *name = toml::Value::String(gait.name().to_string());
            }
        }
        let config: Self = toml::Value::Table(table).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Build the oscillator network for the configured gait.
    pub fn build_integrator(&self) -> Result<CpgIntegrator, ConfigError> {
        let spec = self.gait.build()?;
        match self.seed {
            Some(seed) => CpgIntegrator::with_seed(spec, self.dt, seed),
            None => CpgIntegrator::new(spec, self.dt),
        }
    }

    /// Build the tracking controller.
    pub fn build_controller(&self) -> TrackingController {
        TrackingController::new(self.gains.into(), self.toggles.into())
    }

    /// Build empty telemetry.
    pub fn build_telemetry(&self) -> Result<Telemetry, ConfigError> {
        Telemetry::new(self.robot_mass, self.dt, self.speed_window)
    }
}
