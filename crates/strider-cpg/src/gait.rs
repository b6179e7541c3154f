//! Gait topologies and default oscillator parameters.
//!
//! Each gait is defined by a per-leg phase offset `ψ` (leg order FR, FL, RR,
//! RL). The phase-offset matrix is `φ[i][j] = ψ_j − ψ_i`, so once the network
//! has locked, `θ_j − θ_i ≡ φ[i][j] (mod 2π)`.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, Matrix4, Vector4};
use serde::{Deserialize, Serialize};
use strider_core::error::ConfigError;
use strider_core::types::LEG_COUNT;

/// Supported gait patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gait {
    /// Diagonal pairs in phase: FR+RL and FL+RR.
    Trot,
    /// Same-side pairs in phase: FR+RR and FL+RL.
    Pace,
    /// Front pair and rear pair alternate.
    Bound,
    /// One leg at a time, a quarter cycle apart.
    Walk,
    /// All four legs together.
    Pronk,
}

impl Gait {
    /// All gaits.
    pub const ALL: [Self; 5] = [Self::Trot, Self::Pace, Self::Bound, Self::Walk, Self::Pronk];

    /// Per-leg phase offsets (FR, FL, RR, RL).
    pub const fn leg_phase_offsets(self) -> [f64; LEG_COUNT] {
        match self {
            Self::Trot => [0.0, PI, PI, 0.0],
            Self::Pace => [0.0, PI, 0.0, PI],
            Self::Bound => [0.0, 0.0, PI, PI],
            // Support order FR -> RR -> FL -> RL.
            Self::Walk => [0.0, PI, FRAC_PI_2, 3.0 * FRAC_PI_2],
            Self::Pronk => [0.0; LEG_COUNT],
        }
    }

    /// Default oscillator parameters for this gait.
    pub fn default_params(self) -> GaitParams {
        let base = GaitParams::default();
        match self {
            Self::Trot => GaitParams {
                omega_swing: 8.0 * TAU,
                omega_stance: 3.0 * TAU,
                ground_clearance: 0.07,
                ..base
            },
            Self::Pace => GaitParams {
                mu: 2.0,
                omega_swing: 6.0 * TAU,
                omega_stance: 8.0 * TAU,
                robot_height: 0.23,
                ..base
            },
            Self::Bound => GaitParams {
                mu: 2.0,
                omega_swing: 6.0 * TAU,
                omega_stance: 20.0 * TAU,
                robot_height: 0.2,
                des_step_len: 0.07,
                ground_penetration: 0.023,
                ground_clearance: 0.07,
                ..base
            },
            Self::Walk => GaitParams {
                mu: 3.0,
                omega_swing: 10.0 * TAU,
                omega_stance: 5.0 * TAU,
                ..base
            },
            Self::Pronk => GaitParams {
                omega_swing: 5.0 * TAU,
                omega_stance: 5.0 * TAU,
                ground_clearance: 0.06,
                ..base
            },
        }
    }

    /// Upper-case name, as accepted by [`Gait::from_str`].
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trot => "TROT",
            Self::Pace => "PACE",
            Self::Bound => "BOUND",
            Self::Walk => "WALK",
            Self::Pronk => "PRONK",
        }
    }
}

impl fmt::Display for Gait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Gait {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownGait(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// GaitParams
// ---------------------------------------------------------------------------

/// Numeric oscillator and foot-geometry parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaitParams {
    /// Phase velocity while `sin(θ) > 0` (rad/s).
    pub omega_swing: f64,
    /// Phase velocity otherwise (rad/s).
    pub omega_stance: f64,
    /// Amplitude parameter; the limit-cycle radius is `sqrt(mu)`.
    pub mu: f64,
    /// Amplitude convergence rate.
    pub alpha: f64,
    /// Off-diagonal coupling weight.
    pub coupling_strength: f64,
    /// Enable inter-leg coupling. With it off every oscillator runs free.
    pub couple: bool,
    /// Peak foot height above nominal during swing (m).
    pub ground_clearance: f64,
    /// Peak foot depth below nominal during stance (m).
    pub ground_penetration: f64,
    /// Half-stride scale in x (m).
    pub des_step_len: f64,
    /// Nominal hip height above the ground (m).
    pub robot_height: f64,
}

impl Default for GaitParams {
    fn default() -> Self {
        Self {
            omega_swing: TAU,
            omega_stance: TAU,
            mu: 1.0,
            alpha: 50.0,
            coupling_strength: 1.0,
            couple: true,
            ground_clearance: 0.05,
            ground_penetration: 0.01,
            des_step_len: 0.04,
            robot_height: 0.25,
        }
    }
}

impl GaitParams {
    /// Largest timestep, exclusive, at which an explicit Euler step still
    /// contracts the amplitude monotonically onto `√mu`: `1 / (2·alpha·mu)`.
    pub fn max_timestep(&self) -> f64 {
        1.0 / (2.0 * self.alpha * self.mu)
    }

    /// Largest initial amplitude, exclusive, that one Euler step of length
    /// `dt` maps to a positive value: `√(mu + 1 / (alpha·dt))`.
    pub fn max_initial_amplitude(&self, dt: f64) -> f64 {
        (self.mu + 1.0 / (self.alpha * dt)).sqrt()
    }

    /// Reject values the integrator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("mu", self.mu),
            ("alpha", self.alpha),
            ("robot_height", self.robot_height),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::invalid(field, format!("{value} must be > 0")));
            }
        }
        let non_negative = [
            ("coupling_strength", self.coupling_strength),
            ("ground_clearance", self.ground_clearance),
            ("ground_penetration", self.ground_penetration),
            ("des_step_len", self.des_step_len),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(field, format!("{value} must be >= 0")));
            }
        }
        let omegas = [("omega_swing", self.omega_swing), ("omega_stance", self.omega_stance)];
        for (field, value) in omegas {
            if !value.is_finite() {
                return Err(ConfigError::invalid(field, "must be finite"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GaitOverrides
// ---------------------------------------------------------------------------

/// Optional replacements for a gait's default parameters.
///
/// Overrides never change the gait's topology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitOverrides {
    pub omega_swing: Option<f64>,
    pub omega_stance: Option<f64>,
    pub mu: Option<f64>,
    pub alpha: Option<f64>,
    pub coupling_strength: Option<f64>,
    pub couple: Option<bool>,
    pub ground_clearance: Option<f64>,
    pub ground_penetration: Option<f64>,
    pub des_step_len: Option<f64>,
    pub robot_height: Option<f64>,
}

impl GaitOverrides {
    /// Apply the set fields on top of `params`.
    pub fn apply(&self, params: GaitParams) -> GaitParams {
        GaitParams {
            omega_swing: self.omega_swing.unwrap_or(params.omega_swing),
            omega_stance: self.omega_stance.unwrap_or(params.omega_stance),
            mu: self.mu.unwrap_or(params.mu),
            alpha: self.alpha.unwrap_or(params.alpha),
            coupling_strength: self.coupling_strength.unwrap_or(params.coupling_strength),
            couple: self.couple.unwrap_or(params.couple),
            ground_clearance: self.ground_clearance.unwrap_or(params.ground_clearance),
            ground_penetration: self.ground_penetration.unwrap_or(params.ground_penetration),
            des_step_len: self.des_step_len.unwrap_or(params.des_step_len),
            robot_height: self.robot_height.unwrap_or(params.robot_height),
        }
    }
}

// ---------------------------------------------------------------------------
// GaitConfig
// ---------------------------------------------------------------------------

/// Gait selection as it appears in configuration files.
///
/// ```toml
/// [gait]
/// gait = "BOUND"
/// mu = 1.5
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gait", rename_all = "UPPERCASE")]
pub enum GaitConfig {
    Trot(GaitOverrides),
    Pace(GaitOverrides),
    Bound(GaitOverrides),
    Walk(GaitOverrides),
    Pronk(GaitOverrides),
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self::Trot(GaitOverrides::default())
    }
}

impl GaitConfig {
    /// The selected gait and its overrides.
    pub const fn parts(&self) -> (Gait, &GaitOverrides) {
        match self {
            Self::Trot(o) => (Gait::Trot, o),
            Self::Pace(o) => (Gait::Pace, o),
            Self::Bound(o) => (Gait::Bound, o),
            Self::Walk(o) => (Gait::Walk, o),
            Self::Pronk(o) => (Gait::Pronk, o),
        }
    }

    /// Build the immutable specification.
    pub fn build(&self) -> Result<GaitSpecification, ConfigError> {
        let (gait, overrides) = self.parts();
        GaitSpecification::with_overrides(gait, overrides)
    }
}

// ---------------------------------------------------------------------------
// GaitSpecification
// ---------------------------------------------------------------------------

/// Immutable coupling topology plus parameters for one gait.
#[derive(Clone, Debug, PartialEq)]
pub struct GaitSpecification {
    name: String,
    gait: Option<Gait>,
    coupling: Matrix4<f64>,
    phase_offsets: Matrix4<f64>,
    params: GaitParams,
}

impl GaitSpecification {
    /// Canonical specification with the gait's default parameters.
    pub fn new(gait: Gait) -> Self {
        let params = gait.default_params();
        Self::canonical(gait, params)
    }

    /// Canonical topology with numeric overrides applied.
    pub fn with_overrides(gait: Gait, overrides: &GaitOverrides) -> Result<Self, ConfigError> {
        let params = overrides.apply(gait.default_params());
        params.validate()?;
        Ok(Self::canonical(gait, params))
    }

    /// Look up a gait by name, then apply overrides.
    pub fn from_name(name: &str, overrides: &GaitOverrides) -> Result<Self, ConfigError> {
        Self::with_overrides(name.parse()?, overrides)
    }

    /// Custom topology from dynamically sized matrices.
    ///
    /// Both matrices must be `4×4`; the coupling diagonal must be zero.
    pub fn custom(
        name: impl Into<String>,
        coupling: &DMatrix<f64>,
        phase_offsets: &DMatrix<f64>,
        params: GaitParams,
    ) -> Result<Self, ConfigError> {
        let coupling = to_matrix4(coupling)?;
        let phase_offsets = to_matrix4(phase_offsets)?;
        if (0..LEG_COUNT).any(|i| coupling[(i, i)] != 0.0) {
            return Err(ConfigError::invalid("coupling", "diagonal must be zero"));
        }
        if coupling.iter().chain(phase_offsets.iter()).any(|v| !v.is_finite()) {
            return Err(ConfigError::invalid("coupling", "entries must be finite"));
        }
        params.validate()?;
        Ok(Self {
            name: name.into(),
            gait: None,
            coupling,
            phase_offsets,
            params,
        })
    }

    fn canonical(gait: Gait, params: GaitParams) -> Self {
        let psi = Vector4::from(gait.leg_phase_offsets());
        let phase_offsets = Matrix4::from_fn(|i, j| psi[j] - psi[i]);
        let coupling = if params.couple {
            Matrix4::from_fn(|i, j| if i == j { 0.0 } else { params.coupling_strength })
        } else {
            Matrix4::zeros()
        };
        Self {
            name: gait.name().to_string(),
            gait: Some(gait),
            coupling,
            phase_offsets,
            params,
        }
    }

    /// Gait name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical gait, or `None` for a custom topology.
    pub const fn gait(&self) -> Option<Gait> {
        self.gait
    }

    /// Coupling-strength matrix `K`.
    pub const fn coupling(&self) -> &Matrix4<f64> {
        &self.coupling
    }

    /// Phase-offset matrix `φ`.
    pub const fn phase_offsets(&self) -> &Matrix4<f64> {
        &self.phase_offsets
    }

    /// Numeric parameters.
    pub const fn params(&self) -> &GaitParams {
        &self.params
    }
}

fn to_matrix4(m: &DMatrix<f64>) -> Result<Matrix4<f64>, ConfigError> {
    if m.nrows() != LEG_COUNT || m.ncols() != LEG_COUNT {
        return Err(ConfigError::DimensionMismatch {
            expected: LEG_COUNT,
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    Ok(Matrix4::from_fn(|i, j| m[(i, j)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wrap(angle: f64) -> f64 {
        angle.rem_euclid(TAU)
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("trot".parse::<Gait>().unwrap(), Gait::Trot);
        assert_eq!("Bound".parse::<Gait>().unwrap(), Gait::Bound);
        assert_eq!(" PRONK ".parse::<Gait>().unwrap(), Gait::Pronk);
    }

    #[test]
    fn unknown_gait_is_config_error() {
        let err = "gallop".parse::<Gait>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGait(ref s) if s == "gallop"));
        assert!(GaitSpecification::from_name("canter", &GaitOverrides::default()).is_err());
    }

    #[test]
    fn coupling_has_zero_diagonal() {
        for gait in Gait::ALL {
            let spec = GaitSpecification::new(gait);
            for i in 0..LEG_COUNT {
                assert_eq!(spec.coupling()[(i, i)], 0.0);
                assert_eq!(spec.phase_offsets()[(i, i)], 0.0);
            }
        }
    }

    #[test]
    fn phase_offsets_are_antisymmetric() {
        for gait in Gait::ALL {
            let phi = *GaitSpecification::new(gait).phase_offsets();
            assert_relative_eq!(phi, -phi.transpose(), epsilon = 1e-12);
        }
    }

    #[test]
    fn trot_topology() {
        let phi = *GaitSpecification::new(Gait::Trot).phase_offsets();
        // FR-RL in phase, FR-FL and FR-RR offset by pi.
        assert_relative_eq!(wrap(phi[(0, 3)]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(1, 2)]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(0, 1)]), PI, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(0, 2)]), PI, epsilon = 1e-12);
    }

    #[test]
    fn pace_topology() {
        let phi = *GaitSpecification::new(Gait::Pace).phase_offsets();
        assert_relative_eq!(wrap(phi[(0, 2)]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(1, 3)]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(0, 1)]), PI, epsilon = 1e-12);
    }

    #[test]
    fn bound_topology() {
        let phi = *GaitSpecification::new(Gait::Bound).phase_offsets();
        assert_relative_eq!(wrap(phi[(0, 1)]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(2, 3)]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(0, 2)]), PI, epsilon = 1e-12);
    }

    #[test]
    fn walk_quarter_cycle_sequence() {
        let phi = *GaitSpecification::new(Gait::Walk).phase_offsets();
        // FR -> RR -> FL -> RL, each a quarter cycle later.
        assert_relative_eq!(wrap(phi[(0, 2)]), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(2, 1)]), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(1, 3)]), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(wrap(phi[(3, 0)]), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn pronk_all_zero() {
        let phi = *GaitSpecification::new(Gait::Pronk).phase_offsets();
        assert_relative_eq!(phi, Matrix4::zeros());
    }

    #[test]
    fn overrides_keep_topology() {
        let overrides = GaitOverrides {
            mu: Some(1.5),
            omega_swing: Some(2.0),
            des_step_len: Some(0.05),
            ..Default::default()
        };
        let base = GaitSpecification::new(Gait::Pace);
        let spec = GaitSpecification::with_overrides(Gait::Pace, &overrides).unwrap();
        assert_eq!(spec.phase_offsets(), base.phase_offsets());
        assert_eq!(spec.coupling(), base.coupling());
        assert_relative_eq!(spec.params().mu, 1.5);
        assert_relative_eq!(spec.params().omega_swing, 2.0);
        assert_relative_eq!(spec.params().des_step_len, 0.05);
        // Untouched fields keep the gait default.
        assert_relative_eq!(spec.params().robot_height, 0.23);
    }

    #[test]
    fn decoupled_gait_has_zero_coupling() {
        let overrides = GaitOverrides {
            couple: Some(false),
            ..Default::default()
        };
        let spec = GaitSpecification::with_overrides(Gait::Trot, &overrides).unwrap();
        assert_relative_eq!(*spec.coupling(), Matrix4::zeros());
    }

    #[test]
    fn invalid_override_rejected() {
        let overrides = GaitOverrides {
            mu: Some(0.0),
            ..Default::default()
        };
        let err = GaitSpecification::with_overrides(Gait::Trot, &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "mu"));
    }

    #[test]
    fn custom_rejects_wrong_dimensions() {
        let k = DMatrix::zeros(3, 3);
        let phi = DMatrix::zeros(4, 4);
        let err = GaitSpecification::custom("tri", &k, &phi, GaitParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DimensionMismatch { expected: 4, rows: 3, cols: 3 }
        ));
    }

    #[test]
    fn custom_rejects_nonzero_diagonal() {
        let k = DMatrix::from_element(4, 4, 1.0);
        let phi = DMatrix::zeros(4, 4);
        assert!(GaitSpecification::custom("self", &k, &phi, GaitParams::default()).is_err());
    }

    #[test]
    fn custom_accepts_square_four() {
        let k = DMatrix::from_fn(4, 4, |i, j| if i == j { 0.0 } else { 0.5 });
        let phi = DMatrix::zeros(4, 4);
        let spec = GaitSpecification::custom("soft", &k, &phi, GaitParams::default()).unwrap();
        assert_eq!(spec.name(), "soft");
        assert_eq!(spec.gait(), None);
        assert_relative_eq!(spec.coupling()[(0, 1)], 0.5);
    }

    #[test]
    fn gait_config_from_toml() {
        let cfg: GaitConfig = toml::from_str("gait = \"BOUND\"\nmu = 1.5\n").unwrap();
        let spec = cfg.build().unwrap();
        assert_eq!(spec.gait(), Some(Gait::Bound));
        assert_relative_eq!(spec.params().mu, 1.5);
        assert_relative_eq!(spec.params().robot_height, 0.2);
    }

    #[test]
    fn gait_config_default_is_trot() {
        let spec = GaitConfig::default().build().unwrap();
        assert_eq!(spec.gait(), Some(Gait::Trot));
        assert_relative_eq!(spec.params().omega_swing, 8.0 * TAU);
        assert_relative_eq!(spec.params().omega_stance, 3.0 * TAU);
    }
}
