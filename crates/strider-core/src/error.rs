use nalgebra::Vector3;
use thiserror::Error;

use crate::types::Leg;

/// Top-level error type for the strider crates.
#[derive(Debug, Error)]
pub enum StriderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Kinematics error: {0}")]
    Kinematics(#[from] KinematicsError),
}

/// Setup-time configuration errors. Never raised mid-run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown gait: {0:?}")]
    UnknownGait(String),

    #[error("Invalid timestep: {0} (must be > 0)")]
    InvalidTimestep(f64),

    #[error("Matrix dimension mismatch: expected {expected}x{expected}, got {rows}x{cols}")]
    DimensionMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Per-tick kinematics errors.
///
/// Copy so it can be propagated out of the control loop without allocation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum KinematicsError {
    #[error("Foot target ({}, {}, {}) unreachable for leg {leg}", .target.x, .target.y, .target.z)]
    UnreachableTarget { leg: Leg, target: Vector3<f64> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strider_error_from_config_error() {
        let err = ConfigError::InvalidTimestep(-1.0);
        let strider_err: StriderError = err.into();
        assert!(matches!(strider_err, StriderError::Config(_)));
        assert!(strider_err.to_string().contains("-1"));
    }

    #[test]
    fn strider_error_from_kinematics_error() {
        let err = KinematicsError::UnreachableTarget {
            leg: Leg::RearLeft,
            target: Vector3::new(0.0, 0.0, -1.0),
        };
        let strider_err: StriderError = err.into();
        assert!(matches!(strider_err, StriderError::Kinematics(_)));
        assert!(strider_err.to_string().contains("RL"));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn kinematics_error_is_copy() {
        let err = KinematicsError::UnreachableTarget {
            leg: Leg::FrontRight,
            target: Vector3::zeros(),
        };
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::UnknownGait("gallop".into()).to_string(),
            "Unknown gait: \"gallop\""
        );
        assert_eq!(
            ConfigError::InvalidTimestep(0.0).to_string(),
            "Invalid timestep: 0 (must be > 0)"
        );
        assert_eq!(
            ConfigError::DimensionMismatch {
                expected: 4,
                rows: 3,
                cols: 4
            }
            .to_string(),
            "Matrix dimension mismatch: expected 4x4, got 3x4"
        );
        assert_eq!(
            ConfigError::invalid("mu", "must be positive").to_string(),
            "Invalid value for mu: must be positive"
        );
    }

    #[test]
    fn unreachable_target_display() {
        let err = KinematicsError::UnreachableTarget {
            leg: Leg::FrontLeft,
            target: Vector3::new(0.5, 0.0, -1.0),
        };
        assert_eq!(
            err.to_string(),
            "Foot target (0.5, 0, -1) unreachable for leg FL"
        );
    }
}
