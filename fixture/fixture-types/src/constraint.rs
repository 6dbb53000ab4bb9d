//! Active-constraint (virtual fixture) parameters.
//!
//! These are handed to the external haptic controller that pulls the real
//! tool toward the desired pose. The guidance engine only flips
//! [`ActiveConstraintParameters::active`]; the gains are fixed per task.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Force law used by the haptic controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConstraintMethod {
    /// Spring-damper pull toward the desired pose.
    #[default]
    ViscoElastic,
}

/// Gains and limits of the guidance force.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActiveConstraintParameters {
    /// Force law.
    pub method: ConstraintMethod,

    /// Whether guidance is currently asserted.
    pub active: bool,

    /// Maximum linear force (N).
    pub max_force: f64,

    /// Linear spring stiffness (N/m).
    pub linear_elastic_coeff: f64,

    /// Linear damping (Ns/m).
    pub linear_damping_coeff: f64,

    /// Maximum torque (Nm).
    pub max_torque: f64,

    /// Angular spring stiffness (Nm/rad).
    pub angular_elastic_coeff: f64,

    /// Angular damping (Nms/rad).
    pub angular_damping_coeff: f64,
}

impl Default for ActiveConstraintParameters {
    fn default() -> Self {
        Self {
            method: ConstraintMethod::ViscoElastic,
            active: false,
            max_force: 4.0,
            linear_elastic_coeff: 1000.0,
            linear_damping_coeff: 10.0,
            max_torque: 0.03,
            angular_elastic_coeff: 0.04,
            angular_damping_coeff: 0.002,
        }
    }
}

impl ActiveConstraintParameters {
    /// Set the linear spring-damper gains.
    #[must_use]
    pub fn with_linear(mut self, elastic: f64, damping: f64) -> Self {
        self.linear_elastic_coeff = elastic;
        self.linear_damping_coeff = damping;
        self
    }

    /// Set the angular spring-damper gains.
    #[must_use]
    pub fn with_angular(mut self, elastic: f64, damping: f64) -> Self {
        self.angular_elastic_coeff = elastic;
        self.angular_damping_coeff = damping;
        self
    }

    /// Set force and torque saturation.
    #[must_use]
    pub fn with_limits(mut self, max_force: f64, max_torque: f64) -> Self {
        self.max_force = max_force;
        self.max_torque = max_torque;
        self
    }

    /// Check that every gain and limit is finite and non-negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [
            self.max_force,
            self.linear_elastic_coeff,
            self.linear_damping_coeff,
            self.max_torque,
            self.angular_elastic_coeff,
            self.angular_damping_coeff,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_inactive() {
        let params = ActiveConstraintParameters::default();
        assert!(!params.active);
        assert_eq!(params.method, ConstraintMethod::ViscoElastic);
        assert_relative_eq!(params.max_force, 4.0);
        assert!(params.is_valid());
    }

    #[test]
    fn test_builders() {
        let params = ActiveConstraintParameters::default()
            .with_linear(500.0, 5.0)
            .with_angular(0.1, 0.01)
            .with_limits(2.0, 0.05);
        assert_relative_eq!(params.linear_elastic_coeff, 500.0);
        assert_relative_eq!(params.angular_damping_coeff, 0.01);
        assert_relative_eq!(params.max_torque, 0.05);
    }

    #[test]
    fn test_invalid_gain() {
        let params = ActiveConstraintParameters::default().with_linear(-1.0, 0.0);
        assert!(!params.is_valid());
    }

    #[test]
    fn test_non_finite_limit_is_invalid() {
        let params = ActiveConstraintParameters::default().with_limits(f64::NAN, 0.03);
        assert!(!params.is_valid());
    }
}
