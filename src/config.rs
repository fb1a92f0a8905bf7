//! Scenario files: a control cycle, policies and one table per axis.
//!
//! ```toml
//! delta_time = 0.01
//! synchronization = "time"
//!
//! [[axis]]
//! target_position = 10.0
//! max_velocity = 1.0
//! max_acceleration = 1.0
//! max_jerk = 1.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input_parameter::{DurationDiscretization, InputParameter, Interface, Synchronization};
use crate::otg::Otg;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("scenario describes {found} axes but {expected} are expected")]
    DofMismatch { expected: usize, found: usize },
    #[error("scenario is missing `{0}`")]
    Missing(&'static str),
}

/// Start state, target state and limits of one axis.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AxisConfig {
    #[serde(default)]
    pub current_position: f64,
    #[serde(default)]
    pub current_velocity: f64,
    #[serde(default)]
    pub current_acceleration: f64,
    #[serde(default)]
    pub target_position: f64,
    #[serde(default)]
    pub target_velocity: f64,
    #[serde(default)]
    pub target_acceleration: f64,
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub max_jerk: f64,
    #[serde(default)]
    pub min_velocity: Option<f64>,
    #[serde(default)]
    pub min_acceleration: Option<f64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScenarioConfig {
    /// Control cycle in seconds, required to build a generator
    #[serde(default)]
    pub delta_time: Option<f64>,
    #[serde(default)]
    pub interface: Interface,
    #[serde(default)]
    pub synchronization: Synchronization,
    #[serde(default)]
    pub duration_discretization: DurationDiscretization,
    #[serde(default)]
    pub minimum_duration: Option<f64>,
    #[serde(default, rename = "axis")]
    pub axes: Vec<AxisConfig>,
}

impl ScenarioConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        match toml::from_str(contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse scenario TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Builds the input of a `DOFS`-axis generator.
    ///
    /// Per-axis minimum bounds that are left out default to the negated maximum.
    pub fn to_input<const DOFS: usize>(&self) -> Result<InputParameter<DOFS>, ConfigError> {
        if self.axes.len() != DOFS {
            return Err(ConfigError::DofMismatch {
                expected: DOFS,
                found: self.axes.len(),
            });
        }

        let mut input = InputParameter::<DOFS>::new();
        let mut min_velocity = [0.0; DOFS];
        let mut min_acceleration = [0.0; DOFS];
        for (dof, axis) in self.axes.iter().enumerate() {
            input.current_position[dof] = axis.current_position;
            input.current_velocity[dof] = axis.current_velocity;
            input.current_acceleration[dof] = axis.current_acceleration;
            input.target_position[dof] = axis.target_position;
            input.target_velocity[dof] = axis.target_velocity;
            input.target_acceleration[dof] = axis.target_acceleration;
            input.max_velocity[dof] = axis.max_velocity;
            input.max_acceleration[dof] = axis.max_acceleration;
            input.max_jerk[dof] = axis.max_jerk;
            input.enabled[dof] = axis.enabled;
            min_velocity[dof] = axis.min_velocity.unwrap_or(-axis.max_velocity);
            min_acceleration[dof] = axis.min_acceleration.unwrap_or(-axis.max_acceleration);
        }
        if self.axes.iter().any(|axis| axis.min_velocity.is_some()) {
            input.min_velocity = Some(min_velocity);
        }
        if self.axes.iter().any(|axis| axis.min_acceleration.is_some()) {
            input.min_acceleration = Some(min_acceleration);
        }

        input.interface = self.interface;
        input.synchronization = self.synchronization;
        input.duration_discretization = self.duration_discretization;
        input.minimum_duration = self.minimum_duration;
        Ok(input)
    }

    /// Generator for the scenario's control cycle.
    pub fn generator<const DOFS: usize>(&self) -> Result<Otg<DOFS>, ConfigError> {
        let delta_time = self.delta_time.ok_or(ConfigError::Missing("delta_time"))?;
        Ok(Otg::new(delta_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
        delta_time = 0.005
        synchronization = "time_if_necessary"
        duration_discretization = "discrete"

        [[axis]]
        target_position = 1.5
        max_velocity = 2.0
        max_acceleration = 3.0
        max_jerk = 4.0
        min_velocity = -1.0

        [[axis]]
        current_velocity = 0.2
        max_velocity = 1.0
        max_acceleration = 1.0
        max_jerk = 1.0
        enabled = false
    "#;

    #[test]
    fn parses_policies_and_axes() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        assert_eq!(config.delta_time, Some(0.005));
        assert_eq!(config.interface, Interface::Position);
        assert_eq!(config.synchronization, Synchronization::TimeIfNecessary);
        assert_eq!(config.duration_discretization, DurationDiscretization::Discrete);
        assert_eq!(config.axes.len(), 2);
        assert!(!config.axes[1].enabled);
    }

    #[test]
    fn converts_to_input() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        let input = config.to_input::<2>().unwrap();
        assert_eq!(input.target_position, [1.5, 0.0]);
        assert_eq!(input.current_velocity, [0.0, 0.2]);
        assert_eq!(input.min_velocity, Some([-1.0, -1.0]));
        assert_eq!(input.min_acceleration, None);
        assert_eq!(input.enabled, [true, false]);
        assert_eq!(config.generator::<2>().unwrap().delta_time(), 0.005);
    }

    #[test]
    fn rejects_wrong_axis_count() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        assert!(matches!(
            config.to_input::<3>(),
            Err(ConfigError::DofMismatch { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn generator_needs_cycle_time() {
        let config = ScenarioConfig::from_toml_str("[[axis]]\nmax_velocity = 1.0\nmax_acceleration = 1.0\nmax_jerk = 1.0\n").unwrap();
        assert!(matches!(config.generator::<1>(), Err(ConfigError::Missing("delta_time"))));
    }

    #[test]
    fn reports_parse_errors() {
        assert!(matches!(
            ScenarioConfig::from_toml_str("synchronization = \"sometimes\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn serializes_back_to_toml() {
        let config = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(ScenarioConfig::from_toml_str(&text).unwrap(), config);
    }
}
