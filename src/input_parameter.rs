use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OtgError;
use crate::profile::AxisProblem;

/// What the target of an axis describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interface {
    /// Reach the target position with the target velocity and acceleration.
    #[default]
    Position,
    /// Reach and hold the target velocity and acceleration, position is free.
    Velocity,
}

/// How the durations of the enabled axes are tied together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Synchronization {
    /// Every enabled axis finishes at the same time.
    #[default]
    Time,
    /// Synchronize only when the independent durations differ noticeably.
    TimeIfNecessary,
    /// Every axis runs its own time-optimal profile.
    None,
}

/// Whether the trajectory duration may be any real number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationDiscretization {
    #[default]
    Continuous,
    /// Round the duration up to a whole number of control cycles.
    Discrete,
}

/// Kinematic bounds of a single axis.
///
/// The minimum bounds default to the negated maximum bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    pub max_velocity: f64,
    pub min_velocity: f64,
    pub max_acceleration: f64,
    pub min_acceleration: f64,
    pub max_jerk: f64,
}

impl Limits {
    /// Symmetric bounds.
    pub fn new(max_velocity: f64, max_acceleration: f64, max_jerk: f64) -> Self {
        Self {
            max_velocity,
            min_velocity: -max_velocity,
            max_acceleration,
            min_acceleration: -max_acceleration,
            max_jerk,
        }
    }
}

/// Everything the generator needs to know about one control cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputParameter<const DOFS: usize> {
    pub current_position: [f64; DOFS],
    pub current_velocity: [f64; DOFS],
    pub current_acceleration: [f64; DOFS],

    pub target_position: [f64; DOFS],
    pub target_velocity: [f64; DOFS],
    pub target_acceleration: [f64; DOFS],

    pub max_velocity: [f64; DOFS],
    pub max_acceleration: [f64; DOFS],
    pub max_jerk: [f64; DOFS],

    /// Asymmetric lower velocity bound; `-max_velocity` when unset.
    pub min_velocity: Option<[f64; DOFS]>,
    /// Asymmetric lower acceleration bound; `-max_acceleration` when unset.
    pub min_acceleration: Option<[f64; DOFS]>,

    /// Disabled axes are neither validated nor synchronized, they keep
    /// moving with their current acceleration.
    pub enabled: [bool; DOFS],

    pub interface: Interface,
    pub synchronization: Synchronization,
    pub duration_discretization: DurationDiscretization,

    /// Lower bound on the trajectory duration in seconds.
    pub minimum_duration: Option<f64>,
}

impl<const DOFS: usize> Default for InputParameter<DOFS> {
    fn default() -> Self {
        Self {
            current_position: [0.0; DOFS],
            current_velocity: [0.0; DOFS],
            current_acceleration: [0.0; DOFS],
            target_position: [0.0; DOFS],
            target_velocity: [0.0; DOFS],
            target_acceleration: [0.0; DOFS],
            max_velocity: [0.0; DOFS],
            max_acceleration: [0.0; DOFS],
            max_jerk: [0.0; DOFS],
            min_velocity: None,
            min_acceleration: None,
            enabled: [true; DOFS],
            interface: Interface::default(),
            synchronization: Synchronization::default(),
            duration_discretization: DurationDiscretization::default(),
            minimum_duration: None,
        }
    }
}

impl<const DOFS: usize> InputParameter<DOFS> {
    pub const DEGREES_OF_FREEDOM: usize = DOFS;

    /// All-zero state and limits, every axis enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds of one axis with the optional minimums resolved.
    pub fn limits(&self, dof: usize) -> Limits {
        Limits {
            max_velocity: self.max_velocity[dof],
            min_velocity: self.min_velocity.map_or(-self.max_velocity[dof], |v| v[dof]),
            max_acceleration: self.max_acceleration[dof],
            min_acceleration: self
                .min_acceleration
                .map_or(-self.max_acceleration[dof], |a| a[dof]),
            max_jerk: self.max_jerk[dof],
        }
    }

    pub(crate) fn axis(&self, dof: usize) -> AxisProblem {
        AxisProblem {
            p0: self.current_position[dof],
            v0: self.current_velocity[dof],
            a0: self.current_acceleration[dof],
            pf: self.target_position[dof],
            vf: self.target_velocity[dof],
            af: self.target_acceleration[dof],
            limits: self.limits(dof),
            interface: self.interface,
        }
    }

    /// Checks limits, targets and states, naming the first offending field.
    pub(crate) fn validate(&self) -> Result<(), OtgError> {
        let invalid = |reason: String| Err(OtgError::InvalidInput(reason));

        if let Some(minimum) = self.minimum_duration {
            if !minimum.is_finite() || minimum < 0.0 {
                return invalid(format!("minimum_duration {minimum} must be finite and non-negative"));
            }
        }

        for dof in 0..DOFS {
            let (p0, v0, a0) = (
                self.current_position[dof],
                self.current_velocity[dof],
                self.current_acceleration[dof],
            );
            if !(p0.is_finite() && v0.is_finite() && a0.is_finite()) {
                return invalid(format!("current state of dof {dof} is not finite"));
            }
            if !self.enabled[dof] {
                continue;
            }

            let limits = self.limits(dof);
            let position = self.interface == Interface::Position;

            if !(limits.max_acceleration.is_finite() && limits.max_acceleration > 0.0) {
                return invalid(format!("max_acceleration of dof {dof} must be positive"));
            }
            if !(limits.min_acceleration.is_finite() && limits.min_acceleration < 0.0) {
                return invalid(format!("min_acceleration of dof {dof} must be negative"));
            }
            if !(limits.max_jerk.is_finite() && limits.max_jerk > 0.0) {
                return invalid(format!("max_jerk of dof {dof} must be positive"));
            }
            if position {
                // A zero velocity bound pins the axis
                if !(limits.max_velocity.is_finite() && limits.max_velocity >= 0.0) {
                    return invalid(format!("max_velocity of dof {dof} must not be negative"));
                }
                if !(limits.min_velocity.is_finite() && limits.min_velocity <= 0.0) {
                    return invalid(format!("min_velocity of dof {dof} must not be positive"));
                }
            }

            let (pf, vf, af) = (
                self.target_position[dof],
                self.target_velocity[dof],
                self.target_acceleration[dof],
            );
            if (position && !pf.is_finite()) || !vf.is_finite() || !af.is_finite() {
                return invalid(format!("target state of dof {dof} is not finite"));
            }

            if position && (vf > limits.max_velocity || vf < limits.min_velocity) {
                return invalid(format!("target_velocity of dof {dof} exceeds its velocity limits"));
            }
            if af > limits.max_acceleration || af < limits.min_acceleration {
                return invalid(format!(
                    "target_acceleration of dof {dof} exceeds its acceleration limits"
                ));
            }

            // Reaching the target acceleration must not push the velocity past its bound
            if position {
                let headroom = if vf < 0.0 && self.min_velocity.is_some() {
                    vf - limits.min_velocity
                } else {
                    limits.max_velocity - vf.abs()
                };
                let max_target_acceleration = (2.0 * limits.max_jerk * headroom.max(0.0)).sqrt();
                if af.abs() > max_target_acceleration {
                    return invalid(format!(
                        "target_acceleration of dof {dof} cannot be held without exceeding the velocity limit"
                    ));
                }
            }
        }
        Ok(())
    }
}

impl<const DOFS: usize> fmt::Display for InputParameter<DOFS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inp.interface = {:?}", self.interface)?;
        writeln!(f, "inp.synchronization = {:?}", self.synchronization)?;
        writeln!(f, "inp.duration_discretization = {:?}", self.duration_discretization)?;
        writeln!(f, "inp.current_position = {:?}", self.current_position)?;
        writeln!(f, "inp.current_velocity = {:?}", self.current_velocity)?;
        writeln!(f, "inp.current_acceleration = {:?}", self.current_acceleration)?;
        writeln!(f, "inp.target_position = {:?}", self.target_position)?;
        writeln!(f, "inp.target_velocity = {:?}", self.target_velocity)?;
        writeln!(f, "inp.target_acceleration = {:?}", self.target_acceleration)?;
        writeln!(f, "inp.max_velocity = {:?}", self.max_velocity)?;
        writeln!(f, "inp.max_acceleration = {:?}", self.max_acceleration)?;
        writeln!(f, "inp.max_jerk = {:?}", self.max_jerk)?;
        if let Some(min_velocity) = &self.min_velocity {
            writeln!(f, "inp.min_velocity = {:?}", min_velocity)?;
        }
        if let Some(min_acceleration) = &self.min_acceleration {
            writeln!(f, "inp.min_acceleration = {:?}", min_acceleration)?;
        }
        if let Some(minimum_duration) = self.minimum_duration {
            writeln!(f, "inp.minimum_duration = {:?}", minimum_duration)?;
        }
        write!(f, "inp.enabled = {:?}", self.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_axis() -> InputParameter<1> {
        let mut input = InputParameter::new();
        input.target_position = [10.0];
        input.max_velocity = [1.0];
        input.max_acceleration = [1.0];
        input.max_jerk = [1.0];
        input
    }

    #[test]
    fn limits_default_to_symmetric_bounds() {
        let input = single_axis();
        assert_eq!(input.limits(0), Limits::new(1.0, 1.0, 1.0));

        let mut asymmetric = input;
        asymmetric.min_velocity = Some([-0.5]);
        asymmetric.min_acceleration = Some([-2.0]);
        let limits = asymmetric.limits(0);
        assert_eq!(limits.min_velocity, -0.5);
        assert_eq!(limits.min_acceleration, -2.0);
    }

    #[test]
    fn accepts_well_formed_input() {
        assert_eq!(single_axis().validate(), Ok(()));
    }

    #[test]
    fn rejects_negative_or_missing_limits() {
        let mut input = single_axis();
        input.max_velocity = [-1.0];
        assert!(matches!(input.validate(), Err(OtgError::InvalidInput(_))));

        let mut input = single_axis();
        input.max_jerk = [0.0];
        assert!(input.validate().is_err());

        let mut input = single_axis();
        input.min_velocity = Some([0.5]);
        assert!(input.validate().is_err());
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut input = single_axis();
        input.target_position = [f64::NAN];
        assert!(input.validate().is_err());

        let mut input = single_axis();
        input.current_velocity = [f64::INFINITY];
        assert!(input.validate().is_err());

        let mut input = single_axis();
        input.max_acceleration = [f64::INFINITY];
        assert!(input.validate().is_err());
    }

    #[test]
    fn rejects_target_acceleration_that_overshoots_velocity() {
        let mut input = single_axis();
        input.target_velocity = [0.9];
        input.target_acceleration = [0.9];
        // sqrt(2 * 1 * (1 - 0.9)) ~ 0.447
        assert!(input.validate().is_err());

        input.target_acceleration = [0.4];
        assert_eq!(input.validate(), Ok(()));
    }

    #[test]
    fn velocity_interface_ignores_velocity_and_position_targets() {
        let mut input = single_axis();
        input.interface = Interface::Velocity;
        input.max_velocity = [0.0];
        input.target_position = [f64::NAN];
        input.target_velocity = [5.0];
        assert_eq!(input.validate(), Ok(()));
    }

    #[test]
    fn disabled_axes_skip_limit_checks() {
        let mut input = InputParameter::<2>::new();
        input.max_velocity = [1.0, 0.0];
        input.max_acceleration = [1.0, 0.0];
        input.max_jerk = [1.0, 0.0];
        input.enabled = [true, false];
        assert_eq!(input.validate(), Ok(()));
    }

    #[test]
    fn display_lists_every_field() {
        let text = single_axis().to_string();
        assert!(text.contains("inp.target_position = [10.0]"));
        assert!(text.contains("inp.enabled = [true]"));
    }
}
