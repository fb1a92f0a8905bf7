use std::sync::OnceLock;

use tracing::trace;

use crate::error::OtgError;
use crate::input_parameter::{DurationDiscretization, InputParameter, Interface, Synchronization};
use crate::output_parameter::KinematicState;
use crate::position;
use crate::profile::{AxisProblem, PositionExtrema, Profile};
use crate::velocity;

/// Durations closer than `SYNC_ABS_TOL + SYNC_REL_TOL * max` count as equal
/// for [`Synchronization::TimeIfNecessary`].
pub(crate) const SYNC_ABS_TOL: f64 = 1e-6;
pub(crate) const SYNC_REL_TOL: f64 = 1e-6;

/// Slack against rounding a duration that already is a whole number of cycles up.
const DISCRETE_SLACK: f64 = 1e-9;

/// Stretches smaller than this (relative) reuse the minimum-time profile.
const STRETCH_TOL: f64 = 1e-9;

/// Longest minimum-time profile accepted for an axis, in seconds. Sampling
/// precision degrades on longer time axes.
pub const MAX_DURATION: f64 = 7.6e3;

/// Immutable multi-axis motion computed in one control cycle.
///
/// Each axis holds its own [`Profile`]; the trajectory lasts as long as the
/// longest one. Enabled axes that finish early stay at their target state,
/// disabled axes keep their current acceleration.
#[derive(Clone, Debug)]
pub struct Trajectory<const DOFS: usize> {
    profiles: [Profile; DOFS],
    duration: f64,
    independent_min_durations: [f64; DOFS],
    extrema: OnceLock<[PositionExtrema; DOFS]>,
}

impl<const DOFS: usize> Default for Trajectory<DOFS> {
    fn default() -> Self {
        Self {
            profiles: [Profile::default(); DOFS],
            duration: 0.0,
            independent_min_durations: [0.0; DOFS],
            extrema: OnceLock::new(),
        }
    }
}

fn minimum_time_profile(problem: &AxisProblem) -> Option<Profile> {
    match problem.interface {
        Interface::Position => position::time_optimal_profile(problem),
        Interface::Velocity => velocity::time_optimal_profile(problem),
    }
}

fn fixed_duration_profile(problem: &AxisProblem, duration: f64) -> Option<Profile> {
    match problem.interface {
        Interface::Position => position::fixed_duration_profile(problem, duration),
        Interface::Velocity => velocity::fixed_duration_profile(problem, duration),
    }
}

/// Rounds `duration` up to a whole number of control cycles.
pub(crate) fn discretize(duration: f64, delta_time: f64) -> f64 {
    ((duration / delta_time - DISCRETE_SLACK).ceil() * delta_time).max(0.0)
}

impl<const DOFS: usize> Trajectory<DOFS> {
    /// Synthesizes and synchronizes the profiles of every axis.
    ///
    /// The input is expected to be validated; `delta_time` is only needed
    /// for [`DurationDiscretization::Discrete`].
    pub fn calculate(input: &InputParameter<DOFS>, delta_time: f64) -> Result<Self, OtgError> {
        let mut problems = [None; DOFS];
        let mut profiles = [Profile::default(); DOFS];
        let mut independent_min_durations = [0.0; DOFS];

        // 1) Independent minimum-time profile of every enabled axis
        for dof in 0..DOFS {
            if !input.enabled[dof] {
                profiles[dof] = Profile::idle(
                    input.current_position[dof],
                    input.current_velocity[dof],
                    input.current_acceleration[dof],
                );
                continue;
            }
            let problem = input.axis(dof);
            let profile = minimum_time_profile(&problem)
                .filter(|profile| profile.duration() <= MAX_DURATION)
                .ok_or(OtgError::ExecutionTimeCalculation { dof })?;
            independent_min_durations[dof] = profile.duration();
            profiles[dof] = profile;
            problems[dof] = Some(problem);
        }

        // 2) Common duration, if the policy asks for one
        let enabled = || independent_min_durations.iter().zip(problems.iter()).filter(|(_, p)| p.is_some());
        let t_max = enabled().map(|(t, _)| *t).fold(0.0, f64::max);
        let t_min = enabled().map(|(t, _)| *t).fold(f64::INFINITY, f64::min);
        let synchronize = match input.synchronization {
            Synchronization::Time => true,
            Synchronization::TimeIfNecessary => t_max - t_min > SYNC_ABS_TOL + SYNC_REL_TOL * t_max,
            Synchronization::None => false,
        };

        let minimum_duration = input.minimum_duration.unwrap_or(0.0);
        let discrete = input.duration_discretization == DurationDiscretization::Discrete;
        let target_duration = |t: f64| {
            let t = t.max(minimum_duration);
            if discrete {
                discretize(t, delta_time)
            } else {
                t
            }
        };
        let common = target_duration(t_max);

        // 3) Stretch every axis that has to last longer than its minimum
        for dof in 0..DOFS {
            let Some(problem) = &problems[dof] else { continue };
            let own = independent_min_durations[dof];
            let duration = if synchronize { common } else { target_duration(own) };
            if duration - own <= STRETCH_TOL * duration.max(1.0) {
                continue;
            }
            profiles[dof] = fixed_duration_profile(problem, duration)
                .ok_or(OtgError::SynchronizationCalculation { dof, duration })?;
        }

        let duration = profiles.iter().map(Profile::duration).fold(0.0, f64::max);
        for (dof, profile) in profiles.iter().enumerate() {
            trace!(
                dof,
                duration = profile.duration(),
                brake = profile.brake_duration(),
                limits = ?profile.reached_limits(),
                jerk_signs = ?profile.jerk_signs(),
                "axis profile"
            );
        }

        Ok(Self {
            profiles,
            duration,
            independent_min_durations,
            extrema: OnceLock::new(),
        })
    }

    /// Overall duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Minimum duration of each axis before synchronization (0 for disabled axes).
    pub fn independent_min_durations(&self) -> &[f64; DOFS] {
        &self.independent_min_durations
    }

    pub fn profile(&self, dof: usize) -> &Profile {
        &self.profiles[dof]
    }

    pub fn profiles(&self) -> &[Profile; DOFS] {
        &self.profiles
    }

    /// State of every axis at `time`, clamped to `[0, duration]`.
    pub fn at_time(&self, time: f64) -> KinematicState<DOFS> {
        let mut state = KinematicState::default();
        for dof in 0..DOFS {
            let (p, v, a) = self.state_at(dof, time);
            state.position[dof] = p;
            state.velocity[dof] = v;
            state.acceleration[dof] = a;
        }
        state
    }

    /// `(pos, vel, acc)` of a single axis at `time`, clamped to `[0, duration]`.
    pub fn state_at(&self, dof: usize, time: f64) -> (f64, f64, f64) {
        self.profiles[dof].state_at(time.clamp(0.0, self.duration))
    }

    /// Global position extrema of every axis, computed on first use.
    pub fn position_extrema(&self) -> &[PositionExtrema; DOFS] {
        self.extrema.get_or_init(|| {
            let mut extrema = [PositionExtrema::default(); DOFS];
            for (out, profile) in extrema.iter_mut().zip(self.profiles.iter()) {
                *out = profile.position_extrema(self.duration);
            }
            extrema
        })
    }
}
