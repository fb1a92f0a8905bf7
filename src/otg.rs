use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::{OtgError, Status};
use crate::input_parameter::{InputParameter, Interface};
use crate::output_parameter::{KinematicState, OutputParameter};
use crate::trajectory::Trajectory;

/// An axis counts as arrived within `FINISHED_TOL * max(1, |target|)`.
pub(crate) const FINISHED_TOL: f64 = 1e-6;

/// Sample times this close (in cycles) below the duration snap onto it.
const TIME_SNAP: f64 = 1e-9;

/// Last calculated trajectory and where the caller currently is on it.
#[derive(Clone, Debug)]
struct Cache<const DOFS: usize> {
    /// Input the trajectory was calculated from
    input: InputParameter<DOFS>,
    /// `input` with the current state advanced to the last sample, i.e. what
    /// a caller feeding the output back will pass in the next cycle
    resumed: InputParameter<DOFS>,
    trajectory: Arc<Trajectory<DOFS>>,
    time: f64,
}

/// Online trajectory generator for `DOFS` degrees of freedom.
///
/// Call [`update`](Otg::update) once per control cycle. A new trajectory
/// is only calculated when the input changed; otherwise the cached one is
/// sampled one cycle further.
#[derive(Clone, Debug)]
pub struct Otg<const DOFS: usize> {
    delta_time: f64,
    cache: Option<Cache<DOFS>>,
}

impl<const DOFS: usize> Otg<DOFS> {
    pub const DEGREES_OF_FREEDOM: usize = DOFS;

    /// Creates a generator for a control cycle of `delta_time` seconds.
    ///
    /// A non-positive or non-finite cycle makes every `update` fail with
    /// [`OtgError::InvalidInput`].
    pub fn new(delta_time: f64) -> Self {
        Self {
            delta_time,
            cache: None,
        }
    }

    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }

    /// Drops the cached trajectory, the next `update` recalculates.
    pub fn reset(&mut self) {
        self.cache = None;
    }

    /// Checks the input without touching the generator state.
    pub fn validate_input(&self, input: &InputParameter<DOFS>) -> bool {
        self.check_delta_time().is_ok() && input.validate().is_ok()
    }

    fn check_delta_time(&self) -> Result<(), OtgError> {
        if self.delta_time.is_finite() && self.delta_time > 0.0 {
            Ok(())
        } else {
            Err(OtgError::InvalidInput(format!(
                "delta_time {} must be finite and positive",
                self.delta_time
            )))
        }
    }

    /// Advances one control cycle and writes the state to command into `output`.
    ///
    /// On error the output keeps its previous state and the cache is cleared,
    /// so a later call with corrected input starts from scratch.
    pub fn update(
        &mut self,
        input: &InputParameter<DOFS>,
        output: &mut OutputParameter<DOFS>,
    ) -> Result<Status, OtgError> {
        let start = Instant::now();
        let result = self.step(input, output);
        output.calculation_duration = start.elapsed();

        if let Err(err) = &result {
            warn!(%err, "trajectory update failed");
            self.cache = None;
        }
        result
    }

    fn step(
        &mut self,
        input: &InputParameter<DOFS>,
        output: &mut OutputParameter<DOFS>,
    ) -> Result<Status, OtgError> {
        output.new_calculation = false;
        self.check_delta_time()?;
        input.validate()?;

        let mut cache = match self.cache.take() {
            // Caller fed the last output back: continue along the trajectory
            Some(cache) if cache.resumed == *input => cache,
            // Same request as the one calculated: replay it from the start
            Some(cache) if cache.input == *input => Cache {
                resumed: *input,
                time: 0.0,
                ..cache
            },
            _ => {
                let trajectory = Trajectory::calculate(input, self.delta_time)?;
                debug!(
                    duration = trajectory.duration(),
                    independent_min_durations = ?trajectory.independent_min_durations(),
                    "calculated new trajectory"
                );
                output.new_calculation = true;
                Cache {
                    input: *input,
                    resumed: *input,
                    trajectory: Arc::new(trajectory),
                    time: 0.0,
                }
            }
        };

        let duration = cache.trajectory.duration();
        cache.time += self.delta_time;
        if cache.time < duration && duration - cache.time <= TIME_SNAP * self.delta_time {
            cache.time = duration;
        }

        let state = cache.trajectory.at_time(cache.time);
        let finite = state
            .position
            .iter()
            .chain(state.velocity.iter())
            .chain(state.acceleration.iter())
            .all(|x| x.is_finite());
        if !finite {
            return Err(OtgError::Other(format!(
                "trajectory sample at {} s is not finite",
                cache.time
            )));
        }

        output.new_position = state.position;
        output.new_velocity = state.velocity;
        output.new_acceleration = state.acceleration;
        output.trajectory = Arc::clone(&cache.trajectory);
        output.time = cache.time;

        let status = if cache.time >= duration && Self::arrived(input, &state) {
            Status::Finished
        } else {
            Status::Working
        };

        output.pass_to_input(&mut cache.resumed);
        self.cache = Some(cache);
        Ok(status)
    }

    /// Every enabled axis of the sampled `state` is at its target.
    fn arrived(input: &InputParameter<DOFS>, state: &KinematicState<DOFS>) -> bool {
        let close = |value: f64, target: f64| (value - target).abs() <= FINISHED_TOL * target.abs().max(1.0);
        (0..DOFS).filter(|&dof| input.enabled[dof]).all(|dof| {
            let (p, v, a) = (state.position[dof], state.velocity[dof], state.acceleration[dof]);
            let position_ok = input.interface == Interface::Velocity || close(p, input.target_position[dof]);
            position_ok && close(v, input.target_velocity[dof]) && close(a, input.target_acceleration[dof])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn trapezoid() -> InputParameter<1> {
        let mut input = InputParameter::new();
        input.target_position = [10.0];
        input.max_velocity = [1.0];
        input.max_acceleration = [1.0];
        input.max_jerk = [1.0];
        input
    }

    #[test]
    fn first_update_calculates() {
        let mut otg = Otg::new(0.01);
        let mut output = OutputParameter::new();
        assert_eq!(otg.update(&trapezoid(), &mut output), Ok(Status::Working));
        assert!(output.new_calculation);
        assert!((output.time - 0.01).abs() < 1e-12);
        assert!(output.new_position[0] > 0.0);
    }

    #[test]
    fn feedback_continues_cached_trajectory() {
        let mut otg = Otg::new(0.01);
        let mut output = OutputParameter::new();
        let mut input = trapezoid();
        otg.update(&input, &mut output).unwrap();
        output.pass_to_input(&mut input);
        otg.update(&input, &mut output).unwrap();
        assert!(!output.new_calculation);
        assert!((output.time - 0.02).abs() < 1e-12);
    }

    #[test]
    fn invalid_cycle_time_is_rejected() {
        let mut otg = Otg::new(0.0);
        let mut output = OutputParameter::new();
        assert!(!otg.validate_input(&trapezoid()));
        let err = otg.update(&trapezoid(), &mut output).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn reset_forces_recalculation() {
        let mut otg = Otg::new(0.01);
        let mut output = OutputParameter::new();
        let input = trapezoid();
        otg.update(&input, &mut output).unwrap();
        otg.reset();
        otg.update(&input, &mut output).unwrap();
        assert!(output.new_calculation);
    }
}
