use std::sync::Arc;
use std::time::Duration;

use crate::input_parameter::InputParameter;
use crate::trajectory::Trajectory;

/// Position, velocity and acceleration of every axis at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KinematicState<const DOFS: usize> {
    pub position: [f64; DOFS],
    pub velocity: [f64; DOFS],
    pub acceleration: [f64; DOFS],
}

impl<const DOFS: usize> Default for KinematicState<DOFS> {
    fn default() -> Self {
        Self {
            position: [0.0; DOFS],
            velocity: [0.0; DOFS],
            acceleration: [0.0; DOFS],
        }
    }
}

/// Result of one control cycle.
#[derive(Clone, Debug)]
pub struct OutputParameter<const DOFS: usize> {
    /// State to command for the next cycle
    pub new_position: [f64; DOFS],
    pub new_velocity: [f64; DOFS],
    pub new_acceleration: [f64; DOFS],

    /// Trajectory the state was sampled from; stays valid after the engine moves on
    pub trajectory: Arc<Trajectory<DOFS>>,
    /// Sample time on `trajectory`
    pub time: f64,
    /// True if the trajectory was recalculated in this cycle
    pub new_calculation: bool,
    /// Wall-clock time spent in the cycle
    pub calculation_duration: Duration,
}

impl<const DOFS: usize> Default for OutputParameter<DOFS> {
    fn default() -> Self {
        Self {
            new_position: [0.0; DOFS],
            new_velocity: [0.0; DOFS],
            new_acceleration: [0.0; DOFS],
            trajectory: Arc::new(Trajectory::default()),
            time: 0.0,
            new_calculation: false,
            calculation_duration: Duration::ZERO,
        }
    }
}

impl<const DOFS: usize> OutputParameter<DOFS> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sampled state as one value.
    pub fn state(&self) -> KinematicState<DOFS> {
        KinematicState {
            position: self.new_position,
            velocity: self.new_velocity,
            acceleration: self.new_acceleration,
        }
    }

    /// Feeds the sampled state back as the current state of the next cycle.
    pub fn pass_to_input(&self, input: &mut InputParameter<DOFS>) {
        input.current_position = self.new_position;
        input.current_velocity = self.new_velocity;
        input.current_acceleration = self.new_acceleration;
    }
}
