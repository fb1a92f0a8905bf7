use crate::error::{OtgError, Status};
use crate::input_parameter::InputParameter;
use crate::otg::Otg;
use crate::output_parameter::OutputParameter;

/// Common surface of all per-cycle trajectory generators.
///
/// Control loops written against this trait can swap the generator
/// implementation without further changes.
pub trait TrajectoryGenerator<const DOFS: usize> {
    /// Control cycle in seconds.
    fn delta_time(&self) -> f64;

    fn degrees_of_freedom(&self) -> usize {
        DOFS
    }

    /// Advances one control cycle.
    fn update(
        &mut self,
        input: &InputParameter<DOFS>,
        output: &mut OutputParameter<DOFS>,
    ) -> Result<Status, OtgError>;
}

impl<const DOFS: usize> TrajectoryGenerator<DOFS> for Otg<DOFS> {
    fn delta_time(&self) -> f64 {
        Otg::delta_time(self)
    }

    fn update(
        &mut self,
        input: &InputParameter<DOFS>,
        output: &mut OutputParameter<DOFS>,
    ) -> Result<Status, OtgError> {
        Otg::update(self, input, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Jumps straight to the target, enough to exercise the trait contract.
    struct Teleport {
        delta_time: f64,
    }

    impl TrajectoryGenerator<1> for Teleport {
        fn delta_time(&self) -> f64 {
            self.delta_time
        }

        fn update(&mut self, input: &InputParameter<1>, output: &mut OutputParameter<1>) -> Result<Status, OtgError> {
            output.new_position = input.target_position;
            output.new_velocity = input.target_velocity;
            output.new_acceleration = input.target_acceleration;
            Ok(Status::Finished)
        }
    }

    fn run_until_finished<G: TrajectoryGenerator<1>>(generator: &mut G, input: &InputParameter<1>) -> (usize, f64) {
        let mut input = *input;
        let mut output = OutputParameter::new();
        for cycle in 1..=100_000 {
            if generator.update(&input, &mut output) == Ok(Status::Finished) {
                return (cycle, output.new_position[0]);
            }
            output.pass_to_input(&mut input);
        }
        (usize::MAX, output.new_position[0])
    }

    #[test]
    fn generators_are_interchangeable() {
        let mut input = InputParameter::new();
        input.target_position = [1.0];
        input.max_velocity = [1.0];
        input.max_acceleration = [1.0];
        input.max_jerk = [1.0];

        let mut otg = Otg::new(0.01);
        let mut teleport = Teleport { delta_time: 0.01 };
        assert_eq!(otg.degrees_of_freedom(), teleport.degrees_of_freedom());
        assert_eq!(TrajectoryGenerator::delta_time(&otg), teleport.delta_time());

        let (otg_cycles, otg_end) = run_until_finished(&mut otg, &input);
        let (teleport_cycles, teleport_end) = run_until_finished(&mut teleport, &input);
        assert!(otg_cycles > teleport_cycles);
        assert!((otg_end - teleport_end).abs() < 1e-6);
    }
}
