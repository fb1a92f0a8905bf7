use std::error::Error;

use gnuplot::*;
use otg_motion::{OutputParameter, ScenarioConfig, Status};

const SCENARIO: &str = include_str!("two_axis.toml");

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // -----------------------
    // 1. Load the scenario
    // -----------------------
    // Pass a path to plot another two-axis scenario file
    let config = match std::env::args().nth(1) {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::from_toml_str(SCENARIO)?,
    };
    let mut input = config.to_input::<2>()?;
    let mut otg = config.generator::<2>()?;

    if !otg.validate_input(&input) {
        return Err("Scenario limits or targets are invalid. Check your values.".into());
    }
    println!("{input}");

    // --------------------------------
    // 2. Run the control loop, feeding each output back as the next input
    // --------------------------------
    let mut output = OutputParameter::new();
    let mut time_axis = Vec::new();
    let mut positions = [Vec::new(), Vec::new()];
    let mut velocities = [Vec::new(), Vec::new()];
    let mut accelerations = [Vec::new(), Vec::new()];

    loop {
        let status = otg.update(&input, &mut output)?;
        if output.new_calculation {
            tracing::info!(
                duration = output.trajectory.duration(),
                calculation_us = output.calculation_duration.as_micros() as u64,
                "new trajectory"
            );
        }

        time_axis.push(output.time);
        for dof in 0..2 {
            positions[dof].push(output.new_position[dof]);
            velocities[dof].push(output.new_velocity[dof]);
            accelerations[dof].push(output.new_acceleration[dof]);
        }

        output.pass_to_input(&mut input);
        if status == Status::Finished {
            break;
        }
    }

    let extrema = output.trajectory.position_extrema();
    for (dof, e) in extrema.iter().enumerate() {
        println!(
            "axis {dof}: position range [{:.3}, {:.3}] reached at {:.3} s / {:.3} s",
            e.min, e.max, e.t_min, e.t_max
        );
    }

    // --------------
    // 3. Plot data
    // --------------
    let mut fg = Figure::new();
    let colors = [["blue", "red", "green"], ["dark-blue", "dark-red", "dark-green"]];
    {
        let axes = fg.axes2d();
        axes.set_title("Position, Velocity, Acceleration vs. Time", &[]);
        axes.set_x_label("Time (s)", &[]);
        axes.set_y_label("Position derivatives", &[]);
        for dof in 0..2 {
            let [c_pos, c_vel, c_acc] = colors[dof];
            let (l_pos, l_vel, l_acc) = (
                format!("Position {dof}"),
                format!("Velocity {dof}"),
                format!("Acceleration {dof}"),
            );
            axes.lines(&time_axis, &positions[dof], &[Color(c_pos.into()), Caption(&l_pos)]);
            axes.lines(&time_axis, &velocities[dof], &[Color(c_vel.into()), Caption(&l_vel)]);
            axes.lines(&time_axis, &accelerations[dof], &[Color(c_acc.into()), Caption(&l_acc)]);
        }
    }

    // Attempt to show in a pop-up window (might require gnuplot installed)
    fg.show().map_err(|e| format!("Failed to display plot: {e}"))?;

    println!("Plot generated. Total motion time: {:.3} seconds.", output.trajectory.duration());
    Ok(())
}
