//! # otg_motion
//!
//! Online generation of jerk-limited, time-optimal trajectories for
//! several degrees of freedom.
//!
//! Every control cycle the caller passes the current and target state of
//! each axis together with its limits; the generator returns the state to
//! command at the next sample instant. Targets and limits may change
//! between cycles.
//!
//! This library provides the following modules:
//! - `otg` for the per-cycle step controller with its trajectory cache.
//! - `trajectory` for synchronizing and evaluating the per-axis profiles.
//! - `profile` for a single axis' brake and seven constant-jerk phases.
//! - `velocity` for jerk-limited velocity legs, the building block of every profile.
//! - `brake` for bringing limit-violating start states back into bounds.
//! - `motion_polynomial` for describing a single constant-jerk phase in time.
//! - `config` for loading scenarios from TOML files.
//!
//! ```
//! use otg_motion::{InputParameter, Otg, OutputParameter, Status};
//!
//! let mut otg = Otg::<1>::new(0.01);
//! let mut input = InputParameter::new();
//! input.target_position = [1.0];
//! input.max_velocity = [1.0];
//! input.max_acceleration = [1.0];
//! input.max_jerk = [1.0];
//!
//! let mut output = OutputParameter::new();
//! while otg.update(&input, &mut output)? == Status::Working {
//!     output.pass_to_input(&mut input);
//! }
//! assert!((output.new_position[0] - 1.0).abs() < 1e-6);
//! # Ok::<(), otg_motion::OtgError>(())
//! ```
//!
//! Author: Anton Khrustalev, creapunk

pub mod brake;
pub mod config;
pub mod error;
pub mod generator;
pub mod input_parameter;
pub mod motion_polynomial;
pub mod otg;
pub mod output_parameter;
mod position;
pub mod profile;
pub mod roots;
pub mod trajectory;
pub mod velocity;

// Re-export main structs for convenience:
pub use config::{AxisConfig, ConfigError, ScenarioConfig};
pub use error::{ErrorKind, OtgError, Status};
pub use generator::TrajectoryGenerator;
pub use input_parameter::*;
pub use motion_polynomial::*;
pub use otg::Otg;
pub use output_parameter::*;
pub use profile::{Continuation, JerkSigns, PositionExtrema, Profile, ReachedLimits};
pub use trajectory::Trajectory;
