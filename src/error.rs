use thiserror::Error;

/// Outcome of a successful [`update`](crate::Otg::update) cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The trajectory is still running.
    Working,
    /// The sampled time reached the trajectory duration and every enabled
    /// axis arrived at its target.
    Finished,
}

/// Reasons why no valid trajectory could be produced in a cycle.
///
/// None of them poison the generator: the next `update` with corrected
/// input recalculates from scratch.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum OtgError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no feasible profile for degree of freedom {dof}")]
    ExecutionTimeCalculation { dof: usize },
    #[error("degree of freedom {dof} cannot be synchronized to a duration of {duration} s")]
    SynchronizationCalculation { dof: usize, duration: f64 },
    #[error("Other: {0}")]
    Other(String),
}

/// Fieldless error family, for callers that only branch on the category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ExecutionTimeCalculation,
    SynchronizationCalculation,
    Other,
}

impl OtgError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OtgError::InvalidInput(_) => ErrorKind::InvalidInput,
            OtgError::ExecutionTimeCalculation { .. } => ErrorKind::ExecutionTimeCalculation,
            OtgError::SynchronizationCalculation { .. } => ErrorKind::SynchronizationCalculation,
            OtgError::Other(_) => ErrorKind::Other,
        }
    }
}
