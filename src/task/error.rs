use thiserror::Error;

use super::{DurationName, TimepointName};

/// Errors raised while constructing or mutating a task.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    #[error("window for {name} is empty or malformed: [{r_earliest_time}, {r_latest_time}]")]
    InvalidWindow {
        name: TimepointName,
        r_earliest_time: f64,
        r_latest_time: f64,
    },

    #[error("variance for {name} must be non-negative, got {variance}")]
    InvalidVariance { name: DurationName, variance: f64 },

    #[error("task already has a timepoint constraint named {name}")]
    DuplicateTimepointConstraint { name: TimepointName },

    #[error("task already has an inter-timepoint constraint named {name}")]
    DuplicateInterTimepointConstraint { name: DurationName },
}
