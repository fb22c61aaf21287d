//! Task value objects: absolute release windows and probabilistic durations.
//!
//! A [`Task`] carries the temporal information needed to insert it into a
//! temporal network: one *timepoint constraint* (an absolute window relative
//! to the zero timepoint) per timepoint, and one *inter-timepoint constraint*
//! (a duration estimate with mean and variance) per leg of the task.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Id;

pub mod error;

pub use error::TaskError;

/// Names of the absolute windows a task carries, one per timepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimepointName {
    Start,
    Pickup,
    Delivery,
}

impl TimepointName {
    pub const ALL: [TimepointName; 3] = [
        TimepointName::Start,
        TimepointName::Pickup,
        TimepointName::Delivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimepointName::Start => "start",
            TimepointName::Pickup => "pickup",
            TimepointName::Delivery => "delivery",
        }
    }
}

impl fmt::Display for TimepointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the duration estimates a task carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationName {
    TravelTime,
    WorkTime,
}

impl DurationName {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationName::TravelTime => "travel_time",
            DurationName::WorkTime => "work_time",
        }
    }
}

impl fmt::Display for DurationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn round3(value: f64) -> f64 {
    if value.is_finite() {
        (value * 1000.0).round() / 1000.0
    } else {
        value
    }
}

/// Absolute execution window `[r_earliest_time, r_latest_time]` for one
/// timepoint, relative to the zero timepoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimepointConstraint {
    pub name: TimepointName,
    pub r_earliest_time: f64,
    pub r_latest_time: f64,
}

impl TimepointConstraint {
    /// Creates a window, rounded to millisecond precision.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidWindow`] if the window is empty or contains
    /// a NaN bound.
    pub fn new(name: TimepointName, r_earliest_time: f64, r_latest_time: f64) -> Result<Self, TaskError> {
        if r_earliest_time.is_nan() || r_latest_time.is_nan() || r_earliest_time > r_latest_time {
            return Err(TaskError::InvalidWindow {
                name,
                r_earliest_time,
                r_latest_time,
            });
        }
        Ok(Self {
            name,
            r_earliest_time: round3(r_earliest_time),
            r_latest_time: round3(r_latest_time),
        })
    }
}

impl fmt::Display for TimepointConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}, {}]", self.name, self.r_earliest_time, self.r_latest_time)
    }
}

/// Duration estimate between two consecutive timepoints, modelled as an
/// independent random variable with `mean` and `variance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DurationRecord")]
pub struct InterTimepointConstraint {
    pub name: DurationName,
    pub mean: f64,
    pub variance: f64,
    pub standard_dev: f64,
}

/// Wire shape of a duration estimate; `standard_dev` is derived on ingestion.
#[derive(Debug, Deserialize)]
struct DurationRecord {
    name: DurationName,
    mean: f64,
    variance: f64,
}

impl TryFrom<DurationRecord> for InterTimepointConstraint {
    type Error = TaskError;

    fn try_from(record: DurationRecord) -> Result<Self, Self::Error> {
        InterTimepointConstraint::new(record.name, record.mean, record.variance)
    }
}

impl InterTimepointConstraint {
    /// Creates a duration estimate, rounded to millisecond precision.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidVariance`] if `variance` is negative or NaN.
    pub fn new(name: DurationName, mean: f64, variance: f64) -> Result<Self, TaskError> {
        if variance.is_nan() || variance < 0.0 {
            return Err(TaskError::InvalidVariance { name, variance });
        }
        Ok(Self {
            name,
            mean: round3(mean),
            variance: round3(variance),
            standard_dev: round3(variance.sqrt()),
        })
    }

    /// Sum of two independent durations: `(mean, variance)`.
    pub fn sum(&self, other: &Self) -> (f64, f64) {
        (self.mean + other.mean, self.variance + other.variance)
    }

    /// Difference of two independent durations: `(mean, variance)`.
    pub fn difference(&self, other: &Self) -> (f64, f64) {
        (self.mean - other.mean, self.variance + other.variance)
    }
}

impl fmt::Display for InterTimepointConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: N({}, {})", self.name, self.mean, self.standard_dev)
    }
}

/// Ingestion record for a transportation task (release window plus travel and
/// work estimates). The variant-specific window derivation turns this into a
/// full [`Task`]; see [`crate::network::task_from_request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task_id: Id,
    pub earliest_pickup: f64,
    pub latest_pickup: f64,
    pub travel_time: InterTimepointConstraint,
    pub work_time: InterTimepointConstraint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_action_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_action_id: Option<Id>,
}

/// A schedulable transportation task.
///
/// # Invariants
///
/// - At most one timepoint constraint and one inter-timepoint constraint per
///   recognised name.
/// - Every window satisfies `r_earliest_time <= r_latest_time` and every
///   duration has `variance >= 0` (enforced by the constraint constructors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Id,
    timepoint_constraints: Vec<TimepointConstraint>,
    inter_timepoint_constraints: Vec<InterTimepointConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_action_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_action_id: Option<Id>,
}

impl Task {
    /// Creates a task from its constraints.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::DuplicateTimepointConstraint`] or
    /// [`TaskError::DuplicateInterTimepointConstraint`] if two constraints
    /// share a name.
    pub fn new(
        task_id: impl Into<Id>,
        timepoint_constraints: Vec<TimepointConstraint>,
        inter_timepoint_constraints: Vec<InterTimepointConstraint>,
    ) -> Result<Self, TaskError> {
        for (index, constraint) in timepoint_constraints.iter().enumerate() {
            if timepoint_constraints[..index].iter().any(|c| c.name == constraint.name) {
                return Err(TaskError::DuplicateTimepointConstraint { name: constraint.name });
            }
        }
        for (index, constraint) in inter_timepoint_constraints.iter().enumerate() {
            if inter_timepoint_constraints[..index].iter().any(|c| c.name == constraint.name) {
                return Err(TaskError::DuplicateInterTimepointConstraint { name: constraint.name });
            }
        }
        Ok(Self {
            task_id: task_id.into(),
            timepoint_constraints,
            inter_timepoint_constraints,
            pickup_action_id: None,
            delivery_action_id: None,
        })
    }

    pub fn timepoint_constraints(&self) -> &[TimepointConstraint] {
        &self.timepoint_constraints
    }

    pub fn inter_timepoint_constraints(&self) -> &[InterTimepointConstraint] {
        &self.inter_timepoint_constraints
    }

    /// Returns the window with the given name, if present.
    pub fn timepoint_constraint(&self, name: TimepointName) -> Option<&TimepointConstraint> {
        self.timepoint_constraints.iter().find(|c| c.name == name)
    }

    /// Returns the duration estimate with the given name, if present.
    pub fn inter_timepoint_constraint(&self, name: DurationName) -> Option<&InterTimepointConstraint> {
        self.inter_timepoint_constraints.iter().find(|c| c.name == name)
    }

    pub fn travel_time(&self) -> Option<&InterTimepointConstraint> {
        self.inter_timepoint_constraint(DurationName::TravelTime)
    }

    pub fn work_time(&self) -> Option<&InterTimepointConstraint> {
        self.inter_timepoint_constraint(DurationName::WorkTime)
    }

    /// Replaces the named window, inserting it if absent.
    pub fn update_timepoint_constraint(
        &mut self,
        name: TimepointName,
        r_earliest_time: f64,
        r_latest_time: f64,
    ) -> Result<(), TaskError> {
        let constraint = TimepointConstraint::new(name, r_earliest_time, r_latest_time)?;
        match self.timepoint_constraints.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = constraint,
            None => self.timepoint_constraints.push(constraint),
        }
        Ok(())
    }

    /// Replaces the named duration estimate, inserting it if absent.
    pub fn update_inter_timepoint_constraint(
        &mut self,
        name: DurationName,
        mean: f64,
        variance: f64,
    ) -> Result<(), TaskError> {
        let constraint = InterTimepointConstraint::new(name, mean, variance)?;
        match self.inter_timepoint_constraints.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = constraint,
            None => self.inter_timepoint_constraints.push(constraint),
        }
        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.task_id)?;
        write!(f, "TimepointConstraints:")?;
        for constraint in &self.timepoint_constraints {
            write!(f, " {}", constraint)?;
        }
        writeln!(f)?;
        write!(f, "InterTimepointConstraints:")?;
        for constraint in &self.inter_timepoint_constraints {
            write!(f, " {}", constraint)?;
        }
        Ok(())
    }
}
