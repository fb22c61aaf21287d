//! Network variants: STN, STNU and PSTN.
//!
//! The three classes share the distance-graph core and differ only in how
//! inter-timepoint edges are installed and how a task's absolute windows are
//! derived from its pickup window. Both behaviours live behind the
//! [`Variant`] trait so the core stays free of variant-specific branches.

use std::fmt::Debug;

use super::edge::{ConstraintSpec, ContingentKind};
use super::node::NodeKind;
use crate::task::{Task, TaskError, TaskRequest, TimepointConstraint, TimepointName};

/// Duration estimates are turned into bounded intervals `[mu - 2*sigma,
/// mu + 2*sigma]` when the variant does not keep the full distribution.
const BOUNDED_SIGMAS: f64 = 2.0;

/// Behaviour that distinguishes the three network classes.
pub trait Variant: Debug + Clone + Copy + Default + PartialEq + Send + Sync + 'static {
    /// Wire name of the variant.
    const NAME: &'static str;

    /// Constraint to install from a timepoint of `kind` to its successor in
    /// the task chain (`start -> pickup`, `pickup -> delivery`,
    /// `delivery -> start of next`).
    ///
    /// Durations missing from the task fall back to a zero-mean estimate.
    fn intertimepoint_constraint(kind: NodeKind, task: &Task) -> ConstraintSpec;

    /// Derives the three absolute windows of a task from its pickup window
    /// and duration estimates.
    fn timepoint_windows(
        r_earliest_pickup: f64,
        r_latest_pickup: f64,
        travel_time: &crate::task::InterTimepointConstraint,
        work_time: &crate::task::InterTimepointConstraint,
    ) -> Result<[TimepointConstraint; 3], TaskError>;
}

fn mean_of(task: &Task, name: crate::task::DurationName) -> (f64, f64) {
    task.inter_timepoint_constraint(name)
        .map(|c| (c.mean, c.standard_dev))
        .unwrap_or((0.0, 0.0))
}

/// Simple Temporal Network: every constraint is a requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stn;

impl Variant for Stn {
    const NAME: &'static str = "stn";

    fn intertimepoint_constraint(kind: NodeKind, task: &Task) -> ConstraintSpec {
        match kind {
            NodeKind::Start => {
                let (mean, _) = mean_of(task, crate::task::DurationName::TravelTime);
                ConstraintSpec::requirement(mean, mean)
            }
            NodeKind::Pickup => {
                let (mean, _) = mean_of(task, crate::task::DurationName::WorkTime);
                ConstraintSpec::requirement(mean, mean)
            }
            // Wait between tasks: no forced gap, no upper bound.
            _ => ConstraintSpec::requirement(0.0, f64::INFINITY),
        }
    }

    fn timepoint_windows(
        r_earliest_pickup: f64,
        r_latest_pickup: f64,
        travel_time: &crate::task::InterTimepointConstraint,
        work_time: &crate::task::InterTimepointConstraint,
    ) -> Result<[TimepointConstraint; 3], TaskError> {
        Ok([
            TimepointConstraint::new(
                TimepointName::Start,
                r_earliest_pickup - travel_time.mean,
                r_latest_pickup - travel_time.mean,
            )?,
            TimepointConstraint::new(TimepointName::Pickup, r_earliest_pickup, r_latest_pickup)?,
            TimepointConstraint::new(
                TimepointName::Delivery,
                r_earliest_pickup + work_time.mean,
                r_latest_pickup + work_time.mean,
            )?,
        ])
    }
}

/// STN with Uncertainty: uncontrollable durations become bounded contingent
/// intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stnu;

impl Variant for Stnu {
    const NAME: &'static str = "stnu";

    fn intertimepoint_constraint(kind: NodeKind, task: &Task) -> ConstraintSpec {
        match kind {
            NodeKind::Start => {
                let (mean, std_dev) = mean_of(task, crate::task::DurationName::TravelTime);
                if std_dev == 0.0 {
                    ConstraintSpec::requirement(0.0, 0.0)
                } else {
                    ConstraintSpec::contingent(
                        mean - BOUNDED_SIGMAS * std_dev,
                        mean + BOUNDED_SIGMAS * std_dev,
                        ContingentKind::Bounded,
                    )
                }
            }
            NodeKind::Pickup => {
                let (mean, std_dev) = mean_of(task, crate::task::DurationName::WorkTime);
                ConstraintSpec::contingent(
                    mean - BOUNDED_SIGMAS * std_dev,
                    mean + BOUNDED_SIGMAS * std_dev,
                    ContingentKind::Bounded,
                )
            }
            _ => ConstraintSpec::requirement(0.0, f64::INFINITY),
        }
    }

    fn timepoint_windows(
        r_earliest_pickup: f64,
        r_latest_pickup: f64,
        travel_time: &crate::task::InterTimepointConstraint,
        work_time: &crate::task::InterTimepointConstraint,
    ) -> Result<[TimepointConstraint; 3], TaskError> {
        // The start window widens by the work-time deviation, mirroring the
        // reference derivation.
        let spread = BOUNDED_SIGMAS * work_time.standard_dev;
        Ok([
            TimepointConstraint::new(
                TimepointName::Start,
                r_earliest_pickup - (travel_time.mean - spread),
                r_latest_pickup - (travel_time.mean + spread),
            )?,
            TimepointConstraint::new(TimepointName::Pickup, r_earliest_pickup, r_latest_pickup)?,
            TimepointConstraint::new(
                TimepointName::Delivery,
                r_earliest_pickup + work_time.mean - spread,
                r_latest_pickup + work_time.mean - spread,
            )?,
        ])
    }
}

/// Probabilistic STN: uncontrollable durations carry full distributions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pstn;

impl Pstn {
    /// A degenerate distribution (sigma 0) collapses to a point requirement.
    fn duration_constraint(mean: f64, std_dev: f64) -> ConstraintSpec {
        if std_dev == 0.0 {
            ConstraintSpec::requirement(mean, mean)
        } else {
            ConstraintSpec::contingent(
                0.0,
                f64::INFINITY,
                ContingentKind::Normal { mu: mean, sigma: std_dev },
            )
        }
    }
}

impl Variant for Pstn {
    const NAME: &'static str = "pstn";

    fn intertimepoint_constraint(kind: NodeKind, task: &Task) -> ConstraintSpec {
        match kind {
            NodeKind::Start => {
                let (mean, std_dev) = mean_of(task, crate::task::DurationName::TravelTime);
                Self::duration_constraint(mean, std_dev)
            }
            NodeKind::Pickup => {
                let (mean, std_dev) = mean_of(task, crate::task::DurationName::WorkTime);
                Self::duration_constraint(mean, std_dev)
            }
            _ => ConstraintSpec::requirement(0.0, f64::INFINITY),
        }
    }

    fn timepoint_windows(
        r_earliest_pickup: f64,
        r_latest_pickup: f64,
        travel_time: &crate::task::InterTimepointConstraint,
        work_time: &crate::task::InterTimepointConstraint,
    ) -> Result<[TimepointConstraint; 3], TaskError> {
        let spread = BOUNDED_SIGMAS * work_time.standard_dev;
        Ok([
            TimepointConstraint::new(
                TimepointName::Start,
                r_earliest_pickup - (travel_time.mean - spread),
                f64::INFINITY,
            )?,
            TimepointConstraint::new(TimepointName::Pickup, r_earliest_pickup, r_latest_pickup)?,
            TimepointConstraint::new(TimepointName::Delivery, 0.0, f64::INFINITY)?,
        ])
    }
}

/// Builds a [`Task`] from an ingestion record using the variant-specific
/// window derivation.
pub fn task_from_request<V: Variant>(request: &TaskRequest) -> Result<Task, TaskError> {
    let windows = V::timepoint_windows(
        request.earliest_pickup,
        request.latest_pickup,
        &request.travel_time,
        &request.work_time,
    )?;
    let mut task = Task::new(
        request.task_id.clone(),
        windows.to_vec(),
        vec![request.travel_time, request.work_time],
    )?;
    task.pickup_action_id = request.pickup_action_id.clone();
    task.delivery_action_id = request.delivery_action_id.clone();
    Ok(task)
}
