use thiserror::Error;

use super::node::NodeKind;
use crate::Id;

/// Errors raised by temporal-network construction and mutation.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("constraint {from} -> {to} is empty or malformed: [{lower}, {upper}]")]
    InvalidConstraint {
        from: usize,
        to: usize,
        lower: f64,
        upper: f64,
    },

    #[error("task positions start at 1, got {0}")]
    InvalidPosition(usize),

    #[error("no task at position {0}")]
    NoTaskAtPosition(usize),

    #[error("task {task_id} has no {name} timepoint constraint")]
    IncompleteTask { task_id: Id, name: crate::task::TimepointName },

    #[error("no {node_type} timepoint for task {task_id}")]
    UnknownTimepoint { task_id: Id, node_type: NodeKind },

    #[error("malformed distribution descriptor: {descriptor:?}")]
    InvalidDistribution { descriptor: String },

    #[error("malformed network payload")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Task(#[from] crate::task::TaskError),
}
