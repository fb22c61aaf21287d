//! Timepoints: the nodes of a temporal network.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::task::TimepointName;
use crate::Id;

/// Role of a node in the distance graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Origin of the schedule; node id 0 is reserved for it.
    #[serde(rename = "zero_timepoint")]
    Zero,
    /// Robot starts moving towards the pickup location.
    Start,
    /// Robot arrives and begins the pickup action.
    Pickup,
    /// Robot finishes the delivery action.
    Delivery,
}

impl NodeKind {
    /// The task-window name backing this node kind, if any.
    pub fn timepoint_name(&self) -> Option<TimepointName> {
        match self {
            NodeKind::Zero => None,
            NodeKind::Start => Some(TimepointName::Start),
            NodeKind::Pickup => Some(TimepointName::Pickup),
            NodeKind::Delivery => Some(TimepointName::Delivery),
        }
    }
}

impl From<TimepointName> for NodeKind {
    fn from(name: TimepointName) -> Self {
        match name {
            TimepointName::Start => NodeKind::Start,
            TimepointName::Pickup => NodeKind::Pickup,
            TimepointName::Delivery => NodeKind::Delivery,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Zero => "zero_timepoint",
            NodeKind::Start => "start",
            NodeKind::Pickup => "pickup",
            NodeKind::Delivery => "delivery",
        };
        f.write_str(name)
    }
}

/// A timepoint in the network: the owning task, the node kind, and whether
/// the timepoint has already been executed during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timepoint {
    pub task_id: Id,
    pub node_type: NodeKind,
    #[serde(default)]
    pub is_executed: bool,
}

impl Timepoint {
    pub fn new(task_id: impl Into<Id>, node_type: NodeKind) -> Self {
        Self {
            task_id: task_id.into(),
            node_type,
            is_executed: false,
        }
    }

    /// The unique schedule origin.
    pub fn zero() -> Self {
        Self::new(crate::generate_id(), NodeKind::Zero)
    }
}

impl fmt::Display for Timepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} {}", self.task_id, self.node_type)
    }
}
