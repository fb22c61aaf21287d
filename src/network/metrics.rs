//! Temporal quality metrics over a solved network.

use serde::{Deserialize, Serialize};

use super::node::NodeKind;
use super::variant::Variant;
use super::TemporalNetwork;

/// Criterion selecting which temporal metric to attach to a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalCriterion {
    CompletionTime,
    Makespan,
    IdleTime,
}

impl<V: Variant> TemporalNetwork<V> {
    /// Time between the earliest start of the first task and the earliest
    /// finish of the last one. `None` on a network without tasks.
    pub fn get_completion_time(&self) -> Option<f64> {
        let first = self.node_ids().find(|&id| id != 0)?;
        let last = self.node_ids().last().filter(|&id| id != 0)?;
        let start_lower_bound = -self.edge_weight(first, 0)?;
        let finish_lower_bound = -self.edge_weight(last, 0)?;
        Some(finish_lower_bound - start_lower_bound)
    }

    /// Earliest finish time of the last task. `None` on a network without
    /// tasks.
    pub fn get_makespan(&self) -> Option<f64> {
        let last = self.node_ids().last().filter(|&id| id != 0)?;
        self.edge_weight(last, 0).map(|w| -w)
    }

    /// Accumulated slack between consecutive tasks: the gap between one
    /// task's earliest delivery and the next one's earliest pickup, rounded
    /// to whole seconds.
    pub fn get_idle_time(&self) -> f64 {
        let tasks = self.get_tasks();
        tasks
            .windows(2)
            .filter_map(|pair| {
                let finish = self.get_time(&pair[0], NodeKind::Delivery, true)?;
                let start = self.get_time(&pair[1], NodeKind::Pickup, true)?;
                Some((start - finish).round())
            })
            .sum()
    }

    /// Computes the selected metric and stores it on the network.
    pub fn compute_temporal_metric(&mut self, criterion: TemporalCriterion) {
        let value = match criterion {
            TemporalCriterion::CompletionTime => self.get_completion_time(),
            TemporalCriterion::Makespan => self.get_makespan(),
            TemporalCriterion::IdleTime => Some(self.get_idle_time()),
        };
        self.set_temporal_metric(value);
    }
}
