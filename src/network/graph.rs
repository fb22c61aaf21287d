//! The distance-graph core shared by all network variants.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use log::{debug, info};
use petgraph::graphmap::DiGraphMap;

use super::apsp::{self, DistanceMatrix};
use super::edge::{ConstraintInterval, ConstraintKind, ConstraintSpec, ContingentKind, EdgeData};
use super::error::NetworkError;
use super::node::{NodeKind, Timepoint};
use super::variant::{Stn, Variant};
use crate::task::Task;
use crate::Id;

/// Nodes a task occupies in the network.
pub const NODES_PER_TASK: usize = 3;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A temporal network: a directed distance graph anchored at the zero
/// timepoint, typed over its variant.
///
/// # Invariants
///
/// - Node id 0 is the unique zero timepoint; every other node carries both an
///   `i -> 0` and a `0 -> i` edge (its absolute window).
/// - Every stored constraint is materialised as two directed edges.
/// - Node ids follow the positional scheme `id(start) = 3p - 2`,
///   `id(pickup) = 3p - 1`, `id(delivery) = 3p` for the task at position `p`.
#[derive(Debug, Clone)]
pub struct TemporalNetwork<V: Variant> {
    graph: DiGraphMap<usize, EdgeData>,
    timepoints: BTreeMap<usize, Timepoint>,
    risk_metric: Option<f64>,
    temporal_metric: Option<f64>,
    _variant: PhantomData<V>,
}

impl<V: Variant> Default for TemporalNetwork<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Variant> TemporalNetwork<V> {
    /// Creates a network holding only the zero timepoint.
    pub fn new() -> Self {
        let mut network = Self {
            graph: DiGraphMap::new(),
            timepoints: BTreeMap::new(),
            risk_metric: None,
            temporal_metric: None,
            _variant: PhantomData,
        };
        network.add_node(0, Timepoint::zero());
        network
    }

    /// Wire name of the network's variant.
    pub fn variant_name(&self) -> &'static str {
        V::NAME
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Registers a timepoint under the given id. Low-level; task insertion
    /// normally drives this.
    pub fn add_node(&mut self, id: usize, timepoint: Timepoint) {
        self.graph.add_node(id);
        self.timepoints.insert(id, timepoint);
    }

    pub fn contains_node(&self, id: usize) -> bool {
        self.timepoints.contains_key(&id)
    }

    /// Node ids in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.timepoints.keys().copied()
    }

    pub fn timepoint(&self, id: usize) -> Option<&Timepoint> {
        self.timepoints.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.timepoints.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    // ------------------------------------------------------------------
    // Edges and constraints
    // ------------------------------------------------------------------

    /// Weight of the directed edge `i -> j`, if the edge exists.
    pub fn edge_weight(&self, i: usize, j: usize) -> Option<f64> {
        self.graph.edge_weight(i, j).map(|e| e.weight)
    }

    /// Weight of `i -> j` with distance-graph semantics: a node's implicit
    /// self-loop weighs 0, and a missing edge weighs `+inf`.
    pub fn get_edge_weight(&self, i: usize, j: usize) -> f64 {
        if let Some(weight) = self.edge_weight(i, j) {
            weight
        } else if i == j && self.contains_node(i) {
            0.0
        } else {
            f64::INFINITY
        }
    }

    pub fn edge_data(&self, i: usize, j: usize) -> Option<&EdgeData> {
        self.graph.edge_weight(i, j)
    }

    /// Iterates over all directed edges as `(from, to, data)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &EdgeData)> + '_ {
        self.graph.all_edges()
    }

    /// Installs a requirement constraint `i --[lower, upper]--> j`.
    ///
    /// Overwrites any existing constraint between the pair. `upper` may be
    /// `+inf`.
    ///
    /// # Errors
    ///
    /// [`NetworkError::InvalidConstraint`] on an empty or malformed interval.
    pub fn add_constraint(&mut self, i: usize, j: usize, lower: f64, upper: f64) -> Result<(), NetworkError> {
        self.insert_constraint(i, j, ConstraintSpec::requirement(lower, upper))
    }

    /// Installs a constraint with an explicit kind (requirement or
    /// contingent). Both directed edges receive the kind tag.
    pub fn insert_constraint(&mut self, i: usize, j: usize, spec: ConstraintSpec) -> Result<(), NetworkError> {
        if i == j || spec.lower.is_nan() || spec.upper.is_nan() || spec.lower > spec.upper {
            return Err(NetworkError::InvalidConstraint {
                from: i,
                to: j,
                lower: spec.lower,
                upper: spec.upper,
            });
        }
        self.graph.add_edge(i, j, EdgeData::new(spec.upper, spec.kind));
        self.graph.add_edge(j, i, EdgeData::new(-spec.lower, spec.kind));
        Ok(())
    }

    /// Installs a single directed edge, bypassing pairing. Deserialization
    /// rebuilds networks edge by edge through this.
    pub(crate) fn add_edge_raw(&mut self, i: usize, j: usize, data: EdgeData) {
        self.graph.add_edge(i, j, data);
    }

    /// Removes both directed edges of a constraint. No-op if absent.
    pub fn remove_constraint(&mut self, i: usize, j: usize) {
        self.graph.remove_edge(i, j);
        self.graph.remove_edge(j, i);
    }

    /// Tightens the weight of the directed edge `i -> j`: the stored weight
    /// is replaced only if the new one is smaller. Finite weights are kept at
    /// centisecond precision. No-op if the edge does not exist.
    pub fn update_edge_weight(&mut self, i: usize, j: usize, weight: f64) {
        let weight = if weight.is_finite() { round2(weight) } else { weight };
        if let Some(edge) = self.graph.edge_weight_mut(i, j) {
            if weight < edge.weight {
                edge.weight = weight;
            }
        }
    }

    /// Tightens every existing edge to the shortest-path distance between its
    /// endpoints.
    pub fn update_edges(&mut self, distances: &DistanceMatrix) {
        let ids: Vec<usize> = distances.ids().to_vec();
        for &i in &ids {
            for &j in &ids {
                if i != j {
                    if let Some(distance) = distances.get(i, j) {
                        self.update_edge_weight(i, j, distance);
                    }
                }
            }
        }
    }

    /// Undirected view of the stored constraints, keyed by `(i, j)` with
    /// `i < j`.
    pub fn get_constraints(&self) -> BTreeMap<(usize, usize), ConstraintInterval> {
        let mut constraints = BTreeMap::new();
        for (i, j, data) in self.graph.all_edges() {
            if i < j && self.graph.contains_edge(j, i) {
                constraints.insert(
                    (i, j),
                    ConstraintInterval {
                        lower: -self.get_edge_weight(j, i),
                        upper: data.weight,
                        kind: data.kind,
                    },
                );
            }
        }
        constraints
    }

    /// The contingent constraints, keyed by `(i, j)` with `i < j`.
    pub fn get_contingent_constraints(&self) -> BTreeMap<(usize, usize), ContingentKind> {
        let mut contingent = BTreeMap::new();
        for (i, j, data) in self.graph.all_edges() {
            if i < j {
                if let ConstraintKind::Contingent(kind) = data.kind {
                    contingent.insert((i, j), kind);
                }
            }
        }
        contingent
    }

    /// Nodes whose execution time is chosen by the environment: the targets
    /// of contingent constraints.
    pub fn get_contingent_timepoints(&self) -> Vec<usize> {
        self.get_contingent_constraints().keys().map(|&(_, j)| j).collect()
    }

    /// Shrinks a contingent interval from both ends: the lower bound grows by
    /// `low`, the upper bound drops by `high`.
    pub fn shrink_contingent_constraint(&mut self, i: usize, j: usize, low: f64, high: f64) {
        if let Some(edge) = self.graph.edge_weight_mut(i, j) {
            edge.weight -= high;
        }
        if let Some(edge) = self.graph.edge_weight_mut(j, i) {
            edge.weight -= low;
        }
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Node ids of the task at `position`: `(start, pickup, delivery)`.
    fn task_node_ids_at(position: usize) -> (usize, usize, usize) {
        let start = NODES_PER_TASK * position - 2;
        (start, start + 1, start + 2)
    }

    /// Inserts a task at `position` (positions start at 1).
    ///
    /// Installs three timepoints with their absolute windows, the two
    /// intra-task duration edges, and the wait edges tying the task to its
    /// neighbours. Nodes at or after the insertion point are relabelled
    /// upwards by 3.
    pub fn add_task(&mut self, task: &Task, position: usize) -> Result<(), NetworkError> {
        if position == 0 {
            return Err(NetworkError::InvalidPosition(position));
        }
        info!("adding task {} at position {}", task.task_id, position);

        let (start_id, pickup_id, delivery_id) = Self::task_node_ids_at(position);

        // The wait edge into the displaced successor no longer connects
        // neighbouring tasks once the new one lands between them.
        if self.graph.contains_edge(start_id - 1, start_id) && start_id - 1 != 0 {
            debug!("dropping wait constraint {} -> {}", start_id - 1, start_id);
            self.remove_constraint(start_id - 1, start_id);
        }

        self.relabel_from(start_id, NODES_PER_TASK as i64);

        for (id, kind) in [
            (start_id, NodeKind::Start),
            (pickup_id, NodeKind::Pickup),
            (delivery_id, NodeKind::Delivery),
        ] {
            self.add_node(id, Timepoint::new(task.task_id.clone(), kind));
            let name = kind.timepoint_name().expect("task timepoints are never the zero kind");
            let window = task
                .timepoint_constraint(name)
                .ok_or_else(|| NetworkError::IncompleteTask {
                    task_id: task.task_id.clone(),
                    name,
                })?;
            self.add_constraint(0, id, window.r_earliest_time, window.r_latest_time)?;
        }

        // Chain the new nodes with their neighbours, when present.
        let mut chain = vec![start_id, pickup_id, delivery_id];
        if self.contains_node(delivery_id + 1) {
            chain.push(delivery_id + 1);
        }
        if self.contains_node(start_id - 1) {
            chain.insert(0, start_id - 1);
        }

        for window in chain.windows(2) {
            let (i, j) = (window[0], window[1]);
            let kind = self.timepoints[&i].node_type;
            let spec = V::intertimepoint_constraint(kind, task);
            debug!("installing {} -> {} [{}, {}]", i, j, spec.lower, spec.upper);
            self.insert_constraint(i, j, spec)?;
        }
        Ok(())
    }

    /// Removes the task at `position`, relabelling the tail downwards by 3
    /// and re-installing the wait edge between the surviving neighbours.
    pub fn remove_task(&mut self, position: usize) -> Result<(), NetworkError> {
        if position == 0 {
            return Err(NetworkError::InvalidPosition(position));
        }
        let (start_id, pickup_id, delivery_id) = Self::task_node_ids_at(position);
        if !self.contains_node(start_id) {
            return Err(NetworkError::NoTaskAtPosition(position));
        }
        info!("removing task at position {}", position);

        let reconnect = self.contains_node(start_id - 1) && self.contains_node(delivery_id + 1);

        for id in [start_id, pickup_id, delivery_id] {
            self.graph.remove_node(id);
            self.timepoints.remove(&id);
        }

        self.relabel_from(start_id, -(NODES_PER_TASK as i64));

        if reconnect && self.timepoints[&(start_id - 1)].node_type == NodeKind::Delivery {
            self.add_constraint(start_id - 1, start_id, 0.0, f64::INFINITY)?;
        }
        Ok(())
    }

    /// Shifts every node with id `>= from_id` by `offset`, carrying all
    /// incident edges along.
    fn relabel_from(&mut self, from_id: usize, offset: i64) {
        if !self.timepoints.keys().any(|&id| id >= from_id) {
            return;
        }
        let map = |id: usize| -> usize {
            if id >= from_id {
                (id as i64 + offset) as usize
            } else {
                id
            }
        };

        let mut graph = DiGraphMap::new();
        let mut timepoints = BTreeMap::new();
        for (&id, timepoint) in &self.timepoints {
            graph.add_node(map(id));
            timepoints.insert(map(id), timepoint.clone());
        }
        for (i, j, data) in self.graph.all_edges() {
            graph.add_edge(map(i), map(j), data.clone());
        }
        self.graph = graph;
        self.timepoints = timepoints;
    }

    /// Task ids in execution order.
    pub fn get_tasks(&self) -> Vec<Id> {
        self.timepoints
            .values()
            .filter(|t| t.node_type == NodeKind::Start)
            .map(|t| t.task_id.clone())
            .collect()
    }

    pub fn task_count(&self) -> usize {
        self.timepoints.values().filter(|t| t.node_type == NodeKind::Start).count()
    }

    /// Id of the task at `position`, if any.
    pub fn get_task_id(&self, position: usize) -> Option<&Id> {
        if position == 0 {
            return None;
        }
        let (start_id, _, _) = Self::task_node_ids_at(position);
        self.timepoints.get(&start_id).map(|t| &t.task_id)
    }

    /// Position of the task owning `task_id`, if present.
    pub fn get_task_position(&self, task_id: &str) -> Option<usize> {
        self.timepoints
            .iter()
            .find(|(_, t)| t.task_id == task_id && t.node_type == NodeKind::Start)
            .map(|(&id, _)| (id + 2) / NODES_PER_TASK)
    }

    /// Id of the task scheduled first, if any.
    pub fn get_earliest_task_id(&self) -> Option<&Id> {
        self.get_task_id(1)
    }

    /// Node ids associated with `task_id`, in ascending order.
    pub fn get_task_node_ids(&self, task_id: &str) -> Vec<usize> {
        self.timepoints
            .iter()
            .filter(|(_, t)| t.task_id == task_id)
            .map(|(&id, _)| id)
            .collect()
    }

    fn find_timepoint(&self, task_id: &str, node_type: NodeKind) -> Option<usize> {
        self.timepoints
            .iter()
            .find(|(_, t)| t.task_id == task_id && t.node_type == node_type)
            .map(|(&id, _)| id)
    }

    /// Fixes a timepoint to an absolute time by tightening both window edges.
    ///
    /// Consistency must be re-checked by the caller.
    pub fn assign_timepoint(&mut self, task_id: &str, node_type: NodeKind, time: f64) -> Result<(), NetworkError> {
        let id = self
            .find_timepoint(task_id, node_type)
            .ok_or_else(|| NetworkError::UnknownTimepoint {
                task_id: task_id.to_string(),
                node_type,
            })?;
        self.update_edge_weight(0, id, time);
        self.update_edge_weight(id, 0, -time);
        Ok(())
    }

    /// Marks a timepoint as executed during dispatch.
    pub fn execute_timepoint(&mut self, task_id: &str, node_type: NodeKind) -> Result<(), NetworkError> {
        let id = self
            .find_timepoint(task_id, node_type)
            .ok_or_else(|| NetworkError::UnknownTimepoint {
                task_id: task_id.to_string(),
                node_type,
            })?;
        self.timepoints.get_mut(&id).expect("id came from the timepoint table").is_executed = true;
        Ok(())
    }

    /// Absolute time bound of a timepoint: the earliest time when
    /// `lower_bound`, the latest otherwise.
    pub fn get_time(&self, task_id: &str, node_type: NodeKind, lower_bound: bool) -> Option<f64> {
        let id = self.find_timepoint(task_id, node_type)?;
        if lower_bound {
            self.edge_weight(id, 0).map(|w| -w)
        } else {
            self.edge_weight(0, id)
        }
    }

    /// Sub-network holding the zero timepoint, the first `n_tasks` tasks'
    /// nodes, and every edge among them.
    pub fn get_subgraph(&self, n_tasks: usize) -> Self {
        let cutoff = NODES_PER_TASK * n_tasks;
        let mut subgraph = Self::new();
        subgraph.timepoints.clear();
        subgraph.graph = DiGraphMap::new();
        for (&id, timepoint) in self.timepoints.range(..=cutoff) {
            subgraph.add_node(id, timepoint.clone());
        }
        for (i, j, data) in self.graph.all_edges() {
            if i <= cutoff && j <= cutoff {
                subgraph.graph.add_edge(i, j, data.clone());
            }
        }
        subgraph
    }

    // ------------------------------------------------------------------
    // Consistency and metrics plumbing
    // ------------------------------------------------------------------

    /// True iff the network has no negative cycle.
    pub fn is_consistent(&self) -> bool {
        apsp::floyd_warshall(self).is_consistent()
    }

    /// Risk attached by the solver that produced this network, if any.
    pub fn risk_metric(&self) -> Option<f64> {
        self.risk_metric
    }

    pub fn set_risk_metric(&mut self, risk_metric: f64) {
        self.risk_metric = Some(risk_metric);
    }

    /// Temporal metric stored by [`compute_temporal_metric`](Self::compute_temporal_metric).
    pub fn temporal_metric(&self) -> Option<f64> {
        self.temporal_metric
    }

    pub(crate) fn set_temporal_metric(&mut self, temporal_metric: Option<f64>) {
        self.temporal_metric = temporal_metric;
    }

    /// Re-types the network as a plain STN, dropping contingency metadata.
    pub fn to_stn(&self) -> TemporalNetwork<Stn> {
        let mut stn = TemporalNetwork::<Stn> {
            graph: DiGraphMap::new(),
            timepoints: self.timepoints.clone(),
            risk_metric: self.risk_metric,
            temporal_metric: self.temporal_metric,
            _variant: PhantomData,
        };
        for &id in self.timepoints.keys() {
            stn.graph.add_node(id);
        }
        for (i, j, data) in self.graph.all_edges() {
            stn.graph.add_edge(i, j, EdgeData::requirement(data.weight));
        }
        stn
    }
}

impl TemporalNetwork<super::variant::Pstn> {
    /// Draws one realization of the uncertain durations: every contingent
    /// edge is replaced by a sampled point requirement.
    pub fn sample_realization<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> TemporalNetwork<Stn> {
        let mut realization = self.to_stn();
        for ((i, j), kind) in self.get_contingent_constraints() {
            if let Some(duration) = kind.sample(rng) {
                realization
                    .insert_constraint(i, j, ConstraintSpec::requirement(duration, duration))
                    .expect("a sampled point interval is never empty");
            }
        }
        realization
    }
}

impl<V: Variant> PartialEq for TemporalNetwork<V> {
    /// Structural equality: same timepoints, same directed edges, same
    /// attached risk.
    fn eq(&self, other: &Self) -> bool {
        if self.timepoints != other.timepoints || self.risk_metric != other.risk_metric {
            return false;
        }
        if self.graph.edge_count() != other.graph.edge_count() {
            return false;
        }
        self.graph
            .all_edges()
            .all(|(i, j, data)| other.graph.edge_weight(i, j) == Some(data))
    }
}

impl<V: Variant> fmt::Display for TemporalNetwork<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ((i, j), interval) in self.get_constraints() {
            if i == 0 {
                let timepoint = &self.timepoints[&j];
                write!(f, "Timepoint {}: [{}, {}]", timepoint, interval.lower, interval.upper)?;
                if timepoint.is_executed {
                    write!(f, " (executed)")?;
                }
            } else {
                write!(f, "Constraint {} => {}: [{}, {}]", i, j, interval.lower, interval.upper)?;
                if let ConstraintKind::Contingent(kind) = interval.kind {
                    let descriptor = kind.descriptor();
                    if descriptor.is_empty() {
                        write!(f, " (contingent)")?;
                    } else {
                        write!(f, " ({})", descriptor)?;
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
