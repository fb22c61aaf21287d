//! Temporal networks: distance graphs over task timepoints.
//!
//! A network is built incrementally by inserting tasks; each task occupies
//! three consecutively numbered timepoints (start, pickup, delivery) chained
//! by variant-specific duration edges and anchored to the zero timepoint by
//! absolute windows. See [`TemporalNetwork`] for the operations and
//! [`Variant`] for what distinguishes STN, STNU and PSTN.

mod any;
mod apsp;
mod edge;
mod error;
mod graph;
mod json;
mod metrics;
mod node;
mod variant;

#[cfg(test)]
mod tests;

pub use any::AnyNetwork;
pub use apsp::{floyd_warshall, DistanceMatrix, CONSISTENCY_TOLERANCE};
pub use graph::{TemporalNetwork, NODES_PER_TASK};
pub use edge::{ConstraintInterval, ConstraintKind, ConstraintSpec, ContingentKind, EdgeData};
pub use error::NetworkError;
pub use metrics::TemporalCriterion;
pub use node::{NodeKind, Timepoint};
pub use variant::{task_from_request, Pstn, Stn, Stnu, Variant};
