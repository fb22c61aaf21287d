//! Full Path Consistency: minimality via all-pairs shortest paths.

use log::debug;

use super::error::SolveError;
use super::StpSolver;
use crate::network::{floyd_warshall, AnyNetwork, Stn, TemporalNetwork, Variant};

/// Computes the minimal network equivalent to the input: every existing edge
/// is tightened to the shortest-path distance between its endpoints.
///
/// # Errors
///
/// [`SolveError::Inconsistent`] if the network contains a negative cycle.
pub fn minimal_network<V: Variant>(network: &TemporalNetwork<V>) -> Result<TemporalNetwork<V>, SolveError> {
    let distances = floyd_warshall(network);
    if !distances.is_consistent() {
        return Err(SolveError::Inconsistent);
    }
    let mut minimal = network.clone();
    minimal.update_edges(&distances);
    Ok(minimal)
}

/// The FPC solver: dispatchable graph by full path consistency.
///
/// FPC does not absorb uncertainty at all, so the attached risk metric is the
/// worst value, 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullPathConsistency;

impl FullPathConsistency {
    pub const NAME: &'static str = "fpc";
}

impl StpSolver for FullPathConsistency {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn variant(&self) -> &'static str {
        Stn::NAME
    }

    fn empty_network(&self) -> AnyNetwork {
        TemporalNetwork::<Stn>::new().into()
    }

    fn network_from_json(&self, payload: &str) -> Result<AnyNetwork, crate::network::NetworkError> {
        TemporalNetwork::<Stn>::from_json(payload).map(AnyNetwork::from)
    }

    fn compute_dispatchable_graph(&self, network: &AnyNetwork) -> Result<AnyNetwork, SolveError> {
        let stn = network.as_stn().ok_or(SolveError::UnexpectedVariant {
            expected: Stn::NAME,
            got: network.variant_name(),
        })?;
        debug!("running fpc on {} nodes", stn.node_count());
        let mut minimal = minimal_network(stn)?;
        minimal.set_risk_metric(1.0);
        Ok(minimal.into())
    }
}
