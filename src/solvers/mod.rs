//! Controllability solvers.
//!
//! Every solver consumes a network of its matching variant and produces a
//! deep-copied *dispatchable graph* of the same variant with a risk metric
//! attached:
//!
//! - [`FullPathConsistency`] (`fpc`, STN): minimality by all-pairs shortest
//!   path; absorbs no uncertainty (risk 1.0).
//! - [`DegreeOfStrongControllability`] (`dsc`, STNU): LP shrinking of the
//!   contingent intervals into a strongly controllable schedule; risk is
//!   `1 - DSC`.
//! - [`StaticRobustExecution`] (`srea`, PSTN): binary search over the
//!   confidence level of a chance-constrained decoupling LP; risk is the
//!   smallest feasible level.

pub mod dsc;
mod error;
pub mod fpc;
pub mod srea;

pub use dsc::DegreeOfStrongControllability;
pub use error::SolveError;
pub use fpc::{minimal_network, FullPathConsistency};
pub use srea::{SreaOptions, StaticRobustExecution};

use crate::network::{AnyNetwork, NetworkError};

/// Uniform solver interface used by the dispatch orchestrator.
pub trait StpSolver: Send + Sync {
    /// Registry name of the solver.
    fn name(&self) -> &'static str;

    /// Wire name of the network variant the solver operates on.
    fn variant(&self) -> &'static str;

    /// An empty network of the matching variant.
    fn empty_network(&self) -> AnyNetwork;

    /// Reads a network of the matching variant from node-link JSON.
    fn network_from_json(&self, payload: &str) -> Result<AnyNetwork, NetworkError>;

    /// Computes the dispatchable graph of the input network, leaving the
    /// input untouched.
    fn compute_dispatchable_graph(&self, network: &AnyNetwork) -> Result<AnyNetwork, SolveError>;
}
