//! tempnet - Temporal constraint networks for multi-robot task scheduling
//!
//! Solves Simple Temporal Problems under uncertainty. Tasks with release-time
//! windows and probabilistic duration estimates are inserted into a temporal
//! network (STN, STNU or PSTN); a solver then produces a *dispatchable graph*:
//! a minimal representation of every schedule that satisfies the constraints,
//! together with a risk metric describing how well uncertainty is absorbed.

pub mod dispatch;
pub mod distributions;
pub mod network;
pub mod solvers;
pub mod task;

pub use dispatch::{SolverRegistry, Stp};
pub use network::{AnyNetwork, Pstn, Stn, Stnu, TemporalNetwork};
pub use task::Task;

/// Identifier type used for tasks and actions.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
