use thiserror::Error;

use crate::network::NetworkError;
use crate::solvers::SolveError;

/// Errors surfaced by the dispatch orchestrator.
#[derive(Debug, Error)]
pub enum StpError {
    #[error("unknown solver: {0}")]
    UnknownSolver(String),

    #[error("no solution for the simple temporal problem")]
    NoSolution(#[source] SolveError),

    #[error("solver failure")]
    Solver(#[source] SolveError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl From<SolveError> for StpError {
    /// `Inconsistent` and `Infeasible` mean the problem has no solution; any
    /// other solver error is a malfunction and keeps its identity.
    fn from(error: SolveError) -> Self {
        if error.is_no_solution() {
            StpError::NoSolution(error)
        } else {
            StpError::Solver(error)
        }
    }
}
