use thiserror::Error;

/// Errors surfaced by the controllability solvers.
///
/// Solvers never recover from these internally; the dispatch orchestrator
/// decides at its boundary which ones mean "no solution".
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("temporal network is inconsistent (negative cycle)")]
    Inconsistent,

    #[error("linear program has no feasible solution")]
    Infeasible,

    #[error("contingent constraint {from} -> {to} carries no probability distribution")]
    MissingDistribution { from: usize, to: usize },

    #[error("solver expects a {expected} network, got {got}")]
    UnexpectedVariant {
        expected: &'static str,
        got: &'static str,
    },

    #[error("lp backend failure: {0}")]
    Backend(String),
}

impl SolveError {
    /// True for the failure modes that mean the problem itself has no
    /// solution, as opposed to a solver malfunction.
    pub fn is_no_solution(&self) -> bool {
        matches!(self, SolveError::Inconsistent | SolveError::Infeasible)
    }
}

impl From<good_lp::ResolutionError> for SolveError {
    fn from(error: good_lp::ResolutionError) -> Self {
        match error {
            good_lp::ResolutionError::Infeasible => SolveError::Infeasible,
            other => SolveError::Backend(other.to_string()),
        }
    }
}
