//! Dispatch orchestration: solver registry and the STP facade.
//!
//! A [`Stp`] is bound to one solver by name. It hands out empty networks of
//! the solver's variant, deserializes networks from their wire form, and
//! turns a network into a dispatchable graph, translating "the problem has
//! no solution" failures into [`StpError::NoSolution`] at this boundary.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;

use crate::network::AnyNetwork;
use crate::solvers::{
    DegreeOfStrongControllability, FullPathConsistency, StaticRobustExecution, StpSolver,
};

mod error;

#[cfg(test)]
mod tests;

pub use error::StpError;

/// Registry of STP solvers, keyed by name.
#[derive(Clone)]
pub struct SolverRegistry {
    solvers: HashMap<String, Arc<dyn StpSolver>>,
}

impl SolverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { solvers: HashMap::new() }
    }

    /// The registry with the built-in solvers: `fpc`, `dsc` and `srea`.
    pub fn with_default_solvers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FullPathConsistency));
        registry.register(Arc::new(DegreeOfStrongControllability));
        registry.register(Arc::new(StaticRobustExecution::default()));
        registry
    }

    /// Registers a solver under its own name, replacing any previous entry.
    pub fn register(&mut self, solver: Arc<dyn StpSolver>) {
        self.solvers.insert(solver.name().to_string(), solver);
    }

    /// Looks a solver up by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn StpSolver>, StpError> {
        self.solvers
            .get(name)
            .cloned()
            .ok_or_else(|| StpError::UnknownSolver(name.to_string()))
    }

    /// Registered solver names.
    pub fn names(&self) -> Vec<&str> {
        self.solvers.keys().map(|name| name.as_str()).collect()
    }
}

impl Default for SolverRegistry {
    fn default() -> Self {
        Self::with_default_solvers()
    }
}

/// A Simple Temporal Problem bound to one solving method.
pub struct Stp {
    solver: Arc<dyn StpSolver>,
}

impl Stp {
    /// Binds to a built-in solver by name (`fpc`, `dsc` or `srea`).
    ///
    /// # Errors
    ///
    /// [`StpError::UnknownSolver`] for unregistered names.
    pub fn new(solver_name: &str) -> Result<Self, StpError> {
        Self::from_registry(&SolverRegistry::with_default_solvers(), solver_name)
    }

    /// Binds to a solver from a custom registry.
    pub fn from_registry(registry: &SolverRegistry, solver_name: &str) -> Result<Self, StpError> {
        Ok(Self { solver: registry.get(solver_name)? })
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    /// An empty network of the variant the bound solver expects.
    pub fn get_stn(&self) -> AnyNetwork {
        self.solver.empty_network()
    }

    /// Reads a network of the matching variant from node-link JSON.
    pub fn get_stn_from_serialized(&self, payload: &str) -> Result<AnyNetwork, StpError> {
        Ok(self.solver.network_from_json(payload)?)
    }

    /// Computes the dispatchable graph of the given network.
    ///
    /// The result is a new network of the same variant with its risk metric
    /// set; the input is never mutated.
    ///
    /// # Errors
    ///
    /// [`StpError::NoSolution`] when the network is inconsistent or the
    /// solver's program is infeasible; [`StpError::Solver`] on a solver
    /// malfunction.
    pub fn solve(&self, network: &AnyNetwork) -> Result<AnyNetwork, StpError> {
        info!("solving stp with {}", self.solver.name());
        let dispatchable_graph = self.solver.compute_dispatchable_graph(network)?;
        Ok(dispatchable_graph)
    }

    /// True iff the network has no negative cycle.
    pub fn is_consistent(network: &AnyNetwork) -> bool {
        network.is_consistent()
    }
}
