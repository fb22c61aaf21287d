//! Static Robust Execution: chance-constrained decoupling of a PSTN.
//!
//! The inner LP fixes a confidence level `alpha` and carves, for every
//! contingent constraint, an interval covering probability `1 - alpha` of its
//! distribution (truncated at the 0.3%/99.7% quantiles), then maximises the
//! slack added back while keeping every requirement satisfiable. The outer
//! loop binary-searches the smallest feasible `alpha` on a 1/1000 grid; that
//! level is the schedule's risk.

use std::collections::BTreeMap;

use good_lp::{constraint, default_solver, variable, variables, Constraint, Expression, Solution, SolverModel, Variable};
use log::debug;

use super::dsc::ceil_within_tolerance;
use super::error::SolveError;
use super::{fpc, StpSolver};
use crate::distributions::{inverse_cdf_normal, inverse_cdf_uniform, DEFAULT_RESOLUTION, QUANTILE_CEILING, QUANTILE_FLOOR};
use crate::network::{AnyNetwork, ContingentKind, Pstn, TemporalNetwork, Variant};

/// Tuning knobs for the SREA binary search.
#[derive(Debug, Clone, Copy)]
pub struct SreaOptions {
    /// Starting lower bound on the confidence level.
    pub lower_bound: f64,
    /// Starting upper bound on the confidence level.
    pub upper_bound: f64,
    /// Round the produced windows up to whole seconds, yielding integer
    /// schedules as in the reference formulation.
    pub integer_schedule: bool,
    /// Resolution of the memoised inverse-CDF tables.
    pub resolution: usize,
}

impl Default for SreaOptions {
    fn default() -> Self {
        Self {
            lower_bound: 0.0,
            upper_bound: 0.999,
            integer_schedule: true,
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

/// Quantiles driving one contingent constraint at level `alpha`:
/// `(p_ij, p_ji, limit_ij, limit_ji)`.
fn quantiles(kind: &ContingentKind, alpha: f64, resolution: usize) -> Option<(f64, f64, f64, f64)> {
    match *kind {
        ContingentKind::Normal { mu, sigma } => Some((
            inverse_cdf_normal(1.0 - alpha / 2.0, mu, sigma, resolution, false),
            -inverse_cdf_normal(alpha / 2.0, mu, sigma, resolution, false),
            inverse_cdf_normal(QUANTILE_CEILING, mu, sigma, resolution, false),
            -inverse_cdf_normal(QUANTILE_FLOOR, mu, sigma, resolution, false),
        )),
        ContingentKind::Uniform { lower, upper } => Some((
            inverse_cdf_uniform(1.0 - alpha / 2.0, lower, upper),
            -inverse_cdf_uniform(alpha / 2.0, lower, upper),
            inverse_cdf_uniform(QUANTILE_CEILING, lower, upper),
            -inverse_cdf_uniform(QUANTILE_FLOOR, lower, upper),
        )),
        ContingentKind::Bounded => None,
    }
}

/// Runs the robust-execution LP at one confidence level.
///
/// Returns the `(t+, t-)` assignment per node if the LP is feasible, `None`
/// if the level is too ambitious.
fn chance_constrained_lp(
    network: &TemporalNetwork<Pstn>,
    alpha: f64,
    options: &SreaOptions,
) -> Result<Option<BTreeMap<usize, (f64, f64)>>, SolveError> {
    let constraints = network.get_constraints();
    let contingent = network.get_contingent_constraints();

    let mut vars = variables!();
    let mut lp_constraints: Vec<Constraint> = Vec::new();
    let mut bounds: BTreeMap<usize, (Variable, Variable)> = BTreeMap::new();

    for id in network.node_ids() {
        let latest = network.get_edge_weight(0, id);
        let earliest = -network.get_edge_weight(id, 0);

        let mut hi_definition = variable();
        let mut lo_definition = variable();
        if earliest.is_finite() {
            hi_definition = hi_definition.min(earliest);
            lo_definition = lo_definition.min(earliest);
        }
        if latest.is_finite() {
            hi_definition = hi_definition.max(latest);
            lo_definition = lo_definition.max(latest);
        }
        let hi = vars.add(hi_definition);
        let lo = vars.add(lo_definition);
        lp_constraints.push(constraint!(hi >= lo));
        bounds.insert(id, (hi, lo));
    }

    let mut deltas: Vec<Variable> = Vec::new();
    for (&(i, j), kind) in &contingent {
        let (p_ij, p_ji, limit_ij, limit_ji) = quantiles(kind, alpha, options.resolution)
            .ok_or(SolveError::MissingDistribution { from: i, to: j })?;

        let delta_ij = vars.add(variable().min(0.0).max((limit_ij - p_ij).max(0.0)));
        let delta_ji = vars.add(variable().min(0.0).max((limit_ji - p_ji).max(0.0)));

        let (hi_i, lo_i) = bounds[&i];
        let (hi_j, lo_j) = bounds[&j];
        lp_constraints.push(constraint!(hi_j - hi_i - delta_ij == p_ij));
        lp_constraints.push(constraint!(lo_j - lo_i + delta_ji == -p_ji));
        deltas.push(delta_ij);
        deltas.push(delta_ji);
    }

    for (&(i, j), interval) in &constraints {
        // Zero-timepoint edges are captured by the variable bounds.
        if i == 0 || j == 0 || contingent.contains_key(&(i, j)) {
            continue;
        }
        let (hi_i, lo_i) = bounds[&i];
        let (hi_j, lo_j) = bounds[&j];
        if interval.upper.is_finite() {
            lp_constraints.push(constraint!(hi_j - lo_i <= interval.upper));
        }
        let reverse = network.get_edge_weight(j, i);
        if reverse.is_finite() {
            lp_constraints.push(constraint!(hi_i - lo_j <= reverse));
        }
    }

    let objective: Expression = deltas.iter().copied().sum();
    let mut model = vars.maximise(objective).using(default_solver);
    for lp_constraint in lp_constraints {
        model = model.with(lp_constraint);
    }

    match model.solve() {
        Ok(solution) => {
            let times = bounds
                .iter()
                .map(|(&id, &(hi, lo))| (id, (solution.value(hi), solution.value(lo))))
                .collect();
            Ok(Some(times))
        }
        Err(good_lp::ResolutionError::Infeasible) => Ok(None),
        Err(other) => Err(SolveError::Backend(other.to_string())),
    }
}

/// Runs SREA on a PSTN.
///
/// Returns the risk level together with the decoupled dispatchable graph. A
/// network with no contingent constraints short-circuits to its minimal
/// network at risk 0.
///
/// # Errors
///
/// [`SolveError::Inconsistent`] if pre-minimisation finds a negative cycle,
/// [`SolveError::Infeasible`] if no confidence level admits a decoupling.
pub fn srea(
    pstn: &TemporalNetwork<Pstn>,
    options: &SreaOptions,
) -> Result<(f64, TemporalNetwork<Pstn>), SolveError> {
    let mut network = fpc::minimal_network(pstn)?;

    if network.get_contingent_constraints().is_empty() {
        network.set_risk_metric(0.0);
        return Ok((0.0, network));
    }

    let mut lower = (options.lower_bound * 1000.0).ceil() as i64 - 1;
    let mut upper = (options.upper_bound * 1000.0).floor() as i64 + 1;
    let mut best: Option<(f64, BTreeMap<usize, (f64, f64)>)> = None;

    while upper - lower > 1 {
        let midpoint = (upper + lower) / 2;
        let alpha = midpoint as f64 / 1000.0;
        debug!("srea trying alpha {}", alpha);
        match chance_constrained_lp(&network, alpha, options)? {
            Some(times) => {
                upper = midpoint;
                best = Some((alpha, times));
            }
            None => {
                lower = midpoint;
            }
        }
    }

    let (alpha, times) = best.ok_or(SolveError::Infeasible)?;
    debug!("srea smallest feasible alpha {}", alpha);

    for (&id, &(hi, lo)) in &times {
        if options.integer_schedule {
            network.update_edge_weight(0, id, ceil_within_tolerance(hi));
            network.update_edge_weight(id, 0, ceil_within_tolerance(-lo));
        } else {
            network.update_edge_weight(0, id, hi);
            network.update_edge_weight(id, 0, -lo);
        }
    }
    network.set_risk_metric(alpha);
    Ok((alpha, network))
}

/// The SREA solver: robust decouplings for PSTNs.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRobustExecution {
    pub options: SreaOptions,
}

impl StaticRobustExecution {
    pub const NAME: &'static str = "srea";

    pub fn with_options(options: SreaOptions) -> Self {
        Self { options }
    }
}

impl StpSolver for StaticRobustExecution {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn variant(&self) -> &'static str {
        Pstn::NAME
    }

    fn empty_network(&self) -> AnyNetwork {
        TemporalNetwork::<Pstn>::new().into()
    }

    fn network_from_json(&self, payload: &str) -> Result<AnyNetwork, crate::network::NetworkError> {
        TemporalNetwork::<Pstn>::from_json(payload).map(AnyNetwork::from)
    }

    fn compute_dispatchable_graph(&self, network: &AnyNetwork) -> Result<AnyNetwork, SolveError> {
        let pstn = network.as_pstn().ok_or(SolveError::UnexpectedVariant {
            expected: Pstn::NAME,
            got: network.variant_name(),
        })?;
        let (_, decoupling) = srea(pstn, &self.options)?;
        Ok(decoupling.into())
    }
}
