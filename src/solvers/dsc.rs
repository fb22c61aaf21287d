//! Degree of Strong Controllability by linear programming.
//!
//! For every contingent interval the LP introduces non-negative slacks that
//! shrink its endpoints until a single assignment of the controllable
//! timepoints is robust to every remaining realization. The objective
//! minimises the total shrinkage, normalised by interval width; the degree of
//! strong controllability is the fraction of contingent width retained.

use std::collections::{BTreeMap, HashMap, HashSet};

use good_lp::{constraint, default_solver, variable, variables, Constraint, Expression, Solution, SolverModel, Variable};
use log::debug;

use super::error::SolveError;
use super::StpSolver;
use crate::network::{AnyNetwork, Stnu, TemporalNetwork, Variant, CONSISTENCY_TOLERANCE};

/// Rounds up, ignoring float drift just below an integer.
pub(crate) fn ceil_within_tolerance(value: f64) -> f64 {
    (value - CONSISTENCY_TOLERANCE).ceil()
}

/// Computes the dispatchable graph of an STNU: a *schedule* pinning every
/// controllable timepoint, with the contingent intervals shrunk as little as
/// possible.
///
/// The returned degree is the minimum retained-width ratio over the
/// contingent constraints; the network's risk metric is `1 - degree`.
///
/// # Errors
///
/// [`SolveError::Infeasible`] if no schedule is robust to the (possibly
/// shrunk) contingent intervals, [`SolveError::Backend`] on LP failure.
pub fn solve_dsc(stnu: &TemporalNetwork<Stnu>) -> Result<(f64, TemporalNetwork<Stnu>), SolveError> {
    let mut network = stnu.clone();
    let constraints = network.get_constraints();
    let contingent = network.get_contingent_constraints();
    let contingent_timepoints: HashSet<usize> = network.get_contingent_timepoints().into_iter().collect();

    let mut vars = variables!();
    let mut lp_constraints: Vec<Constraint> = Vec::new();
    // Per node: (t+, t-), the upper and lower bound of its executable window.
    let mut bounds: BTreeMap<usize, (Variable, Variable)> = BTreeMap::new();

    for id in network.node_ids() {
        let latest = network.get_edge_weight(0, id);
        let earliest = -network.get_edge_weight(id, 0);

        let mut hi_definition = variable().min(0.0);
        if latest.is_finite() {
            hi_definition = hi_definition.max(latest);
        }
        let hi = vars.add(hi_definition);

        let mut lo_definition = variable();
        if earliest.is_finite() {
            lo_definition = lo_definition.min(earliest);
        }
        let lo = vars.add(lo_definition);

        lp_constraints.push(constraint!(lo <= hi));
        if id == 0 {
            lp_constraints.push(constraint!(hi == 0.0));
            lp_constraints.push(constraint!(lo == 0.0));
        } else if !contingent_timepoints.contains(&id) {
            // Strong controllability: controllable nodes are fully pinned.
            lp_constraints.push(constraint!(hi == lo));
        }
        bounds.insert(id, (hi, lo));
    }

    // Per contingent target: (eps+, eps-), the endpoint shrinkages.
    let mut epsilons: HashMap<(usize, usize), (Variable, Variable)> = HashMap::new();
    for (&(i, j), interval) in &constraints {
        let (hi_i, lo_i) = bounds[&i];
        let (hi_j, lo_j) = bounds[&j];
        if contingent.contains_key(&(i, j)) {
            let eps_hi = vars.add(variable().min(0.0));
            let eps_lo = vars.add(variable().min(0.0));
            lp_constraints.push(constraint!(hi_j - hi_i + eps_hi == interval.upper));
            lp_constraints.push(constraint!(lo_j - lo_i - eps_lo == interval.lower));
            epsilons.insert((i, j), (eps_hi, eps_lo));
        } else {
            // Vacuous bounds (infinite weights) are simply not emitted.
            if interval.upper.is_finite() {
                lp_constraints.push(constraint!(hi_j - lo_i <= interval.upper));
            }
            let reverse = network.get_edge_weight(j, i);
            if reverse.is_finite() {
                lp_constraints.push(constraint!(hi_i - lo_j <= reverse));
            }
        }
    }

    let mut shrinkage_terms: Vec<Expression> = Vec::new();
    for (&(i, j), &(eps_hi, eps_lo)) in &epsilons {
        let width = constraints[&(i, j)].width();
        if width < CONSISTENCY_TOLERANCE {
            return Err(SolveError::Backend(format!(
                "contingent constraint {} -> {} has zero width",
                i, j
            )));
        }
        shrinkage_terms.push((1.0 / width) * eps_hi + (1.0 / width) * eps_lo);
    }
    let objective: Expression = shrinkage_terms.into_iter().sum();

    let mut model = vars.minimise(objective).using(default_solver);
    for lp_constraint in lp_constraints {
        model = model.with(lp_constraint);
    }
    let solution = model.solve().map_err(SolveError::from)?;

    // Shrink the contingent intervals and measure the retained width.
    let mut degree: f64 = 1.0;
    for (&(i, j), &(eps_hi, eps_lo)) in &epsilons {
        let original_width = constraints[&(i, j)].width();
        let high = solution.value(eps_hi).max(0.0);
        let low = solution.value(eps_lo).max(0.0);
        debug!("shrinking contingent {} -> {} by ({}, {})", i, j, low, high);
        network.shrink_contingent_constraint(i, j, low, high);
        let retained = network.get_constraints()[&(i, j)].width();
        degree = degree.min(retained / original_width);
    }

    // Integer-rounded windows first, then the schedule: controllable nodes at
    // the centre of their window, contingent nodes on their LP interval.
    for (&id, &(hi, lo)) in &bounds {
        network.update_edge_weight(0, id, ceil_within_tolerance(solution.value(hi)));
        network.update_edge_weight(id, 0, ceil_within_tolerance(-solution.value(lo)));
    }
    for (&id, &(hi, lo)) in &bounds {
        let hi_value = solution.value(hi);
        let lo_value = solution.value(lo);
        if contingent_timepoints.contains(&id) {
            network.update_edge_weight(0, id, hi_value);
            network.update_edge_weight(id, 0, -lo_value);
        } else {
            let time = (hi_value + lo_value) / 2.0;
            network.update_edge_weight(0, id, time);
            network.update_edge_weight(id, 0, -time);
        }
    }

    network.set_risk_metric(1.0 - degree);
    Ok((degree, network))
}

/// The DSC solver: offline schedules for STNUs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeOfStrongControllability;

impl DegreeOfStrongControllability {
    pub const NAME: &'static str = "dsc";
}

impl StpSolver for DegreeOfStrongControllability {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn variant(&self) -> &'static str {
        Stnu::NAME
    }

    fn empty_network(&self) -> AnyNetwork {
        TemporalNetwork::<Stnu>::new().into()
    }

    fn network_from_json(&self, payload: &str) -> Result<AnyNetwork, crate::network::NetworkError> {
        TemporalNetwork::<Stnu>::from_json(payload).map(AnyNetwork::from)
    }

    fn compute_dispatchable_graph(&self, network: &AnyNetwork) -> Result<AnyNetwork, SolveError> {
        let stnu = network.as_stnu().ok_or(SolveError::UnexpectedVariant {
            expected: Stnu::NAME,
            got: network.variant_name(),
        })?;
        let (degree, schedule) = solve_dsc(stnu)?;
        debug!("dsc degree {}", degree);
        Ok(schedule.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{ConstraintSpec, ContingentKind, NodeKind, Timepoint};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    /// One task with explicit windows chosen so the schedule is unique:
    /// start [37, 39], pickup [41, 47], delivery [43, 51], travel [4, 8]
    /// and work [2, 6] contingent.
    fn single_task_stnu() -> TemporalNetwork<Stnu> {
        let mut network = TemporalNetwork::<Stnu>::new();
        network.add_node(1, Timepoint::new("t", NodeKind::Start));
        network.add_node(2, Timepoint::new("t", NodeKind::Pickup));
        network.add_node(3, Timepoint::new("t", NodeKind::Delivery));
        network.add_constraint(0, 1, 37.0, 39.0).unwrap();
        network.add_constraint(0, 2, 41.0, 47.0).unwrap();
        network.add_constraint(0, 3, 43.0, 51.0).unwrap();
        network
            .insert_constraint(1, 2, ConstraintSpec::contingent(4.0, 8.0, ContingentKind::Bounded))
            .unwrap();
        network
            .insert_constraint(2, 3, ConstraintSpec::contingent(2.0, 6.0, ContingentKind::Bounded))
            .unwrap();
        network
    }

    #[test]
    fn fully_controllable_stnu_keeps_its_contingent_widths() {
        let (degree, schedule) = solve_dsc(&single_task_stnu()).unwrap();
        assert!(close(degree, 1.0));
        assert!(close(schedule.risk_metric().unwrap(), 0.0));

        let constraints = schedule.get_constraints();
        // The only start time robust to both contingent intervals.
        let start = constraints[&(0, 1)];
        assert!(close(start.lower, 37.0) && close(start.upper, 37.0));
        // Contingent timepoints keep their intervals.
        let pickup = constraints[&(0, 2)];
        assert!(close(pickup.lower, 41.0) && close(pickup.upper, 45.0));
        let delivery = constraints[&(0, 3)];
        assert!(close(delivery.lower, 43.0) && close(delivery.upper, 51.0));
    }

    #[test]
    fn contingent_intervals_never_widen() {
        let input = single_task_stnu();
        let before = input.get_constraints();
        let (_, schedule) = solve_dsc(&input).unwrap();
        let after = schedule.get_constraints();
        for (key, interval) in &after {
            if interval.kind.is_contingent() {
                assert!(interval.width() <= before[key].width() + 1e-9);
            }
        }
    }

    #[test]
    fn controllable_windows_collapse_to_points() {
        let (_, schedule) = solve_dsc(&single_task_stnu()).unwrap();
        let contingent: std::collections::HashSet<usize> =
            schedule.get_contingent_timepoints().into_iter().collect();
        for ((i, j), interval) in schedule.get_constraints() {
            if i == 0 && !contingent.contains(&j) {
                assert!(interval.width() < 1e-6, "node {} should be pinned", j);
            }
        }
    }

    #[test]
    fn overconstrained_stnu_shrinks_the_contingent_interval() {
        let mut network = TemporalNetwork::<Stnu>::new();
        network.add_node(1, Timepoint::new("t", NodeKind::Start));
        network.add_node(2, Timepoint::new("t", NodeKind::Pickup));
        network.add_constraint(0, 1, 0.0, 0.0).unwrap();
        // The pickup window admits only half of the contingent spread.
        network.add_constraint(0, 2, 4.0, 6.0).unwrap();
        network
            .insert_constraint(1, 2, ConstraintSpec::contingent(4.0, 8.0, ContingentKind::Bounded))
            .unwrap();

        let (degree, schedule) = solve_dsc(&network).unwrap();
        assert!(degree < 1.0);
        assert!(schedule.risk_metric().unwrap() > 0.0);
        let interval = schedule.get_constraints()[&(1, 2)];
        assert!(interval.width() < 4.0);
    }

    #[test]
    fn stnu_without_contingents_is_fully_controllable() {
        let mut network = TemporalNetwork::<Stnu>::new();
        network.add_node(1, Timepoint::new("t", NodeKind::Start));
        network.add_constraint(0, 1, 5.0, 9.0).unwrap();

        let (degree, schedule) = solve_dsc(&network).unwrap();
        assert!(close(degree, 1.0));
        let window = schedule.get_constraints()[&(0, 1)];
        assert!(close(window.width(), 0.0));
    }

    #[test]
    fn solver_rejects_other_variants() {
        let solver = DegreeOfStrongControllability;
        let stn = TemporalNetwork::<crate::network::Stn>::new();
        let err = solver.compute_dispatchable_graph(&stn.into()).unwrap_err();
        assert!(matches!(err, SolveError::UnexpectedVariant { .. }));
    }
}
