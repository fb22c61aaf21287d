//! End-to-end scenarios through the dispatch orchestrator.

use std::sync::Arc;

use super::*;
use crate::network::{task_from_request, AnyNetwork, Pstn, Stn, Stnu, TemporalNetwork, Variant};
use crate::solvers::minimal_network;
use crate::task::{DurationName, InterTimepointConstraint, Task, TaskRequest, TimepointConstraint, TimepointName};

fn request(task_id: &str, earliest: f64, latest: f64, sigma: f64) -> TaskRequest {
    let variance = sigma * sigma;
    TaskRequest {
        task_id: task_id.to_string(),
        earliest_pickup: earliest,
        latest_pickup: latest,
        travel_time: InterTimepointConstraint::new(DurationName::TravelTime, 6.0, variance).unwrap(),
        work_time: InterTimepointConstraint::new(DurationName::WorkTime, 4.0, variance).unwrap(),
        pickup_action_id: None,
        delivery_action_id: None,
    }
}

fn build_network<V: Variant>(windows: &[(f64, f64)], sigma: f64) -> TemporalNetwork<V> {
    let mut network = TemporalNetwork::<V>::new();
    for (position, &(earliest, latest)) in windows.iter().enumerate() {
        let task = task_from_request::<V>(&request(
            &format!("task-{}", position + 1),
            earliest,
            latest,
            sigma,
        ))
        .unwrap();
        network.add_task(&task, position + 1).unwrap();
    }
    network
}

fn window_of(network: &AnyNetwork, node: usize) -> (f64, f64) {
    match network {
        AnyNetwork::Stn(n) => {
            let interval = n.get_constraints()[&(0, node)];
            (interval.lower, interval.upper)
        }
        AnyNetwork::Stnu(n) => {
            let interval = n.get_constraints()[&(0, node)];
            (interval.lower, interval.upper)
        }
        AnyNetwork::Pstn(n) => {
            let interval = n.get_constraints()[&(0, node)];
            (interval.lower, interval.upper)
        }
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn unknown_solver_names_are_rejected() {
    assert!(matches!(Stp::new("dynamic"), Err(StpError::UnknownSolver(_))));
}

#[test]
fn each_solver_hands_out_its_network_variant() {
    for (name, variant) in [("fpc", "stn"), ("dsc", "stnu"), ("srea", "pstn")] {
        let stp = Stp::new(name).unwrap();
        assert_eq!(stp.solver_name(), name);
        assert_eq!(stp.get_stn().variant_name(), variant);
    }
}

#[test]
fn custom_solvers_can_be_registered() {
    let mut registry = SolverRegistry::new();
    registry.register(Arc::new(crate::solvers::FullPathConsistency));
    assert!(Stp::from_registry(&registry, "fpc").is_ok());
    assert!(matches!(
        Stp::from_registry(&registry, "srea"),
        Err(StpError::UnknownSolver(_))
    ));
}

#[test]
fn two_task_stn_solved_with_fpc() {
    init_logging();
    let stp = Stp::new("fpc").unwrap();
    let network: AnyNetwork = build_network::<Stn>(&[(41.0, 47.0), (96.0, 102.0)], 0.0).into();

    let dispatchable = stp.solve(&network).unwrap();
    assert_eq!(dispatchable.variant_name(), "stn");
    assert_eq!(dispatchable.risk_metric(), Some(1.0));

    assert_eq!(window_of(&dispatchable, 1), (35.0, 41.0));
    assert_eq!(window_of(&dispatchable, 6), (100.0, 106.0));

    let minimal = dispatchable.as_stn().unwrap();
    assert_eq!(minimal.get_makespan(), Some(100.0));
    assert_eq!(minimal.get_completion_time(), Some(65.0));
    assert!(Stp::is_consistent(&dispatchable));
}

#[test]
fn two_task_pstn_solved_with_srea() {
    init_logging();
    let stp = Stp::new("srea").unwrap();
    let network: AnyNetwork = build_network::<Pstn>(&[(41.0, 47.0), (96.0, 102.0)], 1.0).into();

    let dispatchable = stp.solve(&network).unwrap();
    assert_eq!(dispatchable.variant_name(), "pstn");
    assert_eq!(dispatchable.risk_metric(), Some(0.0));

    assert_eq!(window_of(&dispatchable, 2), (41.0, 47.0));
    assert_eq!(window_of(&dispatchable, 3), (42.0, 54.0));
    assert_eq!(window_of(&dispatchable, 5), (96.0, 102.0));
    assert_eq!(window_of(&dispatchable, 6), (97.0, 109.0));

    let decoupling = dispatchable.as_pstn().unwrap();
    assert_eq!(decoupling.get_makespan(), Some(97.0));
    assert!(Stp::is_consistent(&dispatchable));
}

/// Two tasks with explicit windows chosen so the strong-controllability LP
/// has a unique optimum.
fn strongly_controllable_stnu() -> TemporalNetwork<Stnu> {
    let mut network = TemporalNetwork::<Stnu>::new();
    let windows = [
        [(37.0, 39.0), (41.0, 47.0), (43.0, 51.0)],
        [(92.0, 94.0), (96.0, 102.0), (98.0, 106.0)],
    ];
    for (index, task_windows) in windows.iter().enumerate() {
        let task = Task::new(
            format!("task-{}", index + 1),
            vec![
                TimepointConstraint::new(TimepointName::Start, task_windows[0].0, task_windows[0].1).unwrap(),
                TimepointConstraint::new(TimepointName::Pickup, task_windows[1].0, task_windows[1].1).unwrap(),
                TimepointConstraint::new(TimepointName::Delivery, task_windows[2].0, task_windows[2].1).unwrap(),
            ],
            vec![
                InterTimepointConstraint::new(DurationName::TravelTime, 6.0, 1.0).unwrap(),
                InterTimepointConstraint::new(DurationName::WorkTime, 4.0, 1.0).unwrap(),
            ],
        )
        .unwrap();
        network.add_task(&task, index + 1).unwrap();
    }
    network
}

#[test]
fn two_task_stnu_solved_with_dsc() {
    init_logging();
    let stp = Stp::new("dsc").unwrap();
    let network: AnyNetwork = strongly_controllable_stnu().into();

    let schedule = stp.solve(&network).unwrap();
    assert_eq!(schedule.variant_name(), "stnu");
    assert!(close(schedule.risk_metric().unwrap(), 0.0));

    // Controllable timepoints are pinned; contingent ones keep an interval.
    let expected = [
        (1, 37.0, 37.0),
        (2, 41.0, 45.0),
        (3, 43.0, 51.0),
        (4, 92.0, 92.0),
        (5, 96.0, 100.0),
        (6, 98.0, 106.0),
    ];
    for (node, lower, upper) in expected {
        let (actual_lower, actual_upper) = window_of(&schedule, node);
        assert!(close(actual_lower, lower), "node {} lower {}", node, actual_lower);
        assert!(close(actual_upper, upper), "node {} upper {}", node, actual_upper);
    }

    let stnu = schedule.as_stnu().unwrap();
    assert!(close(stnu.get_completion_time().unwrap(), 61.0));
    assert!(close(stnu.get_makespan().unwrap(), 98.0));
}

#[test]
fn every_solver_fails_on_overlapping_tasks() {
    // The second task's pickup window precedes the first task's delivery,
    // which the wait edge cannot satisfy.
    let windows = [(41.0, 47.0), (30.0, 35.0)];

    let fpc_result = Stp::new("fpc")
        .unwrap()
        .solve(&build_network::<Stn>(&windows, 0.0).into());
    assert!(matches!(fpc_result, Err(StpError::NoSolution(_))));

    let dsc_result = Stp::new("dsc")
        .unwrap()
        .solve(&build_network::<Stnu>(&windows, 1.0).into());
    assert!(matches!(dsc_result, Err(StpError::NoSolution(_))));

    let srea_result = Stp::new("srea")
        .unwrap()
        .solve(&build_network::<Pstn>(&windows, 1.0).into());
    assert!(matches!(srea_result, Err(StpError::NoSolution(_))));
}

#[test]
fn degenerate_pstn_matches_full_path_consistency() {
    let pstn = build_network::<Pstn>(&[(41.0, 47.0), (96.0, 102.0)], 0.0);
    assert!(pstn.get_contingent_constraints().is_empty());

    let stp = Stp::new("srea").unwrap();
    let dispatchable = stp.solve(&pstn.clone().into()).unwrap();
    assert_eq!(dispatchable.risk_metric(), Some(0.0));

    let minimal = minimal_network(&pstn.to_stn()).unwrap();
    let decoupling = dispatchable.as_pstn().unwrap();
    assert_eq!(decoupling.get_constraints(), minimal.get_constraints());
}

#[test]
fn networks_survive_the_serialized_path() {
    let stp = Stp::new("srea").unwrap();
    let network = build_network::<Pstn>(&[(41.0, 47.0), (96.0, 102.0)], 1.0);
    let payload = network.to_json().unwrap();

    let restored = stp.get_stn_from_serialized(&payload).unwrap();
    assert_eq!(restored.variant_name(), "pstn");
    assert_eq!(AnyNetwork::from(network), restored);

    let solved = stp.solve(&restored).unwrap();
    assert_eq!(solved.risk_metric(), Some(0.0));
}

#[test]
fn solve_leaves_the_input_untouched() {
    let stp = Stp::new("fpc").unwrap();
    let network: AnyNetwork = build_network::<Stn>(&[(41.0, 47.0), (96.0, 102.0)], 0.0).into();
    let before = network.clone();

    stp.solve(&network).unwrap();
    assert_eq!(network, before);
}

#[test]
fn malformed_payloads_are_reported_as_network_errors() {
    let stp = Stp::new("fpc").unwrap();
    let result = stp.get_stn_from_serialized("{not json");
    assert!(matches!(result, Err(StpError::Network(_))));
}
