//! Structural tests for task insertion, removal and queries.

use super::*;
use crate::task::{DurationName, InterTimepointConstraint, Task, TaskRequest};
use crate::Id;

fn request(task_id: &str, earliest: f64, latest: f64) -> TaskRequest {
    TaskRequest {
        task_id: task_id.to_string(),
        earliest_pickup: earliest,
        latest_pickup: latest,
        travel_time: InterTimepointConstraint::new(DurationName::TravelTime, 6.0, 0.0).unwrap(),
        work_time: InterTimepointConstraint::new(DurationName::WorkTime, 4.0, 0.0).unwrap(),
        pickup_action_id: None,
        delivery_action_id: None,
    }
}

fn stn_task(task_id: &str, earliest: f64, latest: f64) -> Task {
    task_from_request::<Stn>(&request(task_id, earliest, latest)).unwrap()
}

fn sequential_network(windows: &[(f64, f64)]) -> TemporalNetwork<Stn> {
    let mut network = TemporalNetwork::<Stn>::new();
    for (index, &(earliest, latest)) in windows.iter().enumerate() {
        let task = stn_task(&format!("task-{}", index + 1), earliest, latest);
        network.add_task(&task, index + 1).unwrap();
    }
    network
}

#[test]
fn a_task_adds_three_timepoints_and_five_constraints() {
    let network = sequential_network(&[(41.0, 47.0)]);
    assert_eq!(network.node_count(), 4);
    // 3 windows + travel + work, each as two directed edges.
    assert_eq!(network.edge_count(), 10);
    assert_eq!(network.timepoint(1).unwrap().node_type, NodeKind::Start);
    assert_eq!(network.timepoint(2).unwrap().node_type, NodeKind::Pickup);
    assert_eq!(network.timepoint(3).unwrap().node_type, NodeKind::Delivery);
}

#[test]
fn neighbouring_tasks_are_joined_by_a_wait_edge() {
    let network = sequential_network(&[(41.0, 47.0), (96.0, 102.0)]);
    let constraints = network.get_constraints();
    let wait = constraints.get(&(3, 4)).expect("wait edge between delivery and next start");
    assert_eq!(wait.lower, 0.0);
    assert_eq!(wait.upper, f64::INFINITY);
}

#[test]
fn insert_at_middle_relabels_the_tail() {
    let mut network = sequential_network(&[(10.0, 16.0), (41.0, 47.0), (96.0, 102.0)]);
    let displaced: Id = network.get_task_id(2).unwrap().clone();

    let inserted = stn_task("task-new", 25.0, 31.0);
    network.add_task(&inserted, 2).unwrap();

    assert_eq!(network.node_count(), 13);
    assert_eq!(network.edge_count(), 46);
    assert_eq!(network.get_task_id(2).unwrap(), "task-new");
    assert_eq!(network.get_task_id(3).unwrap(), &displaced);
    assert_eq!(network.get_task_position(&displaced), Some(3));
    assert_eq!(
        network.get_tasks(),
        vec!["task-1".to_string(), "task-new".to_string(), displaced, "task-3".to_string()]
    );
}

#[test]
fn add_then_remove_restores_the_network() {
    let reference = sequential_network(&[(10.0, 16.0), (96.0, 102.0)]);

    let mut network = reference.clone();
    network.add_task(&stn_task("task-middle", 41.0, 47.0), 2).unwrap();
    assert_ne!(network, reference);

    network.remove_task(2).unwrap();
    assert_eq!(network, reference);
}

#[test]
fn removing_the_first_task_shifts_the_rest_forward() {
    let mut network = sequential_network(&[(10.0, 16.0), (41.0, 47.0)]);
    network.remove_task(1).unwrap();

    assert_eq!(network.node_count(), 4);
    assert_eq!(network.get_task_id(1).unwrap(), "task-2");
    // No predecessor: the leading wait edge must not reappear.
    assert!(network.get_constraints().get(&(0, 1)).is_some());
    assert_eq!(network.task_count(), 1);
}

#[test]
fn removing_a_middle_task_reconnects_its_neighbours() {
    let mut network = sequential_network(&[(10.0, 16.0), (41.0, 47.0), (96.0, 102.0)]);
    network.remove_task(2).unwrap();

    assert_eq!(network.node_count(), 7);
    let constraints = network.get_constraints();
    let wait = constraints.get(&(3, 4)).expect("neighbours re-joined by a wait edge");
    assert_eq!((wait.lower, wait.upper), (0.0, f64::INFINITY));
    assert_eq!(network.get_tasks(), vec!["task-1".to_string(), "task-3".to_string()]);
}

#[test]
fn remove_task_rejects_empty_positions() {
    let mut network = sequential_network(&[(10.0, 16.0)]);
    assert!(matches!(network.remove_task(2), Err(NetworkError::NoTaskAtPosition(2))));
    assert!(matches!(network.remove_task(0), Err(NetworkError::InvalidPosition(0))));
}

#[test]
fn empty_intervals_are_rejected() {
    let mut network = TemporalNetwork::<Stn>::new();
    network.add_node(1, Timepoint::new("t", NodeKind::Start));
    let err = network.add_constraint(0, 1, 47.0, 41.0).unwrap_err();
    assert!(matches!(err, NetworkError::InvalidConstraint { .. }));
}

#[test]
fn update_edge_weight_only_tightens() {
    let mut network = TemporalNetwork::<Stn>::new();
    network.add_node(1, Timepoint::new("t", NodeKind::Start));
    network.add_constraint(0, 1, 35.0, 41.0).unwrap();

    network.update_edge_weight(0, 1, 50.0);
    assert_eq!(network.get_edge_weight(0, 1), 41.0);

    network.update_edge_weight(0, 1, 39.0);
    assert_eq!(network.get_edge_weight(0, 1), 39.0);

    // Missing edges are left alone.
    network.update_edge_weight(1, 2, 5.0);
    assert_eq!(network.get_edge_weight(1, 2), f64::INFINITY);
}

#[test]
fn implicit_weights_follow_distance_graph_semantics() {
    let network = TemporalNetwork::<Stn>::new();
    assert_eq!(network.get_edge_weight(0, 0), 0.0);
    assert_eq!(network.get_edge_weight(0, 9), f64::INFINITY);
}

#[test]
fn assign_timepoint_pins_both_window_edges() {
    let mut network = sequential_network(&[(41.0, 47.0)]);
    network.assign_timepoint("task-1", NodeKind::Pickup, 42.0).unwrap();

    assert_eq!(network.get_time("task-1", NodeKind::Pickup, true), Some(42.0));
    assert_eq!(network.get_time("task-1", NodeKind::Pickup, false), Some(42.0));
    assert!(network.is_consistent());

    let err = network.assign_timepoint("ghost", NodeKind::Pickup, 42.0).unwrap_err();
    assert!(matches!(err, NetworkError::UnknownTimepoint { .. }));
}

#[test]
fn execute_timepoint_marks_the_node() {
    let mut network = sequential_network(&[(41.0, 47.0)]);
    network.execute_timepoint("task-1", NodeKind::Start).unwrap();
    assert!(network.timepoint(1).unwrap().is_executed);
    assert!(!network.timepoint(2).unwrap().is_executed);
}

#[test]
fn subgraph_keeps_the_zero_timepoint_and_leading_tasks() {
    let network = sequential_network(&[(10.0, 16.0), (41.0, 47.0), (96.0, 102.0)]);
    let subgraph = network.get_subgraph(2);

    assert_eq!(subgraph.node_count(), 7);
    assert_eq!(subgraph.get_tasks(), vec!["task-1".to_string(), "task-2".to_string()]);
    // Edges into the dropped third task are gone.
    assert_eq!(subgraph.get_edge_weight(6, 7), f64::INFINITY);
    // Edges among the kept nodes survive.
    assert_eq!(subgraph.get_constraints().len(), 11);
}

#[test]
fn task_node_ids_follow_the_positional_scheme() {
    let network = sequential_network(&[(10.0, 16.0), (41.0, 47.0)]);
    assert_eq!(network.get_task_node_ids("task-2"), vec![4, 5, 6]);
    assert_eq!(network.get_task_position("task-2"), Some(2));
    assert_eq!(network.get_earliest_task_id().unwrap(), "task-1");
}

#[test]
fn to_stn_drops_contingency_metadata() {
    let mut pstn = TemporalNetwork::<Pstn>::new();
    let task = task_from_request::<Pstn>(&TaskRequest {
        task_id: "t".into(),
        earliest_pickup: 41.0,
        latest_pickup: 47.0,
        travel_time: InterTimepointConstraint::new(DurationName::TravelTime, 6.0, 1.0).unwrap(),
        work_time: InterTimepointConstraint::new(DurationName::WorkTime, 4.0, 1.0).unwrap(),
        pickup_action_id: None,
        delivery_action_id: None,
    })
    .unwrap();
    pstn.add_task(&task, 1).unwrap();
    assert_eq!(pstn.get_contingent_constraints().len(), 2);

    let stn = pstn.to_stn();
    assert!(stn.get_contingent_constraints().is_empty());
    assert_eq!(stn.node_count(), pstn.node_count());
    assert_eq!(stn.edge_count(), pstn.edge_count());
}

#[test]
fn sampled_realizations_replace_contingent_edges_with_points() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut pstn = TemporalNetwork::<Pstn>::new();
    let task = task_from_request::<Pstn>(&TaskRequest {
        task_id: "t".into(),
        earliest_pickup: 41.0,
        latest_pickup: 47.0,
        travel_time: InterTimepointConstraint::new(DurationName::TravelTime, 6.0, 1.0).unwrap(),
        work_time: InterTimepointConstraint::new(DurationName::WorkTime, 4.0, 1.0).unwrap(),
        pickup_action_id: None,
        delivery_action_id: None,
    })
    .unwrap();
    pstn.add_task(&task, 1).unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let realization = pstn.sample_realization(&mut rng);
    let constraints = realization.get_constraints();

    let travel = constraints.get(&(1, 2)).unwrap();
    assert!(travel.width().abs() < 1e-9);
    assert!(travel.upper >= 0.0);
    let work = constraints.get(&(2, 3)).unwrap();
    assert!(work.width().abs() < 1e-9);
}

#[test]
fn shrink_contingent_constraint_narrows_both_ends() {
    let mut network = TemporalNetwork::<Stnu>::new();
    network.add_node(1, Timepoint::new("t", NodeKind::Start));
    network.add_node(2, Timepoint::new("t", NodeKind::Pickup));
    network
        .insert_constraint(1, 2, ConstraintSpec::contingent(4.0, 8.0, ContingentKind::Bounded))
        .unwrap();

    network.shrink_contingent_constraint(1, 2, 0.5, 1.0);
    let interval = network.get_constraints()[&(1, 2)];
    assert_eq!((interval.lower, interval.upper), (4.5, 7.0));
}
