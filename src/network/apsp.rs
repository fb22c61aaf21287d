//! All-pairs shortest paths over the distance graph.
//!
//! Floyd-Warshall over node ids, with `+inf` as the absorbing "no path"
//! weight. The network is consistent iff the diagonal of the resulting
//! matrix is zero within [`CONSISTENCY_TOLERANCE`]; a negative diagonal
//! entry witnesses a negative cycle.

use super::variant::Variant;
use super::TemporalNetwork;

/// Absolute tolerance absorbing floating-point drift in consistency checks
/// and interval-width comparisons.
pub const CONSISTENCY_TOLERANCE: f64 = 1e-9;

/// Dense all-pairs shortest-path distances, indexed by node id.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    ids: Vec<usize>,
    distances: Vec<f64>,
}

impl DistanceMatrix {
    /// Node ids covered by the matrix, in ascending order.
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Shortest-path distance from `i` to `j`; `None` if either id is not in
    /// the matrix.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let row = self.ids.binary_search(&i).ok()?;
        let column = self.ids.binary_search(&j).ok()?;
        Some(self.distances[row * self.ids.len() + column])
    }

    /// True iff every diagonal entry is zero within the tolerance.
    pub fn is_consistent(&self) -> bool {
        let n = self.ids.len();
        (0..n).all(|i| self.distances[i * n + i].abs() < CONSISTENCY_TOLERANCE)
    }
}

/// Computes all-pairs shortest paths with Floyd-Warshall.
pub fn floyd_warshall<V: Variant>(network: &TemporalNetwork<V>) -> DistanceMatrix {
    let ids: Vec<usize> = network.node_ids().collect();
    let n = ids.len();
    let mut distances = vec![f64::INFINITY; n * n];

    for (row, &i) in ids.iter().enumerate() {
        distances[row * n + row] = 0.0;
        for (column, &j) in ids.iter().enumerate() {
            if let Some(weight) = network.edge_weight(i, j) {
                if weight < distances[row * n + column] {
                    distances[row * n + column] = weight;
                }
            }
        }
    }

    for k in 0..n {
        for i in 0..n {
            let d_ik = distances[i * n + k];
            if d_ik.is_infinite() {
                continue;
            }
            for j in 0..n {
                let candidate = d_ik + distances[k * n + j];
                if candidate < distances[i * n + j] {
                    distances[i * n + j] = candidate;
                }
            }
        }
    }

    DistanceMatrix { ids, distances }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Stn;

    #[test]
    fn distances_tighten_through_intermediate_nodes() {
        let mut network = TemporalNetwork::<Stn>::new();
        network.add_node(1, crate::network::Timepoint::new("a", crate::network::NodeKind::Start));
        network.add_node(2, crate::network::Timepoint::new("a", crate::network::NodeKind::Pickup));
        network.add_constraint(0, 1, 0.0, 10.0).unwrap();
        network.add_constraint(0, 2, 0.0, 3.0).unwrap();
        network.add_constraint(2, 1, 0.0, 2.0).unwrap();

        let matrix = floyd_warshall(&network);
        assert!(matrix.is_consistent());
        // 0 -> 2 -> 1 is shorter than the direct upper bound.
        assert_eq!(matrix.get(0, 1), Some(5.0));
    }

    #[test]
    fn negative_cycle_is_detected() {
        let mut network = TemporalNetwork::<Stn>::new();
        network.add_node(1, crate::network::Timepoint::new("a", crate::network::NodeKind::Start));
        network.add_node(2, crate::network::Timepoint::new("a", crate::network::NodeKind::Pickup));
        // Node 1 is fixed at 5 and node 2 must follow it by at least 10,
        // yet node 2 may not exceed 8: a negative cycle.
        network.add_constraint(0, 1, 5.0, 5.0).unwrap();
        network.add_constraint(1, 2, 10.0, 20.0).unwrap();
        network.add_constraint(0, 2, 0.0, 8.0).unwrap();

        let matrix = floyd_warshall(&network);
        assert!(!matrix.is_consistent());
    }

    #[test]
    fn missing_nodes_yield_none() {
        let network = TemporalNetwork::<Stn>::new();
        let matrix = floyd_warshall(&network);
        assert_eq!(matrix.get(0, 0), Some(0.0));
        assert_eq!(matrix.get(0, 7), None);
    }
}
