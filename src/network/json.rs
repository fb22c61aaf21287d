//! Node-link JSON serialization.
//!
//! Wire schema:
//!
//! ```json
//! {
//!   "risk_metric": 0.0,
//!   "nodes": [{"id": 0, "data": {"task_id": "...", "node_type": "zero_timepoint", "is_executed": false}}],
//!   "links": [{"source": 0, "target": 1, "weight": 41.0, "is_contingent": false, "distribution": ""}]
//! }
//! ```
//!
//! Weights are numbers except `+inf`, which is encoded as the string `"inf"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::edge::{ConstraintKind, ContingentKind, EdgeData};
use super::error::NetworkError;
use super::node::Timepoint;
use super::variant::Variant;
use super::TemporalNetwork;

#[derive(Debug, Serialize, Deserialize)]
struct NodeRecord {
    id: usize,
    data: Timepoint,
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkRecord {
    source: usize,
    target: usize,
    #[serde(serialize_with = "serialize_weight", deserialize_with = "deserialize_weight")]
    weight: f64,
    #[serde(default)]
    is_contingent: bool,
    #[serde(default)]
    distribution: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct NetworkRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    risk_metric: Option<f64>,
    nodes: Vec<NodeRecord>,
    links: Vec<LinkRecord>,
}

fn serialize_weight<S: Serializer>(weight: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if weight.is_infinite() && *weight > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_f64(*weight)
    }
}

fn deserialize_weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) if text == "inf" => Ok(f64::INFINITY),
        Raw::Text(text) => Err(serde::de::Error::custom(format!(
            "expected a number or \"inf\", got {:?}",
            text
        ))),
    }
}

impl<V: Variant> TemporalNetwork<V> {
    fn to_record(&self) -> NetworkRecord {
        let nodes = self
            .node_ids()
            .map(|id| NodeRecord {
                id,
                data: self.timepoint(id).expect("node ids come from the timepoint table").clone(),
            })
            .collect();

        let mut links: Vec<LinkRecord> = self
            .edges()
            .map(|(source, target, data)| LinkRecord {
                source,
                target,
                weight: data.weight,
                is_contingent: data.kind.is_contingent(),
                distribution: data.kind.descriptor(),
            })
            .collect();
        links.sort_by_key(|link| (link.source, link.target));

        NetworkRecord {
            risk_metric: self.risk_metric(),
            nodes,
            links,
        }
    }

    fn from_record(record: NetworkRecord) -> Result<Self, NetworkError> {
        let mut network = Self::new();
        for node in record.nodes {
            network.add_node(node.id, node.data);
        }
        for link in record.links {
            let kind = if link.is_contingent {
                ConstraintKind::Contingent(ContingentKind::parse_descriptor(&link.distribution)?)
            } else {
                ConstraintKind::Requirement
            };
            network.add_edge_raw(link.source, link.target, EdgeData::new(link.weight, kind));
        }
        if let Some(risk_metric) = record.risk_metric {
            network.set_risk_metric(risk_metric);
        }
        Ok(network)
    }

    /// Serializes the network to node-link JSON.
    pub fn to_json(&self) -> Result<String, NetworkError> {
        Ok(serde_json::to_string(&self.to_record())?)
    }

    /// Reads a network from node-link JSON.
    pub fn from_json(payload: &str) -> Result<Self, NetworkError> {
        Self::from_record(serde_json::from_str(payload)?)
    }
}
