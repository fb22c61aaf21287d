//! Variant-erased network values for the dispatch interface.

use super::error::NetworkError;
use super::variant::{Pstn, Stn, Stnu, Variant};
use super::TemporalNetwork;

/// A temporal network of any variant.
///
/// Solvers and the orchestrator exchange networks through this type; the
/// typed [`TemporalNetwork`] API is recovered with the accessor methods.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyNetwork {
    Stn(TemporalNetwork<Stn>),
    Stnu(TemporalNetwork<Stnu>),
    Pstn(TemporalNetwork<Pstn>),
}

impl AnyNetwork {
    /// Wire name of the wrapped variant.
    pub fn variant_name(&self) -> &'static str {
        match self {
            AnyNetwork::Stn(_) => Stn::NAME,
            AnyNetwork::Stnu(_) => Stnu::NAME,
            AnyNetwork::Pstn(_) => Pstn::NAME,
        }
    }

    pub fn as_stn(&self) -> Option<&TemporalNetwork<Stn>> {
        match self {
            AnyNetwork::Stn(network) => Some(network),
            _ => None,
        }
    }

    pub fn as_stnu(&self) -> Option<&TemporalNetwork<Stnu>> {
        match self {
            AnyNetwork::Stnu(network) => Some(network),
            _ => None,
        }
    }

    pub fn as_pstn(&self) -> Option<&TemporalNetwork<Pstn>> {
        match self {
            AnyNetwork::Pstn(network) => Some(network),
            _ => None,
        }
    }

    pub fn is_consistent(&self) -> bool {
        match self {
            AnyNetwork::Stn(network) => network.is_consistent(),
            AnyNetwork::Stnu(network) => network.is_consistent(),
            AnyNetwork::Pstn(network) => network.is_consistent(),
        }
    }

    pub fn risk_metric(&self) -> Option<f64> {
        match self {
            AnyNetwork::Stn(network) => network.risk_metric(),
            AnyNetwork::Stnu(network) => network.risk_metric(),
            AnyNetwork::Pstn(network) => network.risk_metric(),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            AnyNetwork::Stn(network) => network.node_count(),
            AnyNetwork::Stnu(network) => network.node_count(),
            AnyNetwork::Pstn(network) => network.node_count(),
        }
    }

    pub fn to_json(&self) -> Result<String, NetworkError> {
        match self {
            AnyNetwork::Stn(network) => network.to_json(),
            AnyNetwork::Stnu(network) => network.to_json(),
            AnyNetwork::Pstn(network) => network.to_json(),
        }
    }
}

impl From<TemporalNetwork<Stn>> for AnyNetwork {
    fn from(network: TemporalNetwork<Stn>) -> Self {
        AnyNetwork::Stn(network)
    }
}

impl From<TemporalNetwork<Stnu>> for AnyNetwork {
    fn from(network: TemporalNetwork<Stnu>) -> Self {
        AnyNetwork::Stnu(network)
    }
}

impl From<TemporalNetwork<Pstn>> for AnyNetwork {
    fn from(network: TemporalNetwork<Pstn>) -> Self {
        AnyNetwork::Pstn(network)
    }
}
