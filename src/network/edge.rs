//! Edges of the distance graph and the contingency taxonomy.
//!
//! Every undirected constraint `i --[-wji, wij]--> j` is materialised as two
//! directed edges: `i -> j` carrying the upper bound `wij` and `j -> i`
//! carrying the negated lower bound `-wji`. Both directions share the same
//! [`ConstraintKind`].

use std::fmt;

use super::error::NetworkError;

/// Wire descriptor prefix for normal distributions (`N_<mu>_<sigma>`).
const NORMAL_PREFIX: &str = "N";
/// Wire descriptor prefix for uniform distributions (`U_<a>_<b>`).
const UNIFORM_PREFIX: &str = "U";

/// How an uncontrollable duration is described.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContingentKind {
    /// Bounded interval with no distribution attached (STNU).
    Bounded,
    /// Normally distributed duration (PSTN).
    Normal { mu: f64, sigma: f64 },
    /// Uniformly distributed duration (PSTN).
    Uniform { lower: f64, upper: f64 },
}

impl ContingentKind {
    /// Parses a wire descriptor such as `N_6_1` or `U_4_8`.
    ///
    /// An empty descriptor denotes a bounded contingency.
    pub fn parse_descriptor(descriptor: &str) -> Result<Self, NetworkError> {
        if descriptor.is_empty() {
            return Ok(ContingentKind::Bounded);
        }
        let invalid = || NetworkError::InvalidDistribution {
            descriptor: descriptor.to_string(),
        };
        let mut parts = descriptor.split('_');
        let prefix = parts.next().ok_or_else(invalid)?;
        let first: f64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        let second: f64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        match prefix {
            NORMAL_PREFIX => Ok(ContingentKind::Normal { mu: first, sigma: second }),
            UNIFORM_PREFIX => Ok(ContingentKind::Uniform { lower: first, upper: second }),
            _ => Err(invalid()),
        }
    }

    /// Formats the wire descriptor; empty for a bounded contingency.
    pub fn descriptor(&self) -> String {
        match self {
            ContingentKind::Bounded => String::new(),
            ContingentKind::Normal { mu, sigma } => format!("{}_{}_{}", NORMAL_PREFIX, mu, sigma),
            ContingentKind::Uniform { lower, upper } => {
                format!("{}_{}_{}", UNIFORM_PREFIX, lower, upper)
            }
        }
    }

    /// Draws a duration; `None` for a bounded contingency, which carries no
    /// distribution to sample from.
    pub fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        match *self {
            ContingentKind::Bounded => None,
            ContingentKind::Normal { mu, sigma } => {
                Some(crate::distributions::sample_normal(rng, mu, sigma))
            }
            ContingentKind::Uniform { lower, upper } => {
                Some(crate::distributions::sample_uniform(rng, lower, upper))
            }
        }
    }
}

impl fmt::Display for ContingentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// Whether a constraint is controlled by the scheduler or by the environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintKind {
    /// The scheduler chooses the duration.
    Requirement,
    /// Nature chooses the duration at execution time.
    Contingent(ContingentKind),
}

impl ConstraintKind {
    pub fn is_contingent(&self) -> bool {
        matches!(self, ConstraintKind::Contingent(_))
    }

    /// Wire descriptor of the attached distribution; empty for requirements
    /// and bounded contingencies.
    pub fn descriptor(&self) -> String {
        match self {
            ConstraintKind::Requirement => String::new(),
            ConstraintKind::Contingent(kind) => kind.descriptor(),
        }
    }
}

/// One directed edge of the distance graph.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    pub weight: f64,
    pub kind: ConstraintKind,
}

impl EdgeData {
    pub fn new(weight: f64, kind: ConstraintKind) -> Self {
        Self { weight, kind }
    }

    pub fn requirement(weight: f64) -> Self {
        Self::new(weight, ConstraintKind::Requirement)
    }
}

/// Undirected view of a stored constraint: `[lower, upper]` plus its kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintInterval {
    pub lower: f64,
    pub upper: f64,
    pub kind: ConstraintKind,
}

impl ConstraintInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Specification of a constraint to install, produced by the variant-specific
/// inter-timepoint edge derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintSpec {
    pub lower: f64,
    pub upper: f64,
    pub kind: ConstraintKind,
}

impl ConstraintSpec {
    pub fn requirement(lower: f64, upper: f64) -> Self {
        Self { lower, upper, kind: ConstraintKind::Requirement }
    }

    pub fn contingent(lower: f64, upper: f64, kind: ContingentKind) -> Self {
        Self { lower, upper, kind: ConstraintKind::Contingent(kind) }
    }
}
