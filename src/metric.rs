use crate::debug::format_f64_map;
use crate::determinant::{path_accumulated, single_branch};
use crate::error::TopologyError;
use crate::margin::injection_margin;
use crate::network::{BranchId, BusId};
use crate::powerflow::PowerFlowResult;
use crate::session::Session;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Voltage stability index evaluated at every converged load level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    /// Kessel-Glavitsch L-index, maximum over load buses.
    LIndex,
    /// Voltage magnitude less accumulated path drop, minimum over buses.
    InjectionMargin,
    /// Receiving-end voltage determinant per branch.
    SingleBranch,
    /// Single-branch determinants summed along the path from the source.
    PathAccumulated,
}

/// Direction in which a metric indicates stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

/// The bus or branch where a metric attains its critical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Element {
    Bus(BusId),
    Branch(BranchId),
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Bus(id) => write!(f, "bus {}", id),
            Element::Branch(id) => write!(f, "branch {}", id),
        }
    }
}

/// Value of one metric at one load level.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Per-bus values of a network-level index.
    Bus(BTreeMap<BusId, f64>),
    /// Per-branch values of a branch-level index.
    Branch(BTreeMap<BranchId, f64>),
}

impl MetricValue {
    /// Critical value and the element where it occurs. Ties resolve to the
    /// lowest id. `None` if there are no elements.
    pub fn critical(&self, extremum: Extremum) -> Option<(f64, Element)> {
        match self {
            MetricValue::Bus(m) => extreme(m.iter().map(|(&k, &v)| (v, Element::Bus(k))), extremum),
            MetricValue::Branch(m) => extreme(m.iter().map(|(&k, &v)| (v, Element::Branch(k))), extremum),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MetricValue::Bus(m) => m.len(),
            MetricValue::Branch(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Bus(m) => f.write_str(&format_f64_map(m)),
            MetricValue::Branch(m) => f.write_str(&format_f64_map(m)),
        }
    }
}

fn extreme(values: impl Iterator<Item = (f64, Element)>, extremum: Extremum) -> Option<(f64, Element)> {
    values.fold(None, |best, (v, e)| match best {
        None => Some((v, e)),
        Some((b, _)) if (extremum == Extremum::Max && v > b) || (extremum == Extremum::Min && v < b) => {
            Some((v, e))
        }
        keep => keep,
    })
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::LIndex,
        Metric::InjectionMargin,
        Metric::SingleBranch,
        Metric::PathAccumulated,
    ];

    /// Short identifier used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::LIndex => "l-index",
            Metric::InjectionMargin => "injection",
            Metric::SingleBranch => "single-branch",
            Metric::PathAccumulated => "path-accumulated",
        }
    }

    /// Human readable label used in reports and plot legends.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::LIndex => "L-index",
            Metric::InjectionMargin => "Injection margin",
            Metric::SingleBranch => "Single-branch determinant",
            Metric::PathAccumulated => "Path-accumulated margin",
        }
    }

    pub fn extremum(&self) -> Extremum {
        match self {
            Metric::LIndex => Extremum::Max,
            _ => Extremum::Min,
        }
    }

    /// Evaluates the metric for a converged power flow result. The result
    /// is not modified and repeated evaluation yields identical values.
    pub fn evaluate(&self, pf: &PowerFlowResult, session: &Session) -> Result<MetricValue, TopologyError> {
        let topo = session.topology();
        Ok(match self {
            Metric::LIndex => MetricValue::Bus(session.l_index().evaluate(pf)?),
            Metric::InjectionMargin => MetricValue::Bus(injection_margin(topo, pf)?),
            Metric::SingleBranch => MetricValue::Branch(single_branch(topo, pf)?),
            Metric::PathAccumulated => MetricValue::Branch(path_accumulated(topo, pf)?),
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Metric::ALL.iter().map(|m| m.name()).collect();
                format!("unknown metric '{}', expected one of {}", s, names.join(", "))
            })
    }
}
