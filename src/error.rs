use crate::network::{BranchId, BusId};
use thiserror::Error;

/// Malformed graph structure, or a path requested for a bus that has none.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopologyError {
    #[error("network has no source (slack) bus")]
    NoSource,

    #[error("network has more than one source bus: {first} and {second}")]
    MultipleSources { first: BusId, second: BusId },

    #[error("network is not radial: cycle closes at bus {bus}")]
    Cycle { bus: BusId },

    #[error("bus {bus} is not reachable from the source bus")]
    Unreachable { bus: BusId },

    #[error("no path from the source bus to bus {bus}")]
    MissingPath { bus: BusId },
}

/// Network description that cannot be analysed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("duplicate bus id {0}")]
    DuplicateBus(BusId),

    #[error("duplicate branch id {0}")]
    DuplicateBranch(BranchId),

    #[error("branch {branch} refers to unknown bus {bus}")]
    UnknownEndpoint { branch: BranchId, bus: BusId },

    #[error("branch {0} connects a bus to itself")]
    SelfLoop(BranchId),

    #[error("branch {0} has zero series impedance")]
    ZeroImpedance(BranchId),

    #[error("bus {bus} has non-positive nominal voltage {vn_kv} kV")]
    NominalVoltage { bus: BusId, vn_kv: f64 },

    #[error("base power must be positive (sn_mva = {0})")]
    BasePower(f64),

    #[error("network has no buses")]
    Empty,

    #[error("{0} is not a finite number")]
    NonFinite(String),

    #[error("load bus admittance matrix is singular: {0}")]
    SingularAdmittance(String),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Invalid user input, surfaced before any sweep work begins.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("unknown network '{0}' (expected one of: twobus, ieee123, star, all)")]
    UnknownNetwork(String),

    #[error("at least 2 sweep points are required (got {0})")]
    Points(usize),

    #[error("invalid multiplier range [{min}, {max}]")]
    Range { min: f64, max: f64 },

    #[error("load multipliers must be non-negative and strictly increasing")]
    Multipliers,

    #[error("sweep has no metrics to evaluate")]
    NoMetrics,

    #[error("cannot read network file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse network file {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Fatal errors that abort a sweep.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SweepError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Network(#[from] NetworkError),
}
