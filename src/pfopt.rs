use derive_builder::Builder;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub enum Alg {
    /// Newton's method.
    #[default]
    NR = 0,
    /// Current summation method (radial networks only).
    SUM = 4,
}

impl FromStr for Alg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nr" => Ok(Alg::NR),
            "sum" => Ok(Alg::SUM),
            _ => Err(format!("unknown power flow algorithm '{}'", s)),
        }
    }
}

impl fmt::Display for Alg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alg::NR => write!(f, "nr"),
            Alg::SUM => write!(f, "sum"),
        }
    }
}

/// Power flow options.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct PfOpt {
    /// AC power flow algorithm.
    pub algorithm: Alg,

    /// Termination tolerance on per unit P & Q mismatch. Default value is 1e-8.
    pub tolerance: f64,

    /// Maximum number of iterations for Newton's method. Default value is 50.
    pub max_it_nr: usize,

    /// Maximum number of iterations for the summation method. Default value is 1000.
    pub max_it_sum: usize,
}

impl Default for PfOpt {
    fn default() -> Self {
        Self {
            algorithm: Alg::NR,
            tolerance: 1e-8,
            max_it_nr: 50,
            max_it_sum: 1000,
        }
    }
}
