use num_complex::Complex64;
use serde::Deserialize;
use std::fmt;

/// External bus number as it appears in the network description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct BusId(pub usize);

/// External branch number as it appears in the network description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub usize);

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NetworkDescription models a radial distribution feeder as a graph of
/// buses connected by series-impedance branches.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkDescription {
    #[serde(default)]
    pub name: String,

    /// System MVA base used for converting power into per-unit quantities.
    #[serde(default = "default_sn_mva")]
    pub sn_mva: f64,

    #[serde(rename = "bus", default)]
    pub buses: Vec<Bus>,

    #[serde(rename = "branch", default)]
    pub branches: Vec<Branch>,
}

fn default_sn_mva() -> f64 {
    1.0
}

#[derive(Debug, PartialEq, Copy, Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// Fixed voltage magnitude and angle. Slack active and reactive power.
    Slack,
    /// Fixed active and reactive power.
    #[default]
    Load,
}

/// Bus is a node in the network. Base loads and static generation are
/// included in the Bus definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Bus {
    pub id: BusId,

    #[serde(default)]
    pub kind: BusKind,

    /// Nominal voltage (kV).
    pub vn_kv: f64,

    /// Voltage magnitude setpoint of the source bus (p.u.).
    #[serde(default = "default_vm_pu")]
    pub vm_pu: f64,

    /// Voltage angle setpoint of the source bus (degrees).
    #[serde(default)]
    pub va_degree: f64,

    /// Base real power demand (MW).
    #[serde(default)]
    pub p_mw: f64,

    /// Base reactive power demand (MVAr).
    #[serde(default)]
    pub q_mvar: f64,

    /// Base real power of static generation (MW).
    #[serde(default)]
    pub p_gen_mw: f64,

    /// Base reactive power of static generation (MVAr).
    #[serde(default)]
    pub q_gen_mvar: f64,
}

fn default_vm_pu() -> f64 {
    1.0
}

impl Bus {
    pub fn is_slack(&self) -> bool {
        self.kind == BusKind::Slack
    }

    /// Net complex power injection (generation minus load) in MVA at
    /// a load multiplier of one.
    pub fn s_inj_mva(&self) -> Complex64 {
        Complex64::new(self.p_gen_mw - self.p_mw, self.q_gen_mvar - self.q_mvar)
    }
}

/// Branch is a line or cable with a series impedance.
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub id: BranchId,

    pub from_bus: BusId,
    pub to_bus: BusId,

    pub r_ohm_per_km: f64,
    pub x_ohm_per_km: f64,

    #[serde(default = "default_length_km")]
    pub length_km: f64,
}

fn default_length_km() -> f64 {
    1.0
}

impl Branch {
    /// Series impedance in ohms.
    pub fn z_ohm(&self) -> Complex64 {
        Complex64::new(
            self.r_ohm_per_km * self.length_km,
            self.x_ohm_per_km * self.length_km,
        )
    }
}

impl NetworkDescription {
    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.iter().find(|br| br.id == id)
    }
}
