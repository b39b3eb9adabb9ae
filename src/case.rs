use crate::error::{NetworkError, TopologyError};
use crate::network::{BranchId, BusId, NetworkDescription};
use num_complex::Complex64;
use std::collections::{HashMap, HashSet};

/// Case is a network description converted to per-unit quantities with
/// consecutive internal bus numbering beginning at 0.
#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,

    /// System MVA base.
    pub base_mva: f64,

    /// External to internal bus index.
    pub e2i: HashMap<BusId, usize>,
    /// Internal to external bus index.
    pub i2e: Vec<BusId>,

    /// Internal index of the source bus.
    pub slack: usize,
    /// Source bus voltage phasor (p.u.).
    pub v_slack: Complex64,

    /// Net complex power injection per bus at unit load multiplier (p.u.).
    pub s_inj: Vec<Complex64>,

    pub branch: Vec<CaseBranch>,
}

/// Branch with internal endpoints and per-unit series impedance.
#[derive(Debug, Clone, Copy)]
pub struct CaseBranch {
    pub id: BranchId,
    pub f_bus: usize,
    pub t_bus: usize,
    pub z: Complex64,
}

impl Case {
    /// Converts the network to internal indexing, validating ids, endpoints,
    /// impedances and the presence of exactly one source bus.
    pub fn new(net: &NetworkDescription) -> Result<Self, NetworkError> {
        if net.buses.is_empty() {
            return Err(NetworkError::Empty);
        }
        if !(net.sn_mva > 0.0) {
            return Err(NetworkError::BasePower(net.sn_mva));
        }

        let nb = net.buses.len();
        let mut e2i = HashMap::with_capacity(nb);
        let mut i2e = Vec::with_capacity(nb);
        let mut s_inj = Vec::with_capacity(nb);
        let mut slack: Option<usize> = None;

        for (i, b) in net.buses.iter().enumerate() {
            if e2i.insert(b.id, i).is_some() {
                return Err(NetworkError::DuplicateBus(b.id));
            }
            if !(b.vn_kv > 0.0) {
                return Err(NetworkError::NominalVoltage {
                    bus: b.id,
                    vn_kv: b.vn_kv,
                });
            }
            for (what, value) in [
                ("vm_pu", b.vm_pu),
                ("va_degree", b.va_degree),
                ("p_mw", b.p_mw),
                ("q_mvar", b.q_mvar),
                ("p_gen_mw", b.p_gen_mw),
                ("q_gen_mvar", b.q_gen_mvar),
            ] {
                if !value.is_finite() {
                    return Err(NetworkError::NonFinite(format!("bus {} {}", b.id, what)));
                }
            }
            if b.is_slack() {
                if let Some(s) = slack {
                    return Err(TopologyError::MultipleSources {
                        first: i2e[s],
                        second: b.id,
                    }
                    .into());
                }
                slack = Some(i);
            }
            i2e.push(b.id);
            s_inj.push(b.s_inj_mva() / net.sn_mva);
        }
        let slack = slack.ok_or(TopologyError::NoSource)?;
        let sb = &net.buses[slack];
        let v_slack = Complex64::from_polar(sb.vm_pu, sb.va_degree.to_radians());

        let mut seen = HashSet::with_capacity(net.branches.len());
        let mut branch = Vec::with_capacity(net.branches.len());
        for br in net.branches.iter() {
            if !seen.insert(br.id) {
                return Err(NetworkError::DuplicateBranch(br.id));
            }
            let endpoint = |bus: BusId| {
                e2i.get(&bus)
                    .copied()
                    .ok_or(NetworkError::UnknownEndpoint { branch: br.id, bus })
            };
            let (f_bus, t_bus) = (endpoint(br.from_bus)?, endpoint(br.to_bus)?);
            if f_bus == t_bus {
                return Err(NetworkError::SelfLoop(br.id));
            }
            // impedance base taken at the sending end
            let vn_kv = net.buses[f_bus].vn_kv;
            let z_base = vn_kv * vn_kv / net.sn_mva;
            let z = br.z_ohm() / z_base;
            if !(z.re.is_finite() && z.im.is_finite()) {
                return Err(NetworkError::NonFinite(format!("branch {} impedance", br.id)));
            }
            if z.norm() == 0.0 {
                return Err(NetworkError::ZeroImpedance(br.id));
            }
            branch.push(CaseBranch {
                id: br.id,
                f_bus,
                t_bus,
                z,
            });
        }

        Ok(Self {
            name: net.name.clone(),
            base_mva: net.sn_mva,
            e2i,
            i2e,
            slack,
            v_slack,
            s_inj,
            branch,
        })
    }

    pub fn nb(&self) -> usize {
        self.i2e.len()
    }

    pub fn nl(&self) -> usize {
        self.branch.len()
    }

    /// Internal index of every bus other than the source.
    pub fn non_slack(&self) -> Vec<usize> {
        (0..self.nb()).filter(|&i| i != self.slack).collect()
    }

    /// Complex bus power injections scaled by the load multiplier (p.u.).
    pub fn s_bus(&self, load_multiplier: f64) -> Vec<Complex64> {
        self.s_inj.iter().map(|s| s * load_multiplier).collect()
    }
}
