//! Branch-level determinant margins.
//!
//! A branch feeding complex power `S = P + jQ` to its receiving end through
//! series impedance `z = r + jx` has a real receiving-end voltage solution
//! only while
//!
//! ```text
//! det = (|V_s|^2 - 2(rP + xQ))^2 - 4|z|^2|S|^2 >= 0
//! ```
//!
//! The single-branch determinant evaluates this locally at every branch;
//! the path-accumulated margin sums it along the path from the source.

use crate::error::TopologyError;
use crate::network::{BranchId, BusId};
use crate::powerflow::PowerFlowResult;
use crate::topology::{BranchInfo, Topology};
use std::collections::{BTreeMap, HashMap};

/// Determinant of one branch using only its endpoint voltages and current.
pub fn branch_determinant(br: &BranchInfo, pf: &PowerFlowResult) -> Result<f64, TopologyError> {
    let v_send = pf.voltage(br.upstream)?;
    let v_recv = pf.voltage(br.downstream)?;
    // current towards the downstream bus
    let i_down = match pf.current(br.id) {
        Some(i) if br.forward => i,
        Some(i) => -i,
        None => (v_send - v_recv) / br.z,
    };
    let s_recv = v_recv * i_down.conj();

    let (r, x) = (br.z.re, br.z.im);
    let (p, q) = (s_recv.re, s_recv.im);
    let a = v_send.norm_sqr() - 2.0 * (r * p + x * q);
    Ok(a * a - 4.0 * br.z.norm_sqr() * s_recv.norm_sqr())
}

/// Single-branch determinant of every branch.
pub fn single_branch(
    topo: &Topology,
    pf: &PowerFlowResult,
) -> Result<BTreeMap<BranchId, f64>, TopologyError> {
    topo.branches()
        .iter()
        .map(|br| Ok((br.id, branch_determinant(br, pf)?)))
        .collect()
}

/// Path-accumulated margin of every branch: the sum of single-branch
/// determinants over the path from the source to the branch's downstream
/// bus, inclusive.
///
/// Buses are visited source to leaf so each bus extends the memoized sum
/// of its upstream bus; shared path prefixes are summed once.
pub fn path_accumulated(
    topo: &Topology,
    pf: &PowerFlowResult,
) -> Result<BTreeMap<BranchId, f64>, TopologyError> {
    let mut acc: HashMap<BusId, f64> = HashMap::with_capacity(topo.branches().len() + 1);
    let mut by_branch = BTreeMap::new();

    for bus in topo.buses() {
        let Some(br) = topo.parent_branch(bus)? else {
            acc.insert(bus, 0.0);
            continue;
        };
        let upstream = *acc
            .get(&br.upstream)
            .ok_or(TopologyError::MissingPath { bus: br.upstream })?;
        let total = upstream + branch_determinant(br, pf)?;
        acc.insert(bus, total);
        by_branch.insert(br.id, total);
    }
    Ok(by_branch)
}
