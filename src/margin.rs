use crate::error::TopologyError;
use crate::network::BusId;
use crate::powerflow::PowerFlowResult;
use crate::topology::Topology;
use std::collections::BTreeMap;

/// Injection-based voltage margin of every non-source bus.
///
/// The margin of bus `h` is its voltage magnitude less the sum of the
/// branch voltage drop magnitudes `|z_k * I_k|` along the path from the
/// source to `h`. It shrinks towards zero as the feeder is loaded.
pub fn injection_margin(
    topo: &Topology,
    pf: &PowerFlowResult,
) -> Result<BTreeMap<BusId, f64>, TopologyError> {
    let mut margin = BTreeMap::new();
    for bus in topo.buses().filter(|&b| b != topo.source()) {
        let v_h = pf.voltage(bus)?.norm();
        let mut drop = 0.0;
        for br in topo.path_to(bus)?.iter() {
            let i = match pf.current(br.id) {
                Some(i) => i,
                None => {
                    let v_f = pf.voltage(br.from_bus)?;
                    let v_t = pf.voltage(br.to_bus)?;
                    (v_f - v_t) / br.z
                }
            };
            drop += (br.z * i).norm();
        }
        margin.insert(bus, v_h - drop);
    }
    Ok(margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powerflow::{solve, Solver};
    use crate::session::Session;
    use crate::tests::{assert_close, star, twobus};
    use anyhow::Result;

    #[test]
    fn twobus_margin() -> Result<()> {
        let session = Session::new(twobus())?;
        let pf = solve(&session, &Solver::default(), 300.0);
        let margin = injection_margin(session.topology(), &pf)?;

        // |V_r| - |V_s - V_r|
        let v_r = pf.voltage(BusId(1))?;
        let expected = v_r.norm() - (pf.voltage(BusId(0))? - v_r).norm();
        assert_close(margin[&BusId(1)], expected, 1e-12);
        assert_close(margin[&BusId(1)], 0.1708, 1e-3);
        Ok(())
    }

    #[test]
    fn margin_shrinks_with_load() -> Result<()> {
        let session = Session::new(star())?;
        let mut last = f64::INFINITY;
        for lam in [1.0, 10.0, 20.0, 26.0] {
            let pf = solve(&session, &Solver::default(), lam);
            assert!(pf.converged);
            let margin = injection_margin(session.topology(), &pf)?;
            assert!(!margin.contains_key(&BusId(0)));
            assert_eq!(margin.len(), 4);
            let min = margin.values().copied().fold(f64::INFINITY, f64::min);
            assert!(min < last);
            last = min;
        }
        Ok(())
    }
}
