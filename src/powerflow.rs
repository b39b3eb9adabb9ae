use crate::case::Case;
use crate::debug::format_polar_map;
use crate::error::TopologyError;
use crate::jac::{make_jac, min_singular_value};
use crate::network::{BranchId, BusId};
use crate::newton::{newtonpf, LogProgress};
use crate::pfopt::{Alg, PfOpt};
use crate::radial::radial_pf;
use crate::session::Session;
use crate::topology::Topology;
use crate::traits::DenseLU;
use nalgebra::DMatrix;
use num_complex::Complex64;
use std::collections::BTreeMap;

/// Power flow snapshot at one load multiplier.
///
/// Branch currents are oriented from `from_bus` to `to_bus` as defined in
/// the network description. Both maps are empty if the power flow did not
/// converge.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerFlowResult {
    pub load_multiplier: f64,
    pub converged: bool,
    pub bus_voltage: BTreeMap<BusId, Complex64>,
    pub branch_current: BTreeMap<BranchId, Complex64>,
    pub iterations: usize,
    /// Smallest singular value of the converged power flow Jacobian, if the
    /// solver computes one.
    pub min_singular_value: Option<f64>,
}

impl PowerFlowResult {
    pub fn not_converged(load_multiplier: f64, iterations: usize) -> Self {
        Self {
            load_multiplier,
            converged: false,
            bus_voltage: BTreeMap::new(),
            branch_current: BTreeMap::new(),
            iterations,
            min_singular_value: None,
        }
    }

    pub fn voltage(&self, bus: BusId) -> Result<Complex64, TopologyError> {
        self.bus_voltage
            .get(&bus)
            .copied()
            .ok_or(TopologyError::MissingPath { bus })
    }

    /// Branch current in the from → to direction.
    pub fn current(&self, branch: BranchId) -> Option<Complex64> {
        self.branch_current.get(&branch).copied()
    }
}

/// Everything a solver needs for one solve, in internal bus order.
pub struct PowerFlowInput<'a> {
    pub case: &'a Case,
    pub topology: &'a Topology,
    pub y_bus: &'a DMatrix<Complex64>,
    /// Scaled complex bus power injections (p.u.).
    pub s_bus: Vec<Complex64>,
}

/// Raw solver output in internal bus order.
pub struct SolverOutput {
    pub v: Vec<Complex64>,
    pub converged: bool,
    pub iterations: usize,
    pub min_singular_value: Option<f64>,
}

/// The numerical power flow routine behind the adapter.
pub trait PowerFlowSolver {
    fn solve(&self, input: &PowerFlowInput) -> Result<SolverOutput, String>;
}

/// Newton-Raphson or current summation solver with flat start.
#[derive(Default)]
pub struct Solver {
    pub opt: PfOpt,
    pub lin_solver: DenseLU,
}

impl Solver {
    pub fn new(opt: PfOpt) -> Self {
        Self {
            opt,
            lin_solver: DenseLU,
        }
    }
}

impl PowerFlowSolver for Solver {
    fn solve(&self, input: &PowerFlowInput) -> Result<SolverOutput, String> {
        let case = input.case;
        // flat start
        let v0 = vec![case.v_slack; case.nb()];
        let pq = case.non_slack();

        match self.opt.algorithm {
            Alg::NR => {
                let (v, converged, iterations) = newtonpf(
                    input.y_bus,
                    &input.s_bus,
                    &v0,
                    &pq,
                    &self.lin_solver,
                    &self.opt,
                    Some(&LogProgress),
                )?;
                let min_singular_value = if converged {
                    let jac = make_jac(input.y_bus, &v, &pq);
                    min_singular_value(&jac)
                } else {
                    None
                };
                Ok(SolverOutput {
                    v,
                    converged,
                    iterations,
                    min_singular_value,
                })
            }
            Alg::SUM => {
                let (v, converged, iterations) = radial_pf(
                    input.topology,
                    input.y_bus,
                    &input.s_bus,
                    &v0,
                    &self.opt,
                    Some(&LogProgress),
                )?;
                Ok(SolverOutput {
                    v,
                    converged,
                    iterations,
                    min_singular_value: None,
                })
            }
        }
    }
}

/// Solves the power flow of the session's network with every base load and
/// static generator scaled by `load_multiplier`.
///
/// Solver failures and non-convergence both yield a result with
/// `converged == false`; no error is raised for either.
pub fn solve(session: &Session, solver: &dyn PowerFlowSolver, load_multiplier: f64) -> PowerFlowResult {
    let case = session.case();
    let input = PowerFlowInput {
        case,
        topology: session.topology(),
        y_bus: session.y_bus(),
        s_bus: case.s_bus(load_multiplier),
    };

    let out = match solver.solve(&input) {
        Ok(out) => out,
        Err(err) => {
            log::debug!("power flow failed at load multiplier {}: {}", load_multiplier, err);
            return PowerFlowResult::not_converged(load_multiplier, 0);
        }
    };
    if !out.converged {
        return PowerFlowResult::not_converged(load_multiplier, out.iterations);
    }
    if out.v.len() != case.nb() || out.v.iter().any(|v| !(v.re.is_finite() && v.im.is_finite())) {
        log::warn!(
            "solver returned an invalid voltage vector at load multiplier {}",
            load_multiplier
        );
        return PowerFlowResult::not_converged(load_multiplier, out.iterations);
    }

    let bus_voltage: BTreeMap<BusId, Complex64> =
        case.i2e.iter().copied().zip(out.v.iter().copied()).collect();
    log::trace!("V = {}", format_polar_map(&bus_voltage));
    let branch_current = case
        .branch
        .iter()
        .map(|br| (br.id, (out.v[br.f_bus] - out.v[br.t_bus]) / br.z))
        .collect();

    PowerFlowResult {
        load_multiplier,
        converged: true,
        bus_voltage,
        branch_current,
        iterations: out.iterations,
        min_singular_value: out.min_singular_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{assert_close, star, twobus};
    use anyhow::Result;

    struct Failing;

    impl PowerFlowSolver for Failing {
        fn solve(&self, _input: &PowerFlowInput) -> Result<SolverOutput, String> {
            Err("singular Jacobian".to_string())
        }
    }

    #[test]
    fn solver_failure_maps_to_non_convergence() -> Result<()> {
        let session = Session::new(twobus())?;
        let pf = solve(&session, &Failing, 2.0);
        assert!(!pf.converged);
        assert_eq!(pf.load_multiplier, 2.0);
        assert!(pf.bus_voltage.is_empty());
        Ok(())
    }

    #[test]
    fn beyond_collapse_is_not_converged() -> Result<()> {
        let session = Session::new(twobus())?;
        let pf = solve(&session, &Solver::default(), 310.0);
        assert!(!pf.converged);
        Ok(())
    }

    #[test]
    fn currents_balance_at_every_bus() -> Result<()> {
        let session = Session::new(star())?;
        let pf = solve(&session, &Solver::default(), 5.0);
        assert!(pf.converged);
        assert!(pf.min_singular_value.is_some());

        for bus in session.network().buses.iter().filter(|b| !b.is_slack()) {
            let mut net_in = Complex64::default();
            for br in session.network().branches.iter() {
                let i = pf.current(br.id).unwrap();
                if br.to_bus == bus.id {
                    net_in += i;
                } else if br.from_bus == bus.id {
                    net_in -= i;
                }
            }
            // current drawn by the load: conj(S_load / V)
            let v = pf.voltage(bus.id)?;
            let s_load = -bus.s_inj_mva() * 5.0 / session.network().sn_mva;
            let drawn = (s_load / v).conj();
            assert_close((net_in - drawn).norm(), 0.0, 1e-6);
        }
        Ok(())
    }

    #[test]
    fn summation_solver_converges_at_moderate_load() -> Result<()> {
        let session = Session::new(twobus())?;
        let opt = PfOpt {
            algorithm: Alg::SUM,
            ..Default::default()
        };
        let pf = solve(&session, &Solver::new(opt), 100.0);
        assert!(pf.converged);
        assert!(pf.min_singular_value.is_none());
        assert_close(pf.voltage(BusId(1))?.norm(), 0.9412172407866677, 1e-7);
        Ok(())
    }
}
