use crate::newton::{norm_inf, ProgressMonitor};
use crate::pfopt::PfOpt;
use crate::sbus::mismatch;
use crate::topology::Topology;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

/// Solves power flow on a radial network using the backward/forward
/// current summation method.
///
/// The backward pass sums the currents drawn by every bus into the branch
/// that feeds it, leaf to source; the forward pass updates voltages from the
/// source outward using the branch voltage drops. Convergence is declared
/// on the same P & Q mismatch norm the Newton solver uses.
pub fn radial_pf(
    topo: &Topology,
    y_bus: &DMatrix<Complex64>,
    s_bus: &[Complex64],
    v0: &[Complex64],
    opt: &PfOpt,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<(Vec<Complex64>, bool, usize), String> {
    let nb = v0.len();
    let order = topo.order_internal();
    let nl = topo.branches().len();

    let mut v = v0.to_vec();
    let mut j_branch = vec![Complex64::default(); nl];
    let mut converged = false;
    let mut i = 0;

    let norm_f = mismatch_norm(topo, y_bus, &v, s_bus);
    if let Some(pm) = progress {
        pm.update(i, norm_f);
    }
    if norm_f < opt.tolerance {
        converged = true;
    }

    while !converged && i < opt.max_it_sum {
        i = i + 1;

        // backward sweep: current drawn at each bus, summed towards the source
        let mut acc: Vec<Complex64> = (0..nb).map(|k| -(s_bus[k] / v[k]).conj()).collect();
        for &k in order.iter().rev() {
            if let Some(br) = topo.parent_internal(k) {
                j_branch[br.index] = acc[k];
                let up = topo.index(br.upstream).map_err(|e| e.to_string())?;
                let drawn = acc[k];
                acc[up] += drawn;
            }
        }

        // forward sweep: voltage drops from the source outward
        for &k in order.iter() {
            if let Some(br) = topo.parent_internal(k) {
                let up = topo.index(br.upstream).map_err(|e| e.to_string())?;
                v[k] = v[up] - br.z * j_branch[br.index];
            }
        }

        if v.iter().any(|v| !v.norm().is_finite() || v.norm() < 1e-6) {
            return Err(format!("bus voltage collapsed at iteration {}", i));
        }

        let norm_f = mismatch_norm(topo, y_bus, &v, s_bus);
        if let Some(pm) = progress {
            pm.update(i, norm_f);
        }
        if norm_f < opt.tolerance {
            converged = true;
        }
    }

    if converged {
        log::debug!("Current summation power flow converged in {} iterations.", i);
    } else {
        log::debug!(
            "Current summation power flow did not converge in {} iterations.",
            i
        );
    }

    Ok((v, converged, i))
}

fn mismatch_norm(topo: &Topology, y_bus: &DMatrix<Complex64>, v: &[Complex64], s_bus: &[Complex64]) -> f64 {
    let mis = mismatch(y_bus, v, s_bus);
    let f: Vec<f64> = topo
        .order_internal()
        .iter()
        .skip(1) // source bus
        .flat_map(|&k| [mis[k].re, mis[k].im])
        .collect();
    norm_inf(&DVector::from_vec(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::Case;
    use crate::newton::newtonpf;
    use crate::tests::{assert_close, star};
    use crate::traits::DenseLU;
    use crate::ybus::make_ybus;
    use anyhow::{anyhow, Result};

    #[test]
    fn agrees_with_newton_on_star() -> Result<()> {
        let case = Case::new(&star())?;
        let topo = Topology::new(&case)?;
        let y_bus = make_ybus(&case);
        let s_bus = case.s_bus(10.0);
        let v0 = vec![case.v_slack; case.nb()];
        let opt = PfOpt::default();

        let (v_sum, ok_sum, _) = radial_pf(&topo, &y_bus, &s_bus, &v0, &opt, None).map_err(|e| anyhow!(e))?;
        let (v_nr, ok_nr, _) =
            newtonpf(&y_bus, &s_bus, &v0, &case.non_slack(), &DenseLU, &opt, None).map_err(|e| anyhow!(e))?;

        assert!(ok_sum && ok_nr);
        for (a, b) in v_sum.iter().zip(&v_nr) {
            assert_close((a - b).norm(), 0.0, 1e-7);
        }
        Ok(())
    }
}
