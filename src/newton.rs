use crate::jac::make_jac;
use crate::pfopt::PfOpt;
use crate::sbus::mismatch;
use crate::traits::LinearSolver;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

pub trait ProgressMonitor {
    fn update(&self, i: usize, norm_f: f64);
}

/// Logs the mismatch norm of each iteration at trace level.
pub struct LogProgress;

impl ProgressMonitor for LogProgress {
    fn update(&self, i: usize, norm_f: f64) {
        if i == 0 {
            log::trace!(" it    max P & Q mismatch (p.u.)");
            log::trace!("----  ---------------------------");
        }
        log::trace!("{:3}        {:10.3e}", i, norm_f);
    }
}

fn mismatch_vec(y_bus: &DMatrix<Complex64>, v: &[Complex64], s_bus: &[Complex64], pq: &[usize]) -> DVector<f64> {
    let mis = mismatch(y_bus, v, s_bus);
    DVector::from_vec(
        pq.iter()
            .map(|&i| mis[i].re)
            .chain(pq.iter().map(|&i| mis[i].im))
            .collect(),
    )
}

/// Largest absolute entry; infinite if any entry is not finite.
pub(crate) fn norm_inf(f: &DVector<f64>) -> f64 {
    if f.iter().all(|x| x.is_finite()) {
        f.amax()
    } else {
        f64::INFINITY
    }
}

/// Solves power flow using full Newton's method (power/polar).
///
/// All buses listed in `pq` are treated as constant power buses; every
/// other bus keeps the voltage given in `v0`. Returns the final voltage
/// vector, the convergence flag and the number of iterations taken.
pub fn newtonpf(
    y_bus: &DMatrix<Complex64>,
    s_bus: &[Complex64],
    v0: &[Complex64],
    pq: &[usize],
    lin_solver: &dyn LinearSolver,
    opt: &PfOpt,
    progress: Option<&dyn ProgressMonitor>,
) -> Result<(Vec<Complex64>, bool, usize), String> {
    let tol = opt.tolerance;
    let max_it = opt.max_it_nr;

    let mut converged = false;
    let mut i = 0;
    let mut v = v0.to_vec();
    let mut va: Vec<f64> = v.iter().map(|v| v.arg()).collect();
    let mut vm: Vec<f64> = v.iter().map(|v| v.norm()).collect();

    // set up indexing for updating V
    let npq = pq.len();
    let (j1, j2) = (0, npq); // j1:j2 - V angle of pq buses
    let (j3, j4) = (j2, j2 + npq); // j3:j4 - V mag of pq buses

    // evaluate F(x0)
    let mut f = mismatch_vec(y_bus, &v, s_bus, pq);

    // check tolerance
    let norm_f = norm_inf(&f);
    if let Some(pm) = progress {
        pm.update(i, norm_f);
    }
    if norm_f < tol {
        converged = true;
    }

    // do Newton iterations
    while !converged && i < max_it {
        // update iteration counter
        i = i + 1;

        // evaluate Jacobian
        let jac = make_jac(y_bus, &v, pq);

        // compute update step
        let dx = lin_solver.solve(&jac, &(-&f))?;

        // update voltage
        pq.iter().zip(j1..j2).for_each(|(&k, j)| va[k] += dx[j]);
        pq.iter().zip(j3..j4).for_each(|(&k, j)| vm[k] += dx[j]);

        // update Vm and Va again in case we wrapped around with a negative Vm
        v = vm
            .iter()
            .zip(&va)
            .map(|(&m, &a)| Complex64::from_polar(m, a))
            .collect();
        va = v.iter().map(|v| v.arg()).collect();
        vm = v.iter().map(|v| v.norm()).collect();

        // evalute F(x)
        f = mismatch_vec(y_bus, &v, s_bus, pq);

        // check for convergence
        let norm_f = norm_inf(&f);
        if let Some(pm) = progress {
            pm.update(i, norm_f);
        }
        if !norm_f.is_finite() {
            return Err(format!("mismatch became non-finite at iteration {}", i));
        }
        if norm_f < tol {
            converged = true;
        }
    }

    if converged {
        log::debug!(
            "Newton's method power flow (power balance, polar) converged in {} iterations.",
            i
        );
    } else {
        log::debug!(
            "Newton's method power flow (power balance, polar) did not converge in {} iterations.",
            i
        );
    }

    Ok((v, converged, i))
}
