use crate::sbus::d_sbus_d_v;
use nalgebra::{DMatrix, SVD};
use num_complex::Complex64;

/// Forms the reduced power flow Jacobian.
///
/// Rows are the real then reactive power mismatches of the `pq` buses,
/// columns the voltage angles then magnitudes of the same buses. The units
/// are per unit with radians for voltage angles.
pub fn make_jac(y_bus: &DMatrix<Complex64>, v: &[Complex64], pq: &[usize]) -> DMatrix<f64> {
    let (d_sbus_d_va, d_sbus_d_vm) = d_sbus_d_v(y_bus, v);
    let d_va = d_sbus_d_va.select_rows(pq).select_columns(pq);
    let d_vm = d_sbus_d_vm.select_rows(pq).select_columns(pq);

    let j11 = d_va.map(|s| s.re);
    let j12 = d_vm.map(|s| s.re);
    let j21 = d_va.map(|s| s.im);
    let j22 = d_vm.map(|s| s.im);

    let n = pq.len();
    let mut jac = DMatrix::zeros(2 * n, 2 * n);
    jac.view_mut((0, 0), (n, n)).copy_from(&j11);
    jac.view_mut((0, n), (n, n)).copy_from(&j12);
    jac.view_mut((n, 0), (n, n)).copy_from(&j21);
    jac.view_mut((n, n), (n, n)).copy_from(&j22);
    jac
}

const SVD_MAX_IT: usize = 1000;

/// Smallest singular value of `jac`. Returns `None` for an empty Jacobian
/// or if the decomposition does not converge.
pub fn min_singular_value(jac: &DMatrix<f64>) -> Option<f64> {
    if jac.is_empty() {
        return None;
    }
    let svd = SVD::try_new(jac.clone(), false, false, f64::EPSILON, SVD_MAX_IT)?;
    let sv = svd.singular_values.min();
    sv.is_finite().then_some(sv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::BusId;
    use crate::powerflow::{solve, Solver};
    use crate::session::Session;
    use crate::tests::{assert_close, twobus};
    use anyhow::{anyhow, Result};

    #[test]
    fn smallest_singular_value_of_diagonal() {
        let a = DMatrix::from_row_slice(3, 3, &[4.0, 0.0, 0.0, 0.0, -0.5, 0.0, 0.0, 0.0, 2.0]);
        assert_close(min_singular_value(&a).unwrap_or(f64::NAN), 0.5, 1e-12);
    }

    #[test]
    fn singular_jacobian_has_zero_value() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let sv = min_singular_value(&a).unwrap_or(f64::NAN);
        assert_close(sv, 0.0, 1e-12);
        assert_eq!(min_singular_value(&DMatrix::zeros(0, 0)), None);
    }

    /// Closed form 2x2 Jacobian of the load bus of `twobus` and its smallest
    /// singular value, from the eigenvalues of `J' * J`.
    fn twobus_closed_form(v: Complex64) -> f64 {
        let y = Complex64::new(1.0, 0.0) / (Complex64::new(0.2, 0.4) / 400.0);
        let (g, b) = (y.re, y.im);
        let (vm, va) = (v.norm(), v.arg());
        let (sin, cos) = va.sin_cos();

        let dp_dva = vm * (g * sin - b * cos);
        let dp_dvm = 2.0 * g * vm - (g * cos + b * sin);
        let dq_dva = -vm * (g * cos + b * sin);
        let dq_dvm = -2.0 * b * vm - (g * sin - b * cos);

        let s = dp_dva.powi(2) + dp_dvm.powi(2) + dq_dva.powi(2) + dq_dvm.powi(2);
        let det = dp_dva * dq_dvm - dp_dvm * dq_dva;
        ((s - (s * s - 4.0 * det * det).sqrt()) / 2.0).sqrt()
    }

    #[test]
    fn twobus_singular_value_matches_closed_form() -> Result<()> {
        let session = Session::new(twobus())?;
        let mut light = None;
        for lam in [1.0, 300.0, 309.0] {
            let pf = solve(&session, &Solver::default(), lam);
            assert!(pf.converged);
            let sv = pf.min_singular_value.ok_or_else(|| anyhow!("no singular value at {}", lam))?;
            let expected = twobus_closed_form(pf.voltage(BusId(1))?);
            assert_close(sv, expected, 1e-6 * expected.max(1.0) + 1e-3);
            light.get_or_insert(sv);
        }
        // about 893 at nominal load, about 5.4 just before the nose
        let light = light.unwrap_or(f64::NAN);
        assert_close(light, 892.83, 0.1);
        let pf = solve(&session, &Solver::default(), 309.0);
        assert!(pf.min_singular_value.unwrap_or(f64::NAN) < 0.01 * light);
        Ok(())
    }
}
