use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use num_traits::Zero;

/// Computes the complex power mismatch `V .* conj(Ybus * V) - Sbus`.
pub fn mismatch(y_bus: &DMatrix<Complex64>, v: &[Complex64], s_bus: &[Complex64]) -> Vec<Complex64> {
    let i_bus = y_bus * DVector::from_column_slice(v);
    v.iter()
        .zip(i_bus.iter())
        .zip(s_bus)
        .map(|((v, i), s)| v * i.conj() - s)
        .collect()
}

/// Computes partial derivatives of power injection w.r.t. voltage angle
/// and magnitude (polar coordinates).
///
/// ```text
/// dSbus/dVa = 1j * diagV * conj(diagIbus - Ybus * diagV)
/// dSbus/dVm = diagV * conj(Ybus * diagVnorm) + conj(diagIbus) * diagVnorm
/// ```
pub fn d_sbus_d_v(y_bus: &DMatrix<Complex64>, v: &[Complex64]) -> (DMatrix<Complex64>, DMatrix<Complex64>) {
    let n = v.len();
    let i_bus = y_bus * DVector::from_column_slice(v);
    let v_norm: Vec<Complex64> = v.iter().map(|v| v / v.norm()).collect();

    let d_sbus_d_va = DMatrix::from_fn(n, n, |i, k| {
        let diag_i = if i == k { i_bus[i] } else { Complex64::zero() };
        Complex64::i() * v[i] * (diag_i - y_bus[(i, k)] * v[k]).conj()
    });
    let d_sbus_d_vm = DMatrix::from_fn(n, n, |i, k| {
        let d_vm = v[i] * (y_bus[(i, k)] * v_norm[k]).conj();
        if i == k {
            d_vm + i_bus[i].conj() * v_norm[i]
        } else {
            d_vm
        }
    });
    (d_sbus_d_va, d_sbus_d_vm)
}
