use nalgebra::{DMatrix, DVector};

pub trait LinearSolver {
    fn solve(&self, a_mat: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, String>;
}

/// Dense LU decomposition with partial pivoting.
#[derive(Default)]
pub struct DenseLU;

impl LinearSolver for DenseLU {
    fn solve(&self, a_mat: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, String> {
        if !a_mat.is_square() || a_mat.nrows() != b.len() {
            return Err(format!(
                "dimension mismatch: {}x{} matrix, {} right-hand side",
                a_mat.nrows(),
                a_mat.ncols(),
                b.len()
            ));
        }
        a_mat
            .clone()
            .lu()
            .solve(b)
            .ok_or_else(|| "matrix is singular".to_string())
    }
}
