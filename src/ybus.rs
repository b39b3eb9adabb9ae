use crate::case::Case;
use nalgebra::DMatrix;
use num_complex::Complex64;
use num_traits::One;

/// Builds the bus admittance matrix.
///
/// Each branch contributes its series admittance `y_s = 1/z` as
///
/// ```text
///      | If |   |  y_s  -y_s |   | Vf |
///      |    | = |            | * |    |
///      | It |   | -y_s   y_s |   | Vt |
/// ```
///
/// Distribution branches are modelled without line charging or taps.
pub fn make_ybus(case: &Case) -> DMatrix<Complex64> {
    let nb = case.nb();
    let mut y_bus = DMatrix::zeros(nb, nb);

    for br in case.branch.iter() {
        let y_s = Complex64::one() / br.z; // series admittance
        let (f, t) = (br.f_bus, br.t_bus);

        y_bus[(f, f)] += y_s;
        y_bus[(f, t)] -= y_s;
        y_bus[(t, f)] -= y_s;
        y_bus[(t, t)] += y_s;
    }
    y_bus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{assert_close, star};
    use anyhow::Result;

    #[test]
    fn rows_sum_to_zero_without_shunts() -> Result<()> {
        let case = Case::new(&star())?;
        let y = make_ybus(&case);

        for i in 0..case.nb() {
            let sum: Complex64 = y.row(i).iter().sum();
            assert_close(sum.norm(), 0.0, 1e-9);
        }
        assert_eq!(y, y.transpose());
        Ok(())
    }
}
