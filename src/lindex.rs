//! Kessel & Glavitsch (1986) L-index.
//!
//! With the admittance matrix partitioned into generator (G) and load (L)
//! blocks, the load bus voltages satisfy `V_L = F_LG * V_G + Z_LL * I_L`
//! where `F_LG = -Y_LL^-1 * Y_LG`. The index of load bus `j` is
//!
//! ```text
//! L_j = | 1 - sum_i F_ji * V_i / V_j |
//! ```
//!
//! and approaches one as the system approaches voltage collapse.

use crate::case::Case;
use crate::error::TopologyError;
use crate::network::BusId;
use crate::powerflow::PowerFlowResult;
use nalgebra::DMatrix;
use num_complex::Complex64;
use std::collections::BTreeMap;

/// Participation factors `F_LG`, derived once from the admittance matrix.
#[derive(Debug, Clone)]
pub struct LIndexFactors {
    gen_buses: Vec<BusId>,
    load_buses: Vec<BusId>,
    f_lg: DMatrix<Complex64>,
}

impl LIndexFactors {
    /// The source bus forms the generator set; all other buses are loads.
    pub fn new(case: &Case, y_bus: &DMatrix<Complex64>) -> Result<Self, String> {
        let g = vec![case.slack];
        let l = case.non_slack();

        let f_lg = if l.is_empty() {
            DMatrix::zeros(0, g.len())
        } else {
            let y_l = y_bus.select_rows(&l);
            let y_ll = y_l.select_columns(&l);
            let y_lg = y_l.select_columns(&g);
            -y_ll
                .lu()
                .solve(&y_lg)
                .ok_or_else(|| "Y_LL has a zero pivot".to_string())?
        };

        Ok(Self {
            gen_buses: g.iter().map(|&i| case.i2e[i]).collect(),
            load_buses: l.iter().map(|&i| case.i2e[i]).collect(),
            f_lg,
        })
    }

    pub fn load_buses(&self) -> &[BusId] {
        &self.load_buses
    }

    /// L-index of every load bus for a converged power flow result.
    pub fn evaluate(&self, pf: &PowerFlowResult) -> Result<BTreeMap<BusId, f64>, TopologyError> {
        let v_g = self
            .gen_buses
            .iter()
            .map(|&bus| pf.voltage(bus))
            .collect::<Result<Vec<_>, _>>()?;

        let mut l_by_bus = BTreeMap::new();
        for (row, &bus) in self.load_buses.iter().enumerate() {
            let v_j = pf.voltage(bus)?;
            let l_j = if v_j.norm() < 1e-12 {
                f64::INFINITY
            } else {
                let sum: Complex64 = self
                    .f_lg
                    .row(row)
                    .iter()
                    .zip(&v_g)
                    .map(|(f, v_i)| f * v_i / v_j)
                    .sum();
                (Complex64::new(1.0, 0.0) - sum).norm()
            };
            l_by_bus.insert(bus, l_j);
        }
        Ok(l_by_bus)
    }
}
