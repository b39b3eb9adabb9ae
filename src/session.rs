use crate::case::Case;
use crate::error::NetworkError;
use crate::lindex::LIndexFactors;
use crate::network::NetworkDescription;
use crate::topology::Topology;
use crate::ybus::make_ybus;
use nalgebra::DMatrix;
use num_complex::Complex64;

/// Session owns a loaded network and everything derived from it that stays
/// fixed while loads are scaled: internal indexing, radial topology and
/// path cache, admittance matrix and L-index factors.
///
/// A session is built once per network and shared read-only by every
/// level of a sweep. Nothing is shared between sessions.
#[derive(Debug)]
pub struct Session {
    network: NetworkDescription,
    case: Case,
    topology: Topology,
    y_bus: DMatrix<Complex64>,
    l_index: LIndexFactors,
}

impl Session {
    pub fn new(network: NetworkDescription) -> Result<Self, NetworkError> {
        let case = Case::new(&network)?;
        let topology = Topology::new(&case)?;
        let y_bus = make_ybus(&case);
        let l_index =
            LIndexFactors::new(&case, &y_bus).map_err(NetworkError::SingularAdmittance)?;

        log::info!(
            "network '{}': {} buses, {} branches",
            network.name,
            case.nb(),
            case.nl()
        );

        Ok(Self {
            network,
            case,
            topology,
            y_bus,
            l_index,
        })
    }

    pub fn network(&self) -> &NetworkDescription {
        &self.network
    }

    pub fn case(&self) -> &Case {
        &self.case
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn y_bus(&self) -> &DMatrix<Complex64> {
        &self.y_bus
    }

    pub fn l_index(&self) -> &LIndexFactors {
        &self.l_index
    }
}
