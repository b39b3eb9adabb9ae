use crate::error::InputError;
use crate::loadcase::load_network;
use crate::network::NetworkDescription;
use std::path::Path;

/// A reference network with its known collapse point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownNetwork {
    /// Name used on the command line and as the file stem.
    pub name: &'static str,
    pub description: &'static str,
    /// Load multiplier at the nose of the PV curve, the default sweep
    /// upper bound.
    pub max_load_multiplier: f64,
    /// Used to derive the plot file name.
    pub plot_name: &'static str,
}

pub const NETWORKS: [KnownNetwork; 3] = [
    KnownNetwork {
        name: "twobus",
        description: "Two-bus network",
        max_load_multiplier: 309.01698,
        plot_name: "two_bus",
    },
    KnownNetwork {
        name: "ieee123",
        description: "IEEE 123-bus test feeder",
        max_load_multiplier: 3.04914,
        plot_name: "ieee",
    },
    KnownNetwork {
        name: "star",
        description: "Star network",
        max_load_multiplier: 26.21818,
        plot_name: "star",
    },
];

/// Resolves a network name, or `all` for every known network in
/// registry order.
pub fn lookup(name: &str) -> Result<Vec<&'static KnownNetwork>, InputError> {
    if name.eq_ignore_ascii_case("all") {
        return Ok(NETWORKS.iter().collect());
    }
    NETWORKS
        .iter()
        .find(|n| n.name.eq_ignore_ascii_case(name))
        .map(|n| vec![n])
        .ok_or_else(|| InputError::UnknownNetwork(name.to_string()))
}

impl KnownNetwork {
    /// Loads `<dir>/<name>.toml`.
    pub fn load(&self, dir: &Path) -> Result<NetworkDescription, InputError> {
        let mut net = load_network(&dir.join(format!("{}.toml", self.name)))?;
        if net.name.is_empty() {
            net.name = self.name.to_string();
        }
        Ok(net)
    }

    pub fn plot_file_name(&self) -> String {
        format!("metric_{}.svg", self.plot_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powerflow::{solve, Solver};
    use crate::session::Session;
    use crate::sweep::{Sweep, SweepOpt};
    use crate::metric::{Element, Metric};
    use crate::network::BusId;
    use anyhow::{anyhow, Result};
    use std::path::PathBuf;

    fn networks_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("networks")
    }

    #[test]
    fn lookup_names() -> Result<()> {
        let all: Vec<&str> = lookup("all")?.iter().map(|n| n.name).collect();
        assert_eq!(all, vec!["twobus", "ieee123", "star"]);
        assert_eq!(lookup("Star")?[0].plot_file_name(), "metric_star.svg");
        assert!(matches!(lookup("ieee13"), Err(InputError::UnknownNetwork(_))));
        Ok(())
    }

    #[test]
    fn shipped_networks_collapse_near_registered_maximum() -> Result<()> {
        for known in NETWORKS.iter() {
            let name = known.name;
            let session = Session::new(known.load(&networks_dir())?)?;
            let solver = Solver::default();

            let below = solve(&session, &solver, known.max_load_multiplier * 0.999);
            let above = solve(&session, &solver, known.max_load_multiplier * 1.01);
            assert!(below.converged, "{} should converge below its maximum", name);
            assert!(!above.converged, "{} should not converge above its maximum", name);

            let opt = SweepOpt {
                lam_max: Some(known.max_load_multiplier * 1.05),
                points: 50,
                ..Default::default()
            };
            let multipliers = opt.multipliers(known.max_load_multiplier)?;
            let out = Sweep::new(&session, &solver, multipliers, &Metric::ALL, 0)?.run()?;
            let collapse = out.collapse.unwrap();
            assert!(collapse.first_failed > known.max_load_multiplier);
            assert!(collapse.last_converged.unwrap() <= known.max_load_multiplier);
        }
        Ok(())
    }

    #[test]
    fn ieee123_index_rises_from_light_load_to_collapse() -> Result<()> {
        let known = lookup("ieee123")?[0];
        let net = known.load(&networks_dir())?;
        assert_eq!(net.buses.len(), 123);
        assert_eq!(net.branches.len(), 122);
        let session = Session::new(net)?;
        assert_eq!(session.topology().source(), BusId(150));

        let solver = Solver::default();
        let opt = SweepOpt {
            lam_max: Some(known.max_load_multiplier * 1.05),
            points: 50,
            ..Default::default()
        };
        let multipliers = opt.multipliers(known.max_load_multiplier)?;
        let out = Sweep::new(&session, &solver, multipliers, &Metric::ALL, 0)?.run()?;

        let l_index = out
            .series(Metric::LIndex)
            .ok_or_else(|| anyhow!("no L-index series"))?
            .critical_curve();
        assert!(l_index.len() > 40);
        // nominal loading is far from collapse
        assert_eq!(l_index[0].0, 1.0);
        assert!(l_index[0].1 < 0.2, "L-index at nominal load is {}", l_index[0].1);
        assert!(l_index.windows(2).all(|w| w[1].1 > w[0].1));
        assert!(l_index.last().map_or(0.0, |p| p.1) > 0.9);

        let margin = out
            .series(Metric::InjectionMargin)
            .ok_or_else(|| anyhow!("no injection margin series"))?
            .critical_curve();
        assert!(margin.windows(2).all(|w| w[1].1 < w[0].1));

        // every converged level carries a critical bus and branch
        for level in out.levels.iter() {
            assert!(matches!(level.critical.get(&Metric::LIndex), Some((_, Element::Bus(_)))));
            assert!(matches!(level.critical.get(&Metric::SingleBranch), Some((_, Element::Branch(_)))));
            assert!(level.min_singular_value.is_some());
        }
        let collapse = out.collapse.ok_or_else(|| anyhow!("sweep did not collapse"))?;
        assert!(collapse.first_failed > known.max_load_multiplier);
        Ok(())
    }
}
