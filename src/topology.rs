//! Radial structure of a network: the orientation of every branch relative
//! to the source bus and the unique source-to-bus path of every bus.

use crate::case::Case;
use crate::error::TopologyError;
use crate::network::{BranchId, BusId};
use num_complex::Complex64;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{Bfs, EdgeRef};
use std::cell::OnceCell;
use std::collections::HashMap;

/// A branch oriented away from the source bus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchInfo {
    pub id: BranchId,
    /// Index of the branch in the case.
    pub index: usize,
    pub from_bus: BusId,
    pub to_bus: BusId,
    /// Endpoint nearest to the source.
    pub upstream: BusId,
    /// Endpoint furthest from the source.
    pub downstream: BusId,
    /// Series impedance (p.u.).
    pub z: Complex64,
    /// True if the branch is defined in the direction of power flow from
    /// the source, i.e. `from_bus == upstream`.
    pub forward: bool,
}

/// Ordered branches from the source bus to `target`, source-adjacent first.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub target: BusId,
    pub branches: Vec<BranchInfo>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BranchInfo> {
        self.branches.iter()
    }
}

#[derive(Debug)]
pub struct Topology {
    source: usize,
    i2e: Vec<BusId>,
    e2i: HashMap<BusId, usize>,
    branches: Vec<BranchInfo>,
    /// Buses in breadth-first order from the source.
    order: Vec<usize>,
    /// Index of the branch feeding each bus (none for the source).
    parent: Vec<Option<usize>>,
    paths: Vec<OnceCell<Path>>,
}

impl Topology {
    /// Walks the network from the source bus, orienting each branch and
    /// checking that every bus is reached exactly once.
    pub fn new(case: &Case) -> Result<Self, TopologyError> {
        let nb = case.nb();

        let mut graph = UnGraph::<usize, usize>::with_capacity(nb, case.nl());
        for i in 0..nb {
            graph.add_node(i);
        }
        for (l, br) in case.branch.iter().enumerate() {
            graph.add_edge(NodeIndex::new(br.f_bus), NodeIndex::new(br.t_bus), l);
        }

        let mut parent: Vec<Option<usize>> = vec![None; nb];
        let mut reached = vec![false; nb];
        let mut order = Vec::with_capacity(nb);
        let mut upstream = vec![usize::MAX; case.nl()];

        let mut bfs = Bfs::new(&graph, NodeIndex::new(case.slack));
        while let Some(node) = bfs.next(&graph) {
            let u = node.index();
            reached[u] = true;
            order.push(u);
            for edge in graph.edges(node) {
                let l = *edge.weight();
                if parent[u] == Some(l) {
                    continue;
                }
                let w = if edge.source() == node {
                    edge.target().index()
                } else {
                    edge.source().index()
                };
                // a second way into an already fed bus closes a loop
                if w == case.slack || parent[w].is_some() {
                    return Err(TopologyError::Cycle { bus: case.i2e[w] });
                }
                parent[w] = Some(l);
                upstream[l] = u;
            }
        }

        if let Some(i) = reached.iter().position(|r| !r) {
            return Err(TopologyError::Unreachable { bus: case.i2e[i] });
        }

        let branches = case
            .branch
            .iter()
            .enumerate()
            .map(|(l, br)| {
                let forward = upstream[l] == br.f_bus;
                let (up, down) = if forward {
                    (br.f_bus, br.t_bus)
                } else {
                    (br.t_bus, br.f_bus)
                };
                BranchInfo {
                    id: br.id,
                    index: l,
                    from_bus: case.i2e[br.f_bus],
                    to_bus: case.i2e[br.t_bus],
                    upstream: case.i2e[up],
                    downstream: case.i2e[down],
                    z: br.z,
                    forward,
                }
            })
            .collect();

        log::debug!(
            "radial topology: {} buses, {} branches, source bus {}",
            nb,
            case.nl(),
            case.i2e[case.slack]
        );

        Ok(Self {
            source: case.slack,
            i2e: case.i2e.clone(),
            e2i: case.e2i.clone(),
            branches,
            order,
            parent,
            paths: (0..nb).map(|_| OnceCell::new()).collect(),
        })
    }

    pub fn source(&self) -> BusId {
        self.i2e[self.source]
    }

    /// Every branch with its identity, orientation and impedance.
    pub fn branches(&self) -> &[BranchInfo] {
        &self.branches
    }

    /// Bus ids in breadth-first order from the source, source first.
    pub fn buses(&self) -> impl Iterator<Item = BusId> + '_ {
        self.order.iter().map(|&i| self.i2e[i])
    }

    /// The branch feeding `bus`, or `None` for the source bus.
    pub fn parent_branch(&self, bus: BusId) -> Result<Option<&BranchInfo>, TopologyError> {
        let i = self.index(bus)?;
        Ok(self.parent[i].map(|l| &self.branches[l]))
    }

    /// The unique path from the source bus to `bus`. Paths are built on
    /// first request and cached for the lifetime of the topology.
    pub fn path_to(&self, bus: BusId) -> Result<&Path, TopologyError> {
        let i = self.index(bus)?;
        Ok(self.paths[i].get_or_init(|| {
            let mut branches = Vec::new();
            let mut k = i;
            while let Some(l) = self.parent[k] {
                let br = self.branches[l];
                branches.push(br);
                k = self.e2i[&br.upstream];
            }
            branches.reverse();
            Path {
                target: bus,
                branches,
            }
        }))
    }

    pub(crate) fn index(&self, bus: BusId) -> Result<usize, TopologyError> {
        self.e2i
            .get(&bus)
            .copied()
            .ok_or(TopologyError::MissingPath { bus })
    }

    pub(crate) fn order_internal(&self) -> &[usize] {
        &self.order
    }

    pub(crate) fn parent_internal(&self, i: usize) -> Option<&BranchInfo> {
        self.parent[i].map(|l| &self.branches[l])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Branch, BusKind};
    use crate::tests::{chain, star, twobus};
    use anyhow::Result;

    fn assert_contiguous(topo: &Topology, path: &Path) {
        let mut at = topo.source();
        for br in path.iter() {
            assert_eq!(br.upstream, at);
            assert!(
                (br.from_bus == br.upstream && br.to_bus == br.downstream)
                    || (br.to_bus == br.upstream && br.from_bus == br.downstream)
            );
            at = br.downstream;
        }
        assert_eq!(at, path.target);
    }

    #[test]
    fn paths_are_contiguous_chains() -> Result<()> {
        for net in [twobus(), star(), chain(6)] {
            let topo = Topology::new(&Case::new(&net)?)?;
            for bus in topo.buses().collect::<Vec<_>>() {
                let path = topo.path_to(bus)?;
                assert_contiguous(&topo, path);
                // deterministic across calls
                assert_eq!(path, topo.path_to(bus)?);
            }
        }
        Ok(())
    }

    #[test]
    fn source_path_is_empty() -> Result<()> {
        let topo = Topology::new(&Case::new(&star())?)?;
        let path = topo.path_to(topo.source())?;
        assert!(path.is_empty());
        assert!(topo.parent_branch(topo.source())?.is_none());
        Ok(())
    }

    #[test]
    fn reversed_branch_is_oriented_downstream() -> Result<()> {
        let mut net = chain(4);
        // define the middle branch against the direction of flow
        let br = &mut net.branches[1];
        std::mem::swap(&mut br.from_bus, &mut br.to_bus);

        let topo = Topology::new(&Case::new(&net)?)?;
        let path = topo.path_to(BusId(3))?;
        let ids: Vec<BranchId> = path.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BranchId(0), BranchId(1), BranchId(2)]);
        assert!(!path.branches[1].forward);
        assert_eq!(path.branches[1].upstream, BusId(1));
        assert_contiguous(&topo, path);
        Ok(())
    }

    #[test]
    fn star_lateral_path() -> Result<()> {
        let topo = Topology::new(&Case::new(&star())?)?;
        let path = topo.path_to(BusId(4))?;
        let ids: Vec<BranchId> = path.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BranchId(2), BranchId(3)]);
        Ok(())
    }

    #[test]
    fn cycle_is_rejected() -> Result<()> {
        let mut net = chain(4);
        net.branches.push(Branch {
            id: BranchId(10),
            from_bus: BusId(3),
            to_bus: BusId(0),
            r_ohm_per_km: 0.1,
            x_ohm_per_km: 0.1,
            length_km: 1.0,
        });
        let err = Topology::new(&Case::new(&net)?).unwrap_err();
        assert!(matches!(err, TopologyError::Cycle { .. }));
        Ok(())
    }

    #[test]
    fn parallel_branches_are_a_cycle() -> Result<()> {
        let mut net = twobus();
        let mut twin = net.branches[0].clone();
        twin.id = BranchId(1);
        std::mem::swap(&mut twin.from_bus, &mut twin.to_bus);
        net.branches.push(twin);

        let err = Topology::new(&Case::new(&net)?).unwrap_err();
        assert_eq!(err, TopologyError::Cycle { bus: BusId(1) });
        Ok(())
    }

    #[test]
    fn buses_are_ordered_breadth_first() -> Result<()> {
        let topo = Topology::new(&Case::new(&star())?)?;
        let order = topo.order_internal();
        assert_eq!(order.len(), 5);
        assert_eq!(order[0], topo.index(topo.source())?);

        let depth = |i: usize| topo.path_to(topo.i2e[i]).map(|p| p.len());
        let mut last = 0;
        for (pos, &i) in order.iter().enumerate() {
            let d = depth(i)?;
            assert!(d >= last);
            last = d;
            // the feeding bus is listed earlier
            if let Some(br) = topo.parent_internal(i) {
                let up = topo.index(br.upstream)?;
                assert!(order[..pos].contains(&up));
            }
        }
        // only the lateral bus sits two branches out
        assert_eq!(topo.index(BusId(4))?, order[4]);
        Ok(())
    }

    #[test]
    fn island_is_rejected() -> Result<()> {
        let mut net = chain(3);
        let mut island = net.buses[2].clone();
        island.id = BusId(9);
        island.kind = BusKind::Load;
        net.buses.push(island);

        let err = Topology::new(&Case::new(&net)?).unwrap_err();
        assert_eq!(err, TopologyError::Unreachable { bus: BusId(9) });
        Ok(())
    }

    #[test]
    fn unknown_bus_has_no_path() -> Result<()> {
        let topo = Topology::new(&Case::new(&twobus())?)?;
        assert_eq!(
            topo.path_to(BusId(42)).unwrap_err(),
            TopologyError::MissingPath { bus: BusId(42) }
        );
        Ok(())
    }
}
