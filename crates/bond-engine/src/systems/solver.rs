//! Per-tick force accumulation: bond springs plus VSEPR angle constraints.

use glam::Vec3;

use crate::api::config::SimConfig;
use crate::api::types::AtomId;
use crate::chemistry::geometry::Geometry;
use crate::chemistry::valence::{ValenceTable, PLANAR_BOND_ANGLE_DEGREES};
use crate::core::atoms::Atom;
use crate::core::topology::BondTopology;
use crate::systems::angles::{
    anti_flip_force, linear_force, pairwise_angle_force, planarity_force, PlaneMemory,
};
use crate::systems::springs::accumulate_bond_forces;

/// Computes the net force on every atom. Owns the anti-flip plane memory.
#[derive(Debug, Default)]
pub struct ForceSolver {
    memory: PlaneMemory,
    forces: Vec<Vec3>,
}

impl ForceSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate forces for the current positions and velocities.
    ///
    /// Geometry is classified afresh for every center, so a changed neighbor
    /// set is reflected immediately.
    pub fn accumulate(
        &mut self,
        atoms: &[Atom],
        topology: &BondTopology,
        valence: &ValenceTable,
        config: &SimConfig,
    ) -> &[Vec3] {
        self.forces.clear();
        self.forces.resize(atoms.len(), Vec3::ZERO);

        accumulate_bond_forces(atoms, topology.bonds(), config, &mut self.forces);

        for (center, bonded) in topology.adjacency().iter().enumerate() {
            if bonded.len() < 2 || center >= atoms.len() {
                continue;
            }
            let neighbors: Vec<usize> = bonded.iter().map(|&(n, _)| n).collect();
            let has_multiple = bonded.iter().any(|&(_, order)| order > 1);
            let element = atoms[center].element.as_str();

            let Some(geometry) = Geometry::classify(neighbors.len(), has_multiple, element) else {
                continue;
            };

            if geometry == Geometry::Linear {
                linear_force(atoms, center, neighbors[0], neighbors[1], config, &mut self.forces);
                continue;
            }

            let ideal = match geometry {
                Geometry::TrigonalPlanar => PLANAR_BOND_ANGLE_DEGREES.to_radians(),
                _ => valence.ideal_bond_angle(element, neighbors.len(), has_multiple),
            };

            for (p, &a) in neighbors.iter().enumerate() {
                for &b in &neighbors[p + 1..] {
                    pairwise_angle_force(atoms, center, a, b, ideal, config, &mut self.forces);
                }
            }

            if geometry.is_planar() {
                if let [a, b, c] = neighbors.as_slice() {
                    planarity_force(atoms, center, [*a, *b, *c], config, &mut self.forces);
                }
            }

            if neighbors.len() >= 3 {
                anti_flip_force(atoms, center, &neighbors, &mut self.memory, config, &mut self.forces);
            }
        }

        &self.forces
    }

    /// Reset the plane memory of a center whose bonds changed.
    pub fn forget(&mut self, center: AtomId) {
        self.memory.forget(center);
    }

    pub fn reset(&mut self) {
        self.memory.clear();
        self.forces.clear();
    }

    pub fn plane_memory(&self) -> &PlaneMemory {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::topology::{Bond, BondOrigin};

    fn build(elements: &[&str], positions: &[Vec3], bonds: &[(usize, usize, u8)]) -> (Vec<Atom>, BondTopology, ValenceTable) {
        let table = ValenceTable::load().unwrap();
        let atoms: Vec<Atom> = elements
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(i, (e, p))| Atom::new(AtomId(i as u32 + 1), *e, *p).with_mass(table.mass(e)))
            .collect();
        let mut topology = BondTopology::new();
        for e in elements {
            topology.add_atom(table.max_bond_capacity(e));
        }
        for &(a, b, order) in bonds {
            let ideal = table.ideal_bond_length(elements[a], elements[b], order);
            assert!(topology.create_bond(Bond::new(a, b, order, ideal, BondOrigin::Manual)));
        }
        (atoms, topology, table)
    }

    #[test]
    fn equilibrium_pair_has_no_force() {
        let table = ValenceTable::load().unwrap();
        let length = table.ideal_bond_length("C", "C", 1);
        let (atoms, topology, table) = build(&["C", "C"], &[Vec3::ZERO, Vec3::new(length, 0.0, 0.0)], &[(0, 1, 1)]);
        let mut solver = ForceSolver::new();
        let forces = solver.accumulate(&atoms, &topology, &table, &SimConfig::default());
        assert!(forces[0].length() < 1e-4, "force was {:?}", forces[0]);
        assert!(forces[1].length() < 1e-4, "force was {:?}", forces[1]);
    }

    #[test]
    fn net_force_is_zero() {
        let (atoms, topology, table) = build(
            &["N", "H", "H", "H"],
            &[
                Vec3::ZERO,
                Vec3::new(1.1, 0.1, 0.0),
                Vec3::new(-0.4, 0.9, 0.2),
                Vec3::new(-0.3, -0.8, 0.4),
            ],
            &[(0, 1, 1), (0, 2, 1), (0, 3, 1)],
        );
        let mut solver = ForceSolver::new();
        let forces = solver.accumulate(&atoms, &topology, &table, &SimConfig::default());
        let net: Vec3 = forces.iter().copied().sum();
        assert!(net.length() < 1e-3, "net force was {:?}", net);
    }

    #[test]
    fn three_neighbor_center_gets_plane_memory() {
        let (atoms, topology, table) = build(
            &["B", "F", "F", "F"],
            &[
                Vec3::ZERO,
                Vec3::new(1.4, 0.0, 0.0),
                Vec3::new(-0.7, 1.2, 0.0),
                Vec3::new(-0.7, -1.2, 0.1),
            ],
            &[(0, 1, 1), (0, 2, 1), (0, 3, 1)],
        );
        let mut solver = ForceSolver::new();
        solver.accumulate(&atoms, &topology, &table, &SimConfig::default());
        assert!(solver.plane_memory().get(AtomId(1)).is_some());

        solver.forget(AtomId(1));
        assert!(solver.plane_memory().is_empty());
    }

    #[test]
    fn two_neighbor_center_has_no_plane_memory() {
        let (atoms, topology, table) = build(
            &["O", "H", "H"],
            &[Vec3::ZERO, Vec3::X, Vec3::Y],
            &[(0, 1, 1), (0, 2, 1)],
        );
        let mut solver = ForceSolver::new();
        solver.accumulate(&atoms, &topology, &table, &SimConfig::default());
        assert!(solver.plane_memory().is_empty());
    }
}
