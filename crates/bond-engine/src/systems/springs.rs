//! Bond spring forces.

use glam::Vec3;

use crate::api::config::SimConfig;
use crate::core::atoms::Atom;
use crate::core::topology::Bond;

/// Minimum length below which a direction is considered degenerate.
pub const EPSILON: f32 = 1e-6;

/// Accumulate spring, axial damping and isotropic drag for every bond.
///
/// The spring pulls along the a→b axis with `k * (current - ideal) * order`.
/// Axial damping opposes the pair's closing/opening speed, also scaled by
/// order. Each endpoint additionally loses `velocity_damping * v` per bond.
pub fn accumulate_bond_forces(atoms: &[Atom], bonds: &[Bond], config: &SimConfig, forces: &mut [Vec3]) {
    for bond in bonds {
        let (Some(a), Some(b)) = (atoms.get(bond.a), atoms.get(bond.b)) else {
            continue;
        };

        let delta = b.position - a.position;
        let length = delta.length();
        if length < EPSILON {
            continue;
        }
        let axis = delta / length;
        let order = f32::from(bond.order);

        let stretch = length - bond.ideal_length;
        let axial_speed = (b.velocity - a.velocity).dot(axis);
        let magnitude = config.bond_stiffness * stretch * order + config.bond_damping * axial_speed * order;

        forces[bond.a] += axis * magnitude - a.velocity * config.velocity_damping;
        forces[bond.b] += -axis * magnitude - b.velocity * config.velocity_damping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::AtomId;
    use crate::core::topology::BondOrigin;

    fn pair(separation: f32) -> (Vec<Atom>, Vec<Bond>) {
        let atoms = vec![
            Atom::new(AtomId(1), "C", Vec3::ZERO),
            Atom::new(AtomId(2), "C", Vec3::new(separation, 0.0, 0.0)),
        ];
        let bonds = vec![Bond::new(0, 1, 1, 1.52, BondOrigin::Dynamic)];
        (atoms, bonds)
    }

    #[test]
    fn equilibrium_has_zero_force() {
        let (atoms, bonds) = pair(1.52);
        let mut forces = vec![Vec3::ZERO; 2];
        accumulate_bond_forces(&atoms, &bonds, &SimConfig::default(), &mut forces);
        assert!(forces[0].length() < 1e-4, "force was {:?}", forces[0]);
        assert!(forces[1].length() < 1e-4, "force was {:?}", forces[1]);
    }

    #[test]
    fn stretched_bond_pulls_together() {
        let (atoms, bonds) = pair(2.0);
        let mut forces = vec![Vec3::ZERO; 2];
        accumulate_bond_forces(&atoms, &bonds, &SimConfig::default(), &mut forces);
        assert!(forces[0].x > 0.0);
        assert!(forces[1].x < 0.0);
        assert!((forces[0] + forces[1]).length() < 1e-4);
    }

    #[test]
    fn compressed_bond_pushes_apart() {
        let (atoms, bonds) = pair(1.0);
        let mut forces = vec![Vec3::ZERO; 2];
        accumulate_bond_forces(&atoms, &bonds, &SimConfig::default(), &mut forces);
        assert!(forces[0].x < 0.0);
        assert!(forces[1].x > 0.0);
    }

    #[test]
    fn spring_scales_with_order() {
        let (atoms, mut bonds) = pair(2.0);
        let mut single = vec![Vec3::ZERO; 2];
        accumulate_bond_forces(&atoms, &bonds, &SimConfig::default(), &mut single);

        bonds[0].order = 2;
        let mut double = vec![Vec3::ZERO; 2];
        accumulate_bond_forces(&atoms, &bonds, &SimConfig::default(), &mut double);
        assert!((double[0].x - 2.0 * single[0].x).abs() < 1e-3);
    }

    #[test]
    fn damping_opposes_separation_speed() {
        let (mut atoms, bonds) = pair(1.52);
        atoms[1].velocity = Vec3::new(1.0, 0.0, 0.0);
        let mut forces = vec![Vec3::ZERO; 2];
        accumulate_bond_forces(&atoms, &bonds, &SimConfig::default(), &mut forces);
        // Opening pair: b is pulled back, a is pulled along
        assert!(forces[1].x < 0.0);
        assert!(forces[0].x > 0.0);
    }

    #[test]
    fn coincident_atoms_are_skipped() {
        let (atoms, bonds) = pair(0.0);
        let mut forces = vec![Vec3::ZERO; 2];
        accumulate_bond_forces(&atoms, &bonds, &SimConfig::default(), &mut forces);
        assert_eq!(forces, vec![Vec3::ZERO; 2]);
    }
}
