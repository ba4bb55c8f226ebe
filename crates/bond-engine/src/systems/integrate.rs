//! Semi-implicit Euler integration with per-axis damping.

use glam::Vec3;

use crate::core::atoms::Atom;

/// Clamp a force to `max_force` magnitude.
pub fn clamp_force(force: Vec3, max_force: f32) -> Vec3 {
    force.clamp_length_max(max_force)
}

/// Add `F / m * held_dt` to every dynamic atom's velocity.
///
/// `held_dt` is the time the force represents, i.e. `dt` times the number of
/// ticks until it is evaluated again.
pub fn apply_forces(atoms: &mut [Atom], forces: &[Vec3], held_dt: f32, max_force: f32) {
    for (atom, &force) in atoms.iter_mut().zip(forces) {
        if atom.is_kinematic() {
            continue;
        }
        let force = clamp_force(force, max_force);
        atom.velocity += force * (held_dt / atom.mass);
    }
}

/// Damp velocities per axis and move dynamic atoms by `v * dt`.
pub fn advance_positions(atoms: &mut [Atom], dt: f32) {
    if dt <= 0.0 {
        return;
    }
    for atom in atoms.iter_mut().filter(|a| !a.is_kinematic()) {
        let retain = Vec3::new(
            (1.0 - atom.damping.x).powf(dt),
            (1.0 - atom.damping.y).powf(dt),
            (1.0 - atom.damping.z).powf(dt),
        );
        atom.velocity *= retain;
        atom.position += atom.velocity * dt;
    }
}

/// Whether every dynamic atom moves slower than `threshold`.
pub fn is_settled(atoms: &[Atom], threshold: f32) -> bool {
    atoms
        .iter()
        .filter(|a| !a.is_kinematic())
        .all(|a| a.velocity.length() < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::AtomId;
    use crate::core::atoms::MotionMode;

    fn atom(mass: f32) -> Atom {
        Atom::new(AtomId(1), "C", Vec3::ZERO).with_mass(mass)
    }

    #[test]
    fn force_changes_velocity_by_impulse() {
        let mut atoms = vec![atom(2.0)];
        apply_forces(&mut atoms, &[Vec3::new(4.0, 0.0, 0.0)], 0.5, 500.0);
        assert!((atoms[0].velocity.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn force_is_clamped() {
        let mut atoms = vec![atom(1.0)];
        apply_forces(&mut atoms, &[Vec3::new(0.0, 1000.0, 0.0)], 1.0, 500.0);
        assert!((atoms[0].velocity.y - 500.0).abs() < 1e-3);
    }

    #[test]
    fn kinematic_atoms_are_not_integrated() {
        let mut atoms = vec![atom(1.0)];
        atoms[0].mode = MotionMode::Kinematic;
        atoms[0].velocity = Vec3::X;
        apply_forces(&mut atoms, &[Vec3::new(10.0, 0.0, 0.0)], 1.0, 500.0);
        advance_positions(&mut atoms, 0.1);
        assert_eq!(atoms[0].position, Vec3::ZERO);
        assert_eq!(atoms[0].velocity, Vec3::X);
    }

    #[test]
    fn damping_is_per_axis() {
        let mut atoms = vec![atom(1.0).with_damping(Vec3::new(0.0, 0.5, 0.9))];
        atoms[0].velocity = Vec3::ONE;
        advance_positions(&mut atoms, 1.0);
        let v = atoms[0].velocity;
        assert!((v.x - 1.0).abs() < 1e-6);
        assert!((v.y - 0.5).abs() < 1e-6);
        assert!((v.z - 0.1).abs() < 1e-5);
        assert!((atoms[0].position - v).length() < 1e-6);
    }

    #[test]
    fn settled_ignores_kinematic_atoms() {
        let mut atoms = vec![atom(1.0), atom(1.0)];
        atoms[1].velocity = Vec3::splat(10.0);
        assert!(!is_settled(&atoms, 0.01));
        atoms[1].mode = MotionMode::Kinematic;
        assert!(is_settled(&atoms, 0.01));
    }
}
