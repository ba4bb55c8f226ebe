//! Bond-angle constraints around center atoms.
//!
//! All corrections are positional springs between atoms, so every force
//! applied to a neighbor has an equal and opposite partner on the center or
//! on another neighbor, and momentum is conserved.
//!
//! - Pairwise: a spring along the neighbor–neighbor axis toward the
//!   law-of-cosines distance for the ideal angle at the current bond lengths.
//! - Linear: each neighbor is pulled toward the point diametrically opposite
//!   the other one.
//! - Planarity: trigonal-planar neighbors are pulled back into the plane of
//!   the center and the other two.
//! - Anti-flip: a remembered plane normal per center; if the current normal
//!   points against it, the first two neighbors are rotated back.

use std::collections::HashMap;

use glam::Vec3;

use crate::api::config::SimConfig;
use crate::api::types::AtomId;
use crate::core::atoms::Atom;
use crate::systems::springs::EPSILON;

/// Deviation of `dot(n_a, n_b) + 1` below which a linear center counts as straight.
const LINEAR_DEVIATION_EPSILON: f32 = 1e-6;

/// Remembered plane normal per center atom.
#[derive(Debug, Default, Clone)]
pub struct PlaneMemory {
    normals: HashMap<AtomId, Vec3>,
}

impl PlaneMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, center: AtomId) -> Option<Vec3> {
        self.normals.get(&center).copied()
    }

    /// Drop the memory of a center whose neighbor set changed.
    pub fn forget(&mut self, center: AtomId) {
        self.normals.remove(&center);
    }

    pub fn clear(&mut self) {
        self.normals.clear();
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }

    fn remember(&mut self, center: AtomId, normal: Vec3) {
        self.normals.insert(center, normal);
    }
}

/// Spring between two neighbors of `center` toward the separation that
/// makes the angle at `center` equal `ideal`.
///
/// Within tolerance only damping along the neighbor axis acts.
pub fn pairwise_angle_force(
    atoms: &[Atom],
    center: usize,
    a: usize,
    b: usize,
    ideal: f32,
    config: &SimConfig,
    forces: &mut [Vec3],
) {
    let c = atoms[center].position;
    let (pa, pb) = (atoms[a].position, atoms[b].position);
    let (va, vb) = (pa - c, pb - c);
    let (la, lb) = (va.length(), vb.length());
    if la < EPSILON || lb < EPSILON {
        return;
    }

    let current = (va / la).dot(vb / lb).clamp(-1.0, 1.0).acos();

    let ab = pb - pa;
    let separation = ab.length();
    if separation < EPSILON {
        return;
    }
    let axis = ab / separation;

    let closing_speed = (atoms[b].velocity - atoms[a].velocity).dot(axis);
    let mut magnitude = config.angle_damping * closing_speed;

    if (current - ideal).abs() >= config.angle_tolerance() {
        let target = (la * la + lb * lb - 2.0 * la * lb * ideal.cos()).max(0.0).sqrt();
        magnitude += config.angle_stiffness * (separation - target);
    }

    forces[a] += axis * magnitude;
    forces[b] -= axis * magnitude;
}

/// Collinearity solve for a two-neighbor linear center.
pub fn linear_force(atoms: &[Atom], center: usize, a: usize, b: usize, config: &SimConfig, forces: &mut [Vec3]) {
    let c = atoms[center].position;
    let (va, vb) = (atoms[a].position - c, atoms[b].position - c);
    let (la, lb) = (va.length(), vb.length());
    if la < EPSILON || lb < EPSILON {
        return;
    }
    let (na, nb) = (va / la, vb / lb);
    let deviation = na.dot(nb) + 1.0;

    for (i, ni, li, nj) in [(a, na, la, nb), (b, nb, lb, na)] {
        let mut f = if deviation > LINEAR_DEVIATION_EPSILON {
            let target = c - nj * li;
            (target - atoms[i].position) * config.linear_stiffness
        } else {
            Vec3::ZERO
        };

        let relative = atoms[i].velocity - atoms[center].velocity;
        let perpendicular = relative - ni * relative.dot(ni);
        f -= perpendicular * config.linear_damping;

        forces[i] += f;
        forces[center] -= f;
    }
}

/// Pull each of three neighbors toward the plane through the center and the
/// other two.
pub fn planarity_force(atoms: &[Atom], center: usize, neighbors: [usize; 3], config: &SimConfig, forces: &mut [Vec3]) {
    let c = atoms[center].position;
    for k in 0..3 {
        let n = neighbors[k];
        let a = neighbors[(k + 1) % 3];
        let b = neighbors[(k + 2) % 3];
        let Some(normal) = (atoms[a].position - c).cross(atoms[b].position - c).try_normalize() else {
            continue;
        };
        let distance = (atoms[n].position - c).dot(normal);
        let f = normal * (-config.planarity_stiffness * distance);
        forces[n] += f;
        forces[center] -= f;
    }
}

/// Guard a center with three or more neighbors against inverting.
///
/// The first evaluation only records the plane normal of the first two
/// neighbor directions. Afterwards, an inverted normal triggers a corrective
/// force on those two neighbors (and the reaction on the center) without
/// updating the memory; otherwise the memory drifts toward the current normal.
pub fn anti_flip_force(
    atoms: &[Atom],
    center: usize,
    neighbors: &[usize],
    memory: &mut PlaneMemory,
    config: &SimConfig,
    forces: &mut [Vec3],
) {
    let [first, second, ..] = neighbors else {
        return;
    };
    let c = atoms[center].position;
    let (Some(v0), Some(v1)) = (
        (atoms[*first].position - c).try_normalize(),
        (atoms[*second].position - c).try_normalize(),
    ) else {
        return;
    };
    let Some(normal) = v0.cross(v1).try_normalize() else {
        return;
    };

    let id = atoms[center].id;
    let Some(remembered) = memory.get(id) else {
        memory.remember(id, normal);
        return;
    };

    if normal.dot(remembered) < 0.0 {
        let f0 = v1.cross(remembered).reject_from_normalized(v0) * config.flip_stiffness;
        let f1 = remembered.cross(v0).reject_from_normalized(v1) * config.flip_stiffness;
        forces[*first] += f0;
        forces[*second] += f1;
        forces[center] -= f0 + f1;
        log::trace!("anti-flip correction on atom {}", id.0);
        return;
    }

    let blend = config.plane_memory_blend;
    let blended = (remembered * (1.0 - blend) + normal * blend)
        .try_normalize()
        .unwrap_or(normal);
    memory.remember(id, blended);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(id: u32, p: Vec3) -> Atom {
        Atom::new(AtomId(id), "X", p)
    }

    fn net(forces: &[Vec3]) -> Vec3 {
        forces.iter().copied().sum()
    }

    #[test]
    fn pairwise_pushes_closed_angle_open() {
        // 90° at the center, target 104.5°
        let atoms = vec![atom(1, Vec3::ZERO), atom(2, Vec3::X), atom(3, Vec3::Y)];
        let mut forces = vec![Vec3::ZERO; 3];
        pairwise_angle_force(&atoms, 0, 1, 2, 104.5f32.to_radians(), &SimConfig::default(), &mut forces);

        // a is pushed away from b and vice versa
        let ab = (atoms[2].position - atoms[1].position).normalize();
        assert!(forces[1].dot(ab) < 0.0);
        assert!(forces[2].dot(ab) > 0.0);
        assert!(net(&forces).length() < 1e-5);
    }

    #[test]
    fn pairwise_within_tolerance_only_damps() {
        let ideal = 90f32.to_radians();
        let atoms = vec![atom(1, Vec3::ZERO), atom(2, Vec3::X), atom(3, Vec3::Y)];
        let mut forces = vec![Vec3::ZERO; 3];
        pairwise_angle_force(&atoms, 0, 1, 2, ideal, &SimConfig::default(), &mut forces);
        assert!(forces[1].length() < 1e-6);
        assert!(forces[2].length() < 1e-6);
    }

    #[test]
    fn linear_pulls_bent_center_straight() {
        let atoms = vec![
            atom(1, Vec3::ZERO),
            atom(2, Vec3::X),
            atom(3, Vec3::new(-0.8, 0.6, 0.0)),
        ];
        let mut forces = vec![Vec3::ZERO; 3];
        linear_force(&atoms, 0, 1, 2, &SimConfig::default(), &mut forces);
        // Neighbor 2 sits above the axis and is pulled down toward -X
        assert!(forces[2].y < 0.0);
        assert!(forces[2].x < 0.0);
        assert!(net(&forces).length() < 1e-4);
    }

    #[test]
    fn straight_linear_center_feels_nothing() {
        let atoms = vec![atom(1, Vec3::ZERO), atom(2, Vec3::X), atom(3, -Vec3::X)];
        let mut forces = vec![Vec3::ZERO; 3];
        linear_force(&atoms, 0, 1, 2, &SimConfig::default(), &mut forces);
        assert!(forces.iter().all(|f| f.length() < 1e-6), "forces were {:?}", forces);
    }

    #[test]
    fn planarity_pulls_neighbor_into_plane() {
        let atoms = vec![
            atom(1, Vec3::ZERO),
            atom(2, Vec3::new(1.0, 0.0, 0.5)),
            atom(3, Vec3::new(-0.5, 0.866, 0.0)),
            atom(4, Vec3::new(-0.5, -0.866, 0.0)),
        ];
        let mut forces = vec![Vec3::ZERO; 4];
        planarity_force(&atoms, 0, [1, 2, 3], &SimConfig::default(), &mut forces);
        assert!(forces[1].z < 0.0, "force was {:?}", forces[1]);
        assert!(net(&forces).length() < 1e-4);
    }

    #[test]
    fn anti_flip_first_pass_only_remembers() {
        let atoms = vec![atom(1, Vec3::ZERO), atom(2, Vec3::X), atom(3, Vec3::Y), atom(4, Vec3::Z)];
        let mut memory = PlaneMemory::new();
        let mut forces = vec![Vec3::ZERO; 4];
        anti_flip_force(&atoms, 0, &[1, 2, 3], &mut memory, &SimConfig::default(), &mut forces);
        assert_eq!(memory.get(AtomId(1)), Some(Vec3::Z));
        assert!(forces.iter().all(|f| *f == Vec3::ZERO));
    }

    #[test]
    fn anti_flip_corrects_inversion_without_updating() {
        let mut atoms = vec![atom(1, Vec3::ZERO), atom(2, Vec3::X), atom(3, Vec3::Y), atom(4, Vec3::Z)];
        let mut memory = PlaneMemory::new();
        let config = SimConfig::default();
        let mut forces = vec![Vec3::ZERO; 4];
        anti_flip_force(&atoms, 0, &[1, 2, 3], &mut memory, &config, &mut forces);

        // Move the second neighbor below the first so the normal inverts
        atoms[2].position = Vec3::new(0.6, -0.8, 0.0);
        anti_flip_force(&atoms, 0, &[1, 2, 3], &mut memory, &config, &mut forces);

        assert_eq!(memory.get(AtomId(1)), Some(Vec3::Z));
        assert!(forces[1].length() > 0.0);
        assert!(forces[2].y > 0.0, "second neighbor should rotate back, got {:?}", forces[2]);
        assert!(net(&forces).length() < 1e-4);
    }

    #[test]
    fn anti_flip_blends_memory() {
        let mut atoms = vec![atom(1, Vec3::ZERO), atom(2, Vec3::X), atom(3, Vec3::Y), atom(4, Vec3::Z)];
        let mut memory = PlaneMemory::new();
        let config = SimConfig::default();
        let mut forces = vec![Vec3::ZERO; 4];
        anti_flip_force(&atoms, 0, &[1, 2, 3], &mut memory, &config, &mut forces);

        atoms[2].position = Vec3::new(0.0, 1.0, 0.0).lerp(Vec3::Z, 0.5);
        anti_flip_force(&atoms, 0, &[1, 2, 3], &mut memory, &config, &mut forces);
        let m = memory.get(AtomId(1)).unwrap();
        assert!((m.length() - 1.0).abs() < 1e-5);
        assert!(m.y < 0.0 && m.z > 0.9, "memory was {:?}", m);
    }

    #[test]
    fn forget_clears_center() {
        let mut memory = PlaneMemory::new();
        memory.remember(AtomId(7), Vec3::Z);
        memory.forget(AtomId(7));
        assert!(memory.is_empty());
    }
}
