use glam::Vec3;

use crate::api::types::AtomId;

/// Whether the integrator moves the atom or the host does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    #[default]
    Dynamic,
    /// Position set by input; excluded from integration.
    Kinematic,
}

/// A single atom in the scene.
#[derive(Debug, Clone)]
pub struct Atom {
    pub id: AtomId,
    pub element: String,
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    /// Per-axis velocity damping factor.
    pub damping: Vec3,
    pub radius: f32,
    pub mode: MotionMode,
}

impl Atom {
    pub fn new(id: AtomId, element: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            element: element.into(),
            position,
            velocity: Vec3::ZERO,
            mass: 1.0,
            damping: Vec3::ZERO,
            radius: 0.5,
            mode: MotionMode::Dynamic,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass.max(f32::EPSILON);
        self
    }

    pub fn with_damping(mut self, damping: Vec3) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn is_kinematic(&self) -> bool {
        self.mode == MotionMode::Kinematic
    }
}

/// Index-addressed atom storage.
///
/// Indices are dense and shift down on removal; `AtomId`s never change.
/// Sized for interactive scenes (tens to hundreds of atoms).
#[derive(Debug, Default)]
pub struct AtomSet {
    atoms: Vec<Atom>,
    next_id: u32,
}

impl AtomSet {
    pub fn new() -> Self {
        Self {
            atoms: Vec::with_capacity(64),
            next_id: 1,
        }
    }

    /// Allocate a fresh id.
    pub fn next_id(&mut self) -> AtomId {
        let id = AtomId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// Append an atom. Returns its index.
    pub fn push(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Remove the atom at `index`, shifting later atoms down by one.
    pub fn remove(&mut self, index: usize) -> Option<Atom> {
        (index < self.atoms.len()).then(|| self.atoms.remove(index))
    }

    /// Drop every atom. Ids keep counting up.
    pub fn clear(&mut self) {
        self.atoms.clear();
    }

    pub fn index_of(&self, id: AtomId) -> Option<usize> {
        self.atoms.iter().position(|a| a.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    pub fn by_id(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.id == id)
    }

    pub fn by_id_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.iter_mut().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Atom> {
        self.atoms.iter_mut()
    }

    pub fn as_slice(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn as_mut_slice(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

impl std::ops::Index<usize> for AtomSet {
    type Output = Atom;

    fn index(&self, index: usize) -> &Atom {
        &self.atoms[index]
    }
}

impl std::ops::IndexMut<usize> for AtomSet {
    fn index_mut(&mut self, index: usize) -> &mut Atom {
        &mut self.atoms[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(n: usize) -> AtomSet {
        let mut set = AtomSet::new();
        for i in 0..n {
            let id = set.next_id();
            set.push(Atom::new(id, "C", Vec3::new(i as f32, 0.0, 0.0)));
        }
        set
    }

    #[test]
    fn ids_are_unique_and_stable() {
        let mut set = set_of(3);
        let ids: Vec<AtomId> = set.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![AtomId(1), AtomId(2), AtomId(3)]);

        set.remove(0);
        assert_eq!(set.index_of(AtomId(2)), Some(0));
        assert_eq!(set.index_of(AtomId(3)), Some(1));
        assert_eq!(set.index_of(AtomId(1)), None);

        let id = set.next_id();
        assert_eq!(id, AtomId(4));
    }

    #[test]
    fn removal_preserves_order() {
        let mut set = set_of(4);
        set.remove(1);
        let xs: Vec<f32> = set.iter().map(|a| a.position.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 3.0]);
    }

    #[test]
    fn remove_out_of_range() {
        let mut set = set_of(2);
        assert!(set.remove(5).is_none());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn clear_keeps_id_counter() {
        let mut set = set_of(2);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.next_id(), AtomId(3));
    }

    #[test]
    fn mass_never_zero() {
        let atom = Atom::new(AtomId(1), "H", Vec3::ZERO).with_mass(0.0);
        assert!(atom.mass > 0.0);
    }
}
