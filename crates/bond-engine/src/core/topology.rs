//! Bond registry and per-atom valence bookkeeping.
//!
//! Atoms are addressed by their index in the atom arena. Each atom's
//! consumed valence is the sum of the orders of its bonds and never exceeds
//! its capacity; an unordered pair carries at most one bond.

use thiserror::Error;

/// How a bond came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrigin {
    /// Supplied by the host with explicit valence slots.
    Manual,
    /// Found by the one-off inference pass when the scene was built.
    Inferred,
    /// Formed by the bonding scan during simulation.
    Dynamic,
}

/// A bond between two atom indices, stored with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    /// 1 single, 2 double, 3 triple.
    pub order: u8,
    /// Equilibrium length in Ångström.
    pub ideal_length: f32,
    pub origin: BondOrigin,
    /// Valence slot consumed on `a` and `b`, for manual bonds.
    pub slots: Option<(u8, u8)>,
}

impl Bond {
    pub fn new(a: usize, b: usize, order: u8, ideal_length: f32, origin: BondOrigin) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            a,
            b,
            order,
            ideal_length,
            origin,
            slots: None,
        }
    }

    /// Attach slots given in the caller's (i, j) order.
    pub fn with_slots(mut self, i: usize, slot_i: u8, slot_j: u8) -> Self {
        self.slots = Some(if i == self.a { (slot_i, slot_j) } else { (slot_j, slot_i) });
        self
    }

    pub fn connects(&self, i: usize, j: usize) -> bool {
        (self.a == i && self.b == j) || (self.a == j && self.b == i)
    }

    pub fn touches(&self, i: usize) -> bool {
        self.a == i || self.b == i
    }

    /// The other endpoint, if `i` is one of them.
    pub fn partner(&self, i: usize) -> Option<usize> {
        if self.a == i {
            Some(self.b)
        } else if self.b == i {
            Some(self.a)
        } else {
            None
        }
    }

    /// Slot consumed on atom `i`, for manual bonds.
    pub fn slot_on(&self, i: usize) -> Option<u8> {
        let (sa, sb) = self.slots?;
        if i == self.a {
            Some(sa)
        } else if i == self.b {
            Some(sb)
        } else {
            None
        }
    }
}

/// A broken topology invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyViolation {
    #[error("atom {atom} consumes {consumed} valence but hosts only {capacity}")]
    CapacityExceeded { atom: usize, consumed: u8, capacity: u8 },
    #[error("atom {atom} records {recorded} consumed valence but its bonds sum to {actual}")]
    ConsumedMismatch { atom: usize, recorded: u8, actual: u32 },
    #[error("pair ({a}, {b}) is bonded more than once")]
    DuplicatePair { a: usize, b: usize },
    #[error("bond ({a}, {b}) references a missing atom or itself")]
    InvalidEndpoints { a: usize, b: usize },
    #[error("bond ({a}, {b}) has order {order}")]
    InvalidOrder { a: usize, b: usize, order: u8 },
}

/// Current bonds plus per-atom capacity and consumed valence.
#[derive(Debug, Default, Clone)]
pub struct BondTopology {
    bonds: Vec<Bond>,
    capacity: Vec<u8>,
    consumed: Vec<u8>,
}

impl BondTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new atom with the given capacity. Returns its index.
    pub fn add_atom(&mut self, capacity: u8) -> usize {
        self.capacity.push(capacity);
        self.consumed.push(0);
        self.capacity.len() - 1
    }

    /// Remove an atom, every bond touching it, and shift higher indices down.
    /// Returns the removed bonds, with their pre-removal indices.
    pub fn remove_atom(&mut self, index: usize) -> Vec<Bond> {
        if index >= self.capacity.len() {
            return Vec::new();
        }

        let (removed, kept): (Vec<Bond>, Vec<Bond>) =
            self.bonds.drain(..).partition(|bond| bond.touches(index));

        for bond in &removed {
            if let Some(partner) = bond.partner(index) {
                self.release(partner, bond.order);
            }
        }

        self.bonds = kept
            .into_iter()
            .map(|mut bond| {
                if bond.a > index {
                    bond.a -= 1;
                }
                if bond.b > index {
                    bond.b -= 1;
                }
                bond
            })
            .collect();

        self.capacity.remove(index);
        self.consumed.remove(index);
        self.debug_verify();
        removed
    }

    /// Drop every atom and bond.
    pub fn clear(&mut self) {
        self.bonds.clear();
        self.capacity.clear();
        self.consumed.clear();
    }

    /// Whether `bond` could be registered right now.
    pub fn can_bond(&self, i: usize, j: usize, order: u8) -> bool {
        i != j
            && (1..=3).contains(&order)
            && i < self.capacity.len()
            && j < self.capacity.len()
            && self.bond_between(i, j).is_none()
            && self.remaining(i) >= order
            && self.remaining(j) >= order
    }

    /// Register a bond, consuming `order` valence on both atoms.
    /// No-op returning `false` if the pair is invalid, already bonded, or
    /// either side lacks capacity.
    pub fn create_bond(&mut self, bond: Bond) -> bool {
        if !self.can_bond(bond.a, bond.b, bond.order) {
            return false;
        }
        self.consumed[bond.a] += bond.order;
        self.consumed[bond.b] += bond.order;
        self.bonds.push(bond);
        self.debug_verify();
        true
    }

    /// Remove the bond between `i` and `j`, restoring both atoms' valence.
    pub fn remove_bond(&mut self, i: usize, j: usize) -> Option<Bond> {
        let pos = self.bonds.iter().position(|bond| bond.connects(i, j))?;
        let bond = self.bonds.remove(pos);
        self.release(bond.a, bond.order);
        self.release(bond.b, bond.order);
        self.debug_verify();
        Some(bond)
    }

    fn release(&mut self, atom: usize, order: u8) {
        if let Some(consumed) = self.consumed.get_mut(atom) {
            *consumed = consumed.saturating_sub(order);
        }
    }

    pub fn bond_between(&self, i: usize, j: usize) -> Option<&Bond> {
        self.bonds.iter().find(|bond| bond.connects(i, j))
    }

    /// Partners of `atom` with bond order, sorted by partner index.
    pub fn bonds_of(&self, atom: usize) -> Vec<(usize, u8)> {
        let mut out: Vec<(usize, u8)> = self
            .bonds
            .iter()
            .filter_map(|bond| bond.partner(atom).map(|p| (p, bond.order)))
            .collect();
        out.sort_unstable_by_key(|&(p, _)| p);
        out
    }

    /// Neighbor lists for every atom, each sorted by partner index.
    pub fn adjacency(&self) -> Vec<Vec<(usize, u8)>> {
        let mut adjacency = vec![Vec::new(); self.capacity.len()];
        for bond in &self.bonds {
            adjacency[bond.a].push((bond.b, bond.order));
            adjacency[bond.b].push((bond.a, bond.order));
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable_by_key(|&(p, _)| p);
        }
        adjacency
    }

    pub fn has_multiple_bond(&self, atom: usize) -> bool {
        self.bonds.iter().any(|bond| bond.touches(atom) && bond.order > 1)
    }

    pub fn capacity(&self, atom: usize) -> u8 {
        self.capacity.get(atom).copied().unwrap_or(0)
    }

    pub fn consumed(&self, atom: usize) -> u8 {
        self.consumed.get(atom).copied().unwrap_or(0)
    }

    pub fn remaining(&self, atom: usize) -> u8 {
        self.capacity(atom).saturating_sub(self.consumed(atom))
    }

    /// Whether a manual bond already occupies `slot` on `atom`.
    pub fn slot_in_use(&self, atom: usize, slot: u8) -> bool {
        self.bonds.iter().any(|bond| bond.slot_on(atom) == Some(slot))
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.iter()
    }

    /// Number of bonds.
    pub fn len(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bonds.is_empty()
    }

    /// Number of registered atoms.
    pub fn atom_count(&self) -> usize {
        self.capacity.len()
    }

    /// Check every invariant.
    pub fn verify(&self) -> Result<(), TopologyViolation> {
        let n = self.capacity.len();
        let mut sums = vec![0u32; n];

        for (k, bond) in self.bonds.iter().enumerate() {
            if bond.a == bond.b || bond.a >= n || bond.b >= n {
                return Err(TopologyViolation::InvalidEndpoints { a: bond.a, b: bond.b });
            }
            if !(1..=3).contains(&bond.order) {
                return Err(TopologyViolation::InvalidOrder {
                    a: bond.a,
                    b: bond.b,
                    order: bond.order,
                });
            }
            if self.bonds[..k].iter().any(|other| other.connects(bond.a, bond.b)) {
                return Err(TopologyViolation::DuplicatePair { a: bond.a, b: bond.b });
            }
            sums[bond.a] += u32::from(bond.order);
            sums[bond.b] += u32::from(bond.order);
        }

        for (atom, &actual) in sums.iter().enumerate() {
            let recorded = self.consumed[atom];
            if u32::from(recorded) != actual {
                return Err(TopologyViolation::ConsumedMismatch { atom, recorded, actual });
            }
            if recorded > self.capacity[atom] {
                return Err(TopologyViolation::CapacityExceeded {
                    atom,
                    consumed: recorded,
                    capacity: self.capacity[atom],
                });
            }
        }
        Ok(())
    }

    fn debug_verify(&self) {
        if cfg!(debug_assertions) {
            if let Err(violation) = self.verify() {
                panic!("bond topology corrupted: {violation}");
            }
        }
    }
}
