//! The simulation driver: the only component the host render loop calls.
//!
//! A tick always rebuilds the render buffers. Every `force_interval` ticks
//! the solver runs and its forces are integrated; every `bond_scan_interval`
//! ticks the bonding engine may rewrite the topology.

use std::collections::HashSet;
use std::sync::Arc;

use glam::Vec3;

use crate::api::config::SimConfig;
use crate::api::types::{AtomId, AtomSpec, AtomState, BondEvent, BondState, ManualBond, Snapshot};
use crate::chemistry::geometry::{bond_angle_degrees, Geometry};
use crate::chemistry::valence::ValenceTable;
use crate::core::atoms::{Atom, AtomSet, MotionMode};
use crate::core::time::{Cadence, TickClock};
use crate::core::topology::{Bond, BondOrigin, BondTopology};
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::instance::RenderBuffer;
use crate::systems::bonding::BondingEngine;
use crate::systems::integrate::{advance_positions, apply_forces, is_settled};
use crate::systems::render::build_render_buffer;
use crate::systems::solver::ForceSolver;

/// Interactive molecule simulation.
pub struct Simulation {
    config: SimConfig,
    valence: Arc<ValenceTable>,
    atoms: AtomSet,
    topology: BondTopology,
    solver: ForceSolver,
    bonding: BondingEngine,
    clock: TickClock,
    force_cadence: Cadence,
    scan_cadence: Cadence,
    render: RenderBuffer,
    /// Topology changes reported by the last tick.
    events: Vec<BondEvent>,
    /// Host edits since the last tick, reported with the next one.
    pending_events: Vec<BondEvent>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Self::with_valence(config, Arc::new(ValenceTable::default()))
    }

    /// Create a simulation sharing an already loaded valence table.
    pub fn with_valence(config: SimConfig, valence: Arc<ValenceTable>) -> Self {
        let config = config.sanitized();
        Self {
            clock: TickClock::new(config.max_dt),
            force_cadence: Cadence::every(config.force_interval),
            scan_cadence: Cadence::every(config.bond_scan_interval),
            config,
            valence,
            atoms: AtomSet::new(),
            topology: BondTopology::new(),
            solver: ForceSolver::new(),
            bonding: BondingEngine::new(),
            render: RenderBuffer::new(),
            events: Vec::new(),
            pending_events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn valence(&self) -> &ValenceTable {
        &self.valence
    }

    pub fn atoms(&self) -> &AtomSet {
        &self.atoms
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.by_id(id)
    }

    pub fn topology(&self) -> &BondTopology {
        &self.topology
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.render
    }

    /// Bond formations and breaks reported by the last tick, including host
    /// edits applied since the tick before it.
    pub fn events(&self) -> &[BondEvent] {
        &self.events
    }

    pub fn tick_count(&self) -> u64 {
        self.clock.tick()
    }

    pub fn bond_between(&self, a: AtomId, b: AtomId) -> Option<&Bond> {
        let (i, j) = self.indices(a, b)?;
        self.topology.bond_between(i, j)
    }

    fn indices(&self, a: AtomId, b: AtomId) -> Option<(usize, usize)> {
        Some((self.atoms.index_of(a)?, self.atoms.index_of(b)?))
    }

    // -- Scene construction --

    /// Add a single atom. It takes part in bonding from the next scan on.
    pub fn add_atom(&mut self, spec: &AtomSpec) -> AtomId {
        let id = self.atoms.next_id();
        let profile = self.valence.profile(&spec.element);

        let mut position = Vec3::from_array(spec.position);
        if !position.is_finite() {
            log::warn!("atom {} ({}) has a non-finite position, placing at origin", id.0, spec.element);
            position = Vec3::ZERO;
        }

        let atom = Atom::new(id, spec.element.trim(), position)
            .with_mass(profile.mass)
            .with_damping(Vec3::from_array(self.config.atom_damping))
            .with_radius(spec.radius.unwrap_or(profile.covalent_radius));
        self.atoms.push(atom);
        self.topology.add_atom(profile.max_bond_capacity);
        self.refresh_render();
        id
    }

    /// Remove an atom and every bond referencing it.
    pub fn remove_atom(&mut self, id: AtomId) -> bool {
        let Some(index) = self.atoms.index_of(id) else {
            log::warn!("remove_atom: unknown atom {}", id.0);
            return false;
        };

        for bond in self.topology.remove_atom(index) {
            let (a, b) = (self.atoms[bond.a].id, self.atoms[bond.b].id);
            self.solver.forget(a);
            self.solver.forget(b);
            self.pending_events.push(BondEvent::Broken { a, b, order: bond.order });
        }
        self.atoms.remove(index);
        self.solver.forget(id);
        self.refresh_render();
        true
    }

    /// Remove every atom and bond and restart the tick count.
    pub fn clear(&mut self) {
        self.atoms.clear();
        self.topology.clear();
        self.solver.reset();
        self.clock.reset();
        self.events.clear();
        self.pending_events.clear();
        self.render.clear();
    }

    /// Replace the scene.
    ///
    /// Manual bonds are registered first as single bonds consuming the given
    /// valence slots; their pairs are exempt from inference even when
    /// rejected. The remaining pairs are then bonded once by the formation
    /// test. Returns every bond in the new topology.
    pub fn build_topology(&mut self, atoms: &[AtomSpec], manual_bonds: &[ManualBond]) -> Vec<Bond> {
        self.clear();
        for spec in atoms {
            self.add_atom(spec);
        }

        let mut exempt = HashSet::new();
        let mut manual = 0;
        for mb in manual_bonds {
            exempt.insert((mb.a.min(mb.b), mb.a.max(mb.b)));
            if self.add_manual_bond(mb) {
                manual += 1;
            }
        }

        let inferred = self.bonding.infer(
            self.atoms.as_slice(),
            &mut self.topology,
            &self.valence,
            &self.config,
            &exempt,
        );

        log::info!(
            "scene built: {} atoms, {} manual bonds, {} inferred bonds",
            self.atoms.len(),
            manual,
            inferred.len()
        );
        self.refresh_render();
        self.topology.bonds().to_vec()
    }

    fn add_manual_bond(&mut self, mb: &ManualBond) -> bool {
        let n = self.atoms.len();
        if mb.a >= n || mb.b >= n || mb.a == mb.b {
            log::warn!("manual bond ({}, {}) references an invalid atom pair", mb.a, mb.b);
            return false;
        }
        for (atom, slot) in [(mb.a, mb.slot_a), (mb.b, mb.slot_b)] {
            if slot >= self.topology.capacity(atom) || self.topology.slot_in_use(atom, slot) {
                log::warn!(
                    "manual bond ({}, {}): slot {} on atom {} is unavailable",
                    mb.a,
                    mb.b,
                    slot,
                    atom
                );
                return false;
            }
        }

        let ideal = self
            .valence
            .ideal_bond_length(&self.atoms[mb.a].element, &self.atoms[mb.b].element, 1);
        let bond = Bond::new(mb.a, mb.b, 1, ideal, BondOrigin::Manual).with_slots(mb.a, mb.slot_a, mb.slot_b);
        let created = self.topology.create_bond(bond);
        if !created {
            log::warn!("manual bond ({}, {}) rejected: pair bonded or out of valence", mb.a, mb.b);
        }
        created
    }

    // -- Host edits --

    /// Bond two atoms at the order their remaining valence allows.
    /// Returns the order, or `None` if no bond could be made.
    pub fn add_bond(&mut self, a: AtomId, b: AtomId) -> Option<u8> {
        let Some((i, j)) = self.indices(a, b) else {
            log::warn!("add_bond: unknown atom in pair ({}, {})", a.0, b.0);
            return None;
        };
        let (ei, ej) = (self.atoms[i].element.as_str(), self.atoms[j].element.as_str());
        let order = self
            .valence
            .bond_order(ei, ej, self.topology.remaining(i), self.topology.remaining(j));
        if order == 0 {
            log::warn!("add_bond: no valence left for ({}, {})", a.0, b.0);
            return None;
        }

        let ideal = self.valence.ideal_bond_length(ei, ej, order);
        if !self.topology.create_bond(Bond::new(i, j, order, ideal, BondOrigin::Manual)) {
            log::warn!("add_bond: ({}, {}) already bonded", a.0, b.0);
            return None;
        }
        self.solver.forget(a);
        self.solver.forget(b);
        self.pending_events.push(BondEvent::Formed { a, b, order });
        self.refresh_render();
        Some(order)
    }

    /// Remove the bond between two atoms, if any.
    pub fn remove_bond(&mut self, a: AtomId, b: AtomId) -> bool {
        let Some(bond) = self.indices(a, b).and_then(|(i, j)| self.topology.remove_bond(i, j)) else {
            log::debug!("remove_bond: no bond between {} and {}", a.0, b.0);
            return false;
        };
        self.solver.forget(a);
        self.solver.forget(b);
        self.pending_events.push(BondEvent::Broken { a, b, order: bond.order });
        self.refresh_render();
        true
    }

    /// Grab an atom: it becomes kinematic at `position`.
    pub fn begin_drag(&mut self, id: AtomId, position: Vec3) -> bool {
        let Some(atom) = self.atoms.by_id_mut(id) else {
            log::warn!("begin_drag: unknown atom {}", id.0);
            return false;
        };
        atom.mode = MotionMode::Kinematic;
        atom.velocity = Vec3::ZERO;
        atom.position = position;
        true
    }

    /// Move a grabbed atom. Ignored for atoms not being dragged.
    pub fn update_drag(&mut self, id: AtomId, position: Vec3) -> bool {
        match self.atoms.by_id_mut(id) {
            Some(atom) if atom.is_kinematic() => {
                atom.position = position;
                true
            }
            _ => {
                log::debug!("update_drag: atom {} is not being dragged", id.0);
                false
            }
        }
    }

    /// Release a grabbed atom at rest. Ignored for atoms not being dragged,
    /// which keep their velocity.
    pub fn end_drag(&mut self, id: AtomId) -> bool {
        match self.atoms.by_id_mut(id) {
            Some(atom) if atom.is_kinematic() => {
                atom.mode = MotionMode::Dynamic;
                atom.velocity = Vec3::ZERO;
                true
            }
            Some(_) => {
                log::debug!("end_drag: atom {} is not being dragged", id.0);
                false
            }
            None => {
                log::warn!("end_drag: unknown atom {}", id.0);
                false
            }
        }
    }

    /// Apply every queued host command, in order.
    pub fn apply_input(&mut self, input: &mut InputQueue) {
        for event in input.drain() {
            match event {
                InputEvent::BeginDrag { atom, position } => {
                    self.begin_drag(atom, position);
                }
                InputEvent::UpdateDrag { atom, position } => {
                    self.update_drag(atom, position);
                }
                InputEvent::EndDrag { atom } => {
                    self.end_drag(atom);
                }
                InputEvent::AddBond { a, b } => {
                    self.add_bond(a, b);
                }
                InputEvent::RemoveBond { a, b } => {
                    self.remove_bond(a, b);
                }
                InputEvent::AddAtom { spec } => {
                    self.add_atom(&spec);
                }
                InputEvent::RemoveAtom { atom } => {
                    self.remove_atom(atom);
                }
            }
        }
    }

    // -- Stepping --

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32) {
        let dt = self.clock.advance(dt);
        let tick = self.clock.tick();
        self.events = std::mem::take(&mut self.pending_events);

        if self.force_cadence.is_due(tick) {
            let forces = self
                .solver
                .accumulate(self.atoms.as_slice(), &self.topology, &self.valence, &self.config);
            let held = dt * self.force_cadence.interval() as f32;
            apply_forces(self.atoms.as_mut_slice(), forces, held, self.config.max_force);
        }

        advance_positions(self.atoms.as_mut_slice(), dt);

        if self.scan_cadence.is_due(tick) {
            let outcome = self
                .bonding
                .scan(self.atoms.as_slice(), &mut self.topology, &self.valence, &self.config);
            for event in &outcome.events {
                let (a, b) = event.atoms();
                self.solver.forget(a);
                self.solver.forget(b);
            }
            let held = dt * self.scan_cadence.interval() as f32;
            apply_forces(self.atoms.as_mut_slice(), &outcome.forces, held, self.config.max_force);
            self.events.extend(outcome.events);
        }

        self.refresh_render();
    }

    fn refresh_render(&mut self) {
        build_render_buffer(self.atoms.as_slice(), self.topology.bonds(), &mut self.render);
    }

    // -- Queries --

    /// Whether every dynamic atom moves slower than `threshold`.
    pub fn is_settled(&self, threshold: f32) -> bool {
        is_settled(self.atoms.as_slice(), threshold)
    }

    /// Angle in degrees at `center` between `a` and `b`.
    pub fn measure_angle(&self, center: AtomId, a: AtomId, b: AtomId) -> Option<f32> {
        let c = self.atoms.by_id(center)?.position;
        let pa = self.atoms.by_id(a)?.position;
        let pb = self.atoms.by_id(b)?.position;
        bond_angle_degrees(pa - c, pb - c)
    }

    /// Current VSEPR geometry of an atom, if it has at least two bonds.
    pub fn geometry_of(&self, id: AtomId) -> Option<Geometry> {
        let index = self.atoms.index_of(id)?;
        let neighbors = self.topology.bonds_of(index);
        let has_multiple = neighbors.iter().any(|&(_, order)| order > 1);
        Geometry::classify(neighbors.len(), has_multiple, &self.atoms[index].element)
    }

    pub fn snapshot(&self) -> Snapshot {
        let atoms = self
            .atoms
            .iter()
            .map(|atom| AtomState {
                id: atom.id,
                element: atom.element.clone(),
                position: atom.position.to_array(),
                velocity: atom.velocity.to_array(),
                kinematic: atom.is_kinematic(),
                geometry: self.geometry_of(atom.id).map(|g| g.name()),
            })
            .collect();

        let bonds = self
            .topology
            .iter()
            .map(|bond| BondState {
                a: self.atoms[bond.a].id,
                b: self.atoms[bond.b].id,
                order: bond.order,
                length: self.atoms[bond.a].position.distance(self.atoms[bond.b].position),
                ideal_length: bond.ideal_length,
            })
            .collect();

        Snapshot {
            tick: self.clock.tick(),
            atoms,
            bonds,
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
