//! Dynamic bond formation and breaking.
//!
//! Every scan walks all unordered atom pairs in index order. Bonded pairs
//! break when stretched past the breaking threshold. Unbonded pairs are
//! classified by distance relative to the ideal length of the bond they
//! could form:
//!
//! ```text
//!   0 ── min_safe ── max_bond ──────── attraction ──────── ∞
//!   TooClose │ Bonding │      Attraction       │     Far
//! ```
//!
//! TooClose repels regardless of valence; Bonding and Attraction need a
//! non-zero candidate order. A bond formed early in a scan reduces the
//! valence available to later pairs of the same scan.

use std::collections::HashSet;

use glam::Vec3;

use crate::api::config::SimConfig;
use crate::api::types::BondEvent;
use crate::chemistry::valence::ValenceTable;
use crate::core::atoms::Atom;
use crate::core::topology::{Bond, BondOrigin, BondTopology};
use crate::systems::springs::EPSILON;

/// Distance thresholds for one candidate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondWindow {
    pub ideal_length: f32,
    pub min_safe: f32,
    pub max_bond: f32,
    pub attraction: f32,
}

impl BondWindow {
    pub fn new(ideal_length: f32, config: &SimConfig) -> Self {
        Self {
            ideal_length,
            min_safe: config.min_safe_factor * ideal_length,
            max_bond: config.max_bond_factor * ideal_length,
            attraction: config.attraction_factor * ideal_length,
        }
    }

    /// Zone of an unbonded pair at `distance`. Without a candidate order
    /// only `TooClose` and `Far` are possible.
    pub fn zone(&self, distance: f32, order: u8) -> PairZone {
        if distance < self.min_safe {
            PairZone::TooClose
        } else if order > 0 && distance <= self.max_bond {
            PairZone::Bonding
        } else if order > 0 && distance <= self.attraction {
            PairZone::Attraction
        } else {
            PairZone::Far
        }
    }
}

/// Distance zone of an unbonded pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairZone {
    TooClose,
    Bonding,
    Attraction,
    Far,
}

/// Result of one bonding scan.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Formations and breaks, in scan order.
    pub events: Vec<BondEvent>,
    /// Net attraction/repulsion force per atom index.
    pub forces: Vec<Vec3>,
}

/// Runs bonding scans and the initial inference pass.
#[derive(Debug, Default)]
pub struct BondingEngine;

impl BondingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Candidate order and ideal length for an unbonded pair given current valence.
    fn candidate(
        atoms: &[Atom],
        topology: &BondTopology,
        valence: &ValenceTable,
        i: usize,
        j: usize,
    ) -> (u8, f32) {
        let (ei, ej) = (atoms[i].element.as_str(), atoms[j].element.as_str());
        let order = valence.bond_order(ei, ej, topology.remaining(i), topology.remaining(j));
        let ideal = valence.ideal_bond_length(ei, ej, order.max(1));
        (order, ideal)
    }

    /// One pass over every pair: break stretched bonds, form bonds in the
    /// bonding window, and collect attraction/repulsion forces.
    pub fn scan(
        &self,
        atoms: &[Atom],
        topology: &mut BondTopology,
        valence: &ValenceTable,
        config: &SimConfig,
    ) -> ScanOutcome {
        let n = atoms.len().min(topology.atom_count());
        let mut outcome = ScanOutcome {
            events: Vec::new(),
            forces: vec![Vec3::ZERO; atoms.len()],
        };

        for i in 0..n {
            for j in (i + 1)..n {
                let delta = atoms[j].position - atoms[i].position;
                let distance = delta.length();

                if let Some(bond) = topology.bond_between(i, j) {
                    if distance > config.breaking_factor * bond.ideal_length {
                        let order = bond.order;
                        topology.remove_bond(i, j);
                        log::debug!(
                            "bond broken: {}{} - {}{} (order {order}, {distance:.2} Å)",
                            atoms[i].element,
                            atoms[i].id.0,
                            atoms[j].element,
                            atoms[j].id.0
                        );
                        outcome.events.push(BondEvent::Broken {
                            a: atoms[i].id,
                            b: atoms[j].id,
                            order,
                        });
                    }
                    continue;
                }

                let (order, ideal) = Self::candidate(atoms, topology, valence, i, j);
                let window = BondWindow::new(ideal, config);
                let axis = if distance < EPSILON { Vec3::X } else { delta / distance };

                match window.zone(distance, order) {
                    PairZone::TooClose => {
                        let floored = distance.max(config.repulsion_floor_factor * ideal);
                        let magnitude = config.repulsion_strength / (floored * floored);
                        outcome.forces[i] -= axis * magnitude;
                        outcome.forces[j] += axis * magnitude;
                    }
                    PairZone::Bonding => {
                        let bond = Bond::new(i, j, order, ideal, BondOrigin::Dynamic);
                        if topology.create_bond(bond) {
                            log::debug!(
                                "bond formed: {}{} - {}{} (order {order}, {distance:.2} Å)",
                                atoms[i].element,
                                atoms[i].id.0,
                                atoms[j].element,
                                atoms[j].id.0
                            );
                            outcome.events.push(BondEvent::Formed {
                                a: atoms[i].id,
                                b: atoms[j].id,
                                order,
                            });
                        }
                    }
                    PairZone::Attraction => {
                        let magnitude = config.attraction_strength * (distance - ideal) / ideal;
                        outcome.forces[i] += axis * magnitude;
                        outcome.forces[j] -= axis * magnitude;
                    }
                    PairZone::Far => {}
                }
            }
        }

        outcome
    }

    /// One-off inference for a freshly built scene: bond every pair that is
    /// in the bonding window, skipping pairs listed in `exempt`.
    pub fn infer(
        &self,
        atoms: &[Atom],
        topology: &mut BondTopology,
        valence: &ValenceTable,
        config: &SimConfig,
        exempt: &HashSet<(usize, usize)>,
    ) -> Vec<Bond> {
        let n = atoms.len().min(topology.atom_count());
        let mut inferred = Vec::new();

        for i in 0..n {
            for j in (i + 1)..n {
                if exempt.contains(&(i, j)) || topology.bond_between(i, j).is_some() {
                    continue;
                }
                let (order, ideal) = Self::candidate(atoms, topology, valence, i, j);
                let distance = atoms[i].position.distance(atoms[j].position);
                if BondWindow::new(ideal, config).zone(distance, order) != PairZone::Bonding {
                    continue;
                }
                let bond = Bond::new(i, j, order, ideal, BondOrigin::Inferred);
                if topology.create_bond(bond) {
                    inferred.push(bond);
                }
            }
        }

        inferred
    }
}
