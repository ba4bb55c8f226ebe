use serde::{Deserialize, Serialize};

/// Stable identifier of an atom. Survives index compaction on removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomId(pub u32);

/// An atom as supplied by the host or a coordinate file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomSpec {
    pub element: String,
    pub position: [f32; 3],
    /// Display radius; defaults to the element's covalent radius.
    #[serde(default)]
    pub radius: Option<f32>,
}

impl AtomSpec {
    pub fn new(element: impl Into<String>, position: [f32; 3]) -> Self {
        Self {
            element: element.into(),
            position,
            radius: None,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }
}

/// A bond fixed by the host before inference runs.
///
/// `a`/`b` index into the atom list passed alongside; `slot_a`/`slot_b`
/// name the valence slot consumed on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualBond {
    pub a: usize,
    pub b: usize,
    #[serde(default)]
    pub slot_a: u8,
    #[serde(default)]
    pub slot_b: u8,
}

/// Initial scene description: atoms plus optional manual bonds.
/// Loaded from JSON by hosts that do not use XYZ files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub atoms: Vec<AtomSpec>,
    #[serde(default)]
    pub bonds: Vec<ManualBond>,
}

impl SceneSpec {
    /// Parse a scene from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Topology change reported by a tick or a host edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BondEvent {
    Formed { a: AtomId, b: AtomId, order: u8 },
    Broken { a: AtomId, b: AtomId, order: u8 },
}

impl BondEvent {
    pub fn atoms(&self) -> (AtomId, AtomId) {
        match *self {
            Self::Formed { a, b, .. } | Self::Broken { a, b, .. } => (a, b),
        }
    }
}

/// Serializable view of one atom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomState {
    pub id: AtomId,
    pub element: String,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub kinematic: bool,
    /// VSEPR geometry name for atoms with two or more bonds.
    pub geometry: Option<&'static str>,
}

/// Serializable view of one bond.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondState {
    pub a: AtomId,
    pub b: AtomId,
    pub order: u8,
    pub length: f32,
    pub ideal_length: f32,
}

/// Full simulation state at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub atoms: Vec<AtomState>,
    pub bonds: Vec<BondState>,
}
