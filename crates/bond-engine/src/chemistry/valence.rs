//! Per-element valence data and the bonding rules derived from it.
//!
//! The table is embedded JSON (covalent radii from Cordero et al. 2008,
//! in Ångström). Unknown symbols resolve to a fallback profile instead of
//! failing, so a scene with exotic elements still simulates.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Embed the valence table at compile time.
const VALENCE_JSON: &str = include_str!("../../data/valence.json");

/// Bond capacity assumed for symbols missing from the table.
pub const DEFAULT_BOND_CAPACITY: u8 = 4;
/// Covalent radius (Å) assumed for symbols missing from the table.
pub const DEFAULT_COVALENT_RADIUS: f32 = 0.75;
/// Mass assumed for symbols missing from the table.
pub const DEFAULT_MASS: f32 = 12.0;
/// Ideal angle used when no element rule applies (tetrahedral).
pub const DEFAULT_BOND_ANGLE_DEGREES: f32 = 109.5;
/// Ideal angle of an sp2 center.
pub const PLANAR_BOND_ANGLE_DEGREES: f32 = 120.0;

const DEFAULT_MULTIPLICITY_SCALE: [f32; 3] = [1.0, 0.86, 0.78];

#[derive(Debug, Deserialize)]
struct RawProfile {
    symbol: String,
    covalent_radius: f32,
    max_bonds: u8,
    mass: f32,
    /// Ideal angle in degrees, keyed by neighbor count.
    #[serde(default)]
    angles: BTreeMap<u8, f32>,
}

#[derive(Debug, Deserialize)]
struct RawMultipleBond {
    pair: [String; 2],
    order: u8,
}

#[derive(Debug, Deserialize)]
struct RawValenceTable {
    fallback: RawProfile,
    #[serde(default = "default_multiplicity_scale")]
    multiplicity_scale: [f32; 3],
    elements: Vec<RawProfile>,
    #[serde(default)]
    multiple_bonds: Vec<RawMultipleBond>,
}

fn default_multiplicity_scale() -> [f32; 3] {
    DEFAULT_MULTIPLICITY_SCALE
}

/// Immutable bonding data for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ValenceProfile {
    pub symbol: String,
    /// Single-bond covalent radius in Ångström.
    pub covalent_radius: f32,
    /// Sum of bond orders the atom may host.
    pub max_bond_capacity: u8,
    pub mass: f32,
    /// Ideal bond angle in radians, keyed by neighbor count.
    angle_rules: BTreeMap<u8, f32>,
}

impl ValenceProfile {
    fn from_raw(raw: RawProfile) -> Self {
        Self {
            symbol: canonical_symbol(&raw.symbol),
            covalent_radius: raw.covalent_radius,
            max_bond_capacity: raw.max_bonds,
            mass: raw.mass,
            angle_rules: raw
                .angles
                .into_iter()
                .map(|(count, degrees)| (count, degrees.to_radians()))
                .collect(),
        }
    }

    fn fallback() -> Self {
        Self {
            symbol: "X".to_string(),
            covalent_radius: DEFAULT_COVALENT_RADIUS,
            max_bond_capacity: DEFAULT_BOND_CAPACITY,
            mass: DEFAULT_MASS,
            angle_rules: BTreeMap::new(),
        }
    }

    /// Element-specific ideal angle (radians) for a center with this many neighbors.
    pub fn angle_rule(&self, neighbor_count: usize) -> Option<f32> {
        let count = u8::try_from(neighbor_count).ok()?;
        self.angle_rules.get(&count).copied()
    }
}

/// Normalize an element symbol to "C", "Cl", "Br" form.
pub fn canonical_symbol(symbol: &str) -> String {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

fn pair_key(e1: &str, e2: &str) -> (String, String) {
    let a = canonical_symbol(e1);
    let b = canonical_symbol(e2);
    if a <= b { (a, b) } else { (b, a) }
}

/// Valence table with O(1) lookup by symbol.
#[derive(Debug, Clone)]
pub struct ValenceTable {
    profiles: HashMap<String, ValenceProfile>,
    fallback: ValenceProfile,
    /// Preferred bond order for element pairs that may bond more than once.
    multiple_bonds: HashMap<(String, String), u8>,
    multiplicity_scale: [f32; 3],
}

impl ValenceTable {
    /// Load the table from embedded JSON.
    pub fn load() -> Result<Self, serde_json::Error> {
        Self::from_json(VALENCE_JSON)
    }

    /// Parse a table from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawValenceTable = serde_json::from_str(json)?;

        let profiles = raw
            .elements
            .into_iter()
            .map(ValenceProfile::from_raw)
            .map(|profile| (profile.symbol.clone(), profile))
            .collect();

        let multiple_bonds = raw
            .multiple_bonds
            .into_iter()
            .map(|entry| (pair_key(&entry.pair[0], &entry.pair[1]), entry.order.clamp(1, 3)))
            .collect();

        Ok(Self {
            profiles,
            fallback: ValenceProfile::from_raw(raw.fallback),
            multiple_bonds,
            multiplicity_scale: raw.multiplicity_scale,
        })
    }

    /// A table that knows no elements: everything uses the fallback profile.
    pub fn fallback_only() -> Self {
        Self {
            profiles: HashMap::new(),
            fallback: ValenceProfile::fallback(),
            multiple_bonds: HashMap::new(),
            multiplicity_scale: DEFAULT_MULTIPLICITY_SCALE,
        }
    }

    /// Profile for a symbol, or the fallback profile for unknown symbols.
    pub fn profile(&self, symbol: &str) -> &ValenceProfile {
        self.profiles
            .get(symbol)
            .or_else(|| self.profiles.get(&canonical_symbol(symbol)))
            .unwrap_or(&self.fallback)
    }

    /// Whether the symbol has its own entry.
    pub fn contains(&self, symbol: &str) -> bool {
        self.profiles.contains_key(&canonical_symbol(symbol))
    }

    pub fn max_bond_capacity(&self, symbol: &str) -> u8 {
        self.profile(symbol).max_bond_capacity
    }

    pub fn covalent_radius(&self, symbol: &str) -> f32 {
        self.profile(symbol).covalent_radius
    }

    pub fn mass(&self, symbol: &str) -> f32 {
        self.profile(symbol).mass
    }

    /// Sum of covalent radii, shortened for double and triple bonds.
    pub fn ideal_bond_length(&self, e1: &str, e2: &str, order: u8) -> f32 {
        let single = self.covalent_radius(e1) + self.covalent_radius(e2);
        let scale = match order {
            2 => self.multiplicity_scale[1],
            3 => self.multiplicity_scale[2],
            _ => self.multiplicity_scale[0],
        };
        single * scale
    }

    /// Bond order two atoms would form given their remaining capacity.
    ///
    /// Returns 0 when either side is saturated. Pairs listed as multiple-bond
    /// exceptions get their preferred order, stepped down to what the scarcer
    /// side can still host; everything else bonds once.
    pub fn bond_order(&self, e1: &str, e2: &str, remaining1: u8, remaining2: u8) -> u8 {
        let available = remaining1.min(remaining2);
        if available == 0 {
            return 0;
        }

        let preferred = self
            .multiple_bonds
            .get(&pair_key(e1, e2))
            .copied()
            .unwrap_or(1);

        preferred.min(available).min(3)
    }

    /// Ideal bond angle in radians at a center atom.
    ///
    /// Three neighbors with a multiple bond are sp2 regardless of element.
    /// Otherwise the element's own rule for that neighbor count applies
    /// (lone-pair compression for O, S, N, P), falling back to tetrahedral.
    pub fn ideal_bond_angle(&self, center: &str, neighbor_count: usize, has_multiple_bond: bool) -> f32 {
        if neighbor_count == 3 && has_multiple_bond {
            return PLANAR_BOND_ANGLE_DEGREES.to_radians();
        }
        self.profile(center)
            .angle_rule(neighbor_count)
            .unwrap_or(DEFAULT_BOND_ANGLE_DEGREES.to_radians())
    }

    /// Number of element entries.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ValenceTable {
    fn default() -> Self {
        Self::load().unwrap_or_else(|err| {
            log::error!("valence table failed to parse, using fallback profile only: {err}");
            Self::fallback_only()
        })
    }
}
