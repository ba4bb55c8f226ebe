//! VSEPR geometry classification for bond centers.
//!
//! The classifier only looks at neighbor count, bond multiplicity and the
//! center element. Lone pairs are implied by the element (O/S carry two,
//! N/P carry one) rather than counted explicitly.

use glam::Vec3;

/// Arrangement of bonds around a center atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Geometry {
    /// 2 neighbors, 180° (e.g., CO₂, HCN)
    Linear,
    /// 3 neighbors in a plane, 120° (e.g., BF₃, H₂CO)
    TrigonalPlanar,
    /// 4 neighbors, 109.5° (e.g., CH₄)
    Tetrahedral,
    /// 2 neighbors plus two lone pairs (e.g., H₂O, H₂S)
    BentSp3,
    /// 3 neighbors plus one lone pair (e.g., NH₃, PH₃)
    Pyramidal,
}

impl Geometry {
    /// Classify a center. Centers with fewer than two neighbors have no angle
    /// to maintain and return `None`.
    pub fn classify(neighbor_count: usize, has_multiple_bond: bool, center: &str) -> Option<Self> {
        let is = |symbol: &str| center.trim().eq_ignore_ascii_case(symbol);

        match neighbor_count {
            0 | 1 => None,
            2 if is("O") || is("S") => Some(Self::BentSp3),
            2 => Some(Self::Linear),
            3 if has_multiple_bond || is("B") => Some(Self::TrigonalPlanar),
            3 if is("N") || is("P") => Some(Self::Pyramidal),
            3 => Some(Self::TrigonalPlanar),
            _ => Some(Self::Tetrahedral),
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "Linear",
            Self::TrigonalPlanar => "Trigonal Planar",
            Self::Tetrahedral => "Tetrahedral",
            Self::BentSp3 => "Bent",
            Self::Pyramidal => "Trigonal Pyramidal",
        }
    }

    /// Whether the geometry constrains its neighbors into a plane.
    pub fn is_planar(&self) -> bool {
        matches!(self, Self::Linear | Self::TrigonalPlanar)
    }
}

/// Angle in degrees between two bond directions from a shared center.
/// Returns `None` if either direction is degenerate.
pub fn bond_angle_degrees(dir_a: Vec3, dir_b: Vec3) -> Option<f32> {
    let a = dir_a.try_normalize()?;
    let b = dir_b.try_normalize()?;
    Some(a.dot(b).clamp(-1.0, 1.0).acos().to_degrees())
}
