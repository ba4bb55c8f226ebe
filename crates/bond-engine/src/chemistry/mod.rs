pub mod geometry;
pub mod valence;

pub use geometry::{bond_angle_degrees, Geometry};
pub use valence::{canonical_symbol, ValenceProfile, ValenceTable};
