pub mod angles;
pub mod bonding;
pub mod integrate;
pub mod render;
pub mod solver;
pub mod springs;
