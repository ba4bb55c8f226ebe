pub mod instance;

pub use instance::{AtomInstance, BondInstance, RenderBuffer};
