pub mod api;
pub mod chemistry;
pub mod core;
pub mod input;
pub mod io;
pub mod renderer;
pub mod systems;

pub use glam;

// Re-export key types at crate root for convenience
pub use api::config::SimConfig;
pub use api::simulation::Simulation;
pub use api::types::{AtomId, AtomSpec, AtomState, BondEvent, BondState, ManualBond, SceneSpec, Snapshot};
pub use chemistry::geometry::Geometry;
pub use chemistry::valence::{ValenceProfile, ValenceTable};
pub use core::atoms::{Atom, AtomSet, MotionMode};
pub use core::time::{Cadence, TickClock};
pub use core::topology::{Bond, BondOrigin, BondTopology, TopologyViolation};
pub use input::queue::{InputEvent, InputQueue};
pub use io::xyz::{parse_xyz, XyzError};
pub use renderer::instance::{AtomInstance, BondInstance, RenderBuffer};
pub use systems::bonding::{BondWindow, BondingEngine, PairZone};
pub use systems::solver::ForceSolver;
