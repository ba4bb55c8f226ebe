use bond_engine::{
    parse_xyz, AtomId, AtomInstance, AtomSpec, BondInstance, InputEvent, InputQueue, SceneSpec,
    SimConfig, Simulation, XyzError,
};

/// Owns the simulation and the host command queue.
///
/// The bridge keeps one runner in a `thread_local!` and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export the
/// engine types directly.
pub struct SimRunner {
    sim: Simulation,
    input: InputQueue,
}

impl SimRunner {
    pub fn new(config: SimConfig) -> Self {
        Self {
            sim: Simulation::new(config),
            input: InputQueue::new(),
        }
    }

    /// Build a runner from host JSON. Bad JSON falls back to the defaults.
    pub fn from_config_json(json: &str) -> Self {
        let config = if json.trim().is_empty() {
            SimConfig::default()
        } else {
            SimConfig::from_json(json).unwrap_or_else(|err| {
                log::warn!("invalid simulation config, using defaults: {err}");
                SimConfig::default()
            })
        };
        Self::new(config)
    }

    /// Replace the scene with the atoms of an XYZ document.
    pub fn load_xyz(&mut self, text: &str) -> Result<usize, XyzError> {
        let atoms = parse_xyz(text)?;
        self.input.drain();
        let bonds = self.sim.build_topology(&atoms, &[]);
        log::info!("loaded {} atoms from xyz, {} bonds", atoms.len(), bonds.len());
        Ok(atoms.len())
    }

    /// Replace the scene from a JSON scene description.
    pub fn load_scene_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let scene = SceneSpec::from_json(json)?;
        self.input.drain();
        self.sim.build_topology(&scene.atoms, &scene.bonds);
        Ok(scene.atoms.len())
    }

    /// Add an atom right away so the host gets its id back.
    pub fn add_atom(&mut self, element: &str, position: [f32; 3]) -> AtomId {
        self.sim.add_atom(&AtomSpec::new(element, position))
    }

    /// Queue a host command for the next tick.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Apply queued commands, then advance the simulation one frame.
    pub fn tick(&mut self, dt: f32) {
        self.sim.apply_input(&mut self.input);
        self.sim.tick(dt);
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn is_settled(&self, threshold: f32) -> bool {
        self.sim.is_settled(threshold)
    }

    // ---- Pointer accessors for zero-copy reads ----

    pub fn atom_instances_ptr(&self) -> *const f32 {
        self.sim.render_buffer().atoms_ptr()
    }

    pub fn atom_instance_count(&self) -> u32 {
        self.sim.render_buffer().atom_count() as u32
    }

    pub fn atom_instance_floats(&self) -> u32 {
        AtomInstance::FLOATS as u32
    }

    pub fn bond_instances_ptr(&self) -> *const f32 {
        self.sim.render_buffer().bonds_ptr()
    }

    pub fn bond_instance_count(&self) -> u32 {
        self.sim.render_buffer().bond_count() as u32
    }

    pub fn bond_instance_floats(&self) -> u32 {
        BondInstance::FLOATS as u32
    }

    // ---- JSON views ----

    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.sim.snapshot()).unwrap_or_else(|err| {
            log::error!("snapshot serialization failed: {err}");
            String::from("{}")
        })
    }

    pub fn events_json(&self) -> String {
        serde_json::to_string(self.sim.events()).unwrap_or_else(|err| {
            log::error!("event serialization failed: {err}");
            String::from("[]")
        })
    }
}

impl Default for SimRunner {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bond_engine::glam::Vec3;

    const WATER: &str = "3\nwater\nO 0.0 0.0 0.0\nH 0.97 0.0 0.0\nH -0.243 0.939 0.0\n";

    #[test]
    fn bad_config_falls_back_to_defaults() {
        let runner = SimRunner::from_config_json("{ not json");
        assert_eq!(runner.simulation().config(), &SimConfig::default());

        let runner = SimRunner::from_config_json(r#"{ "bond_scan_interval": 12 }"#);
        assert_eq!(runner.simulation().config().bond_scan_interval, 12);
    }

    #[test]
    fn loads_xyz_and_exposes_buffers() {
        let mut runner = SimRunner::default();
        assert_eq!(runner.load_xyz(WATER), Ok(3));
        runner.tick(1.0 / 60.0);

        assert_eq!(runner.atom_instance_count(), 3);
        assert_eq!(runner.bond_instance_count(), 2);
        assert_eq!(runner.atom_instance_floats(), 8);
        assert_eq!(runner.bond_instance_floats(), 16);
        assert!(!runner.atom_instances_ptr().is_null());
    }

    #[test]
    fn bad_xyz_keeps_scene() {
        let mut runner = SimRunner::default();
        runner.load_xyz(WATER).unwrap();
        assert!(runner.load_xyz("2\nc\nC 0 0\n").is_err());
        assert_eq!(runner.simulation().atoms().len(), 3);

        let hostile = format!("{}\nc\nH 0 0 0\n", usize::MAX);
        assert!(matches!(runner.load_xyz(&hostile), Err(XyzError::CountMismatch { .. })));
        assert_eq!(runner.simulation().atoms().len(), 3);
    }

    #[test]
    fn loads_scene_with_manual_bonds() {
        let mut runner = SimRunner::default();
        let json = r#"{
            "atoms": [
                { "element": "C", "position": [0.0, 0.0, 0.0] },
                { "element": "C", "position": [1.52, 0.0, 0.0] }
            ],
            "bonds": [ { "a": 0, "b": 1 } ]
        }"#;
        assert_eq!(runner.load_scene_json(json).unwrap(), 2);
        let bond = runner.simulation().topology().bonds()[0];
        assert_eq!(bond.order, 1);
        assert!(runner.load_scene_json("[]").is_err());
    }

    #[test]
    fn queued_commands_apply_on_tick() {
        let mut runner = SimRunner::default();
        let o = runner.add_atom("O", [0.0, 0.0, 0.0]);
        let h = runner.add_atom("H", [3.0, 0.0, 0.0]);

        runner.push_input(InputEvent::AddBond { a: o, b: h });
        runner.push_input(InputEvent::BeginDrag { atom: h, position: Vec3::new(2.0, 0.0, 0.0) });
        assert!(runner.simulation().bond_between(o, h).is_none());

        runner.tick(1.0 / 60.0);
        assert!(runner.simulation().bond_between(o, h).is_some());
        assert!(runner.simulation().atom(h).unwrap().is_kinematic());
        assert!(runner.events_json().contains("formed"));
    }

    #[test]
    fn snapshot_json_lists_atoms() {
        let mut runner = SimRunner::default();
        runner.load_xyz(WATER).unwrap();
        let json = runner.snapshot_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["atoms"].as_array().map(|a| a.len()), Some(3));
        assert_eq!(value["bonds"].as_array().map(|b| b.len()), Some(2));
    }
}
