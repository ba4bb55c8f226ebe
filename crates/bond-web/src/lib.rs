pub mod runner;

pub use runner::SimRunner;

use std::cell::RefCell;

use bond_engine::glam::Vec3;
use bond_engine::{AtomId, InputEvent};
use wasm_bindgen::prelude::*;

thread_local! {
    static RUNNER: RefCell<Option<SimRunner>> = RefCell::new(None);
}

/// Run `f` against the runner, or return `fallback` if `sim_init` has not
/// been called yet. Bad host call order is logged, never a panic.
fn with_runner<R>(fallback: R, f: impl FnOnce(&mut SimRunner) -> R) -> R {
    RUNNER.with(|cell| match cell.borrow_mut().as_mut() {
        Some(runner) => f(runner),
        None => {
            log::warn!("simulation not initialized, call sim_init() first");
            fallback
        }
    })
}

#[wasm_bindgen]
pub fn sim_init(config_json: &str) {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let runner = SimRunner::from_config_json(config_json);
    RUNNER.with(|cell| {
        *cell.borrow_mut() = Some(runner);
    });
    log::info!("bond-web: initialized");
}

/// Replace the scene from XYZ text. Returns false and logs on parse errors.
#[wasm_bindgen]
pub fn sim_load_xyz(text: &str) -> bool {
    with_runner(false, |r| match r.load_xyz(text) {
        Ok(_) => true,
        Err(err) => {
            log::error!("xyz load failed: {err}");
            false
        }
    })
}

/// Replace the scene from `{ "atoms": [...], "bonds": [...] }` JSON.
#[wasm_bindgen]
pub fn sim_load_scene(json: &str) -> bool {
    with_runner(false, |r| match r.load_scene_json(json) {
        Ok(_) => true,
        Err(err) => {
            log::error!("scene load failed: {err}");
            false
        }
    })
}

/// Add an atom immediately. Returns its id, or 0 before init.
#[wasm_bindgen]
pub fn sim_add_atom(element: &str, x: f32, y: f32, z: f32) -> u32 {
    with_runner(0, |r| r.add_atom(element, [x, y, z]).0)
}

#[wasm_bindgen]
pub fn sim_remove_atom(id: u32) {
    with_runner((), |r| r.push_input(InputEvent::RemoveAtom { atom: AtomId(id) }));
}

#[wasm_bindgen]
pub fn sim_tick(dt: f32) {
    with_runner((), |r| r.tick(dt));
}

#[wasm_bindgen]
pub fn sim_begin_drag(id: u32, x: f32, y: f32, z: f32) {
    with_runner((), |r| {
        r.push_input(InputEvent::BeginDrag {
            atom: AtomId(id),
            position: Vec3::new(x, y, z),
        })
    });
}

#[wasm_bindgen]
pub fn sim_update_drag(id: u32, x: f32, y: f32, z: f32) {
    with_runner((), |r| {
        r.push_input(InputEvent::UpdateDrag {
            atom: AtomId(id),
            position: Vec3::new(x, y, z),
        })
    });
}

#[wasm_bindgen]
pub fn sim_end_drag(id: u32) {
    with_runner((), |r| r.push_input(InputEvent::EndDrag { atom: AtomId(id) }));
}

#[wasm_bindgen]
pub fn sim_add_bond(a: u32, b: u32) {
    with_runner((), |r| {
        r.push_input(InputEvent::AddBond {
            a: AtomId(a),
            b: AtomId(b),
        })
    });
}

#[wasm_bindgen]
pub fn sim_remove_bond(a: u32, b: u32) {
    with_runner((), |r| {
        r.push_input(InputEvent::RemoveBond {
            a: AtomId(a),
            b: AtomId(b),
        })
    });
}

#[wasm_bindgen]
pub fn sim_is_settled(threshold: f32) -> bool {
    with_runner(false, |r| r.is_settled(threshold))
}

// ---- Data accessors ----

#[wasm_bindgen]
pub fn get_atom_instances_ptr() -> *const f32 {
    with_runner(std::ptr::null(), |r| r.atom_instances_ptr())
}

#[wasm_bindgen]
pub fn get_atom_instance_count() -> u32 {
    with_runner(0, |r| r.atom_instance_count())
}

#[wasm_bindgen]
pub fn get_atom_instance_floats() -> u32 {
    with_runner(0, |r| r.atom_instance_floats())
}

#[wasm_bindgen]
pub fn get_bond_instances_ptr() -> *const f32 {
    with_runner(std::ptr::null(), |r| r.bond_instances_ptr())
}

#[wasm_bindgen]
pub fn get_bond_instance_count() -> u32 {
    with_runner(0, |r| r.bond_instance_count())
}

#[wasm_bindgen]
pub fn get_bond_instance_floats() -> u32 {
    with_runner(0, |r| r.bond_instance_floats())
}

#[wasm_bindgen]
pub fn sim_snapshot_json() -> String {
    with_runner(String::from("{}"), |r| r.snapshot_json())
}

/// Bond formations and breaks from the last tick, as a JSON array.
#[wasm_bindgen]
pub fn sim_events_json() -> String {
    with_runner(String::from("[]"), |r| r.events_json())
}
