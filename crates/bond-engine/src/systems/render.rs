use crate::core::atoms::Atom;
use crate::core::topology::Bond;
use crate::renderer::instance::{AtomInstance, BondInstance, RenderBuffer};

/// Rebuild the instance buffers from current atom positions and bonds.
/// Runs every tick, so bond visuals track atoms even between force ticks.
pub fn build_render_buffer(atoms: &[Atom], bonds: &[Bond], buffer: &mut RenderBuffer) {
    buffer.clear();

    for atom in atoms {
        buffer.push_atom(AtomInstance {
            x: atom.position.x,
            y: atom.position.y,
            z: atom.position.z,
            radius: atom.radius,
            id: atom.id.0 as f32,
            kinematic: if atom.is_kinematic() { 1.0 } else { 0.0 },
            _pad0: 0.0,
            _pad1: 0.0,
        });
    }

    for bond in bonds {
        let (Some(a), Some(b)) = (atoms.get(bond.a), atoms.get(bond.b)) else {
            continue;
        };
        buffer.push_bond(BondInstance::between(a.position, b.position, bond.order, bond.ideal_length));
    }
}
