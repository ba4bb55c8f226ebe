use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

/// Per-atom render data, read by the host's sphere pipeline.
/// 8 floats = 32 bytes per instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct AtomInstance {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub radius: f32,
    /// `AtomId` as a float, for picking.
    pub id: f32,
    /// 1.0 while the atom is being dragged.
    pub kinematic: f32,
    pub _pad0: f32,
    pub _pad1: f32,
}

impl AtomInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Per-bond render data, read by the host's cylinder pipeline.
/// 16 floats = 64 bytes per instance.
///
/// The rotation takes +Y onto the a→b axis, so a unit cylinder along Y
/// scaled by `length` and placed at the midpoint spans the bond.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct BondInstance {
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
    pub bx: f32,
    pub by: f32,
    pub bz: f32,
    pub mid_x: f32,
    pub mid_y: f32,
    pub mid_z: f32,
    pub length: f32,
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,
    pub rot_w: f32,
    pub order: f32,
    /// current / ideal length.
    pub strain: f32,
}

impl BondInstance {
    pub const FLOATS: usize = 16;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;

    pub fn between(a: Vec3, b: Vec3, order: u8, ideal_length: f32) -> Self {
        let axis = b - a;
        let length = axis.length();
        let mid = (a + b) * 0.5;
        // Degenerate bonds keep the identity orientation
        let rotation = axis
            .try_normalize()
            .map(|dir| Quat::from_rotation_arc(Vec3::Y, dir))
            .unwrap_or(Quat::IDENTITY);
        let strain = if ideal_length > f32::EPSILON {
            length / ideal_length
        } else {
            1.0
        };

        Self {
            ax: a.x,
            ay: a.y,
            az: a.z,
            bx: b.x,
            by: b.y,
            bz: b.z,
            mid_x: mid.x,
            mid_y: mid.y,
            mid_z: mid.z,
            length,
            rot_x: rotation.x,
            rot_y: rotation.y,
            rot_z: rotation.z,
            rot_w: rotation.w,
            order: f32::from(order),
            strain,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_xyzw(self.rot_x, self.rot_y, self.rot_z, self.rot_w)
    }
}

/// Atom and bond instance buffers, rebuilt every tick.
pub struct RenderBuffer {
    atoms: Vec<AtomInstance>,
    bonds: Vec<BondInstance>,
}

impl RenderBuffer {
    pub fn new() -> Self {
        Self::with_capacity(128, 256)
    }

    pub fn with_capacity(atoms: usize, bonds: usize) -> Self {
        Self {
            atoms: Vec::with_capacity(atoms),
            bonds: Vec::with_capacity(bonds),
        }
    }

    pub fn clear(&mut self) {
        self.atoms.clear();
        self.bonds.clear();
    }

    pub fn push_atom(&mut self, instance: AtomInstance) {
        self.atoms.push(instance);
    }

    pub fn push_bond(&mut self, instance: BondInstance) {
        self.bonds.push(instance);
    }

    pub fn atoms(&self) -> &[AtomInstance] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[BondInstance] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn atoms_ptr(&self) -> *const f32 {
        self.atoms.as_ptr() as *const f32
    }

    pub fn bonds_ptr(&self) -> *const f32 {
        self.bonds.as_ptr() as *const f32
    }

    /// Atom instances as a flat float slice.
    pub fn atom_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.atoms)
    }

    /// Bond instances as a flat float slice.
    pub fn bond_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.bonds)
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}
