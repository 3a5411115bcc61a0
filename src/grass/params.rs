//! GPU-ready per-blade bend vector (16 bytes).
//!
//! Uploaded once per chunk per tick as the per-instance override read by the
//! grass shader (`_CollisionBending`).

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};

/// Bend state of one blade. Layout matches a shader `vec4`:
/// `(lean_x, grow, lean_z, reserved)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Bend {
    pub lean_x: f32,
    /// 0 = just cut, 1 = fully grown.
    pub grow: f32,
    pub lean_z: f32,
    pub reserved: f32,
}

impl Bend {
    /// Fully grown, no lean.
    pub const UPRIGHT: Self = Self { lean_x: 0.0, grow: 1.0, lean_z: 0.0, reserved: 0.0 };

    pub fn lean(&self) -> Vec2 {
        Vec2::new(self.lean_x, self.lean_z)
    }

    pub fn set_lean(&mut self, lean: Vec2) {
        self.lean_x = lean.x;
        self.lean_z = lean.y;
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.lean_x, self.grow, self.lean_z, self.reserved)
    }
}
