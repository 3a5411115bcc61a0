//! Batched instanced submission of the blade field.
//!
//! One draw call per chunk per tick. Each call carries the chunk's transform
//! array and a shared per-instance attribute block holding the chunk's bend
//! vectors, refilled before every call.

use glam::{Mat4, Vec4};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::grass::effects::TintColors;
use crate::grass::field::BladeField;
use crate::grass::params::Bend;

/// Per-instance attribute name the grass shader reads bend vectors from.
pub const BENDING_ATTRIBUTE: &str = "_CollisionBending";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ShadowMode {
    Off,
    #[default]
    On,
    TwoSided,
    ShadowsOnly,
}

/// Material the blades are drawn with, plus the two tints cut effects
/// interpolate between.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GrassMaterial {
    pub handle: MaterialHandle,
    pub tints: TintColors,
}

/// Named per-instance vec4 override attached to a draw call.
#[derive(Clone, Debug)]
pub struct InstanceAttributeBlock {
    name: &'static str,
    values: Vec<Vec4>,
}

impl InstanceAttributeBlock {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        Self { name, values: Vec::with_capacity(capacity) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn values(&self) -> &[Vec4] {
        &self.values
    }

    /// Replace contents with one vec4 per bend.
    pub fn fill(&mut self, bends: &[Bend]) {
        self.values.clear();
        self.values.extend(bends.iter().map(|b| b.to_vec4()));
    }
}

/// One instanced draw submission.
#[derive(Debug)]
pub struct DrawCall<'a> {
    pub mesh: MeshHandle,
    pub submesh_index: u32,
    pub material: &'a GrassMaterial,
    pub transforms: &'a [Mat4],
    pub instance_count: usize,
    pub attributes: &'a InstanceAttributeBlock,
    pub shadow_mode: ShadowMode,
    pub receive_shadows: bool,
}

/// Host rendering API that accepts instanced draws.
pub trait InstancedDrawBackend {
    fn draw_instanced(&mut self, call: &DrawCall<'_>);
}

/// Packs chunks into draw calls.
pub struct BatchRenderer {
    mesh: MeshHandle,
    material: GrassMaterial,
    shadow_mode: ShadowMode,
    /// Hard instancing ceiling of the backend.
    max_instances: usize,
    attributes: InstanceAttributeBlock,
}

impl BatchRenderer {
    pub fn new(mesh: MeshHandle, material: GrassMaterial, max_instances: usize) -> Self {
        Self {
            mesh,
            material,
            shadow_mode: ShadowMode::default(),
            max_instances,
            attributes: InstanceAttributeBlock::new(BENDING_ATTRIBUTE, max_instances),
        }
    }

    pub fn with_shadow_mode(mut self, shadow_mode: ShadowMode) -> Self {
        self.shadow_mode = shadow_mode;
        self
    }

    pub fn material(&self) -> &GrassMaterial {
        &self.material
    }

    pub fn set_material(&mut self, material: GrassMaterial) {
        self.material = material;
    }

    pub fn shadow_mode(&self) -> ShadowMode {
        self.shadow_mode
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    /// Submit one draw per non-empty chunk and return the number of calls.
    ///
    /// Fails before drawing anything if any chunk holds more instances than
    /// the ceiling.
    pub fn submit(&mut self, field: &BladeField, backend: &mut dyn InstancedDrawBackend) -> Result<usize> {
        if let Some(chunk) = field.chunks().iter().find(|c| c.len() > self.max_instances) {
            return Err(Error::InstancingLimitExceeded {
                requested: chunk.len(),
                capacity: self.max_instances,
            });
        }

        let mut calls = 0;
        for chunk in field.chunks().iter().filter(|c| !c.is_empty()) {
            self.attributes.fill(chunk.bends());
            backend.draw_instanced(&DrawCall {
                mesh: self.mesh,
                submesh_index: 0,
                material: &self.material,
                transforms: chunk.transforms(),
                instance_count: chunk.len(),
                attributes: &self.attributes,
                shadow_mode: self.shadow_mode,
                receive_shadows: false,
            });
            calls += 1;
        }
        Ok(calls)
    }
}

/// Owned copy of a [`DrawCall`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub mesh: MeshHandle,
    pub submesh_index: u32,
    pub material: MaterialHandle,
    pub transforms: Vec<Mat4>,
    pub instance_count: usize,
    pub attribute_name: &'static str,
    pub attribute_values: Vec<Vec4>,
    pub shadow_mode: ShadowMode,
    pub receive_shadows: bool,
}

/// Backend that keeps every submission, for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub draws: Vec<RecordedDraw>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.draws.clear();
    }

    /// Total instances across recorded draws.
    pub fn instance_total(&self) -> usize {
        self.draws.iter().map(|d| d.instance_count).sum()
    }
}

impl InstancedDrawBackend for RecordingBackend {
    fn draw_instanced(&mut self, call: &DrawCall<'_>) {
        self.draws.push(RecordedDraw {
            mesh: call.mesh,
            submesh_index: call.submesh_index,
            material: call.material.handle,
            transforms: call.transforms.to_vec(),
            instance_count: call.instance_count,
            attribute_name: call.attributes.name(),
            attribute_values: call.attributes.values().to_vec(),
            shadow_mode: call.shadow_mode,
            receive_shadows: call.receive_shadows,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grass::config::{ChunkAllocation, ChunkLayout, CutConfig, PopulationConfig};
    use crate::scan::ScanResult;
    use glam::{Vec2, Vec3};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn field(n: usize, layout: ChunkLayout) -> BladeField {
        let mut field = BladeField::new(layout);
        let points = (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let mut rng = SmallRng::seed_from_u64(3);
        field
            .populate(&ScanResult::from_points(points), &PopulationConfig::default(), &CutConfig::default(), &mut rng)
            .unwrap();
        field
    }

    fn renderer(max: usize) -> BatchRenderer {
        BatchRenderer::new(MeshHandle(1), GrassMaterial { handle: MaterialHandle(2), ..Default::default() }, max)
    }

    #[test]
    fn test_one_call_per_chunk() {
        let f = field(25, ChunkLayout { capacity: 10, ..Default::default() });
        let mut backend = RecordingBackend::new();
        let calls = renderer(10).submit(&f, &mut backend).unwrap();

        assert_eq!(calls, 3);
        let counts: Vec<_> = backend.draws.iter().map(|d| d.instance_count).collect();
        assert_eq!(counts, vec![10, 10, 5]);
        assert_eq!(backend.instance_total(), 25);

        let draw = &backend.draws[2];
        assert_eq!(draw.mesh, MeshHandle(1));
        assert_eq!(draw.material, MaterialHandle(2));
        assert_eq!(draw.submesh_index, 0);
        assert!(!draw.receive_shadows);
        assert_eq!(draw.shadow_mode, ShadowMode::On);
        assert_eq!(draw.attribute_name, BENDING_ATTRIBUTE);
        assert_eq!(draw.transforms.len(), 5);
    }

    #[test]
    fn test_trailing_empty_chunk_skipped() {
        // 20 blades with ExtraTrailing allocation leave an empty third chunk
        let f = field(20, ChunkLayout { capacity: 10, allocation: ChunkAllocation::ExtraTrailing });
        assert_eq!(f.chunk_count(), 3);
        let mut backend = RecordingBackend::new();
        assert_eq!(renderer(10).submit(&f, &mut backend).unwrap(), 2);
    }

    #[test]
    fn test_attributes_mirror_bends() {
        let mut f = field(3, ChunkLayout { capacity: 10, ..Default::default() });
        let id = f.id_at(1).unwrap();
        f.chunks_mut()[0].bend_mut(1).set_lean(Vec2::new(0.2, -0.3));
        f.update_grow(id, |_| 0.5);

        let mut backend = RecordingBackend::new();
        renderer(10).submit(&f, &mut backend).unwrap();
        let values = &backend.draws[0].attribute_values;
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], Vec4::new(0.0, 1.0, 0.0, 0.0));
        assert_eq!(values[1], Vec4::new(0.2, 0.5, -0.3, 0.0));
    }

    #[test]
    fn test_ceiling_enforced() {
        let f = field(7, ChunkLayout { capacity: 10, ..Default::default() });
        let mut backend = RecordingBackend::new();
        let err = renderer(5).submit(&f, &mut backend).unwrap_err();
        assert!(matches!(err, Error::InstancingLimitExceeded { requested: 7, capacity: 5 }));
        assert!(backend.draws.is_empty());
    }

    #[test]
    fn test_empty_field_submits_nothing() {
        let f = BladeField::new(ChunkLayout::default());
        let mut backend = RecordingBackend::new();
        assert_eq!(renderer(1000).submit(&f, &mut backend).unwrap(), 0);
    }

    #[test]
    fn test_shadow_mode_forwarded() {
        let f = field(1, ChunkLayout::default());
        let mut backend = RecordingBackend::new();
        renderer(1000).with_shadow_mode(ShadowMode::Off).submit(&f, &mut backend).unwrap();
        assert_eq!(backend.draws[0].shadow_mode, ShadowMode::Off);
    }
}
