//! wgpu backend for batched blade draws.
//!
//! Each chunk gets a pair of instance vertex buffers (transforms and bend
//! vectors) sized to the instancing ceiling. Submissions upload into the
//! next free pair with `queue.write_buffer`; [`GpuInstanceBuffers::encode`]
//! replays them into a render pass as one instanced indexed draw each.
//!
//! The host binds the pipeline and the blade mesh (vertex slot 0, index
//! buffer) before calling `encode`.

use super::batch::{DrawCall, InstancedDrawBackend};

/// Vertex slot of the per-instance transform buffer.
pub const TRANSFORM_SLOT: u32 = 1;
/// Vertex slot of the per-instance bend buffer.
pub const BENDING_SLOT: u32 = 2;

const TRANSFORM_STRIDE: wgpu::BufferAddress = std::mem::size_of::<glam::Mat4>() as wgpu::BufferAddress;
const BENDING_STRIDE: wgpu::BufferAddress = std::mem::size_of::<glam::Vec4>() as wgpu::BufferAddress;

/// Columns of the model matrix at shader locations 2..=5.
const TRANSFORM_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
];

/// Bend vector (lean_x, grow, lean_z, reserved) at shader location 6.
const BENDING_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![6 => Float32x4];

/// Instance layout for the transform buffer.
pub fn transform_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: TRANSFORM_STRIDE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &TRANSFORM_ATTRIBUTES,
    }
}

/// Instance layout for the bend buffer.
pub fn bending_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: BENDING_STRIDE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &BENDING_ATTRIBUTES,
    }
}

struct ChunkBuffers {
    transforms: wgpu::Buffer,
    bending: wgpu::Buffer,
    instance_count: u32,
}

/// Per-chunk instance buffers, reused across frames.
pub struct GpuInstanceBuffers {
    chunks: Vec<ChunkBuffers>,
    /// Instances per buffer pair
    capacity: usize,
    /// Pairs filled this frame
    used: usize,
}

impl GpuInstanceBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            chunks: Vec::new(),
            capacity,
            used: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Draws recorded since the last [`begin_frame`](Self::begin_frame).
    pub fn draw_count(&self) -> usize {
        self.used
    }

    /// Allocated buffer pairs.
    pub fn allocated(&self) -> usize {
        self.chunks.len()
    }

    pub fn begin_frame(&mut self) {
        self.used = 0;
    }

    /// Borrow as a backend for one `BatchRenderer::submit`. Starts a new
    /// frame, so buffer pairs from the previous submit are overwritten.
    pub fn backend<'a>(&'a mut self, device: &'a wgpu::Device, queue: &'a wgpu::Queue) -> GpuBatchBackend<'a> {
        self.begin_frame();
        GpuBatchBackend { device, queue, buffers: self }
    }

    /// Take the next buffer pair for a draw of `requested` instances.
    /// Returns the pair index and how many instances it will hold.
    fn claim(&mut self, requested: usize) -> (usize, usize) {
        let count = requested.min(self.capacity);
        if count < requested {
            log::warn!(
                "Draw of {} instances exceeds GPU buffer capacity {}, truncating",
                requested, self.capacity
            );
        }
        let slot = self.used;
        self.used += 1;
        (slot, count)
    }

    fn allocate(&mut self, device: &wgpu::Device) {
        let index = self.chunks.len();
        let transforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("grass_transforms_{}", index)),
            size: self.capacity as u64 * TRANSFORM_STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bending = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("grass_bending_{}", index)),
            size: self.capacity as u64 * BENDING_STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::debug!("Allocated grass instance buffers for chunk {} ({} instances)", index, self.capacity);
        self.chunks.push(ChunkBuffers { transforms, bending, instance_count: 0 });
    }

    /// Record this frame's draws into a render pass.
    pub fn encode(&self, pass: &mut wgpu::RenderPass<'_>, index_count: u32) {
        for chunk in &self.chunks[..self.used] {
            pass.set_vertex_buffer(TRANSFORM_SLOT, chunk.transforms.slice(..));
            pass.set_vertex_buffer(BENDING_SLOT, chunk.bending.slice(..));
            pass.draw_indexed(0..index_count, 0, 0..chunk.instance_count);
        }
    }
}

/// [`InstancedDrawBackend`] that uploads into [`GpuInstanceBuffers`].
pub struct GpuBatchBackend<'a> {
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    buffers: &'a mut GpuInstanceBuffers,
}

impl InstancedDrawBackend for GpuBatchBackend<'_> {
    fn draw_instanced(&mut self, call: &DrawCall<'_>) {
        let (slot, count) = self.buffers.claim(call.instance_count);
        while self.buffers.chunks.len() <= slot {
            self.buffers.allocate(self.device);
        }

        let chunk = &mut self.buffers.chunks[slot];
        self.queue.write_buffer(&chunk.transforms, 0, bytemuck::cast_slice(&call.transforms[..count]));
        self.queue.write_buffer(&chunk.bending, 0, bytemuck::cast_slice(&call.attributes.values()[..count]));
        chunk.instance_count = count as u32;
    }
}
