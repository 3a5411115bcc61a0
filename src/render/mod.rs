//! Instanced rendering of the blade field

pub mod batch;
pub mod gpu;

pub use batch::{
    BatchRenderer, DrawCall, GrassMaterial, InstanceAttributeBlock, InstancedDrawBackend, MaterialHandle,
    MeshHandle, RecordingBackend, ShadowMode,
};
pub use gpu::{GpuBatchBackend, GpuInstanceBuffers};
