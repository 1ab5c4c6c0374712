pub mod model;
pub mod scene;
pub mod waveform;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Per-drawable uniforms for lit meshes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MeshUniform {
    /// Transform from model space to clip space.
    pub model_view_proj: Mat4, // 64 B
    /// Model-to-world, for world-space lighting.
    pub model: Mat4, // +64 -> 128
}

// Compile-time safety check: buffer size must match WGSL-reflected size.
const _: [(); 128] = [(); core::mem::size_of::<MeshUniform>()];

/// Per-strip uniforms for the waveform lines.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineUniform {
    pub model_view_proj: Mat4, // 64 B
}

const _: [(); 64] = [(); core::mem::size_of::<LineUniform>()];
