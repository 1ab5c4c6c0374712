use glam::Mat4;

/// Runtime-assigned index identifying one tracked physical device for the
/// session's lifetime. Stable while the session is open.
pub type DeviceSlot = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    Headset,
    Controller,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];
}

/// One device's rigid transform in tracking space for a single frame.
/// `transform` is only meaningful when `valid` is set; devices can be
/// temporarily untracked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPose {
    pub transform: Mat4,
    pub valid: bool,
}

impl Default for TrackedPose {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY,
            valid: false,
        }
    }
}

/// Connection notification drained from the runtime's event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    Activated(DeviceSlot),
    Deactivated(DeviceSlot),
    /// Anything else the runtime emits; logged, never fatal.
    Other(u32),
}

/// One step of an asynchronous loader: poll until no longer `Pending`.
#[derive(Debug, Clone)]
pub enum LoadPoll<T> {
    Pending,
    Ready(T),
    Failed,
}

/// Interleaved vertex layout used by runtime render models.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Mesh geometry for one tracked device, as served by the runtime.
#[derive(Debug, Clone)]
pub struct RenderModel {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u16>,
    /// Identifier of the diffuse texture to fetch once the mesh is in.
    pub diffuse_texture_id: i32,
}

/// RGBA8 diffuse texture for a render model.
#[derive(Debug, Clone)]
pub struct TextureMap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Descriptor handed to the compositor with each per-eye submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeFrame {
    pub width: u32,
    pub height: u32,
    pub frame_index: u64,
}
