use crate::types::{
    DeviceEvent, DeviceRole, DeviceSlot, Eye, EyeFrame, LoadPoll, RenderModel, TextureMap,
    TrackedPose,
};
use crate::SubmitError;
use glam::Mat4;

/// The surface a VR runtime backend exposes to the rest of the system.
///
/// One implementation per backend; `sim::SimRuntime` is the in-tree
/// provider, native bindings slot in behind the same trait. All calls are
/// non-blocking except `wait_poses`, which paces the frame loop the way the
/// compositor wants.
pub trait VrRuntime {
    /// Number of device slots, fixed for the session's lifetime.
    fn slot_count(&self) -> u32;

    fn device_role(&self, slot: DeviceSlot) -> DeviceRole;

    /// Render-model identifier for the device, if it advertises one.
    fn render_model_name(&self, slot: DeviceSlot) -> Option<String>;

    /// Recommended per-eye render target resolution.
    fn recommended_target_size(&self) -> (u32, u32);

    /// Per-eye projection matrix for the given clip planes.
    fn projection(&self, eye: Eye, near: f32, far: f32) -> Mat4;

    /// Fixed offset between the eye's optical center and the head origin.
    fn eye_to_head(&self, eye: Eye) -> Mat4;

    /// Compositor bring-up hook, called once when the session opens.
    fn begin_session(&mut self);

    /// Non-blocking event poll; `None` once the queue is drained.
    fn poll_event(&mut self) -> Option<DeviceEvent>;

    /// Fills current and next-predicted poses for every slot in one call.
    /// Slices are sized to `slot_count()`.
    fn wait_poses(&mut self, current: &mut [TrackedPose], predicted: &mut [TrackedPose]);

    /// Hands one eye's rendered image to the compositor.
    fn submit(&mut self, eye: Eye, frame: &EyeFrame) -> Result<(), SubmitError>;

    /// Asynchronous mesh fetch; poll until no longer `Pending`.
    fn load_model(&mut self, name: &str) -> LoadPoll<RenderModel>;

    /// Asynchronous diffuse texture fetch for a loaded model.
    fn load_texture(&mut self, texture_id: i32) -> LoadPoll<TextureMap>;

    /// Releases the runtime connection. Must be safe to call exactly once.
    fn shutdown(&mut self);
}
