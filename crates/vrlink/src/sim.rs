//! Deterministic in-process VR runtime: one headset and two controllers
//! with gently animated poses, an async loader that reports `Pending` a
//! fixed number of polls before settling, a scriptable event queue, and a
//! recording compositor. Drives the viewer when no native runtime is
//! compiled in, and every test in this crate.

use crate::runtime::VrRuntime;
use crate::types::{
    DeviceEvent, DeviceRole, DeviceSlot, Eye, EyeFrame, LoadPoll, ModelVertex, RenderModel,
    TextureMap, TrackedPose,
};
use crate::SubmitError;
use glam::{Mat4, Vec3};
use std::collections::{HashMap, VecDeque};

const EYE_WIDTH: u32 = 1440;
const EYE_HEIGHT: u32 = 1600;
const HALF_IPD: f32 = 0.032;
const LOADER_DELAY: u32 = 3;

pub struct SimRuntime {
    roles: Vec<DeviceRole>,
    connected: Vec<bool>,
    events: VecDeque<DeviceEvent>,
    model_polls: HashMap<String, u32>,
    texture_polls: HashMap<i32, u32>,
    model_load_calls: u32,
    stalled: bool,
    fail_submit: bool,
    submitted: Vec<(Eye, EyeFrame)>,
    tick: u64,
}

impl SimRuntime {
    /// Headset at slot 0, controllers at slots 1 and 2.
    pub fn new() -> Self {
        Self::with_roles(vec![
            DeviceRole::Headset,
            DeviceRole::Controller,
            DeviceRole::Controller,
        ])
    }

    pub fn with_roles(roles: Vec<DeviceRole>) -> Self {
        let connected = vec![true; roles.len()];
        Self {
            roles,
            connected,
            events: VecDeque::new(),
            model_polls: HashMap::new(),
            texture_polls: HashMap::new(),
            model_load_calls: 0,
            stalled: false,
            fail_submit: false,
            submitted: Vec::new(),
            tick: 0,
        }
    }

    /// Queues a connection event for the next drain.
    pub fn push_event(&mut self, event: DeviceEvent) {
        self.events.push_back(event);
    }

    /// Marks a device tracked or untracked; untracked poses report invalid.
    pub fn set_connected(&mut self, slot: DeviceSlot, connected: bool) {
        if let Some(c) = self.connected.get_mut(slot as usize) {
            *c = connected;
        }
    }

    /// When set, the async loaders report `Pending` forever.
    pub fn stall_loader(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// When set, every compositor submit is rejected.
    pub fn fail_submit(&mut self, fail: bool) {
        self.fail_submit = fail;
    }

    pub fn model_load_calls(&self) -> u32 {
        self.model_load_calls
    }

    /// Frames accepted by the recording compositor, in submission order.
    pub fn submitted(&self) -> &[(Eye, EyeFrame)] {
        &self.submitted
    }

    fn device_pose(&self, slot: DeviceSlot) -> Mat4 {
        let t = self.tick as f32 / 90.0;
        match self.roles[slot as usize] {
            DeviceRole::Headset => Mat4::from_rotation_y((t * 0.3).sin() * 0.1)
                * Mat4::from_translation(Vec3::new(0.0, 1.6, 0.0)),
            DeviceRole::Controller => {
                let x = if slot % 2 == 1 { -0.3 } else { 0.3 };
                Mat4::from_translation(Vec3::new(x, 1.1 + 0.05 * (t * 2.0).sin(), -0.4))
            }
            DeviceRole::Unknown => Mat4::IDENTITY,
        }
    }
}

impl Default for SimRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl VrRuntime for SimRuntime {
    fn slot_count(&self) -> u32 {
        self.roles.len() as u32
    }

    fn device_role(&self, slot: DeviceSlot) -> DeviceRole {
        self.roles
            .get(slot as usize)
            .copied()
            .unwrap_or(DeviceRole::Unknown)
    }

    fn render_model_name(&self, slot: DeviceSlot) -> Option<String> {
        match self.device_role(slot) {
            DeviceRole::Controller => Some(format!("sim/controller_{slot}")),
            _ => None,
        }
    }

    fn recommended_target_size(&self) -> (u32, u32) {
        (EYE_WIDTH, EYE_HEIGHT)
    }

    fn projection(&self, _eye: Eye, near: f32, far: f32) -> Mat4 {
        let aspect = EYE_WIDTH as f32 / EYE_HEIGHT as f32;
        Mat4::perspective_rh(100f32.to_radians(), aspect, near, far)
    }

    fn eye_to_head(&self, eye: Eye) -> Mat4 {
        let x = match eye {
            Eye::Left => -HALF_IPD,
            Eye::Right => HALF_IPD,
        };
        Mat4::from_translation(Vec3::new(x, 0.0, 0.0))
    }

    fn begin_session(&mut self) {
        log::info!("sim compositor to front, fading grid");
    }

    fn poll_event(&mut self) -> Option<DeviceEvent> {
        self.events.pop_front()
    }

    fn wait_poses(&mut self, current: &mut [TrackedPose], predicted: &mut [TrackedPose]) {
        self.tick += 1;
        for slot in 0..self.roles.len().min(current.len()) {
            let valid = self.connected[slot];
            current[slot] = TrackedPose {
                transform: self.device_pose(slot as DeviceSlot),
                valid,
            };
        }
        // Predicted poses: one tick ahead, same validity.
        self.tick += 1;
        for slot in 0..self.roles.len().min(predicted.len()) {
            predicted[slot] = TrackedPose {
                transform: self.device_pose(slot as DeviceSlot),
                valid: self.connected[slot],
            };
        }
        self.tick -= 1;
    }

    fn submit(&mut self, eye: Eye, frame: &EyeFrame) -> Result<(), SubmitError> {
        if self.fail_submit {
            return Err(SubmitError::Rejected {
                eye,
                reason: "sim compositor rejecting frames".into(),
            });
        }
        self.submitted.push((eye, *frame));
        Ok(())
    }

    fn load_model(&mut self, name: &str) -> LoadPoll<RenderModel> {
        self.model_load_calls += 1;
        if self.stalled {
            return LoadPoll::Pending;
        }
        let polls = self
            .model_polls
            .entry(name.to_string())
            .or_insert(LOADER_DELAY);
        if *polls > 0 {
            *polls -= 1;
            return LoadPoll::Pending;
        }
        LoadPoll::Ready(controller_model(name))
    }

    fn load_texture(&mut self, texture_id: i32) -> LoadPoll<TextureMap> {
        if self.stalled {
            return LoadPoll::Pending;
        }
        let polls = self.texture_polls.entry(texture_id).or_insert(LOADER_DELAY);
        if *polls > 0 {
            *polls -= 1;
            return LoadPoll::Pending;
        }
        LoadPoll::Ready(checker_texture(texture_id))
    }

    fn shutdown(&mut self) {
        log::info!("sim runtime shut down");
    }
}

/// Stable per-name texture identifier.
fn texture_id_for(name: &str) -> i32 {
    name.bytes()
        .fold(7i32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as i32))
}

/// A wand-shaped cuboid, 5 cm square and 20 cm long, with face normals and
/// a per-face UV atlas. Stands in for a runtime-served render model.
fn controller_model(name: &str) -> RenderModel {
    let (hx, hy, hz) = (0.025f32, 0.025f32, 0.1f32);
    // (normal, four corners CCW when viewed from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [[-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz]],
        ),
        (
            [0.0, 0.0, -1.0],
            [[hx, -hy, -hz], [-hx, -hy, -hz], [-hx, hy, -hz], [hx, hy, -hz]],
        ),
        (
            [1.0, 0.0, 0.0],
            [[hx, -hy, hz], [hx, -hy, -hz], [hx, hy, -hz], [hx, hy, hz]],
        ),
        (
            [-1.0, 0.0, 0.0],
            [[-hx, -hy, -hz], [-hx, -hy, hz], [-hx, hy, hz], [-hx, hy, -hz]],
        ),
        (
            [0.0, 1.0, 0.0],
            [[-hx, hy, hz], [hx, hy, hz], [hx, hy, -hz], [-hx, hy, -hz]],
        ),
        (
            [0.0, -1.0, 0.0],
            [[-hx, -hy, -hz], [hx, -hy, -hz], [hx, -hy, hz], [-hx, -hy, hz]],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces.iter() {
        let base = vertices.len() as u16;
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for (corner, uv) in corners.iter().zip(uvs) {
            vertices.push(ModelVertex {
                position: *corner,
                normal: *normal,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    RenderModel {
        vertices,
        indices,
        diffuse_texture_id: texture_id_for(name),
    }
}

/// 8x8 two-tone checkerboard; the tone pair varies with the texture id so
/// different controllers are tellable apart.
fn checker_texture(texture_id: i32) -> TextureMap {
    let shade = (texture_id.unsigned_abs() % 128) as u8;
    let mut rgba = Vec::with_capacity(8 * 8 * 4);
    for y in 0..8u32 {
        for x in 0..8u32 {
            let on = (x + y) % 2 == 0;
            let v = if on { 200 } else { 64 + shade };
            rgba.extend_from_slice(&[v, v, 255 - shade, 255]);
        }
    }
    TextureMap {
        width: 8,
        height: 8,
        rgba,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submits_are_recorded_in_order() {
        let mut rt = SimRuntime::new();
        let frame = EyeFrame {
            width: 1440,
            height: 1600,
            frame_index: 0,
        };
        rt.submit(Eye::Left, &frame).unwrap();
        rt.submit(Eye::Right, &frame).unwrap();
        assert_eq!(rt.submitted().len(), 2);
        assert_eq!(rt.submitted()[0].0, Eye::Left);
    }

    #[test]
    fn rejected_submit_reports_the_eye() {
        let mut rt = SimRuntime::new();
        rt.fail_submit(true);
        let frame = EyeFrame {
            width: 1440,
            height: 1600,
            frame_index: 3,
        };
        let err = rt.submit(Eye::Right, &frame).unwrap_err();
        assert!(err.to_string().contains("Right"));
    }

    #[test]
    fn loader_settles_after_its_delay() {
        let mut rt = SimRuntime::new();
        let name = rt.render_model_name(1).unwrap();
        for _ in 0..LOADER_DELAY {
            assert!(matches!(rt.load_model(&name), LoadPoll::Pending));
        }
        let model = match rt.load_model(&name) {
            LoadPoll::Ready(m) => m,
            other => panic!("expected Ready, got {other:?}"),
        };
        assert_eq!(model.vertices.len(), 24);
        assert_eq!(model.indices.len(), 36);
        assert!(model
            .indices
            .iter()
            .all(|&i| (i as usize) < model.vertices.len()));
    }

    #[test]
    fn texture_ids_are_stable_for_arbitrary_names() {
        // The last name drives the fold accumulator right up against
        // i32::MAX mid-hash; the id must still come out, not overflow.
        for name in [
            "sim/controller_1",
            "a_rather_long_render_model_identifier",
            "5uaq5yy6lim",
        ] {
            assert_eq!(texture_id_for(name), texture_id_for(name));
        }
    }

    #[test]
    fn untracked_devices_report_invalid_poses() {
        let mut rt = SimRuntime::new();
        rt.set_connected(2, false);
        let n = rt.slot_count() as usize;
        let mut current = vec![TrackedPose::default(); n];
        let mut predicted = vec![TrackedPose::default(); n];
        rt.wait_poses(&mut current, &mut predicted);
        assert!(current[0].valid);
        assert!(current[1].valid);
        assert!(!current[2].valid);
    }
}
