//! Frame coordinator: owns the session, the device registry, pose
//! tracking, audio capture, and the renderer, and runs the fixed
//! per-frame sequence of audio sync, event drain, pose update, both eye
//! passes with compositor submits, then the mirror pass.

use crate::{
    audio::AudioSampler,
    renderer::{targets, FrameDraw, Renderer},
    scene::WAVEFORM_SAMPLES,
};
use anyhow::Result;
use glam::Mat4;
use std::sync::Arc;
use vrlink::{
    frame, pose::PoseTracker, sim::SimRuntime, DeviceRegistry, DeviceSlot, Eye, EyeFrame, Session,
    VrRuntime,
};
use winit::window::Window;

pub struct App {
    session: Session<SimRuntime>,
    registry: DeviceRegistry,
    poses: PoseTracker,
    audio: AudioSampler,
    left_wave: [f32; WAVEFORM_SAMPLES],
    right_wave: [f32; WAVEFORM_SAMPLES],
    pub renderer: Renderer,
    /// Mirror dimensions from the last reported window size; `None` while
    /// minimized. Tracked separately from the surface config, which never
    /// records a zero size.
    mirror_extent: Option<(u32, u32)>,
    frame_index: u64,
}

/// Mirror pass dimensions for a reported window size.
fn mirror_extent(size: winit::dpi::PhysicalSize<u32>) -> Option<(u32, u32)> {
    targets::renderable(size.width, size.height).then_some((size.width, size.height))
}

impl App {
    pub async fn new(window: Arc<Window>, mut session: Session<SimRuntime>) -> Result<Self> {
        let mut registry = DeviceRegistry::new();
        registry.scan(session.runtime());

        let mut poses = PoseTracker::new(session.slot_count());
        poses.set_headset(registry.headset());

        let eye_size = session.runtime().recommended_target_size();
        log::info!("per-eye target {}x{}", eye_size.0, eye_size.1);
        let renderer = Renderer::new(window, eye_size).await?;

        let audio = AudioSampler::start();

        let mirror = mirror_extent(renderer.gfx.size);
        Ok(Self {
            session,
            registry,
            poses,
            audio,
            left_wave: [0.0; WAVEFORM_SAMPLES],
            right_wave: [0.0; WAVEFORM_SAMPLES],
            renderer,
            mirror_extent: mirror,
            frame_index: 0,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        // A zero size pauses the mirror pass; buffer recreation is skipped
        // inside the renderer.
        self.mirror_extent = mirror_extent(new_size);
        self.renderer.resize(new_size);
    }

    /// Runs one full frame. A surface error from the mirror swap chain is
    /// the only thing that propagates; compositor rejects are logged and
    /// retried next frame.
    pub fn frame(&mut self) -> std::result::Result<(), wgpu::SurfaceError> {
        // 1. Audio: reshape the strips only when new samples arrived, so a
        //    stalled capture leaves last frame's geometry untouched.
        if self.audio.sync(&mut self.left_wave, &mut self.right_wave) {
            self.renderer
                .update_waveforms(&self.left_wave, &self.right_wave);
        }
        let amplitude = self.left_wave[WAVEFORM_SAMPLES - 1];

        // 2. Connection events, then one poll step for in-flight assets.
        while let Some(event) = self.session.runtime().poll_event() {
            self.registry.apply_event(event, self.session.runtime());
        }
        // An event can designate the headset mid-session; keep the
        // tracker's view origin pointed at it.
        self.poses.set_headset(self.registry.headset());
        for slot in self.registry.poll_assets(self.session.runtime()) {
            if let Some(asset) = self.registry.asset(slot) {
                self.renderer.upload_controller(slot, asset);
            }
        }

        // 3. Fresh poses for everything tracked.
        self.poses.update(self.session.runtime());
        let head = self.poses.head();

        let controllers: Vec<(DeviceSlot, Mat4)> = self
            .registry
            .active_controllers()
            .into_iter()
            .map(|slot| (slot, self.poses.transform(slot)))
            .collect();
        let draw = FrameDraw {
            amplitude,
            controllers: &controllers,
        };

        // 4. Both eyes, each rendered then handed to the compositor.
        let (eye_w, eye_h) = self.renderer.targets.eye_size;
        for eye in Eye::BOTH {
            let runtime = self.session.runtime();
            let proj = runtime.projection(eye, frame::NEAR, frame::FAR);
            let view = frame::eye_view(runtime.eye_to_head(eye), head);
            self.renderer.render_eye(eye, view, proj, &draw);

            let submitted = EyeFrame {
                width: eye_w,
                height: eye_h,
                frame_index: self.frame_index,
            };
            if let Err(err) = self.session.runtime().submit(eye, &submitted) {
                log::warn!("{err}");
            }
        }

        // 5. Mirror window, skipped entirely while minimized.
        if let Some((width, height)) = self.mirror_extent {
            let swap = self.renderer.gfx.surface.get_current_texture()?;
            let swap_view = swap
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let aspect = width as f32 / height as f32;
            let proj = Mat4::perspective_rh(
                std::f32::consts::FRAC_PI_3,
                aspect,
                frame::NEAR,
                frame::FAR,
            );
            self.renderer
                .render_mirror(&swap_view, frame::mirror_view(head), proj, &draw);
            swap.present();
        }

        self.frame_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::mirror_extent;
    use winit::dpi::PhysicalSize;

    #[test]
    fn minimize_pauses_the_mirror_until_a_real_size_returns() {
        assert_eq!(mirror_extent(PhysicalSize::new(0, 540)), None);
        assert_eq!(mirror_extent(PhysicalSize::new(960, 0)), None);
        assert_eq!(mirror_extent(PhysicalSize::new(0, 0)), None);
        assert_eq!(mirror_extent(PhysicalSize::new(960, 540)), Some((960, 540)));
    }
}
