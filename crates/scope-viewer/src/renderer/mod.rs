//! The rendering orchestrator. Owns the GPU context, the per-eye and
//! mirror render targets, and the three draw pipelines. The same pass
//! body runs three times per frame against different targets and view
//! transforms.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{
    context::GfxContext,
    pipelines::{
        model::{ControllerGpu, ModelPipeline},
        scene::{SceneMeshGpu, ScenePipeline},
        waveform::{WaveformGpu, WaveformPipeline},
    },
    targets::Targets,
};
use crate::scene::{self, WAVEFORM_SAMPLES};
use glam::Mat4;
use std::collections::HashMap;
use std::sync::Arc;
use vrlink::{frame, ControllerAsset, DeviceSlot, Eye};
use winit::window::Window;

/// Everything one pass draws besides the static geometry: the newest
/// capture amplitude and the posed controllers.
pub struct FrameDraw<'a> {
    pub amplitude: f32,
    pub controllers: &'a [(DeviceSlot, Mat4)],
}

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    scene_pipe: ScenePipeline,
    model_pipe: ModelPipeline,
    wave_pipe: WaveformPipeline,
    scene_mesh: SceneMeshGpu,
    controllers: HashMap<DeviceSlot, ControllerGpu>,
    /// Left channel strip, then right.
    waveforms: [WaveformGpu; 2],
}

impl Renderer {
    pub async fn new(window: Arc<Window>, eye_size: (u32, u32)) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;
        let size = gfx.size;

        let targets = Targets::new(&gfx.device, gfx.config.format, eye_size, size);
        let scene_pipe = ScenePipeline::new(&gfx.device, gfx.config.format, targets::DEPTH_FORMAT);
        let model_pipe = ModelPipeline::new(&gfx.device, gfx.config.format, targets::DEPTH_FORMAT);
        let wave_pipe = WaveformPipeline::new(&gfx.device, gfx.config.format, targets::DEPTH_FORMAT);

        let (vertices, indices) = scene::sphere(0.5, 24, 32);
        let scene_mesh = scene_pipe.upload(&gfx.device, &vertices, &indices);

        let rest = scene::waveform_rest();
        let waveforms = [
            wave_pipe.create_strip(&gfx.device, &rest),
            wave_pipe.create_strip(&gfx.device, &rest),
        ];

        Ok(Self {
            gfx,
            targets,
            scene_pipe,
            model_pipe,
            wave_pipe,
            scene_mesh,
            controllers: HashMap::new(),
            waveforms,
        })
    }

    /// Makes a controller's loaded asset drawable. Idempotent per slot;
    /// the GPU copy is retained across deactivation like the CPU asset.
    pub fn upload_controller(&mut self, slot: DeviceSlot, asset: &ControllerAsset) {
        if self.controllers.contains_key(&slot) {
            return;
        }
        let gpu = self.model_pipe.upload(&self.gfx.device, &self.gfx.queue, asset);
        self.controllers.insert(slot, gpu);
    }

    /// Reshapes both strips from fresh capture samples.
    pub fn update_waveforms(
        &self,
        left: &[f32; WAVEFORM_SAMPLES],
        right: &[f32; WAVEFORM_SAMPLES],
    ) {
        self.wave_pipe.update(
            &self.gfx.queue,
            &self.waveforms[0],
            &scene::waveform_vertices(left),
        );
        self.wave_pipe.update(
            &self.gfx.queue,
            &self.waveforms[1],
            &scene::waveform_vertices(right),
        );
    }

    /// Renders one eye into its offscreen target.
    pub fn render_eye(&self, eye: Eye, view: Mat4, proj: Mat4, draw: &FrameDraw) {
        let target = self.targets.eye(eye);
        let label = match eye {
            Eye::Left => "Left Eye Pass",
            Eye::Right => "Right Eye Pass",
        };
        self.draw_pass(&target.color, &target.depth, label, view, proj, draw);
    }

    /// Renders the mirror pass into the window's swap chain view.
    pub fn render_mirror(&self, swap_view: &wgpu::TextureView, view: Mat4, proj: Mat4, draw: &FrameDraw) {
        self.draw_pass(
            swap_view,
            &self.targets.mirror_depth,
            "Mirror Pass",
            view,
            proj,
            draw,
        );
    }

    /// One full pass: clear, scene mesh, controllers, both waveform
    /// strips. Each pass submits on its own so its uniform writes land
    /// before the next pass rewrites the shared slots.
    fn draw_pass(
        &self,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        label: &str,
        view: Mat4,
        proj: Mat4,
        draw: &FrameDraw,
    ) {
        let view_proj = proj * view;

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let scene_model = frame::scene_world(draw.amplitude);
            self.scene_pipe.draw(
                &mut pass,
                &self.gfx.queue,
                &self.scene_mesh,
                pipelines::MeshUniform {
                    model_view_proj: view_proj * scene_model,
                    model: scene_model,
                },
            );

            for &(slot, pose) in draw.controllers {
                // Uploaded lazily; a slot whose asset is still loading
                // simply isn't in the map yet.
                if let Some(gpu) = self.controllers.get(&slot) {
                    let model = frame::controller_world(pose, draw.amplitude);
                    self.model_pipe.draw(
                        &mut pass,
                        &self.gfx.queue,
                        gpu,
                        pipelines::MeshUniform {
                            model_view_proj: view_proj * model,
                            model,
                        },
                    );
                }
            }

            for (strip, z_offset) in self
                .waveforms
                .iter()
                .zip([frame::LEFT_WAVEFORM_Z, frame::RIGHT_WAVEFORM_Z])
            {
                self.wave_pipe.draw(
                    &mut pass,
                    &self.gfx.queue,
                    strip,
                    pipelines::LineUniform {
                        model_view_proj: view_proj * frame::waveform_world(z_offset),
                    },
                );
            }
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if targets::renderable(new_size.width, new_size.height) {
            self.gfx.resize(new_size);
            self.targets.resize_mirror(&self.gfx.device, new_size);
        }
    }
}
