//! Line-strip pipeline for the oscilloscope waveforms.

use super::LineUniform;
use crate::scene::{WaveVertex, WAVEFORM_SAMPLES};
use wgpu::util::DeviceExt;

pub struct WaveformPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl WaveformPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Waveform BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Waveform WGSL"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/waveform.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Waveform Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Waveform Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<WaveVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 0,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineStrip,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_fmt,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }

    /// Creates one strip at the silent rest shape; `update` reshapes it.
    pub fn create_strip(&self, device: &wgpu::Device, rest: &[WaveVertex]) -> WaveformGpu {
        let vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Waveform VB"),
            contents: bytemuck::cast_slice(rest),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Waveform UBO"),
            size: std::mem::size_of::<LineUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Waveform Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        WaveformGpu {
            vb,
            ubo,
            bind_group,
        }
    }

    /// Rewrites a strip's vertices from fresh capture samples.
    pub fn update(&self, queue: &wgpu::Queue, strip: &WaveformGpu, vertices: &[WaveVertex]) {
        queue.write_buffer(&strip.vb, 0, bytemuck::cast_slice(vertices));
    }

    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        queue: &wgpu::Queue,
        strip: &'a WaveformGpu,
        uniform: LineUniform,
    ) {
        queue.write_buffer(&strip.ubo, 0, bytemuck::bytes_of(&uniform));

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &strip.bind_group, &[]);
        rpass.set_vertex_buffer(0, strip.vb.slice(..));
        rpass.draw(0..WAVEFORM_SAMPLES as u32, 0..1);
    }
}

/// One channel's line strip on the GPU.
pub struct WaveformGpu {
    vb: wgpu::Buffer,
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}
