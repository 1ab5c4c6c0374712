//! Offscreen render targets: one color+depth pair per eye at the runtime's
//! recommended size, plus a depth buffer matching the mirror window.

use vrlink::Eye;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// True when a surface of these dimensions can actually be rendered to.
/// Minimized windows report a zero extent and must be skipped.
#[inline]
pub fn renderable(width: u32, height: u32) -> bool {
    width > 0 && height > 0
}

/// Offscreen color+depth pair for one eye.
pub struct EyeTarget {
    // Private textures, kept alive for the lifetime of the views.
    _color_tex: wgpu::Texture,
    _depth_tex: wgpu::Texture,

    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
}

impl EyeTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let tex_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let color_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: tex_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Eye Depth Target"),
            size: tex_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        Self {
            color: color_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _color_tex: color_tex,
            _depth_tex: depth_tex,
        }
    }
}

pub struct Targets {
    /// Fixed per-eye resolution recommended by the runtime.
    pub eye_size: (u32, u32),
    pub left: EyeTarget,
    pub right: EyeTarget,

    _mirror_depth_tex: wgpu::Texture,
    pub mirror_depth: wgpu::TextureView,
}

impl Targets {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        eye_size: (u32, u32),
        window_size: winit::dpi::PhysicalSize<u32>,
    ) -> Self {
        let left = EyeTarget::new(device, format, eye_size.0, eye_size.1, "Left Eye Target");
        let right = EyeTarget::new(device, format, eye_size.0, eye_size.1, "Right Eye Target");
        let (mirror_depth_tex, mirror_depth) = mirror_depth(device, window_size);

        Self {
            eye_size,
            left,
            right,
            _mirror_depth_tex: mirror_depth_tex,
            mirror_depth,
        }
    }

    #[inline]
    pub fn eye(&self, eye: Eye) -> &EyeTarget {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }

    /// Rebuilds the mirror depth buffer; the eye targets never resize.
    pub fn resize_mirror(&mut self, device: &wgpu::Device, size: winit::dpi::PhysicalSize<u32>) {
        if renderable(size.width, size.height) {
            let (tex, view) = mirror_depth(device, size);
            self._mirror_depth_tex = tex;
            self.mirror_depth = view;
        }
    }
}

fn mirror_depth(
    device: &wgpu::Device,
    size: winit::dpi::PhysicalSize<u32>,
) -> (wgpu::Texture, wgpu::TextureView) {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Mirror Depth Target"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
    (tex, view)
}

#[cfg(test)]
mod tests {
    use super::renderable;

    #[test]
    fn zero_extents_are_not_renderable() {
        assert!(renderable(960, 540));
        assert!(!renderable(0, 540));
        assert!(!renderable(960, 0));
        assert!(!renderable(0, 0));
    }
}
