//! CPU-side geometry: the shared mesh vertex layout, the primary sphere
//! mesh, and the oscilloscope line strips.

use bytemuck::{Pod, Zeroable};

/// Samples per waveform strip, one strip per audio channel.
pub const WAVEFORM_SAMPLES: usize = 1024;

/// Interleaved mesh vertex: position, normal, uv. Matches the layout the
/// runtime serves its render models in.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// A waveform strip vertex; x is fixed at build time, y follows the audio.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct WaveVertex {
    pub position: [f32; 2],
}

/// UV sphere centered at the origin. Rings share seam vertices so the
/// index buffer stays within u16 range at the tessellation used here.
pub fn sphere(radius: f32, stacks: u32, slices: u32) -> (Vec<Vertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let phi = v * std::f32::consts::PI;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for slice in 0..=slices {
            let u = slice as f32 / slices as f32;
            let theta = u * std::f32::consts::TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();

            let normal = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            vertices.push(Vertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
                uv: [u, v],
            });
        }
    }

    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
    let row = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = (stack * row + slice) as u16;
            let b = a + 1;
            let c = a + row as u16;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    (vertices, indices)
}

/// The silent waveform: x prebaked to [-1, 1) in 1/512 steps, y flat.
pub fn waveform_rest() -> Vec<WaveVertex> {
    (0..WAVEFORM_SAMPLES)
        .map(|sample| WaveVertex {
            position: [-1.0 + sample as f32 / 512.0, 0.0],
        })
        .collect()
}

/// Rebuilds a strip's vertices from one channel of amplitude samples.
pub fn waveform_vertices(amplitudes: &[f32; WAVEFORM_SAMPLES]) -> Vec<WaveVertex> {
    amplitudes
        .iter()
        .enumerate()
        .map(|(sample, &amplitude)| WaveVertex {
            position: [-1.0 + sample as f32 / 512.0, amplitude],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_indices_stay_in_bounds() {
        let (vertices, indices) = sphere(0.5, 24, 32);
        assert_eq!(vertices.len(), 25 * 33);
        assert_eq!(indices.len(), 24 * 32 * 6);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let (vertices, _) = sphere(2.0, 8, 8);
        for v in &vertices {
            let r = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2)).sqrt();
            assert!((r - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn waveform_x_axis_is_prebaked() {
        let rest = waveform_rest();
        assert_eq!(rest.len(), WAVEFORM_SAMPLES);
        assert_eq!(rest[0].position, [-1.0, 0.0]);
        assert_eq!(rest[512].position, [0.0, 0.0]);
        assert!((rest[1023].position[0] - (1.0 - 1.0 / 512.0)).abs() < 1e-6);
    }

    #[test]
    fn waveform_vertices_carry_the_amplitudes() {
        let mut amps = [0.0f32; WAVEFORM_SAMPLES];
        amps[100] = 0.75;
        let verts = waveform_vertices(&amps);
        assert_eq!(verts[100].position[1], 0.75);
        assert_eq!(verts[100].position[0], waveform_rest()[100].position[0]);
    }
}
