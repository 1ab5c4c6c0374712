//! Stereoscopic waveform viewer library.
//!
//! Renders an audio-reactive scene once per eye plus a mirror window,
//! overlaying controller meshes with live textures from the VR runtime.

pub mod app;
pub mod audio;
pub mod renderer;
pub mod scene;
