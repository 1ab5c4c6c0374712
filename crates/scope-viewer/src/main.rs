//! Entry point for the stereo scope viewer.

use anyhow::Result;
use scope_viewer::app::App;
use std::sync::Arc;
use vrlink::{sim::SimRuntime, Session};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // The session must come up before any window or GPU work; without a
    // runtime there is nothing to render.
    let session = match Session::open(SimRuntime::new()) {
        Ok(session) => session,
        Err(err) => {
            log::error!("VR runtime unavailable: {err}");
            return Ok(());
        }
    };

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Stereo Scope Viewer")
            .with_inner_size(winit::dpi::LogicalSize::new(960, 540))
            .build(&event_loop)?,
    );

    // Initialise the application (async -> sync).
    let mut app = pollster::block_on(App::new(window.clone(), session))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::KeyboardInput { event, .. } => {
                    if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                        elwt.exit();
                    }
                }
                WindowEvent::Resized(new_size) => app.resize(new_size),
                WindowEvent::RedrawRequested => match app.frame() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        app.resize(app.renderer.gfx.size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("WGPU out of memory - exiting.");
                        elwt.exit();
                    }
                    Err(e) => log::error!("Render error: {:?}", e),
                },
                _ => {}
            },
            Event::AboutToWait => {
                // The eye submits pace the loop; redraw continuously.
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
