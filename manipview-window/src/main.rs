/// Manipview Window - render a three-joint manipulator with wgpu
///
/// Controls:
///   - WASD: Fly the camera
///   - 1/2, 3/4, 5/6: Turn the base, shoulder and wrist
///   - Mouse: Look around, wheel zooms
///   - ESC: Quit
use std::fs::File;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use manipview_core::{InputFrame, ViewerArgs, ViewerState};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    dpi::PhysicalSize,
    event::{DeviceEvent, ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowBuilder},
};

mod gpu;
mod input;
mod vertex;

use gpu::Gpu;

const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

fn init_logging(args: &ViewerArgs) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    if let Err(err) = grabbed {
        warn!(%err, "cursor grab unavailable");
    }
    window.set_cursor_visible(false);
}

fn main() -> Result<()> {
    let args = ViewerArgs::parse();
    init_logging(&args)?;

    let config = args.to_config().context("invalid configuration")?;
    let mut state = ViewerState::load(&config).context("failed to load the manipulator")?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Manipview")
            .with_inner_size(PhysicalSize::new(1280u32, 720u32))
            .build(&event_loop)
            .context("failed to create window")?,
    );
    grab_cursor(&window);

    let mut gpu = pollster::block_on(Gpu::new(window, &state.model))?;
    let mut input = InputFrame::default();
    let mut last_tick = Instant::now();
    let mut fps_since = Instant::now();
    let mut frames = 0u32;

    event_loop.run(move |event, target| match event {
        Event::WindowEvent { ref event, window_id } if window_id == gpu.window().id() => {
            match event {
                WindowEvent::CloseRequested => target.exit(),
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(code),
                            state: key_state,
                            ..
                        },
                    ..
                } => {
                    if *code == KeyCode::Escape && *key_state == ElementState::Pressed {
                        target.exit();
                    } else {
                        input::handle_key(&mut input, *code, *key_state);
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => input::handle_wheel(&mut input, *delta),
                WindowEvent::Focused(false) => input.held.clear(),
                WindowEvent::Resized(physical_size) => gpu.resize(*physical_size),
                WindowEvent::RedrawRequested => {
                    let dt = last_tick.elapsed().as_secs_f32();
                    last_tick = Instant::now();
                    state.apply_input(&input, dt);
                    input.clear_motion();

                    match gpu.render(&state.frame(gpu.aspect())) {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            gpu.resize(gpu.size)
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("GPU out of memory");
                            target.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => warn!("surface timeout"),
                    }

                    frames += 1;
                    if fps_since.elapsed().as_secs() >= 1 {
                        let fps = frames as f32 / fps_since.elapsed().as_secs_f32();
                        let angles = state.angles();
                        gpu.window().set_title(&format!(
                            "Manipview | {fps:.0} fps | base {:.1} shoulder {:.1} wrist {:.1}",
                            angles.base, angles.shoulder, angles.wrist
                        ));
                        debug!(fps, ?angles, fov = state.camera.fov, "frame stats");
                        frames = 0;
                        fps_since = Instant::now();
                    }
                }
                _ => {}
            }
        }
        Event::DeviceEvent {
            event: DeviceEvent::MouseMotion { delta },
            ..
        } => input::handle_motion(&mut input, delta),
        Event::AboutToWait => gpu.window().request_redraw(),
        Event::LoopExiting => {
            let angles = state.angles();
            info!(
                base = angles.base,
                shoulder = angles.shoulder,
                wrist = angles.wrist,
                "viewer closed"
            );
        }
        _ => {}
    })?;

    Ok(())
}
