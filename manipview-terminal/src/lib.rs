/// Terminal frontend: ASCII rendering of the manipulator with keyboard and mouse control
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyboardEnhancementFlags, MouseEvent, MouseEventKind, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use manipview_core::{Action, InputFrame, MouseLook, ViewerState};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::info;

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Look input per terminal cell of pointer travel
const LOOK_PER_CELL: f32 = 20.0;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    state: ViewerState,
    renderer: AsciiRenderer,
    input: InputFrame,
    mouse: MouseLook,
    /// Whether the terminal reports key releases; without them a key counts
    /// as held for the tick its event arrives in
    release_events: bool,
    running: bool,
    last_tick: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(state: ViewerState) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(state, width as usize, height as usize))
    }

    pub fn with_size(state: ViewerState, width: usize, height: usize) -> Self {
        Self {
            state,
            renderer: AsciiRenderer::new(width, height),
            input: InputFrame::default(),
            mouse: MouseLook::default(),
            release_events: false,
            running: true,
            last_tick: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;
        self.release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.main_loop();

        // Cleanup runs every step; the first error wins
        let pop = if self.release_events {
            execute!(stdout(), PopKeyboardEnhancementFlags)
        } else {
            Ok(())
        };
        let restore = execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        );
        let raw = terminal::disable_raw_mode();
        info!(release_events = self.release_events, "terminal restored");

        first_error([result, pop, restore, raw])
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update
            let dt = self.last_tick.elapsed().as_secs_f32();
            self.last_tick = Instant::now();
            self.update(dt);

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.renderer.resize(width as usize, height as usize),
            Event::FocusLost => {
                self.input.held.clear();
                self.mouse.reset();
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char(c) => {
                if let Some(action) = Action::from_char(c) {
                    match kind {
                        KeyEventKind::Press | KeyEventKind::Repeat => self.input.press(action),
                        KeyEventKind::Release => self.input.release(action),
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, MouseEvent { kind, column, row, .. }: MouseEvent) {
        match kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let (dx, dy) = self.mouse.delta(column as f32, row as f32);
                self.input.add_look(dx * LOOK_PER_CELL, dy * LOOK_PER_CELL);
            }
            MouseEventKind::ScrollUp => self.input.scroll += 1.0,
            MouseEventKind::ScrollDown => self.input.scroll -= 1.0,
            _ => {}
        }
    }

    fn update(&mut self, dt: f32) {
        self.state.apply_input(&self.input, dt);
        self.input.clear_motion();
        if !self.release_events {
            self.input.held.clear();
        }
    }

    /// Draw every sub-mesh with its own world matrix into the ASCII buffer
    fn rasterize(&mut self) {
        let frame = self.state.frame(self.renderer.aspect());
        let view_projection = frame.projection * frame.view;

        self.renderer.clear();
        for (mesh, world) in self.state.model.meshes.iter().zip(&frame.world) {
            self.renderer.render_mesh(mesh, world, &view_projection);
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.rasterize();

        // Output to terminal
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let angles = self.state.angles();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Manipview | FPS: {:.1} | base {:7.2} shoulder {:6.2} wrist {:6.2} | fov {:.0} | \
                 WASD=Fly 1/2 3/4 5/6=Joints Mouse=Look Q=Quit",
                self.fps,
                angles.base,
                angles.shoulder,
                angles.wrist,
                self.state.camera.fov
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Keep the first failure among results that were all produced
fn first_error<const N: usize>(results: [io::Result<()>; N]) -> io::Result<()> {
    results.into_iter().collect()
}
