/// Manipview Terminal - render a three-joint manipulator as ASCII art
///
/// Controls:
///   - WASD: Fly the camera
///   - 1/2, 3/4, 5/6: Turn the base, shoulder and wrist
///   - Mouse: Look around, wheel zooms
///   - Q/ESC: Quit
use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use manipview_core::{ViewerArgs, ViewerState};
use manipview_terminal::TerminalApp;
use tracing_subscriber::EnvFilter;

fn init_logging(args: &ViewerArgs) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = ViewerArgs::parse();
    init_logging(&args)?;

    let config = args.to_config().context("invalid configuration")?;
    let state = ViewerState::load(&config).context("failed to load the manipulator")?;

    // Logging to stderr stops here: the alternate screen owns the terminal
    let mut app = TerminalApp::new(state).context("failed to query the terminal")?;
    app.run().context("terminal renderer failed")?;

    let angles = app.state().angles();
    println!(
        "Final pose: base {:.2}, shoulder {:.2}, wrist {:.2}",
        angles.base, angles.shoulder, angles.wrist
    );
    Ok(())
}
