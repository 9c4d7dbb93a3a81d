//! Colortris: falling-piece colour matching puzzle in the terminal.

mod app;
mod game;
mod grid;
mod input;
mod piece;
mod rng;
mod score;
mod theme;
mod timing;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Front-end options derived from the CLI. Gameplay rules are fixed.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub frame_rate: f64,
    pub no_animation: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        warn!("{e}; using the default theme");
        let mut theme = theme::Theme::default();
        theme.apply_palette(args.palette);
        theme
    });
    let config = GameConfig {
        seed: args.seed,
        frame_rate: args.frame_rate.clamp(1.0, 240.0),
        no_animation: args.no_animation,
    };
    info!("starting with {config:?}");
    let mut app = App::new(config, theme);
    let score = app.run()?;
    info!("exited with score {score}");
    Ok(())
}

/// Logs go to a file: the terminal is in raw mode on the alternate screen while playing.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_module_path(false)
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}

/// Colour matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "colortris",
    version,
    about = "Falling-piece colour matching puzzle in the terminal. Line up three of a colour to clear them.",
    long_about = "Colortris drops single coloured pieces into a 7x10 well. Steer each one while it \
        falls; when it lands it locks. Any row or column of three or more of one colour is \
        cleared for a point per run, and whatever was above falls into the gap. The game ends \
        when the stack reaches the top row.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move    Down or j  Soft drop\n  P  Pause    Q / Esc  Quit    R  Restart (after game over)\n\n\
        Hold a movement key to keep the piece moving. Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]="value"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Seed for the spawn sequence; the same seed replays the same pieces.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Target render frames per second (also the input sampling rate).
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable the fade on cleared cells.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
