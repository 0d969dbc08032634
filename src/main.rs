//! A circular, endlessly wrapping image carousel for the terminal.
//!
//! Pass image files, directories or a manifest; drag, scroll or use the
//! arrow keys to spin the gallery.

mod app;
mod config;
mod core;
mod ui;

use std::io::{self, stderr};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, widgets::Paragraph, Terminal};
use tokio::sync::mpsc;

use crate::app::{
    event::{spawn_event_reader, AppEvent, TICK_RATE},
    handler, load_runtime,
    state::AppState,
};
use crate::config::AppConfig;
use crate::core::{
    gallery::{Gallery, LoadOutcome},
    item::{self, DiscoverOptions, GalleryItem},
};
use crate::ui::{
    gallery_widget::{screen_for, GalleryWidget},
    layout::AppLayout,
    theme::Theme,
};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Circular image gallery for the terminal")]
struct Cli {
    /// Image files or directories (defaults to `.` when no manifest is given).
    paths: Vec<PathBuf>,

    /// Manifest file with one `image | caption` per line.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Maximum directory depth when searching for images.
    #[arg(long, default_value_t = 1)]
    depth: usize,

    /// Include hidden (dot) files.
    #[arg(long)]
    hidden: bool,

    /// Don't apply .gitignore rules while searching.
    #[arg(long = "no-ignore")]
    no_ignore: bool,

    /// Arc bend; 0 lays the planes out flat, negative bends upward.
    #[arg(long, allow_hyphen_values = true)]
    bend: Option<f64>,

    /// Corner radius of the planes, 0 to 1.
    #[arg(long = "border-radius")]
    border_radius: Option<f64>,

    /// Caption colour as `#rrggbb`.
    #[arg(long = "text-color")]
    text_color: Option<String>,

    /// Caption font, e.g. "bold 30px Figtree".
    #[arg(long)]
    font: Option<String>,

    /// Item to centre on start (1-based).
    #[arg(long)]
    start: Option<usize>,

    /// Write logs to this file instead of stderr.
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Persist the effective settings to the config file.
    #[arg(long = "save-config")]
    save_config: bool,
}

impl Cli {
    /// Fold command-line overrides into the loaded config.
    fn apply_overrides(&self, config: &mut AppConfig) {
        let g = &mut config.gallery;
        if let Some(bend) = self.bend.filter(|b| b.is_finite()) {
            g.bend = bend.clamp(-50.0, 50.0);
        }
        if let Some(radius) = self.border_radius.filter(|r| r.is_finite()) {
            g.border_radius = radius.clamp(0.0, 1.0);
        }
        if let Some(color) = &self.text_color {
            g.text_color = color.clone();
        }
        if let Some(font) = &self.font {
            g.font = font.clone();
        }
    }

    fn discover_options(&self) -> DiscoverOptions {
        DiscoverOptions {
            max_depth: self.depth.max(1),
            show_hidden: self.hidden,
            respect_gitignore: !self.no_ignore,
        }
    }
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr) // never pollute stdout
                .init();
        }
    }
    Ok(())
}

fn gather_items(cli: &Cli) -> Result<Vec<GalleryItem>> {
    let mut items = Vec::new();
    if let Some(manifest) = &cli.manifest {
        items.extend(item::load_manifest(manifest)?);
    }
    let paths = if cli.paths.is_empty() && cli.manifest.is_none() {
        vec![PathBuf::from(".")]
    } else {
        cli.paths.clone()
    };
    items.extend(item::collect_items(&paths, cli.discover_options())?);
    Ok(items)
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref())?;

    let mut user_config = AppConfig::load();
    cli.apply_overrides(&mut user_config);
    if cli.save_config {
        let path = user_config.save()?;
        eprintln!("saved configuration to {}", path.display());
    }

    let items = gather_items(&cli)?;
    if items.is_empty() {
        bail!("no images found");
    }
    tracing::info!(count = items.len(), "gallery items collected");

    // ── build the gallery before touching the terminal ────────
    let (cols, rows) = crossterm::terminal::size()?;
    let layout = AppLayout::from_area(Rect::new(0, 0, cols, rows));
    let mut gallery = Gallery::new(
        items,
        user_config.gallery.gallery_config(),
        screen_for(layout.gallery_area),
    )?;
    if let Some(start) = cli.start {
        gallery.on_initialized(|controls| {
            if let Err(e) = start.checked_sub(1).map_or(Ok(()), |i| controls.go_to(i)) {
                tracing::warn!(error = %e, "ignoring --start");
            }
        });
    }

    let (load_tx, load_rx) = mpsc::unbounded_channel::<LoadOutcome>();
    let spawned = load_runtime::spawn_all(&load_tx, gallery.begin_loads());
    tracing::debug!(spawned, "image loads started");

    let mut state = AppState::new(gallery, user_config, layout.gallery_area);

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut state, load_rx).await;

    // ── teardown ──────────────────────────────────────────────
    state.gallery.cancel_loads();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stderr>>,
    state: &mut AppState,
    mut load_rx: mpsc::UnboundedReceiver<LoadOutcome>,
) -> Result<()> {
    let mut events = spawn_event_reader(TICK_RATE);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    loop {
        // ── draw only when something changed ──────────────────
        if dirty {
            let status_text = state.status_line();
            terminal.draw(|frame| {
                let layout = AppLayout::from_area(frame.area());
                let widget = GalleryWidget {
                    gallery: &state.gallery,
                    caption_style: state.caption_style,
                    tick: state.frame,
                };
                frame.render_stateful_widget(widget, layout.gallery_area, &mut state.thumbs);

                if let Some(status_area) = layout.status_area {
                    let status = Paragraph::new(status_text).style(Theme::status_bar_style());
                    frame.render_widget(status, status_area);
                }
            })?;
            dirty = false;
        }

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                match event {
                    AppEvent::Key(k) => {
                        handler::handle_key(state, k);
                        dirty = true;
                    }
                    AppEvent::Mouse(m) => {
                        handler::handle_mouse(state, m);
                        dirty = true;
                    }
                    AppEvent::Resize(w, h) => {
                        let layout = AppLayout::from_area(Rect::new(0, 0, w, h));
                        handler::handle_resize(state, layout.gallery_area);
                        dirty = true;
                    }
                    AppEvent::Tick => {
                        let now = Instant::now();
                        let moved = state.gallery.tick(now - last_tick);
                        last_tick = now;
                        state.frame = state.frame.wrapping_add(1);
                        // Spinners keep animating while anything is loading.
                        dirty = moved
                            || state.gallery.is_animating()
                            || state.gallery.pending_loads() > 0;
                    }
                }
            }

            Some(outcome) = load_rx.recv() => {
                // Apply everything already queued before the next frame.
                dirty |= state.gallery.apply_load(outcome);
                while let Ok(outcome) = load_rx.try_recv() {
                    dirty |= state.gallery.apply_load(outcome);
                }
            }

            else => break,
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}
