//! rosary - guided Anglican rosary in the terminal
//!
//! This is the main entry point. It wires together:
//! - Configuration loading
//! - Store initialization (sqlite, with an in-memory fallback)
//! - The flow engine
//! - Terminal rendering and the timer/input event loop

mod input;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use rosary_api::{Frame, Node};
use rosary_config::load_config_or_default;
use rosary_core::{CoreEvent, FlowEngine};
use rosary_host_api::{AnimationDriver, HapticNotifier, NoopHaptics, Renderer};
use rosary_store::{KeyValueStore, MemoryStore, SqliteStore};
use rosary_util::{
    DATABASE_FILENAME, EpochMs, default_config_path, epoch_ms_to_local, format_datetime_full,
    is_mock_time_active, now_epoch_ms,
};
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::input::{Command, help_text};
use crate::terminal::{BellHaptics, TerminalRenderer, render_frame};

/// Upper bound on the wait between repaints while a countdown is showing
const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// rosary - Guided Anglican rosary prayer flow
#[derive(Parser, Debug)]
#[command(name = "rosary")]
#[command(about = "Guided Anglican rosary prayer flow", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/rosary/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set ROSARY_DATA_DIR env var)
    #[arg(short, long, env = "ROSARY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Terminal shell state
struct Shell {
    engine: FlowEngine,
    renderer: TerminalRenderer<Stdout>,
    dev_controls: bool,
    last_painted: Option<String>,
}

impl Shell {
    fn new(args: &Args) -> Result<Self> {
        let settings = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            load_duration_ms = settings.flow.load_duration_ms(),
            dwell_ms = settings.flow.dwell_ms(),
            dev_controls = settings.shell.dev_controls,
            "Configuration loaded"
        );

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| settings.storage.data_dir.clone());
        let store = open_store(&data_dir);

        let haptics: Arc<dyn HapticNotifier> = if BellHaptics.is_available() {
            Arc::new(BellHaptics)
        } else {
            debug!("No terminal on stderr, haptics disabled");
            Arc::new(NoopHaptics)
        };

        let engine = FlowEngine::new(
            settings.flow,
            store,
            settings.storage.session_key.clone(),
            haptics,
        );

        Ok(Self {
            engine,
            renderer: TerminalRenderer::stdout(settings.shell.dev_controls),
            dev_controls: settings.shell.dev_controls,
            last_painted: None,
        })
    }

    async fn run(mut self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        let now = now_epoch_ms();
        let events = self.engine.hydrate(now);
        self.after(events, now);

        info!("Shell running");

        loop {
            let wait = self.wait_duration(now_epoch_ms());

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down");
                    break;
                }

                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        info!("Input closed, shutting down");
                        break;
                    };

                    let now = now_epoch_ms();
                    let events = match Command::parse(&line, self.dev_controls) {
                        Command::Tap => self.engine.tap(now),
                        Command::Skip => self.engine.skip(now),
                        Command::Reset => self.engine.reset_to_start(now),
                        Command::Quit => break,
                        Command::Help => {
                            self.notice(&help_text(self.dev_controls));
                            continue;
                        }
                        Command::Unknown(cmd) => {
                            self.notice(&format!("Unknown command: {} (h for help)", cmd));
                            continue;
                        }
                    };
                    self.after(events, now);
                }

                // Timers: load advance, dwell, expiry watcher, finale
                _ = tokio::time::sleep(wait) => {
                    let now = now_epoch_ms();
                    let events = self.engine.tick(now);
                    self.after(events, now);
                }
            }
        }

        info!("Shutdown complete");
        Ok(())
    }

    /// Time until the next timer, capped so countdowns keep moving
    fn wait_duration(&self, now: EpochMs) -> Duration {
        let until_deadline = self
            .engine
            .next_deadline()
            .map(|due| Duration::from_millis(due.saturating_sub(now).max(0) as u64));

        match until_deadline {
            Some(wait) => wait.min(REFRESH_INTERVAL),
            None => REFRESH_INTERVAL,
        }
    }

    fn after(&mut self, events: Vec<CoreEvent>, now: EpochMs) {
        for event in &events {
            debug!(?event, "Core event");
            match event {
                CoreEvent::SessionResumed { .. } => {
                    if let Some(started) = self
                        .engine
                        .session()
                        .started_at_epoch_ms
                        .and_then(epoch_ms_to_local)
                    {
                        info!(started_at = %format_datetime_full(&started), "Continuing round");
                    }
                }
                CoreEvent::NodeEntered { .. } => match self.engine.current_node() {
                    Ok((index, Node::Prayer(prayer))) => {
                        debug!(node_index = index, title = %prayer.title, "Showing prayer");
                    }
                    Ok(_) => {}
                    Err(e) => debug!(error = %e, "No node to show"),
                },
                _ => {}
            }
        }
        let frame = self.engine.frame(now);
        self.paint(&frame, now);
    }

    /// Repaint when the visible text changes, and keep the ramp moving
    fn paint(&mut self, frame: &Frame, now: EpochMs) {
        let text = render_frame(frame, now, self.dev_controls);
        if self.last_painted.as_deref() != Some(text.as_str()) {
            if let Err(e) = self.renderer.render(frame) {
                debug!(error = %e, "Render failed");
            }
            self.last_painted = Some(text);
        }

        if let Err(e) = self.renderer.update(&self.engine.animation(now)) {
            debug!(error = %e, "Animation update failed");
        }
    }

    fn notice(&mut self, message: &str) {
        if let Err(e) = self.renderer.notice(message) {
            debug!(error = %e, "Notice failed");
        }
    }
}

/// Open the sqlite store, degrading to memory when it is unavailable
fn open_store(data_dir: &Path) -> Arc<dyn KeyValueStore> {
    let db_path = data_dir.join(DATABASE_FILENAME);

    let opened = std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))
        .and_then(|_| {
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))
        });

    match opened {
        Ok(store) if store.is_healthy() => {
            info!(db_path = %db_path.display(), "Store initialized");
            Arc::new(store)
        }
        Ok(_) => {
            warn!(
                db_path = %db_path.display(),
                "Store unhealthy, progress will not survive a restart"
            );
            Arc::new(MemoryStore::new())
        }
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Store unavailable, progress will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout belongs to the prayer screens
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "rosary starting");

    if is_mock_time_active() {
        warn!("Mock time is active, timestamps are shifted");
    }

    let shell = Shell::new(&args)?;
    shell.run().await
}
