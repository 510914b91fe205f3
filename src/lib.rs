//! DDNS Agent - Keep a dynamic DNS record fresh from the background
//!
//! Periodically calls a dynamic DNS provider's update URL, tracks whether
//! the last call worked, and shows that in a small window with an optional
//! tray presence.
//!
//! ## Architecture
//!
//! - **Config**: the persisted `{url, interval}` record and its store
//! - **Updater**: one-shot update attempts over HTTP
//! - **Agents**: the polling worker and its start/stop lifecycle
//! - **Controller**: the UI-thread side, turning user intent into agent calls
//! - **UI / Tray**: presentation boundaries, with console implementations and
//!   a native tray icon behind the `system-tray` feature
//! - **Install**: best-effort relocation and autostart registration
//! - **Security**: keeping URL secrets out of logs and the screen
//!
//! ## Threads
//!
//! The UI thread owns the controller and the view. The polling worker runs
//! on a single-threaded tokio runtime and talks to the UI thread only by
//! sending [`controller::UiEvent`]s.

pub mod agents;
pub mod commands;
pub mod config;
pub mod controller;
pub mod install;
pub mod security;
pub mod tray;
pub mod ui;
pub mod updater;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc::{self, UnboundedSender};

use agents::UpdateAgent;
use commands::UserCommand;
use config::{ConfigStore, CONFIG_FILE_NAME};
use controller::{AgentController, UiEvent};
use install::{Installer, Relocation};
#[cfg(feature = "system-tray")]
use tray::FallbackTray;
use tray::{ConsoleTray, Tray, TrayCommand};
use ui::ConsoleView;
use updater::HttpUpdater;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "ddns-agent")]
#[command(about = "Dynamic DNS agent - periodically calls your DDNS update URL")]
#[command(version)]
pub struct Args {
    /// Config file to use instead of the default location
    #[arg(long, env = "DDNS_AGENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Copy the agent into its base directory and register it to start on login
    #[arg(long)]
    pub install: bool,

    /// Base directory used by --install (also holds the config file)
    #[arg(long, requires = "install")]
    pub install_dir: Option<PathBuf>,
}

impl Args {
    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| self.install_dir.as_ref().map(|d| d.join(CONFIG_FILE_NAME)))
            .or_else(config::default_config_path)
    }
}

// ============================================================================
// Entry Point
// ============================================================================

/// Initializes logging and runs the agent until the user exits
pub fn run() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run_with(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    // Logs go to stderr; stdout belongs to the console window
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,ddns_agent_lib=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_with(args: Args) -> anyhow::Result<ExitCode> {
    tracing::info!("Starting DDNS agent...");

    if args.install {
        match args.install_dir.clone().or_else(config::base_dir) {
            Some(base_dir) => {
                if Installer::new(base_dir).prepare() == Relocation::Relaunched {
                    return Ok(ExitCode::SUCCESS);
                }
            }
            None => tracing::warn!("No base directory on this platform, skipping install"),
        }
    }

    let config_path = args
        .config_path()
        .context("Could not determine config path, pass --config")?;
    let store = Arc::new(ConfigStore::open(config_path));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("ddns-worker")
        .enable_all()
        .build()
        .context("Failed to start worker runtime")?;

    let updater = Arc::new(HttpUpdater::new().context("Failed to create HTTP client")?);
    let agent = Arc::new(UpdateAgent::new(updater, runtime.handle().clone()));

    let (events, mut inbox) = mpsc::unbounded_channel();
    spawn_input_reader(events.clone()).context("Failed to start console input")?;

    let ctrl_c = events.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c.send(UiEvent::Tray(TrayCommand::Exit));
        }
    });

    let tray = build_tray(&events);
    let mut controller =
        AgentController::new(store, agent, Box::new(ConsoleView::stdout()), tray, events);
    tracing::info!("DDNS agent initialized successfully");

    while let Some(event) = inbox.blocking_recv() {
        if controller.dispatch(event).is_break() {
            break;
        }
    }

    // The worker is abandoned, not joined
    drop(controller);
    runtime.shutdown_background();
    Ok(ExitCode::SUCCESS)
}

/// The native tray icon when built with it, the console otherwise
fn build_tray(events: &UnboundedSender<UiEvent>) -> Box<dyn Tray> {
    #[cfg(feature = "system-tray")]
    {
        Box::new(FallbackTray::new(
            Box::new(tray::SystemTray::new(events.clone())),
            Box::new(ConsoleTray::stdout()),
        ))
    }

    #[cfg(not(feature = "system-tray"))]
    {
        let _ = events;
        Box::new(ConsoleTray::stdout())
    }
}

/// Reads console lines on their own thread and forwards them to the UI thread
fn spawn_input_reader(events: UnboundedSender<UiEvent>) -> io::Result<()> {
    thread::Builder::new()
        .name("console-input".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Failed to read console input: {}", e);
                        break;
                    }
                };
                if events.send(UiEvent::User(UserCommand::parse(&line))).is_err() {
                    return;
                }
            }
            let _ = events.send(UiEvent::InputClosed);
        })?;
    Ok(())
}
