//! `forgewatch-tui`: terminal dashboard for machine health monitoring.
//!
//! Built on [ratatui](https://ratatui.rs). Screens are reachable with the
//! number keys: Machines (fleet statistics and the paged machine table),
//! Alerts, and the maintenance Assistant. Machine detail opens from the
//! table. Without a stored session the app starts on the sign-in form.
//!
//! Logs go to a file in the data directory so they never corrupt the
//! terminal. Backend calls run as background tasks whose results come
//! back through the action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use forgewatch_core::Backend;

use crate::app::App;

/// Terminal dashboard for machine health, alerts, and the maintenance assistant.
#[derive(Parser, Debug)]
#[command(name = "forgewatch-tui", version, about)]
struct Cli {
    /// Profile to use
    #[arg(short, long, env = "FORGEWATCH_PROFILE")]
    profile: Option<String>,

    /// Backend URL, overriding the profile
    #[arg(long, env = "FORGEWATCH_API_URL")]
    api_url: Option<String>,

    /// Log file path (defaults to forgewatch-tui.log in the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// File-based tracing. Nothing may be written to stdout/stderr while the
/// terminal is in raw mode. Hold the guard until exit so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = &cli.log_level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "forgewatch_tui={log_level},forgewatch_core={log_level},forgewatch_api={log_level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| forgewatch_config::data_dir().join("forgewatch-tui.log"));
    let log_dir = log_file.parent().unwrap_or(Path::new("."));
    let _ = std::fs::create_dir_all(log_dir);
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("forgewatch-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Resolve the profile and build the backend it describes.
fn build_backend(cli: &Cli) -> Result<(Backend, Option<String>)> {
    let cfg = forgewatch_config::load_config()?;
    let profile_name = cfg.profile_name(cli.profile.as_deref());
    let mut profile = cfg.profile_or_default(&profile_name);
    if let Some(ref url) = cli.api_url {
        profile.api_url.clone_from(url);
    }

    let config = forgewatch_config::profile_to_backend_config(&profile, &cfg.defaults)?;
    let storage = forgewatch_config::session_storage(&profile_name, profile.session_store);
    info!(
        profile = %profile_name,
        url = %config.url,
        "starting forgewatch-tui"
    );
    Ok((Backend::new(config, storage)?, profile.email))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal enters raw mode
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let (backend, email) = build_backend(&cli)?;
    let mut app = App::new(backend, email);
    app.run().await?;

    Ok(())
}
