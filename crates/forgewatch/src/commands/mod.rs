//! Command dispatch: bridges CLI args -> backend calls -> output formatting.

pub mod alerts;
pub mod auth;
pub mod chat;
pub mod config_cmd;
pub mod machines;
pub mod util;

use forgewatch_core::Backend;

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    backend: &Backend,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(backend, args, resolved, global).await,
        Command::Register(args) => auth::register(backend, args, global).await,
        Command::Logout => auth::logout(backend, global),
        Command::Whoami => auth::whoami(backend, global),
        Command::Profile => auth::profile(backend, global).await,
        Command::Machines(args) => machines::handle(backend, args, global).await,
        Command::Alerts(args) => alerts::handle(backend, args, global).await,
        Command::Chat(args) => chat::handle(backend, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
