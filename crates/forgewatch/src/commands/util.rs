//! Shared helpers for command handlers.

use std::io::{self, BufRead, IsTerminal};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

use forgewatch_core::{MachineType, Risk, Severity};

use crate::cli::{GlobalOpts, MachineTypeArg, RiskArg, SeverityArg};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))?;
    Ok(confirmed)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for a line of text, using `default` when one is known.
pub fn prompt_text(label: &str, default: Option<&str>) -> Result<String, CliError> {
    let mut input = dialoguer::Input::<String>::new().with_prompt(label);
    if let Some(default) = default {
        input = input.default(default.to_owned());
    }
    input.interact_text().map_err(prompt_err)
}

/// Read a password from the first line of stdin, or prompt without echo.
pub fn read_password(from_stdin: bool, prompt: &str) -> Result<SecretString, CliError> {
    let raw = if from_stdin {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password(prompt).map_err(prompt_err)?
    };
    if raw.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(raw))
}

/// Stderr spinner for slow calls. Hidden when quiet or not a terminal.
pub fn spinner(message: &str, global: &GlobalOpts) -> ProgressBar {
    if global.quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Status line on stderr, suppressed by `--quiet`.
pub fn status(message: &str, global: &GlobalOpts) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

// ── Arg → domain conversions ────────────────────────────────────────

impl From<MachineTypeArg> for MachineType {
    fn from(arg: MachineTypeArg) -> Self {
        match arg {
            MachineTypeArg::Low => Self::Low,
            MachineTypeArg::Medium => Self::Medium,
            MachineTypeArg::High => Self::High,
        }
    }
}

impl From<RiskArg> for Risk {
    fn from(arg: RiskArg) -> Self {
        match arg {
            RiskArg::Healthy => Self::Healthy,
            RiskArg::Failure => Self::Failure,
        }
    }
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Low => Self::Low,
            SeverityArg::Medium => Self::Medium,
            SeverityArg::High => Self::High,
            SeverityArg::Critical => Self::Critical,
        }
    }
}
