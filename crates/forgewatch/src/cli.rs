//! Clap derive structures for the `forgewatch` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept
//! free of crate-internal imports so `build.rs` can include it directly.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// forgewatch -- predictive-maintenance dashboard in your terminal
#[derive(Debug, Parser)]
#[command(
    name = "forgewatch",
    version,
    about = "Monitor machine health, alerts, and failure predictions from the command line",
    long_about = "A CLI for the forgewatch predictive-maintenance backend.\n\n\
        Browse machines with their latest sensor readings and model verdicts,\n\
        triage alerts, and ask the maintenance assistant questions.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "FORGEWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, env = "FORGEWATCH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FORGEWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, env = "FORGEWATCH_COLOR", default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "FORGEWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, env = "FORGEWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Login(LoginArgs),

    /// Create an account
    Register(RegisterArgs),

    /// Forget the stored session
    Logout,

    /// Show the signed-in user from the stored session
    Whoami,

    /// Fetch the current user's profile from the backend
    Profile,

    /// Browse machines and fleet statistics
    #[command(alias = "m")]
    Machines(MachinesArgs),

    /// List, inspect, and resolve alerts
    #[command(alias = "a")]
    Alerts(AlertsArgs),

    /// Talk to the maintenance assistant
    Chat(ChatArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted when omitted and not in the profile)
    #[arg(long, short = 'e', env = "FORGEWATCH_EMAIL")]
    pub email: Option<String>,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Username (prompted when omitted)
    #[arg(long, short = 'u')]
    pub username: Option<String>,

    /// Account email (prompted when omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Read the password from stdin instead of prompting (used for both fields)
    #[arg(long)]
    pub password_stdin: bool,
}

// ── Machines ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MachinesArgs {
    #[command(subcommand)]
    pub command: MachinesCommand,
}

#[derive(Debug, Subcommand)]
pub enum MachinesCommand {
    /// List machines, optionally searched or filtered
    #[command(alias = "ls")]
    List(MachineListArgs),

    /// Show one machine with readings, diagnostics, and anomalies
    Get {
        /// Machine id (e.g. M14860)
        machine_id: String,
    },

    /// Fleet statistics: type mix, health, severity, averages
    Stats,
}

#[derive(Debug, Args)]
pub struct MachineListArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Rows per page (defaults to the configured page size)
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: Option<u32>,

    /// Search machines by name
    #[arg(long, short = 's', conflicts_with_all = ["machine_type", "risk", "severity"])]
    pub search: Option<String>,

    /// Filter by product type
    #[arg(long = "type", short = 't', conflicts_with_all = ["risk", "severity"])]
    pub machine_type: Option<MachineTypeArg>,

    /// Filter by predicted risk
    #[arg(long, short = 'r', conflicts_with = "severity")]
    pub risk: Option<RiskArg>,

    /// Filter by condition severity
    #[arg(long)]
    pub severity: Option<SeverityArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MachineTypeArg {
    /// Low quality variant (L)
    #[value(alias = "l")]
    Low,
    /// Medium quality variant (M)
    #[value(alias = "m")]
    Medium,
    /// High quality variant (H)
    #[value(alias = "h")]
    High,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RiskArg {
    Healthy,
    Failure,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityArg {
    Low,
    Medium,
    High,
    Critical,
}

// ── Alerts ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts
    #[command(alias = "ls")]
    List {
        /// Only alerts of this severity
        #[arg(long)]
        severity: Option<SeverityArg>,

        /// Hide resolved alerts
        #[arg(long)]
        unresolved: bool,
    },

    /// Show one alert with its prediction and diagnostics
    Get {
        /// Alert id
        id: String,
    },

    /// Mark an alert resolved
    Resolve {
        /// Alert id
        id: String,
    },
}

// ── Chat ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ChatArgs {
    #[command(subcommand)]
    pub command: ChatCommand,
}

#[derive(Debug, Subcommand)]
pub enum ChatCommand {
    /// List past conversations
    History,

    /// Ask the assistant a question
    Send {
        /// Message text
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the current configuration
    Show,

    /// Set a profile value
    Set {
        /// Key: api_url, email, session_store, ca_cert, insecure, timeout
        key: String,
        /// Value
        value: String,
    },

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
