//! All possible UI actions. Actions are the sole mechanism for state mutation.
//!
//! Backend results come back as actions too, with errors already rendered
//! to strings; screens decide how to show them.

use std::fmt;

use forgewatch_core::{
    Alert, ChatExchange, Machine, MachineStatistics, Page, ResourceId, Route, User,
};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Pending confirmation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    ResolveAlert { id: ResourceId, machine: String },
    Logout,
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResolveAlert { id, machine } => {
                write!(f, "Mark alert {id} on {machine} as resolved?")
            }
            Self::Logout => f.write_str("Sign out of this profile?"),
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    Navigate(Route),
    GoBack,

    // ── Overlays ──────────────────────────────────────────────────
    ToggleHelp,
    OpenSearch,
    CloseSearch,
    SearchSubmit(String),
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,
    Notify(Notification),

    // ── Session ───────────────────────────────────────────────────
    LoggedIn(User),
    LoginFailed(String),
    Registered(String),
    RegisterFailed(String),
    LoggedOut,
    ProfileRefreshed(User),

    // ── Machines ──────────────────────────────────────────────────
    StatisticsLoaded {
        seq: u64,
        result: Result<MachineStatistics, String>,
    },
    MachinesLoaded {
        seq: u64,
        result: Result<Page<Machine>, String>,
    },
    OpenMachine(String),
    MachineLoaded {
        seq: u64,
        result: Result<Machine, String>,
    },

    // ── Alerts ────────────────────────────────────────────────────
    AlertsLoaded {
        seq: u64,
        result: Result<Vec<Alert>, String>,
    },
    AlertLoaded {
        seq: u64,
        result: Result<Alert, String>,
    },
    /// Confirmed by the user; the alerts screen sends the request.
    ResolveAlert(ResourceId),
    AlertResolved {
        id: ResourceId,
        result: Result<Option<Alert>, String>,
    },

    // ── Chat ──────────────────────────────────────────────────────
    ChatReplied {
        seq: u64,
        result: Result<String, String>,
    },
    ChatHistoryLoaded {
        seq: u64,
        result: Result<Vec<ChatExchange>, String>,
    },
}

impl Action {
    /// Results and session changes that every screen gets to see.
    pub fn is_broadcast(&self) -> bool {
        matches!(
            self,
            Self::LoggedIn(_)
                | Self::LoginFailed(_)
                | Self::Registered(_)
                | Self::RegisterFailed(_)
                | Self::LoggedOut
                | Self::StatisticsLoaded { .. }
                | Self::MachinesLoaded { .. }
                | Self::OpenMachine(_)
                | Self::MachineLoaded { .. }
                | Self::AlertsLoaded { .. }
                | Self::AlertLoaded { .. }
                | Self::ResolveAlert(_)
                | Self::AlertResolved { .. }
                | Self::ChatReplied { .. }
                | Self::ChatHistoryLoaded { .. }
                | Self::SearchSubmit(_)
                | Self::Tick
        )
    }
}
