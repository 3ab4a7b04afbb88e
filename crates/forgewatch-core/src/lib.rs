//! Dashboard state and session services between `forgewatch-api` and the
//! CLI / TUI front ends.
//!
//! - **[`Backend`]**: cheaply cloneable facade owning the API client and the
//!   [`AuthContext`]. Dispatches dashboard queries, maps transport failures
//!   into [`CoreError`], and keeps the signed-in user current.
//!
//! - **[`DashboardState`]**: the machine table as an explicit [`Mode`]
//!   (none, search, or one of three filters) driven by a single
//!   [`Transition`] reducer. Each query is stamped by a [`RequestSequence`]
//!   so late responses for superseded queries are dropped.
//!
//! - **[`AlertPanel`]** and **[`ChatThread`]**: state for the alert list
//!   with its resolve flow, and for the assistant conversation.
//!
//! - **[`page_window`]**, [`detail`], [`route`]: stateless presentation
//!   helpers shared by both front ends.

pub mod alerts;
pub mod auth;
pub mod backend;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod detail;
pub mod error;
pub mod pager;
pub mod route;
pub mod sequence;

// ── Primary re-exports ──────────────────────────────────────────────
pub use alerts::{AlertPanel, AlertTicket, DetailTicket};
pub use auth::{AuthContext, AuthState, Registration};
pub use backend::Backend;
pub use chat::{ChatMessage, ChatSession, ChatThread, SendTicket, Sender};
pub use config::{BackendConfig, TlsVerification};
pub use dashboard::{DashboardState, MachineQuery, Mode, Ticket, Transition};
pub use error::CoreError;
pub use pager::{PageItem, page_window};
pub use route::{Route, guard};
pub use sequence::RequestSequence;

// Re-export the wire model so front ends need only this crate.
pub use forgewatch_api::{
    Alert, AlertKind, Anomaly, ChatExchange, DEFAULT_BASE_URL, HealthStatus, Machine,
    MachineStatistics, MachineType, MemoryStorage, MlPrediction, Page, Pagination, ResourceId, Risk,
    SessionStorage, Severity, User, display_value,
};
