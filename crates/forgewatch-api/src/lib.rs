// forgewatch-api: Async Rust client for the forgewatch predictive-maintenance backend

pub mod alerts;
pub mod auth;
pub mod chat;
pub mod client;
pub mod error;
pub mod machines;
pub mod models;
pub mod session;
pub mod transport;

pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
pub use error::Error;
pub use models::{
    Alert, AlertData, AlertKind, Anomaly, CalculatedFeatures, ChatExchange, Condition,
    Diagnostics, HealthStatus, Machine, MachineData, MachineStatistics, MachineType,
    MlPrediction, Page, Pagination, PredictionSummary, RegisterResponse, ResourceId, Risk,
    SensorValues, Session, Severity, SeverityCounts, StatusCounts, User, display_value,
};
pub use session::{MemoryStorage, SessionStorage, SessionStore};
pub use transport::{TlsMode, TransportConfig};
