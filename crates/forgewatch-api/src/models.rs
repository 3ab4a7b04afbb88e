// Wire types for the forgewatch backend
//
// Every endpoint has one documented response schema. Optional fields use
// `#[serde(default)]` because the backend omits empty sections, but shapes
// that do not match are rejected rather than coerced. The only tolerated
// variation is a single-resource `data` that arrives as a one-element array.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::Error;

// ── Identifiers ──────────────────────────────────────────────────────

/// Identifier that the backend emits either as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Numeric text becomes `Number`, so ids typed by a user compare equal
/// to ids decoded from the backend.
impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        value
            .trim()
            .parse()
            .map_or_else(|_| Self::Text(value.to_owned()), Self::Number)
    }
}

// ── Envelopes ────────────────────────────────────────────────────────

/// `{ "data": T }`
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// `{ "data": [T], "pagination": {...} }`. A missing `data` is an empty page.
#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Error body shape: `{ "message": "..." }`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// A single resource, or the same resource wrapped in a one-element array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrSingleton<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrSingleton<T> {
    /// Unwrap to the single resource. Empty or multi-element arrays are
    /// rejected.
    pub fn into_single(self, what: &str) -> Result<T, Error> {
        match self {
            Self::One(item) => Ok(item),
            Self::Many(mut items) => {
                if items.len() == 1 {
                    if let Some(item) = items.pop() {
                        return Ok(item);
                    }
                }
                Err(Error::MalformedResponse {
                    message: format!("expected a single {what}, got {} entries", items.len()),
                })
            }
        }
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> From<ListEnvelope<T>> for Page<T> {
    fn from(envelope: ListEnvelope<T>) -> Self {
        Self {
            items: envelope.data,
            pagination: envelope.pagination,
        }
    }
}

/// Server-computed pagination. The client never derives these locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub has_prev: bool,
    #[serde(default)]
    pub has_next: bool,
}

// ── Auth ─────────────────────────────────────────────────────────────

/// Signed-in user record, persisted as JSON under the `user` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Fields the backend adds that we don't model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl User {
    /// Best human-readable name: username, then email, then id.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.email.clone())
            .or_else(|| self.id.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| "unknown".into())
    }
}

/// Tokens and user issued by a successful login.
#[derive(Debug)]
pub struct Session {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// `POST /login` body: `{ "data": { "accessToken", "refreshToken"?, "user"?, "id"? } }`
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginData {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub id: Option<ResourceId>,
}

/// `POST /register` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

// ── Machines ─────────────────────────────────────────────────────────

/// Product quality variant. Travels as `L`/`M`/`H`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
)]
pub enum MachineType {
    #[serde(rename = "L")]
    #[strum(serialize = "L", serialize = "low", ascii_case_insensitive)]
    Low,
    #[serde(rename = "M")]
    #[strum(serialize = "M", serialize = "medium", ascii_case_insensitive)]
    Medium,
    #[serde(rename = "H")]
    #[strum(serialize = "H", serialize = "high", ascii_case_insensitive)]
    High,
}

impl MachineType {
    /// Wire code used in paths and payloads.
    pub fn code(self) -> &'static str {
        match self {
            Self::Low => "L",
            Self::Medium => "M",
            Self::High => "H",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Predicted failure risk class used by the risk filter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Risk {
    Healthy,
    Failure,
}

impl Risk {
    /// Lowercase path segment.
    pub fn code(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Failure => "failure",
        }
    }
}

/// Severity shared by machine conditions, anomalies, and alerts.
///
/// The backend is inconsistent about case (`LOW` vs `low`); decoding is
/// case-insensitive and anything unrecognised becomes `Unknown`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Severities a user can filter by.
    pub const FILTERABLE: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Lowercase path segment.
    pub fn code(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|r| Self::from_str(r.trim()).ok())
            .unwrap_or_default())
    }
}

/// Machine health verdict from the prediction model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::EnumString, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Failure,
    #[default]
    Unknown,
}

impl<'de> Deserialize<'de> for HealthStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|r| Self::from_str(r.trim()).ok())
            .unwrap_or_default())
    }
}

/// One machine with its latest sensor readings and model verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    pub machine_id: String,
    #[serde(rename = "type", default)]
    pub machine_type: Option<MachineType>,
    /// Kelvin.
    #[serde(default)]
    pub air_temperature: f64,
    /// Kelvin.
    #[serde(default)]
    pub process_temperature: f64,
    /// RPM.
    #[serde(default)]
    pub rotational_speed: f64,
    /// Nm.
    #[serde(default)]
    pub torque: f64,
    /// Minutes.
    #[serde(default)]
    pub tool_wear: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_features: Option<CalculatedFeatures>,
}

impl Machine {
    pub fn is_healthy(&self) -> bool {
        self.condition
            .as_ref()
            .is_some_and(|c| c.status == HealthStatus::Healthy)
    }

    pub fn status(&self) -> HealthStatus {
        self.condition.as_ref().map(|c| c.status).unwrap_or_default()
    }

    /// Condition severity, `Unknown` when the model reported none.
    pub fn severity(&self) -> Severity {
        self.condition
            .as_ref()
            .and_then(|c| c.severity)
            .unwrap_or_default()
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        self.condition
            .as_ref()
            .map_or(&[], |c| c.anomalies.as_slice())
    }

    pub fn temperature_diff(&self) -> f64 {
        self.calculated_features
            .as_ref()
            .map_or(0.0, |f| f.temperature_diff)
    }

    pub fn power_w(&self) -> f64 {
        self.calculated_features.as_ref().map_or(0.0, |f| f.power_w)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_health: Option<String>,
}

/// A sensor reading outside its normal range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub parameter: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub normal_range: Value,
    #[serde(default)]
    pub status: Severity,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_alert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CalculatedFeatures {
    #[serde(rename = "Temperature_Diff", default)]
    pub temperature_diff: f64,
    #[serde(rename = "Power_W", default)]
    pub power_w: f64,
}

/// Fleet-wide aggregates from `GET /api/machines/statistics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineStatistics {
    #[serde(default)]
    pub total_records_processed: u64,
    #[serde(default)]
    pub total_unique_machines: u64,
    #[serde(default)]
    pub type_l_count_unique: u64,
    #[serde(default)]
    pub type_m_count_unique: u64,
    #[serde(default)]
    pub type_h_count_unique: u64,
    #[serde(default)]
    pub prediction_summary: PredictionSummary,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub avg_air_temp: f64,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub avg_process_temp: f64,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub avg_rotational_speed: f64,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub avg_torque: f64,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub avg_tool_wear: f64,
}

impl MachineStatistics {
    /// Unique machines of one type.
    pub fn type_count(&self, machine_type: MachineType) -> u64 {
        match machine_type {
            MachineType::Low => self.type_l_count_unique,
            MachineType::Medium => self.type_m_count_unique,
            MachineType::High => self.type_h_count_unique,
        }
    }

    /// Share of unique machines of one type, in percent. Zero when the
    /// fleet is empty.
    #[allow(clippy::cast_precision_loss)]
    pub fn type_share(&self, machine_type: MachineType) -> f64 {
        if self.total_unique_machines == 0 {
            return 0.0;
        }
        self.type_count(machine_type) as f64 / self.total_unique_machines as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionSummary {
    #[serde(default)]
    pub status: StatusCounts,
    #[serde(default)]
    pub severity: SeverityCounts,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct StatusCounts {
    #[serde(default)]
    pub healthy: u64,
    #[serde(default)]
    pub failure: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SeverityCounts {
    #[serde(default)]
    pub low: u64,
    #[serde(default)]
    pub medium: u64,
    #[serde(default)]
    pub high: u64,
    #[serde(default)]
    pub critical: u64,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
            Severity::Unknown => 0,
        }
    }
}

/// Averages arrive as JSON numbers or as numeric strings (`"300.12"`).
fn number_or_numeric_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("number out of range")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}"))),
        other => Err(serde::de::Error::custom(format!(
            "expected a number, got {other}"
        ))),
    }
}

// ── Alerts ───────────────────────────────────────────────────────────

/// Known alert categories raised by the prediction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
pub enum AlertKind {
    #[strum(serialize = "ML_FAILURE_PREDICTED")]
    FailurePredicted,
    #[strum(serialize = "ML_POWER_ANOMALY")]
    PowerAnomaly,
    #[strum(serialize = "ML_TOOL_WEAR_WARNING")]
    ToolWearWarning,
    #[strum(serialize = "ML_TEMPERATURE_ANOMALY")]
    TemperatureAnomaly,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AlertData>,
}

impl Alert {
    pub fn kind(&self) -> AlertKind {
        self.alert_type
            .as_deref()
            .and_then(|t| AlertKind::from_str(t).ok())
            .unwrap_or(AlertKind::Other)
    }

    /// Alert type with underscores shown as spaces.
    pub fn type_label(&self) -> String {
        self.alert_type
            .as_deref()
            .map_or_else(|| "ALERT".into(), |t| t.replace('_', " "))
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.created_at.as_deref()?)
    }

    pub fn resolved_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.resolved_at.as_deref()?)
    }

    /// Preview text, falling back to the full message.
    pub fn summary(&self) -> &str {
        self.message_preview
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("")
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<MlPrediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_data: Option<MachineData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MlPrediction {
    #[serde(default)]
    pub prediction: Value,
    /// Model confidence in `0.0..=1.0`.
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_health: Option<String>,
}

impl MlPrediction {
    /// Confidence as a percentage with one decimal, e.g. `"87.5%"`.
    pub fn confidence_percent(&self) -> Option<String> {
        self.confidence.map(|c| format!("{:.1}%", c * 100.0))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineData {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_values: Option<SensorValues>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SensorValues {
    #[serde(default)]
    pub air_temperature: Option<f64>,
    #[serde(default)]
    pub process_temperature: Option<f64>,
    #[serde(default)]
    pub rotational_speed: Option<f64>,
    #[serde(default)]
    pub torque: Option<f64>,
    #[serde(default)]
    pub tool_wear: Option<f64>,
}

// ── Chat ─────────────────────────────────────────────────────────────

/// One prompt/reply pair from the chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExchange {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub response: String,
}

/// `{ "status": "success", "data": T }`
#[derive(Debug, Deserialize)]
pub(crate) struct StatusEnvelope<T> {
    pub status: Option<String>,
    pub data: Option<T>,
}

impl<T> StatusEnvelope<T> {
    pub fn into_success(self) -> Result<T, Error> {
        match (self.status.as_deref(), self.data) {
            (Some("success"), Some(data)) => Ok(data),
            _ => Err(Error::MalformedResponse {
                message: "Invalid response format".into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatHistoryData {
    #[serde(default)]
    pub message: Vec<ChatExchange>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeneratedReply {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub prompt: &'a str,
}

// ── Display helpers ──────────────────────────────────────────────────

/// Render a loosely typed reading for humans: strings unquoted, arrays as
/// `a - b`, null as empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(" - "),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_ids_from_text() {
        assert_eq!(ResourceId::from("42"), ResourceId::Number(42));
        assert_eq!(
            ResourceId::from("a1f"),
            ResourceId::Text("a1f".into())
        );
    }

    #[test]
    fn severity_is_case_insensitive() {
        let s: Severity = serde_json::from_value(json!("critical")).unwrap();
        assert_eq!(s, Severity::Critical);
        let s: Severity = serde_json::from_value(json!("HIGH")).unwrap();
        assert_eq!(s, Severity::High);
        let s: Severity = serde_json::from_value(json!("bogus")).unwrap();
        assert_eq!(s, Severity::Unknown);
    }

    #[test]
    fn null_severity_and_status_decode_as_unknown() {
        let alerts: Vec<Alert> = serde_json::from_value(json!([
            { "id": 1, "severity": null, "type": "ML_POWER_ANOMALY" },
            { "id": 2, "severity": "LOW", "type": "ML_POWER_ANOMALY" }
        ]))
        .unwrap();
        assert_eq!(alerts[0].severity, Severity::Unknown);
        assert_eq!(alerts[1].severity, Severity::Low);

        let machine: Machine = serde_json::from_value(json!({
            "machine_id": "M_H_3",
            "condition": {
                "status": null,
                "severity": null,
                "anomalies": [ { "parameter": "Torque", "status": null } ]
            }
        }))
        .unwrap();
        assert_eq!(machine.status(), HealthStatus::Unknown);
        assert_eq!(machine.severity(), Severity::Unknown);
        assert_eq!(machine.anomalies()[0].status, Severity::Unknown);
    }

    #[test]
    fn singleton_array_unwraps() {
        let raw: OneOrSingleton<User> =
            serde_json::from_value(json!([{ "id": 1, "email": "a@b.c" }])).unwrap();
        let user = raw.into_single("user").unwrap();
        assert_eq!(user.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn multi_element_array_is_rejected() {
        let raw: OneOrSingleton<User> =
            serde_json::from_value(json!([{ "id": 1 }, { "id": 2 }])).unwrap();
        let err = raw.into_single("user").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse { .. }));
    }

    #[test]
    fn machine_derivations_default_sensibly() {
        let machine: Machine = serde_json::from_value(json!({
            "machine_id": "M_L_15",
            "type": "L",
            "air_temperature": 302.5
        }))
        .unwrap();
        assert_eq!(machine.machine_type, Some(MachineType::Low));
        assert!(!machine.is_healthy());
        assert_eq!(machine.severity(), Severity::Unknown);
        assert!(machine.anomalies().is_empty());
        assert!(machine.temperature_diff().abs() < f64::EPSILON);
    }

    #[test]
    fn statistics_accept_string_averages() {
        let stats: MachineStatistics = serde_json::from_value(json!({
            "total_unique_machines": 4,
            "type_l_count_unique": 1,
            "avg_air_temp": "300.25",
            "avg_torque": 40.5,
            "prediction_summary": { "status": { "HEALTHY": 3, "FAILURE": 1 } }
        }))
        .unwrap();
        assert!((stats.avg_air_temp - 300.25).abs() < 1e-9);
        assert!((stats.type_share(MachineType::Low) - 25.0).abs() < 1e-9);
        assert_eq!(stats.prediction_summary.status.failure, 1);
        assert!(stats.type_share(MachineType::High).abs() < f64::EPSILON);
    }

    #[test]
    fn type_share_is_zero_for_empty_fleet() {
        let stats = MachineStatistics::default();
        assert!(stats.type_share(MachineType::Medium).abs() < f64::EPSILON);
    }

    #[test]
    fn alert_kind_and_label() {
        let alert: Alert = serde_json::from_value(json!({
            "id": 12,
            "type": "ML_TOOL_WEAR_WARNING",
            "severity": "high"
        }))
        .unwrap();
        assert_eq!(alert.kind(), AlertKind::ToolWearWarning);
        assert_eq!(alert.type_label(), "ML TOOL WEAR WARNING");
        assert!(!alert.resolved);
        assert_eq!(alert.id.to_string(), "12");
    }

    #[test]
    fn confidence_renders_one_decimal() {
        let p = MlPrediction {
            confidence: Some(0.875),
            ..MlPrediction::default()
        };
        assert_eq!(p.confidence_percent().as_deref(), Some("87.5%"));
    }

    #[test]
    fn display_value_flattens_ranges() {
        assert_eq!(display_value(&json!([295, 305])), "295 - 305");
        assert_eq!(display_value(&json!("high")), "high");
        assert_eq!(display_value(&Value::Null), "");
    }
}
