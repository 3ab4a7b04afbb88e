// Alert endpoints

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Alert, DataEnvelope, ListEnvelope, OneOrSingleton, Severity};

impl ApiClient {
    /// `GET /api/alerts`
    pub async fn list_alerts(&self) -> Result<Vec<Alert>, Error> {
        let url = self.endpoint(&["api", "alerts"])?;
        let resp: ListEnvelope<Alert> = self.get(url).await?;
        Ok(resp.data)
    }

    /// `GET /api/alerts/{id}`
    pub async fn alert(&self, id: &str) -> Result<Alert, Error> {
        let url = self.endpoint(&["api", "alerts", id])?;
        let resp: DataEnvelope<OneOrSingleton<Alert>> = self.get(url).await?;
        resp.data.into_single("alert")
    }

    /// `GET /api/alerts/severity/{low|medium|high|critical}`
    pub async fn alerts_by_severity(&self, severity: Severity) -> Result<Vec<Alert>, Error> {
        let url = self.endpoint(&["api", "alerts", "severity", severity.code()])?;
        let resp: ListEnvelope<Alert> = self.get(url).await?;
        Ok(resp.data)
    }

    /// Mark an alert resolved.
    ///
    /// `PATCH /api/alerts/{id}/resolve`. Success is the 2xx status; the
    /// updated alert is returned when the body's `data` is one.
    pub async fn resolve_alert(&self, id: &str) -> Result<Option<Alert>, Error> {
        let url = self.endpoint(&["api", "alerts", id, "resolve"])?;
        debug!(id, "resolving alert");
        let resp: serde_json::Value = self.patch(url).await?;
        Ok(resp
            .get("data")
            .cloned()
            .and_then(|data| serde_json::from_value::<OneOrSingleton<Alert>>(data).ok())
            .and_then(|data| data.into_single("alert").ok()))
    }
}
