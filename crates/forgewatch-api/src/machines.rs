// Machine endpoints
//
// Every list variant (plain, search, type/risk/severity filters) returns
// the same `{data, pagination}` envelope and takes the same page/limit pair.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{
    DataEnvelope, ListEnvelope, Machine, MachineStatistics, MachineType, OneOrSingleton, Page,
    Risk, Severity,
};

fn paging(page: u32, limit: u32) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("limit", limit.to_string())]
}

impl ApiClient {
    /// `GET /api/machines?page&limit`
    pub async fn list_machines(&self, page: u32, limit: u32) -> Result<Page<Machine>, Error> {
        let url = self.endpoint_with_query(&["api", "machines"], &paging(page, limit))?;
        let resp: ListEnvelope<Machine> = self.get(url).await?;
        Ok(resp.into())
    }

    /// `GET /api/machines/search?name&page&limit`
    pub async fn search_machines(
        &self,
        term: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<Machine>, Error> {
        let [page_param, limit_param] = paging(page, limit);
        let url = self.endpoint_with_query(
            &["api", "machines", "search"],
            &[("name", term.to_owned()), page_param, limit_param],
        )?;
        debug!(term, page, "searching machines");
        let resp: ListEnvelope<Machine> = self.get(url).await?;
        Ok(resp.into())
    }

    /// `GET /api/machines/type/{L|M|H}?page&limit`
    pub async fn machines_by_type(
        &self,
        machine_type: MachineType,
        page: u32,
        limit: u32,
    ) -> Result<Page<Machine>, Error> {
        let url = self.endpoint_with_query(
            &["api", "machines", "type", machine_type.code()],
            &paging(page, limit),
        )?;
        let resp: ListEnvelope<Machine> = self.get(url).await?;
        Ok(resp.into())
    }

    /// `GET /api/machines/risk/{healthy|failure}?page&limit`
    pub async fn machines_by_risk(
        &self,
        risk: Risk,
        page: u32,
        limit: u32,
    ) -> Result<Page<Machine>, Error> {
        let url = self.endpoint_with_query(
            &["api", "machines", "risk", risk.code()],
            &paging(page, limit),
        )?;
        let resp: ListEnvelope<Machine> = self.get(url).await?;
        Ok(resp.into())
    }

    /// `GET /api/machines/severity/{low|medium|high|critical}?page&limit`
    pub async fn machines_by_severity(
        &self,
        severity: Severity,
        page: u32,
        limit: u32,
    ) -> Result<Page<Machine>, Error> {
        let url = self.endpoint_with_query(
            &["api", "machines", "severity", severity.code()],
            &paging(page, limit),
        )?;
        let resp: ListEnvelope<Machine> = self.get(url).await?;
        Ok(resp.into())
    }

    /// One machine by its `machine_id`.
    ///
    /// `GET /api/machines/{id}`. The backend sometimes wraps the machine
    /// in a one-element array; that is unwrapped here.
    pub async fn machine(&self, machine_id: &str) -> Result<Machine, Error> {
        let url = self.endpoint(&["api", "machines", machine_id])?;
        let resp: DataEnvelope<OneOrSingleton<Machine>> = self.get(url).await?;
        resp.data.into_single("machine")
    }

    /// `GET /api/machines/statistics`
    pub async fn machine_statistics(&self) -> Result<MachineStatistics, Error> {
        let url = self.endpoint(&["api", "machines", "statistics"])?;
        let resp: DataEnvelope<MachineStatistics> = self.get(url).await?;
        Ok(resp.data)
    }
}
