// ── Alert panel ──
//
// Alert list with an optional server-side severity filter, a detail
// view for one alert, and the one-way resolve transition. List and detail
// fetches are sequence-stamped like the dashboard table.

use std::fmt;

use tracing::debug;

use forgewatch_api::{Alert, ResourceId, Severity};

use crate::sequence::RequestSequence;

/// Stamped request for the alert list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTicket {
    pub seq: u64,
    pub severity: Option<Severity>,
}

/// Stamped request for one alert's detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub seq: u64,
    pub id: ResourceId,
}

#[derive(Debug, Clone, Default)]
pub struct AlertPanel {
    alerts: Vec<Alert>,
    filter: Option<Severity>,
    loading: bool,
    error: Option<String>,
    selected: Option<Alert>,
    detail_loading: bool,
    resolving: Option<ResourceId>,
    resolve_error: Option<String>,
    list_sequence: RequestSequence,
    detail_sequence: RequestSequence,
}

impl AlertPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything loaded, e.g. after sign-out. Requests issued
    /// before the reset can no longer be applied.
    pub fn reset(&mut self) {
        let mut list_sequence = self.list_sequence;
        let mut detail_sequence = self.detail_sequence;
        list_sequence.issue();
        detail_sequence.issue();
        *self = Self {
            list_sequence,
            detail_sequence,
            ..Self::default()
        };
    }

    // ── List ─────────────────────────────────────────────────────────

    /// Refetch under the current filter.
    pub fn refresh(&mut self) -> AlertTicket {
        self.loading = true;
        self.error = None;
        AlertTicket {
            seq: self.list_sequence.issue(),
            severity: self.filter,
        }
    }

    /// Change the severity filter. `None` shows every alert.
    pub fn set_filter(&mut self, severity: Option<Severity>) -> Option<AlertTicket> {
        if self.filter == severity {
            return None;
        }
        self.filter = severity;
        Some(self.refresh())
    }

    pub fn accept_list<E: fmt::Display>(&mut self, seq: u64, result: Result<Vec<Alert>, E>) -> bool {
        if !self.list_sequence.is_current(seq) {
            debug!(seq, "dropping stale alert list");
            return false;
        }
        self.loading = false;
        match result {
            Ok(alerts) => {
                self.alerts = alerts;
                self.error = None;
            }
            Err(e) => self.error = Some(format!("Failed to fetch alerts: {e}")),
        }
        true
    }

    // ── Detail ───────────────────────────────────────────────────────

    /// Open the detail view for `id`. The list entry is shown until the
    /// full detail arrives.
    pub fn open(&mut self, id: ResourceId) -> DetailTicket {
        self.selected = self.alerts.iter().find(|a| a.id == id).cloned();
        self.detail_loading = true;
        self.resolve_error = None;
        DetailTicket {
            seq: self.detail_sequence.issue(),
            id,
        }
    }

    pub fn accept_detail<E: fmt::Display>(&mut self, seq: u64, result: Result<Alert, E>) -> bool {
        if !self.detail_sequence.is_current(seq) {
            return false;
        }
        self.detail_loading = false;
        match result {
            Ok(alert) => self.selected = Some(alert),
            Err(e) => debug!(error = %e, "alert detail failed"),
        }
        true
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.detail_loading = false;
        self.resolve_error = None;
        // orphan any in-flight detail fetch
        self.detail_sequence.issue();
    }

    // ── Resolve ──────────────────────────────────────────────────────

    /// Whether the resolve control is offered for `id`.
    pub fn can_resolve(&self, id: &ResourceId) -> bool {
        if self.resolving.as_ref() == Some(id) {
            return false;
        }
        self.find(id)
            .or(self.selected.as_ref().filter(|a| &a.id == id))
            .is_some_and(|a| !a.resolved)
    }

    /// Start resolving `id`. Returns `false` when resolving is not allowed.
    pub fn begin_resolve(&mut self, id: &ResourceId) -> bool {
        if !self.can_resolve(id) {
            return false;
        }
        self.resolving = Some(id.clone());
        self.resolve_error = None;
        true
    }

    /// Record the resolve outcome. On success the entry flips to resolved
    /// in place and a list refetch under the current filter is returned.
    /// Outcomes for an id that is not being resolved are ignored.
    pub fn finish_resolve<E: fmt::Display>(
        &mut self,
        id: &ResourceId,
        result: Result<Option<Alert>, E>,
    ) -> Option<AlertTicket> {
        if self.resolving.as_ref() != Some(id) {
            debug!(%id, "dropping resolve outcome with nothing pending");
            return None;
        }
        self.resolving = None;
        match result {
            Ok(updated) => {
                self.mark_resolved(id, updated);
                Some(self.refresh())
            }
            Err(e) => {
                self.resolve_error = Some(format!("Failed to resolve alert: {e}"));
                None
            }
        }
    }

    /// Flip `id` to resolved in the list and in the detail view.
    pub fn mark_resolved(&mut self, id: &ResourceId, updated: Option<Alert>) {
        if let Some(entry) = self.alerts.iter_mut().find(|a| &a.id == id) {
            entry.resolved = true;
        }
        if let Some(selected) = self.selected.as_mut().filter(|a| &a.id == id) {
            match updated {
                Some(mut alert) => {
                    alert.resolved = true;
                    *selected = alert;
                }
                None => selected.resolved = true,
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn find(&self, id: &ResourceId) -> Option<&Alert> {
        self.alerts.iter().find(|a| &a.id == id)
    }

    pub fn filter(&self) -> Option<Severity> {
        self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected(&self) -> Option<&Alert> {
        self.selected.as_ref()
    }

    pub fn is_detail_loading(&self) -> bool {
        self.detail_loading
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving.is_some()
    }

    /// The alert a resolve request is pending for.
    pub fn resolving(&self) -> Option<&ResourceId> {
        self.resolving.as_ref()
    }

    pub fn resolve_error(&self) -> Option<&str> {
        self.resolve_error.as_deref()
    }

    pub fn unresolved_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.resolved).count()
    }
}
