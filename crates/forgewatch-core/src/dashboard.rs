// ── Dashboard coordinator ──
//
// One search box and three filter selectors drive a single machine table.
// At most one criterion is active, so the whole selection is a `Mode`.
// Every change goes through `DashboardState::apply`, which returns a
// `Ticket` when the table needs refetching. Results are handed back via
// `accept` together with the ticket's sequence number; anything but the
// newest ticket is dropped.

use std::fmt;

use tracing::debug;

use forgewatch_api::{Machine, MachineType, Page, Pagination, Risk, Severity};

use crate::pager::{PageItem, page_window};
use crate::sequence::RequestSequence;

/// The active table criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    /// Plain paginated list.
    #[default]
    None,
    Search(String),
    FilterType(MachineType),
    FilterRisk(Risk),
    FilterSeverity(Severity),
}

impl Mode {
    pub fn is_searching(&self) -> bool {
        matches!(self, Self::Search(_))
    }

    pub fn is_filtering(&self) -> bool {
        matches!(
            self,
            Self::FilterType(_) | Self::FilterRisk(_) | Self::FilterSeverity(_)
        )
    }

    pub fn search_term(&self) -> Option<&str> {
        match self {
            Self::Search(term) => Some(term),
            _ => None,
        }
    }

    pub fn selected_type(&self) -> Option<MachineType> {
        match self {
            Self::FilterType(t) => Some(*t),
            _ => None,
        }
    }

    pub fn selected_risk(&self) -> Option<Risk> {
        match self {
            Self::FilterRisk(r) => Some(*r),
            _ => None,
        }
    }

    pub fn selected_severity(&self) -> Option<Severity> {
        match self {
            Self::FilterSeverity(s) => Some(*s),
            _ => None,
        }
    }
}

/// Summary suffix, e.g. ` - type: Low`. Empty for [`Mode::None`].
impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Search(term) => write!(f, " - searching for \"{term}\""),
            Self::FilterType(t) => write!(f, " - type: {}", t.label()),
            Self::FilterRisk(r) => write!(f, " - risk: {r}"),
            Self::FilterSeverity(s) => write!(f, " - severity: {}", s.label()),
        }
    }
}

/// User intents the dashboard reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Search box contents changed. Whitespace-only counts as empty.
    SetSearch(String),
    SelectType(Option<MachineType>),
    SelectRisk(Option<Risk>),
    SelectSeverity(Option<Severity>),
    GoToPage(u32),
    NextPage,
    PrevPage,
    /// Drop every criterion and go back to page 1.
    Reset,
    /// Re-issue the current query (retry after an error).
    Reload,
}

/// What to fetch for the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineQuery {
    pub mode: Mode,
    pub page: u32,
    pub limit: u32,
}

/// A query stamped with its request sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub query: MachineQuery,
}

/// Dashboard table state.
#[derive(Debug, Clone)]
pub struct DashboardState {
    mode: Mode,
    page: u32,
    limit: u32,
    machines: Vec<Machine>,
    pagination: Option<Pagination>,
    loading: bool,
    error: Option<String>,
    sequence: RequestSequence,
}

impl DashboardState {
    pub fn new(limit: u32) -> Self {
        Self {
            mode: Mode::None,
            page: 1,
            limit: limit.max(1),
            machines: Vec::new(),
            pagination: None,
            loading: false,
            error: None,
            sequence: RequestSequence::default(),
        }
    }

    /// Ticket for the initial load.
    pub fn start(&mut self) -> Ticket {
        self.issue()
    }

    /// Back to the initial state, e.g. after sign-out. The sequence keeps
    /// counting so tickets issued before the reset stay stale.
    pub fn reset(&mut self) {
        let mut sequence = self.sequence;
        sequence.issue();
        *self = Self {
            sequence,
            ..Self::new(self.limit)
        };
    }

    /// Apply a transition. Returns a ticket when the table must be
    /// refetched, `None` when nothing changed.
    pub fn apply(&mut self, transition: Transition) -> Option<Ticket> {
        match transition {
            Transition::SetSearch(term) => {
                if term.trim().is_empty() {
                    self.clear_if(Mode::is_searching)
                } else {
                    self.enter(Mode::Search(term))
                }
            }
            Transition::SelectType(Some(t)) => self.enter(Mode::FilterType(t)),
            Transition::SelectType(None) => self.clear_if(|m| matches!(m, Mode::FilterType(_))),
            Transition::SelectRisk(Some(r)) => self.enter(Mode::FilterRisk(r)),
            Transition::SelectRisk(None) => self.clear_if(|m| matches!(m, Mode::FilterRisk(_))),
            Transition::SelectSeverity(Some(s)) => self.enter(Mode::FilterSeverity(s)),
            Transition::SelectSeverity(None) => {
                self.clear_if(|m| matches!(m, Mode::FilterSeverity(_)))
            }
            Transition::GoToPage(page) => self.go_to(page),
            Transition::NextPage => {
                if self.pagination.is_some_and(|p| p.has_next) {
                    self.go_to(self.page + 1)
                } else {
                    None
                }
            }
            Transition::PrevPage => {
                if self.page > 1 && self.pagination.is_some_and(|p| p.has_prev) {
                    self.go_to(self.page - 1)
                } else {
                    None
                }
            }
            Transition::Reset => {
                if self.mode == Mode::None && self.page == 1 {
                    None
                } else {
                    self.mode = Mode::None;
                    self.page = 1;
                    Some(self.issue())
                }
            }
            Transition::Reload => Some(self.issue()),
        }
    }

    /// Hand back the result for ticket `seq`.
    ///
    /// Returns `false` (and changes nothing) when a newer ticket has been
    /// issued since.
    pub fn accept<E: fmt::Display>(&mut self, seq: u64, result: Result<Page<Machine>, E>) -> bool {
        if !self.sequence.is_current(seq) {
            debug!(seq, latest = self.sequence.latest(), "dropping stale machine page");
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.machines = page.items;
                self.pagination = page.pagination;
                self.error = None;
            }
            Err(e) => {
                self.error = Some(format!("Failed to load machines: {e}"));
            }
        }
        true
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Reset Filters is only offered while searching or filtering.
    pub fn can_reset(&self) -> bool {
        self.mode != Mode::None
    }

    /// The query the current state maps to.
    pub fn query(&self) -> MachineQuery {
        MachineQuery {
            mode: self.mode.clone(),
            page: self.page,
            limit: self.limit,
        }
    }

    /// `Page X of Y (N total records)` plus the mode suffix.
    pub fn summary(&self) -> Option<String> {
        self.pagination.map(|p| {
            format!(
                "Page {} of {} ({} total records){}",
                p.current_page, p.total_pages, p.total_records, self.mode
            )
        })
    }

    /// Pager slots for the last accepted pagination.
    pub fn page_items(&self) -> Vec<PageItem> {
        self.pagination
            .map(|p| page_window(p.current_page, p.total_pages))
            .unwrap_or_default()
    }

    // ── Internals ────────────────────────────────────────────────────

    fn enter(&mut self, mode: Mode) -> Option<Ticket> {
        if self.mode == mode {
            return None;
        }
        self.mode = mode;
        self.page = 1;
        Some(self.issue())
    }

    fn clear_if(&mut self, active: impl Fn(&Mode) -> bool) -> Option<Ticket> {
        if active(&self.mode) {
            self.enter(Mode::None)
        } else {
            None
        }
    }

    fn go_to(&mut self, page: u32) -> Option<Ticket> {
        if page == 0 || page == self.page {
            return None;
        }
        if let Some(p) = self.pagination {
            if p.total_pages > 0 && page > p.total_pages {
                return None;
            }
        }
        self.page = page;
        Some(self.issue())
    }

    fn issue(&mut self) -> Ticket {
        self.loading = true;
        self.error = None;
        Ticket {
            seq: self.sequence.issue(),
            query: self.query(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page(ids: &[&str], current: u32, total: u32) -> Page<Machine> {
        Page {
            items: ids
                .iter()
                .map(|id| {
                    serde_json::from_value(serde_json::json!({ "machine_id": id })).unwrap()
                })
                .collect(),
            pagination: Some(Pagination {
                current_page: current,
                total_pages: total,
                total_records: u64::from(total) * 10,
                has_prev: current > 1,
                has_next: current < total,
            }),
        }
    }

    fn loaded(current: u32, total: u32) -> DashboardState {
        let mut state = DashboardState::new(10);
        let ticket = state.start();
        assert!(state.accept::<String>(ticket.seq, Ok(page(&["M_1"], current, total))));
        state
    }

    fn active_criteria(mode: &Mode) -> usize {
        [
            mode.search_term().is_some(),
            mode.selected_type().is_some(),
            mode.selected_risk().is_some(),
            mode.selected_severity().is_some(),
        ]
        .iter()
        .filter(|on| **on)
        .count()
    }

    #[test]
    fn initial_load_is_plain_list_page_one() {
        let mut state = DashboardState::new(10);
        let ticket = state.start();
        assert_eq!(ticket.query.mode, Mode::None);
        assert_eq!(ticket.query.page, 1);
        assert_eq!(ticket.query.limit, 10);
        assert!(state.is_loading());
    }

    #[test]
    fn search_then_filter_clears_search() {
        let mut state = loaded(3, 10);
        state.apply(Transition::GoToPage(3));

        let t = state.apply(Transition::SetSearch("M_H".into())).unwrap();
        assert_eq!(t.query.mode, Mode::Search("M_H".into()));
        assert_eq!(t.query.page, 1);

        let t = state
            .apply(Transition::SelectType(Some(MachineType::High)))
            .unwrap();
        assert_eq!(t.query.mode, Mode::FilterType(MachineType::High));
        assert_eq!(state.mode().search_term(), None);
    }

    #[test]
    fn at_most_one_criterion_after_any_sequence() {
        let mut state = loaded(1, 10);
        let steps = [
            Transition::SetSearch("abc".into()),
            Transition::SelectRisk(Some(Risk::Failure)),
            Transition::SelectSeverity(Some(Severity::High)),
            Transition::SetSearch("x".into()),
            Transition::SelectType(Some(MachineType::Low)),
            Transition::SelectType(None),
            Transition::SelectSeverity(Some(Severity::Critical)),
            Transition::SetSearch("   ".into()),
        ];
        for step in steps {
            state.apply(step);
            assert!(active_criteria(state.mode()) <= 1, "mode: {:?}", state.mode());
        }
    }

    #[test]
    fn every_new_filter_resets_page() {
        let mut state = loaded(4, 10);
        state.apply(Transition::GoToPage(4));
        assert_eq!(state.page(), 4);

        for transition in [
            Transition::SelectType(Some(MachineType::Medium)),
            Transition::SelectRisk(Some(Risk::Healthy)),
            Transition::SelectSeverity(Some(Severity::Low)),
        ] {
            state.apply(Transition::GoToPage(4));
            let ticket = state.apply(transition).unwrap();
            assert_eq!(ticket.query.page, 1);
            assert_eq!(state.page(), 1);
        }
    }

    #[test]
    fn clearing_only_criterion_returns_to_none() {
        let mut state = loaded(1, 10);
        state.apply(Transition::SelectRisk(Some(Risk::Failure)));
        let t = state.apply(Transition::SelectRisk(None)).unwrap();
        assert_eq!(t.query.mode, Mode::None);
        assert_eq!(t.query.page, 1);
    }

    #[test]
    fn clearing_inactive_criterion_is_noop() {
        let mut state = loaded(1, 10);
        state.apply(Transition::SelectRisk(Some(Risk::Failure)));
        assert!(state.apply(Transition::SelectType(None)).is_none());
        assert!(state.apply(Transition::SetSearch(String::new())).is_none());
        assert_eq!(state.mode(), &Mode::FilterRisk(Risk::Failure));
    }

    #[test]
    fn empty_search_leaves_search_mode() {
        let mut state = loaded(1, 10);
        state.apply(Transition::SetSearch("M_".into()));
        let t = state.apply(Transition::SetSearch("  ".into())).unwrap();
        assert_eq!(t.query.mode, Mode::None);
    }

    #[test]
    fn reselecting_same_filter_is_noop() {
        let mut state = loaded(1, 10);
        state.apply(Transition::SelectType(Some(MachineType::Low)));
        assert!(
            state
                .apply(Transition::SelectType(Some(MachineType::Low)))
                .is_none()
        );
    }

    #[test]
    fn page_change_keeps_mode() {
        let mut state = loaded(1, 10);
        state.apply(Transition::SelectSeverity(Some(Severity::High)));
        let t = state.apply(Transition::GoToPage(2)).unwrap();
        assert_eq!(t.query.mode, Mode::FilterSeverity(Severity::High));
        assert_eq!(t.query.page, 2);
    }

    #[test]
    fn next_and_prev_follow_pagination_flags() {
        let mut state = loaded(1, 2);
        assert!(state.apply(Transition::PrevPage).is_none());
        let t = state.apply(Transition::NextPage).unwrap();
        assert_eq!(t.query.page, 2);
        state.accept::<String>(t.seq, Ok(page(&["M_2"], 2, 2)));
        assert!(state.apply(Transition::NextPage).is_none());
        assert_eq!(state.apply(Transition::PrevPage).unwrap().query.page, 1);
    }

    #[test]
    fn go_to_page_bounds() {
        let mut state = loaded(1, 5);
        assert!(state.apply(Transition::GoToPage(0)).is_none());
        assert!(state.apply(Transition::GoToPage(1)).is_none());
        assert!(state.apply(Transition::GoToPage(6)).is_none());
        assert!(state.apply(Transition::GoToPage(5)).is_some());
    }

    #[test]
    fn stale_response_is_dropped() {
        let mut state = loaded(1, 10);
        let filter = state
            .apply(Transition::SelectType(Some(MachineType::High)))
            .unwrap();
        let search = state.apply(Transition::SetSearch("M_L".into())).unwrap();

        // search answers first, then the older filter request lands
        assert!(state.accept::<String>(search.seq, Ok(page(&["M_L_1"], 1, 1))));
        assert!(!state.accept::<String>(filter.seq, Ok(page(&["M_H_9"], 1, 1))));

        assert_eq!(state.machines()[0].machine_id, "M_L_1");
        assert_eq!(state.mode(), &Mode::Search("M_L".into()));
    }

    #[test]
    fn reset_keeps_earlier_tickets_stale() {
        let mut state = loaded(1, 10);
        let before = state
            .apply(Transition::SelectType(Some(MachineType::High)))
            .unwrap();
        state.reset();
        assert_eq!(state.mode(), &Mode::None);
        assert!(state.machines().is_empty());
        assert!(state.pagination().is_none());

        let after = state
            .apply(Transition::SelectType(Some(MachineType::Low)))
            .unwrap();
        assert!(after.seq > before.seq);
        assert!(!state.accept::<String>(before.seq, Ok(page(&["M_H_9"], 1, 1))));
        assert!(state.machines().is_empty());
        assert!(state.is_loading());

        assert!(state.accept::<String>(after.seq, Ok(page(&["M_L_1"], 1, 1))));
        assert_eq!(state.machines()[0].machine_id, "M_L_1");
        assert_eq!(state.mode(), &Mode::FilterType(MachineType::Low));
    }

    #[test]
    fn older_response_cannot_clear_loading() {
        let mut state = loaded(1, 10);
        let first = state.apply(Transition::GoToPage(2)).unwrap();
        let _second = state.apply(Transition::GoToPage(3)).unwrap();
        state.accept::<String>(first.seq, Ok(page(&[], 2, 10)));
        assert!(state.is_loading());
    }

    #[test]
    fn error_then_reload() {
        let mut state = DashboardState::new(10);
        let t = state.start();
        state.accept(t.seq, Err("HTTP error! status: 500"));
        assert_eq!(
            state.error(),
            Some("Failed to load machines: HTTP error! status: 500")
        );
        let retry = state.apply(Transition::Reload).unwrap();
        assert!(state.error().is_none());
        assert_eq!(retry.query, state.query());
    }

    #[test]
    fn reset_only_when_something_to_reset() {
        let mut state = loaded(1, 10);
        assert!(!state.can_reset());
        assert!(state.apply(Transition::Reset).is_none());
        state.apply(Transition::SetSearch("abc".into()));
        assert!(state.can_reset());
        let t = state.apply(Transition::Reset).unwrap();
        assert_eq!(t.query.mode, Mode::None);
    }

    #[test]
    fn summary_mentions_mode() {
        let mut state = loaded(1, 10);
        assert_eq!(
            state.summary().as_deref(),
            Some("Page 1 of 10 (100 total records)")
        );
        let t = state
            .apply(Transition::SelectType(Some(MachineType::Low)))
            .unwrap();
        state.accept::<String>(t.seq, Ok(page(&["M_L_1"], 1, 3)));
        assert_eq!(
            state.summary().as_deref(),
            Some("Page 1 of 3 (30 total records) - type: Low")
        );
        let t = state.apply(Transition::SetSearch("M_1".into())).unwrap();
        state.accept::<String>(t.seq, Ok(page(&["M_1"], 1, 1)));
        assert_eq!(
            state.summary().as_deref(),
            Some("Page 1 of 1 (10 total records) - searching for \"M_1\"")
        );
    }

    #[test]
    fn page_items_follow_pagination() {
        let state = loaded(5, 10);
        let text: Vec<String> = state.page_items().iter().map(ToString::to_string).collect();
        assert_eq!(text, ["1", "...", "3", "4", "5", "6", "7", "...", "10"]);
    }
}
