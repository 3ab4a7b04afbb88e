//! Machines screen: fleet statistics above a paged, filterable machine table.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;

use forgewatch_core::{
    Backend, DashboardState, Machine, MachineStatistics, MachineType, RequestSequence, Risk,
    Severity, Ticket, Transition,
};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_request;
use crate::theme;
use crate::widgets::pager::pager_line;

const TYPES: [MachineType; 3] = [MachineType::Low, MachineType::Medium, MachineType::High];
const RISKS: [Risk; 2] = [Risk::Healthy, Risk::Failure];

/// Step a filter through `None → values… → None`.
fn cycle<T: Copy + PartialEq>(current: Option<T>, values: &[T]) -> Option<T> {
    match current {
        None => values.first().copied(),
        Some(v) => values
            .iter()
            .position(|x| *x == v)
            .and_then(|i| values.get(i + 1))
            .copied(),
    }
}

pub struct DashboardScreen {
    backend: Backend,
    action_tx: Option<UnboundedSender<Action>>,
    focused: bool,
    loaded: bool,
    state: DashboardState,
    stats: Option<MachineStatistics>,
    stats_error: Option<String>,
    stats_sequence: RequestSequence,
    table_state: TableState,
    throbber_state: ThrobberState,
}

impl DashboardScreen {
    pub fn new(backend: Backend) -> Self {
        let limit = backend.page_size();
        Self {
            backend,
            action_tx: None,
            focused: false,
            loaded: false,
            state: DashboardState::new(limit),
            stats: None,
            stats_error: None,
            stats_sequence: RequestSequence::default(),
            table_state: TableState::default(),
            throbber_state: ThrobberState::default(),
        }
    }

    fn load(&mut self) {
        self.loaded = true;
        let ticket = self.state.start();
        self.fetch(ticket);
        self.fetch_statistics();
    }

    fn fetch(&self, ticket: Ticket) {
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        let Ticket { seq, query } = ticket;
        spawn_request(
            tx,
            async move { backend.fetch_machines(&query).await },
            move |result| Action::MachinesLoaded { seq, result },
        );
    }

    fn fetch_statistics(&mut self) {
        let seq = self.stats_sequence.issue();
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        spawn_request(
            tx,
            async move { backend.statistics().await },
            move |result| Action::StatisticsLoaded { seq, result },
        );
    }

    fn apply(&mut self, transition: Transition) {
        if let Some(ticket) = self.state.apply(transition) {
            self.fetch(ticket);
        }
    }

    fn selected(&self) -> Option<&Machine> {
        self.state
            .machines()
            .get(self.table_state.selected().unwrap_or(0))
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.state.machines().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = if down {
            (current + 1).min(len - 1)
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Fleet ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(stats) = self.stats.as_ref() else {
            let text = match self.stats_error.as_deref() {
                Some(err) => Span::styled(err.to_owned(), theme::error()),
                None => Span::styled("Loading statistics...", theme::key_hint()),
            };
            frame.render_widget(Paragraph::new(text), inner);
            return;
        };

        let label = |s: &'static str| Span::styled(s, theme::key_hint());
        let value = |s: String| Span::styled(s, Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD));

        let mut types = vec![label("Types  ")];
        for t in TYPES {
            types.push(Span::styled(
                format!("{} {} ({:.1}%)  ", t.label(), stats.type_count(t), stats.type_share(t)),
                Style::default().fg(theme::TEXT),
            ));
        }

        let status = stats.prediction_summary.status;
        let mut severities = vec![label("Severity  ")];
        for s in Severity::FILTERABLE {
            severities.push(Span::styled(
                format!("{} {}  ", s.label(), stats.prediction_summary.severity.get(s)),
                theme::severity(s),
            ));
        }

        let lines = vec![
            Line::from(vec![
                label("Machines "),
                value(stats.total_unique_machines.to_string()),
                label("   Records "),
                value(stats.total_records_processed.to_string()),
                label("   Healthy "),
                Span::styled(status.healthy.to_string(), Style::default().fg(theme::HEALTHY_GREEN)),
                label("   Failure "),
                Span::styled(status.failure.to_string(), theme::error()),
            ]),
            Line::from(types),
            Line::from(severities),
            Line::from(vec![
                label("Averages  "),
                Span::styled(
                    format!(
                        "air {:.1} K  process {:.1} K  speed {:.0} RPM  torque {:.1} Nm  wear {:.0} min",
                        stats.avg_air_temp,
                        stats.avg_process_temp,
                        stats.avg_rotational_speed,
                        stats.avg_torque,
                        stats.avg_tool_wear
                    ),
                    Style::default().fg(theme::TEXT),
                ),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect) {
        let mode = self.state.mode();
        let chip = |key: &'static str, name: &'static str, current: Option<String>| {
            let (text, style) = match current {
                Some(v) => (format!("{name}: {v}"), theme::tab_active()),
                None => (format!("{name}: all"), theme::tab_inactive()),
            };
            vec![
                Span::styled(format!(" {key} "), theme::key_hint_key()),
                Span::styled(format!("{text}  "), style),
            ]
        };

        let mut spans = Vec::new();
        spans.extend(chip("t", "Type", mode.selected_type().map(|t| t.label().to_owned())));
        spans.extend(chip("r", "Risk", mode.selected_risk().map(|r| r.to_string())));
        spans.extend(chip(
            "s",
            "Severity",
            mode.selected_severity().map(|s| s.label().to_owned()),
        ));
        spans.extend(chip("/", "Search", mode.search_term().map(|t| format!("\"{t}\""))));
        if self.state.can_reset() {
            spans.push(Span::styled(" x ", theme::key_hint_key()));
            spans.push(Span::styled("reset filters", theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        if let Some(err) = self.state.error() {
            let lines = vec![
                Line::from(Span::styled(err.to_owned(), theme::error())),
                Line::from(vec![
                    Span::styled("R ", theme::key_hint_key()),
                    Span::styled("retry", theme::key_hint()),
                ]),
            ];
            frame.render_widget(Paragraph::new(lines), area);
            return;
        }
        if self.state.is_loading() && self.state.machines().is_empty() {
            let throbber = Throbber::default()
                .label(" Loading machines...")
                .style(Style::default().fg(theme::TEXT))
                .throbber_style(Style::default().fg(theme::AMBER));
            frame.render_stateful_widget(throbber, area, &mut self.throbber_state.clone());
            return;
        }
        if self.state.machines().is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("No machines found", theme::key_hint())),
                area,
            );
            return;
        }

        let header = Row::new(
            ["Machine", "Type", "Status", "Severity", "Air K", "Proc K", "RPM", "Nm", "Wear", "Issues"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );
        let rows: Vec<Row> = self
            .state
            .machines()
            .iter()
            .map(|m| {
                let issues = m.anomalies().len();
                Row::new(vec![
                    Cell::from(m.machine_id.clone()),
                    Cell::from(m.machine_type.map_or("-", MachineType::label)),
                    Cell::from(m.status().to_string()).style(theme::health(m.status())),
                    Cell::from(m.severity().label()).style(theme::severity(m.severity())),
                    Cell::from(format!("{:.1}", m.air_temperature)),
                    Cell::from(format!("{:.1}", m.process_temperature)),
                    Cell::from(format!("{:.0}", m.rotational_speed)),
                    Cell::from(format!("{:.1}", m.torque)),
                    Cell::from(format!("{:.0}", m.tool_wear)),
                    Cell::from(if issues == 0 { String::new() } else { issues.to_string() })
                        .style(theme::error()),
                ])
                .style(theme::table_row())
            })
            .collect();
        let widths = [
            Constraint::Fill(2),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(5),
            Constraint::Length(6),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("\u{25B8} ");
        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(area);
        if let Some(summary) = self.state.summary() {
            frame.render_widget(
                Paragraph::new(Span::styled(summary, theme::key_hint())),
                rows[0],
            );
        }
        if let Some(p) = self.state.pagination() {
            let line = pager_line(&self.state.page_items(), p.current_page, p.has_prev, p.has_next);
            frame.render_widget(Paragraph::new(line), rows[1]);
        }
    }
}

impl Component for DashboardScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let mode = self.state.mode().clone();
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            KeyCode::Enter => {
                if let Some(m) = self.selected() {
                    return Ok(Some(Action::OpenMachine(m.machine_id.clone())));
                }
            }
            KeyCode::Char('t') => {
                self.apply(Transition::SelectType(cycle(mode.selected_type(), &TYPES)));
            }
            KeyCode::Char('r') => {
                self.apply(Transition::SelectRisk(cycle(mode.selected_risk(), &RISKS)));
            }
            KeyCode::Char('s') => self.apply(Transition::SelectSeverity(cycle(
                mode.selected_severity(),
                &Severity::FILTERABLE,
            ))),
            KeyCode::Char('x') if self.state.can_reset() => self.apply(Transition::Reset),
            KeyCode::Char('R') => {
                self.apply(Transition::Reload);
                self.fetch_statistics();
            }
            KeyCode::Right | KeyCode::Char('n') => self.apply(Transition::NextPage),
            KeyCode::Left | KeyCode::Char('p') => self.apply(Transition::PrevPage),
            KeyCode::Home => self.apply(Transition::GoToPage(1)),
            KeyCode::End => {
                if let Some(total) = self.state.pagination().map(|p| p.total_pages) {
                    self.apply(Transition::GoToPage(total));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::MachinesLoaded { seq, result } => {
                if self.state.accept(*seq, result.clone()) {
                    let select = (!self.state.machines().is_empty()).then_some(0);
                    self.table_state.select(select);
                }
            }
            Action::StatisticsLoaded { seq, result } if self.stats_sequence.is_current(*seq) => {
                match result {
                    Ok(stats) => {
                        self.stats = Some(stats.clone());
                        self.stats_error = None;
                    }
                    Err(e) => self.stats_error = Some(format!("Failed to load statistics: {e}")),
                }
            }
            Action::SearchSubmit(query) => self.apply(Transition::SetSearch(query.clone())),
            Action::LoggedOut => {
                self.state.reset();
                self.stats_sequence.issue();
                self.stats = None;
                self.stats_error = None;
                self.loaded = false;
                self.table_state = TableState::default();
            }
            Action::Tick if self.state.is_loading() => self.throbber_state.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = match self.state.pagination() {
            Some(p) => format!(" Machines ({}) ", p.total_records),
            None => " Machines ".into(),
        };
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let outer = Layout::vertical([Constraint::Length(6), Constraint::Min(6)]).split(area);
        self.render_stats(frame, outer[0]);

        let inner = block.inner(outer[1]);
        frame.render_widget(block, outer[1]);

        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(inner);
        self.render_filters(frame, layout[0]);
        self.render_table(frame, layout[1]);
        self.render_footer(frame, layout[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused && !self.loaded {
            self.load();
        }
    }

    fn hints(&self) -> &'static str {
        "j/k move  Enter open  t/r/s filter  / search  n/p page  R reload"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use forgewatch_core::{BackendConfig, MemoryStorage, Mode, Page, Pagination};

    use super::*;

    fn screen() -> DashboardScreen {
        let config = BackendConfig::from_url("http://127.0.0.1:9").unwrap();
        DashboardScreen::new(Backend::new(config, Arc::new(MemoryStorage::new())).unwrap())
    }

    fn page(ids: &[&str], current: u32, total: u32) -> Page<Machine> {
        Page {
            items: ids
                .iter()
                .map(|id| serde_json::from_value(json!({ "machine_id": id })).unwrap())
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

    fn press(s: &mut DashboardScreen, code: KeyCode) -> Option<Action> {
        s.handle_key_event(KeyEvent::from(code)).unwrap()
    }

    #[test]
    fn cycle_walks_values_then_clears() {
        assert_eq!(cycle(None, &RISKS), Some(Risk::Healthy));
        assert_eq!(cycle(Some(Risk::Healthy), &RISKS), Some(Risk::Failure));
        assert_eq!(cycle(Some(Risk::Failure), &RISKS), None);
    }

    #[test]
    fn first_focus_starts_loading() {
        let mut s = screen();
        s.set_focused(true);
        assert!(s.loaded);
        assert!(s.state.is_loading());
    }

    #[test]
    fn filter_keys_switch_mode() {
        let mut s = screen();
        s.set_focused(true);
        press(&mut s, KeyCode::Char('t'));
        assert_eq!(s.state.mode(), &Mode::FilterType(MachineType::Low));
        press(&mut s, KeyCode::Char('s'));
        assert_eq!(s.state.mode(), &Mode::FilterSeverity(Severity::Low));
        press(&mut s, KeyCode::Char('x'));
        assert_eq!(s.state.mode(), &Mode::None);
    }

    #[test]
    fn loaded_page_selects_first_row_and_opens_it() {
        let mut s = screen();
        s.set_focused(true);
        s.update(&Action::MachinesLoaded {
            seq: 1,
            result: Ok(page(&["M-1", "M-2"], 1, 3)),
        })
        .unwrap();
        assert_eq!(s.state.machines().len(), 2);

        press(&mut s, KeyCode::Down);
        let action = press(&mut s, KeyCode::Enter);
        assert!(matches!(action, Some(Action::OpenMachine(ref id)) if id == "M-2"));

        press(&mut s, KeyCode::Char('n'));
        assert_eq!(s.state.page(), 2);
    }

    #[test]
    fn search_submit_enters_search_mode() {
        let mut s = screen();
        s.set_focused(true);
        s.update(&Action::SearchSubmit("M-14".into())).unwrap();
        assert_eq!(s.state.mode(), &Mode::Search("M-14".into()));
        s.update(&Action::SearchSubmit("   ".into())).unwrap();
        assert_eq!(s.state.mode(), &Mode::None);
    }

    #[test]
    fn logout_forgets_loaded_data() {
        let mut s = screen();
        s.set_focused(true);
        s.update(&Action::LoggedOut).unwrap();
        assert!(!s.loaded);
        assert!(s.stats.is_none());
    }

    #[test]
    fn results_from_before_logout_are_dropped() {
        let mut s = screen();
        s.set_focused(true);
        s.update(&Action::LoggedOut).unwrap();
        s.set_focused(true);

        s.update(&Action::MachinesLoaded {
            seq: 1,
            result: Ok(page(&["USER_A_M_H_9"], 1, 1)),
        })
        .unwrap();
        s.update(&Action::StatisticsLoaded {
            seq: 1,
            result: Ok(MachineStatistics::default()),
        })
        .unwrap();
        assert!(s.state.machines().is_empty());
        assert!(s.state.is_loading());
        assert!(s.stats.is_none());
    }

    #[test]
    fn older_statistics_cannot_overwrite_newer() {
        let mut s = screen();
        s.set_focused(true);
        press(&mut s, KeyCode::Char('R'));

        s.update(&Action::StatisticsLoaded {
            seq: 2,
            result: Ok(MachineStatistics::default()),
        })
        .unwrap();
        s.update(&Action::StatisticsLoaded {
            seq: 1,
            result: Err("HTTP error! status: 500".into()),
        })
        .unwrap();
        assert!(s.stats.is_some());
        assert!(s.stats_error.is_none());
    }
}
