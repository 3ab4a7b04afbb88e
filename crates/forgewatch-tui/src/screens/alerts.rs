//! Alerts screen: severity-filtered alert list, detail modal, and resolve.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;

use forgewatch_core::{
    Alert, AlertPanel, AlertTicket, Backend, MlPrediction, ResourceId, Severity, display_value,
};

use crate::action::{Action, ConfirmAction, Notification};
use crate::component::Component;
use crate::data_bridge::spawn_request;
use crate::theme;
use crate::widgets::centered;

fn next_filter(current: Option<Severity>) -> Option<Severity> {
    let all = Severity::FILTERABLE;
    match current {
        None => Some(all[0]),
        Some(s) => all
            .iter()
            .position(|x| *x == s)
            .and_then(|i| all.get(i + 1))
            .copied(),
    }
}

fn created_label(alert: &Alert) -> String {
    alert.created().map_or_else(
        || alert.created_at.clone().unwrap_or_default(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

pub struct AlertsScreen {
    backend: Backend,
    action_tx: Option<UnboundedSender<Action>>,
    focused: bool,
    panel: AlertPanel,
    table_state: TableState,
    modal_open: bool,
    throbber_state: ThrobberState,
}

impl AlertsScreen {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            action_tx: None,
            focused: false,
            panel: AlertPanel::new(),
            table_state: TableState::default(),
            modal_open: false,
            throbber_state: ThrobberState::default(),
        }
    }

    fn fetch(&self, ticket: AlertTicket) {
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        let AlertTicket { seq, severity } = ticket;
        spawn_request(
            tx,
            async move { backend.alerts(severity).await },
            move |result| Action::AlertsLoaded { seq, result },
        );
    }

    fn open_detail(&mut self, id: ResourceId) {
        let ticket = self.panel.open(id);
        self.modal_open = true;
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        let seq = ticket.seq;
        let id = ticket.id;
        spawn_request(
            tx,
            async move { backend.alert(&id).await },
            move |result| Action::AlertLoaded { seq, result },
        );
    }

    fn close_detail(&mut self) {
        self.panel.close();
        self.modal_open = false;
    }

    fn resolve(&mut self, id: &ResourceId) {
        if !self.panel.begin_resolve(id) {
            return;
        }
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        let id = id.clone();
        let reply_id = id.clone();
        spawn_request(
            tx,
            async move { backend.resolve_alert(&id).await },
            move |result| Action::AlertResolved { id: reply_id, result },
        );
    }

    /// The alert keys act on: the open modal, else the highlighted row.
    fn target(&self) -> Option<&Alert> {
        if self.modal_open {
            return self.panel.selected();
        }
        self.panel
            .alerts()
            .get(self.table_state.selected().unwrap_or(0))
    }

    fn confirm_resolve(&self) -> Option<Action> {
        let alert = self.target()?;
        if !self.panel.can_resolve(&alert.id) {
            return None;
        }
        Some(Action::ShowConfirm(ConfirmAction::ResolveAlert {
            id: alert.id.clone(),
            machine: alert.machine_id.clone().unwrap_or_else(|| "unknown machine".into()),
        }))
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.panel.alerts().len();
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

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        if let Some(err) = self.panel.error() {
            frame.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(err.to_owned(), theme::error())),
                    Line::from(vec![
                        Span::styled("R ", theme::key_hint_key()),
                        Span::styled("retry", theme::key_hint()),
                    ]),
                ]),
                area,
            );
            return;
        }
        if self.panel.alerts().is_empty() {
            if self.panel.is_loading() {
                let throbber = Throbber::default()
                    .label(" Loading alerts...")
                    .style(Style::default().fg(theme::TEXT))
                    .throbber_style(Style::default().fg(theme::AMBER));
                frame.render_stateful_widget(throbber, area, &mut self.throbber_state.clone());
            } else {
                frame.render_widget(
                    Paragraph::new(Span::styled("No alerts", theme::key_hint())),
                    area,
                );
            }
            return;
        }

        let header = Row::new(
            ["Severity", "Type", "Machine", "Created", "State", "Message"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );
        let rows: Vec<Row> = self
            .panel
            .alerts()
            .iter()
            .map(|a| {
                let state = if a.resolved {
                    Cell::from("resolved").style(theme::key_hint())
                } else {
                    Cell::from("open").style(theme::error())
                };
                Row::new(vec![
                    Cell::from(a.severity.label()).style(theme::severity(a.severity)),
                    Cell::from(a.type_label()),
                    Cell::from(a.machine_id.clone().unwrap_or_default()),
                    Cell::from(created_label(a)),
                    state,
                    Cell::from(a.summary().to_owned()),
                ])
                .style(if a.resolved {
                    theme::key_hint()
                } else {
                    theme::table_row()
                })
            })
            .collect();
        let widths = [
            Constraint::Length(9),
            Constraint::Length(24),
            Constraint::Length(10),
            Constraint::Length(17),
            Constraint::Length(9),
            Constraint::Fill(1),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("\u{25B8} ");
        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn detail_lines(&self, alert: &Alert) -> Vec<Line<'static>> {
        let field = |label: &'static str, value: String, style: Style| {
            Line::from(vec![
                Span::styled(format!("{label:<14}"), theme::key_hint()),
                Span::styled(value, style),
            ])
        };
        let text = Style::default().fg(theme::TEXT);

        let mut lines = vec![
            field("Type", alert.type_label(), text.add_modifier(Modifier::BOLD)),
            field("Severity", alert.severity.label().into(), theme::severity(alert.severity)),
            field("Machine", alert.machine_id.clone().unwrap_or_default(), text),
            field("Created", created_label(alert), text),
        ];
        if alert.resolved {
            let by = alert
                .resolved_by
                .as_ref()
                .map(|u| format!(" by {u}"))
                .unwrap_or_default();
            let at = alert
                .resolved_time()
                .map(|t| t.format(" %Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            lines.push(field(
                "State",
                format!("resolved{at}{by}"),
                Style::default().fg(theme::HEALTHY_GREEN),
            ));
        } else {
            lines.push(field("State", "open".into(), theme::error()));
        }

        if let Some(message) = alert.message.as_deref().or(alert.message_preview.as_deref()) {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(message.to_owned(), text)));
        }

        if let Some(data) = alert.data.as_ref() {
            if let Some(confidence) = data.ml_prediction.as_ref().and_then(MlPrediction::confidence_percent) {
                lines.push(Line::from(""));
                lines.push(field("Confidence", confidence, text));
            }
            if let Some(diag) = data.diagnostics.as_ref() {
                if let Some(ref cause) = diag.primary_cause {
                    lines.push(field("Cause", cause.clone(), text));
                }
                if let Some(ref action) = diag.recommended_action {
                    lines.push(field("Action", action.clone(), text));
                }
            }
            for a in &data.anomalies {
                lines.push(Line::from(vec![
                    Span::styled(format!("{} ", a.status.label()), theme::severity(a.status)),
                    Span::styled(format!("{} ", a.parameter), text),
                    Span::styled(display_value(&a.value), theme::error()),
                ]));
            }
        }

        if self.panel.is_resolving() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Resolving...", theme::key_hint())));
        } else if let Some(err) = self.panel.resolve_error() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(err.to_owned(), theme::error())));
        }
        lines
    }

    fn render_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = centered(area, 72, 22);
        frame.render_widget(Clear, modal);
        let block = Block::default()
            .title(" Alert ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(modal);
        frame.render_widget(block, modal);

        let Some(alert) = self.panel.selected() else {
            let throbber = Throbber::default()
                .label(" Loading alert...")
                .style(Style::default().fg(theme::TEXT))
                .throbber_style(Style::default().fg(theme::AMBER));
            frame.render_stateful_widget(throbber, inner, &mut self.throbber_state.clone());
            return;
        };

        let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
        frame.render_widget(
            Paragraph::new(self.detail_lines(alert)).wrap(Wrap { trim: false }),
            rows[0],
        );
        let mut hints = vec![
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("close  ", theme::key_hint()),
        ];
        if self.panel.can_resolve(&alert.id) {
            hints.push(Span::styled("r ", theme::key_hint_key()));
            hints.push(Span::styled("resolve", theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(hints)), rows[1]);
    }
}

impl Component for AlertsScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.modal_open {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    self.close_detail();
                    None
                }
                KeyCode::Char('r') => self.confirm_resolve(),
                _ => None,
            });
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            KeyCode::Enter => {
                if let Some(id) = self.target().map(|a| a.id.clone()) {
                    self.open_detail(id);
                }
            }
            KeyCode::Char('f') => {
                if let Some(ticket) = self.panel.set_filter(next_filter(self.panel.filter())) {
                    self.fetch(ticket);
                }
            }
            KeyCode::Char('r') => return Ok(self.confirm_resolve()),
            KeyCode::Char('R') => {
                let ticket = self.panel.refresh();
                self.fetch(ticket);
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::AlertsLoaded { seq, result } => {
                if self.panel.accept_list(*seq, result.clone()) {
                    let len = self.panel.alerts().len();
                    let select = match self.table_state.selected() {
                        _ if len == 0 => None,
                        Some(i) => Some(i.min(len - 1)),
                        None => Some(0),
                    };
                    self.table_state.select(select);
                }
            }
            Action::AlertLoaded { seq, result } => {
                self.panel.accept_detail(*seq, result.clone());
            }
            Action::ResolveAlert(id) => self.resolve(id),
            Action::AlertResolved { id, result } if self.panel.resolving() == Some(id) => {
                let ok = result.is_ok();
                if let Some(ticket) = self.panel.finish_resolve(id, result.clone()) {
                    self.fetch(ticket);
                }
                return Ok(Some(Action::Notify(if ok {
                    Notification::success(format!("Alert {id} resolved"))
                } else {
                    Notification::error(
                        self.panel
                            .resolve_error()
                            .unwrap_or("Failed to resolve alert")
                            .to_owned(),
                    )
                })));
            }
            Action::LoggedOut => {
                self.panel.reset();
                self.modal_open = false;
                self.table_state = TableState::default();
            }
            Action::Tick if self.panel.is_loading() || self.panel.is_detail_loading() => {
                self.throbber_state.calc_next();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let filter = self
            .panel
            .filter()
            .map_or_else(|| "all".to_owned(), |s| s.label().to_lowercase());
        let title = format!(
            " Alerts ({} open) \u{00B7} {filter} ",
            self.panel.unresolved_count()
        );
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
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.render_table(frame, inner);
        if self.modal_open {
            self.render_modal(frame, area);
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused {
            let ticket = self.panel.refresh();
            self.fetch(ticket);
        }
    }

    fn hints(&self) -> &'static str {
        if self.modal_open {
            "r resolve  Esc close"
        } else {
            "j/k move  Enter open  f severity  r resolve  R refresh"
        }
    }
}
