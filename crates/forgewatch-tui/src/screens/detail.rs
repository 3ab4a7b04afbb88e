//! Machine detail: readings against rated limits, model verdict, and anomalies.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;

use forgewatch_core::{Backend, Machine, MachineType, RequestSequence, detail, display_value};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_request;
use crate::theme;

pub struct DetailScreen {
    backend: Backend,
    action_tx: Option<UnboundedSender<Action>>,
    focused: bool,
    machine_id: Option<String>,
    machine: Option<Machine>,
    loading: bool,
    error: Option<String>,
    sequence: RequestSequence,
    scroll: u16,
    throbber_state: ThrobberState,
}

impl DetailScreen {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            action_tx: None,
            focused: false,
            machine_id: None,
            machine: None,
            loading: false,
            error: None,
            sequence: RequestSequence::default(),
            scroll: 0,
            throbber_state: ThrobberState::default(),
        }
    }

    fn open(&mut self, machine_id: String) {
        if self.machine_id.as_deref() != Some(machine_id.as_str()) {
            self.machine = None;
        }
        self.machine_id = Some(machine_id.clone());
        self.loading = true;
        self.error = None;
        self.scroll = 0;

        let seq = self.sequence.issue();
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        spawn_request(
            tx,
            async move { backend.machine(&machine_id).await },
            move |result| Action::MachineLoaded { seq, result },
        );
    }

    fn header_lines(machine: &Machine) -> Vec<Line<'static>> {
        let status = machine.status();
        let severity = machine.severity();
        let mut spans = vec![
            Span::styled("Type ", theme::key_hint()),
            Span::styled(
                machine.machine_type.map_or("-", MachineType::label),
                Style::default().fg(theme::TEXT),
            ),
            Span::styled("   Status ", theme::key_hint()),
            Span::styled(status.to_string(), theme::health(status)),
            Span::styled("   Severity ", theme::key_hint()),
            Span::styled(severity.label(), theme::severity(severity)),
        ];
        if let Some(badge) = detail::anomaly_badge(machine) {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(
                format!(" {badge} "),
                Style::default()
                    .fg(theme::BG_DARK)
                    .bg(theme::ALERT_RED)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        vec![
            Line::from(spans),
            Line::from(""),
            Line::from(Span::styled(
                detail::health_analysis(machine).to_owned(),
                Style::default().fg(theme::TEXT),
            )),
        ]
    }

    fn reading_lines(machine: &Machine) -> Vec<Line<'static>> {
        detail::readings(machine)
            .into_iter()
            .map(|r| {
                let style = if r.over_limit() {
                    theme::error().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme::TEXT)
                };
                Line::from(vec![
                    Span::styled(format!("{:<22}", r.label), theme::key_hint()),
                    Span::styled(r.display(), style),
                ])
            })
            .collect()
    }

    fn diagnosis_lines(machine: &Machine) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if let Some(diag) = machine.condition.as_ref().and_then(|c| c.diagnostics.as_ref()) {
            let field = |label: &'static str, value: Option<&String>| {
                value.map(|v| {
                    Line::from(vec![
                        Span::styled(format!("{label:<20}"), theme::key_hint()),
                        Span::styled(v.clone(), Style::default().fg(theme::TEXT)),
                    ])
                })
            };
            lines.extend(field("Primary cause", diag.primary_cause.as_ref()));
            lines.extend(field("Sensor alert", diag.sensor_alert.as_ref()));
            lines.extend(field("Recommended action", diag.recommended_action.as_ref()));
        }

        let anomalies = machine.anomalies();
        if !anomalies.is_empty() {
            if !lines.is_empty() {
                lines.push(Line::from(""));
            }
            for a in anomalies {
                let range = display_value(&a.normal_range);
                lines.push(Line::from(vec![
                    Span::styled(format!("{} ", a.status.label()), theme::severity(a.status)),
                    Span::styled(
                        a.parameter.clone(),
                        Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", display_value(&a.value)),
                        Style::default().fg(theme::ALERT_RED),
                    ),
                    Span::styled(
                        if range.is_empty() {
                            String::new()
                        } else {
                            format!("  (normal {range})")
                        },
                        theme::key_hint(),
                    ),
                ]));
                if let Some(ref text) = a.explanation {
                    lines.push(Line::from(Span::styled(format!("  {text}"), theme::key_hint())));
                }
            }
        }

        if lines.is_empty() {
            lines.push(Line::from(Span::styled("No anomalies detected", theme::key_hint())));
        }
        lines
    }
}

impl Component for DetailScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::GoBack)),
            KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Char('R') => {
                if let Some(id) = self.machine_id.clone() {
                    self.open(id);
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::OpenMachine(id) => self.open(id.clone()),
            Action::MachineLoaded { seq, result } => {
                if self.sequence.is_current(*seq) {
                    self.loading = false;
                    match result {
                        Ok(machine) => {
                            self.machine = Some(machine.clone());
                            self.error = None;
                        }
                        Err(e) => self.error = Some(e.clone()),
                    }
                }
            }
            Action::LoggedOut => {
                self.machine_id = None;
                self.machine = None;
                self.error = None;
                self.loading = false;
                self.sequence.issue();
            }
            Action::Tick if self.loading => self.throbber_state.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = match self.machine_id.as_deref() {
            Some(id) => format!(" Machine {id} "),
            None => " Machine ".into(),
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
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(machine) = self.machine.as_ref() else {
            if let Some(ref err) = self.error {
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::from(Span::styled(err.clone(), theme::error())),
                        Line::from(vec![
                            Span::styled("R ", theme::key_hint_key()),
                            Span::styled("retry  ", theme::key_hint()),
                            Span::styled("Esc ", theme::key_hint_key()),
                            Span::styled("back", theme::key_hint()),
                        ]),
                    ]),
                    inner,
                );
            } else if self.loading {
                let throbber = Throbber::default()
                    .label(" Loading machine...")
                    .style(Style::default().fg(theme::TEXT))
                    .throbber_style(Style::default().fg(theme::AMBER));
                frame.render_stateful_widget(throbber, inner, &mut self.throbber_state.clone());
            } else {
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        "Select a machine on the Machines tab",
                        theme::key_hint(),
                    )),
                    inner,
                );
            }
            return;
        };

        let rows = Layout::vertical([Constraint::Length(4), Constraint::Min(4)]).split(inner);
        frame.render_widget(
            Paragraph::new(Self::header_lines(machine)).wrap(Wrap { trim: true }),
            rows[0],
        );

        let cols = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[1]);
        let section = |title: &'static str| {
            Block::default()
                .title(title)
                .title_style(theme::title_style())
                .borders(Borders::TOP)
                .border_style(theme::border_default())
        };
        frame.render_widget(
            Paragraph::new(Self::reading_lines(machine)).block(section(" Readings ")),
            cols[0],
        );
        frame.render_widget(
            Paragraph::new(Self::diagnosis_lines(machine))
                .block(section(" Diagnosis "))
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            cols[1],
        );
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn hints(&self) -> &'static str {
        "j/k scroll  R reload  Esc back"
    }
}
