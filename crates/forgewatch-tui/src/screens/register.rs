//! Account registration form. Success returns to the sign-in screen.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use secrecy::SecretString;
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;

use forgewatch_core::{Backend, CoreError, Registration, Route};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_request;
use crate::theme;
use crate::widgets::{centered, text_field::TextField};

const REGISTERED_MESSAGE: &str = "Registration successful! Please sign in.";

pub struct RegisterScreen {
    backend: Backend,
    action_tx: Option<UnboundedSender<Action>>,
    fields: [TextField; 4],
    focus: usize,
    submitting: bool,
    error: Option<String>,
    throbber_state: ThrobberState,
}

impl RegisterScreen {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            action_tx: None,
            fields: [
                TextField::new("Username"),
                TextField::new("Email"),
                TextField::masked("Password"),
                TextField::masked("Confirm password"),
            ],
            focus: 0,
            submitting: false,
            error: None,
            throbber_state: ThrobberState::default(),
        }
    }

    fn registration(&self) -> Registration {
        Registration {
            username: self.fields[0].value().to_owned(),
            email: self.fields[1].value().to_owned(),
            password: SecretString::from(self.fields[2].value().to_owned()),
            confirm_password: SecretString::from(self.fields[3].value().to_owned()),
        }
    }

    fn submit(&mut self) {
        if self.submitting {
            return;
        }
        let registration = self.registration();
        if let Err(e) = registration.validate() {
            self.error = Some(match e {
                CoreError::Validation { reason, .. } => reason,
                other => other.to_string(),
            });
            return;
        }

        self.error = None;
        self.submitting = true;
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        spawn_request(
            tx,
            async move { backend.register(&registration).await },
            |result| match result {
                Ok(resp) => Action::Registered(
                    resp.message
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| REGISTERED_MESSAGE.into()),
                ),
                Err(message) => Action::RegisterFailed(message),
            },
        );
    }

    fn reset(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
        self.focus = 0;
        self.error = None;
    }
}

impl Component for RegisterScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            return Ok(Some(Action::Navigate(Route::Login)));
        }
        let last = self.fields.len() - 1;
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::Navigate(Route::Login))),
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % self.fields.len(),
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + last) % self.fields.len(),
            KeyCode::Enter if self.focus < last => self.focus += 1,
            KeyCode::Enter => self.submit(),
            _ => {
                if self.fields[self.focus].handle_key(key) {
                    self.error = None;
                }
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Registered(_) => {
                self.submitting = false;
                self.reset();
            }
            Action::RegisterFailed(message) => {
                self.submitting = false;
                self.error = Some(message.clone());
            }
            Action::Tick if self.submitting => self.throbber_state.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            area,
        );
        let panel = centered(area, 56, 22);
        let block = Block::default()
            .title(Span::styled(" forgewatch \u{00B7} register ", theme::title_style()))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let rows = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

        for (i, field) in self.fields.iter().enumerate() {
            field.render(frame, rows[i], i == self.focus);
        }

        if self.submitting {
            let throbber = Throbber::default()
                .label(" Creating account...")
                .style(Style::default().fg(theme::TEXT))
                .throbber_style(Style::default().fg(theme::AMBER));
            frame.render_stateful_widget(throbber, rows[5], &mut self.throbber_state.clone());
        } else if let Some(ref err) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err.as_str(), theme::error()))
                    .alignment(Alignment::Center),
                rows[5],
            );
        }

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("next / submit  ", theme::key_hint()),
                Span::styled("Tab ", theme::key_hint_key()),
                Span::styled("next field  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("back to sign in", theme::key_hint()),
            ]))
            .alignment(Alignment::Center),
            rows[7],
        );
    }

    fn captures_input(&self) -> bool {
        true
    }
}
