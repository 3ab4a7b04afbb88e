//! Sign-in form. The entry screen whenever no session is stored.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use secrecy::SecretString;
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;

use forgewatch_core::{Backend, Route};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_request;
use crate::theme;
use crate::widgets::{centered, text_field::TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Email,
    Password,
}

pub struct LoginScreen {
    backend: Backend,
    action_tx: Option<UnboundedSender<Action>>,
    email: TextField,
    password: TextField,
    field: Field,
    submitting: bool,
    error: Option<String>,
    info: Option<String>,
    throbber_state: ThrobberState,
}

impl LoginScreen {
    /// `email` prefills the form, typically from the active profile.
    pub fn new(backend: Backend, email: Option<String>) -> Self {
        let field = if email.is_some() {
            Field::Password
        } else {
            Field::Email
        };
        Self {
            backend,
            action_tx: None,
            email: TextField::new("Email").with_value(email.unwrap_or_default()),
            password: TextField::masked("Password"),
            field,
            submitting: false,
            error: None,
            info: None,
            throbber_state: ThrobberState::default(),
        }
    }

    fn active_field(&mut self) -> &mut TextField {
        match self.field {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            Field::Email => Field::Password,
            Field::Password => Field::Email,
        };
    }

    fn submit(&mut self) {
        if self.submitting {
            return;
        }
        let email = self.email.value().trim().to_owned();
        if email.is_empty() {
            self.error = Some("Email is required".into());
            self.field = Field::Email;
            return;
        }
        if self.password.value().is_empty() {
            self.error = Some("Password is required".into());
            self.field = Field::Password;
            return;
        }

        self.error = None;
        self.info = None;
        self.submitting = true;

        let password = SecretString::from(self.password.take());
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        spawn_request(
            tx,
            async move { backend.login(&email, &password).await },
            |result| match result {
                Ok(user) => Action::LoggedIn(user),
                Err(message) => Action::LoginFailed(message),
            },
        );
    }
}

impl Component for LoginScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
            return Ok(Some(Action::Navigate(Route::Register)));
        }
        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => self.toggle_field(),
            KeyCode::Enter => match self.field {
                Field::Email => self.field = Field::Password,
                Field::Password => self.submit(),
            },
            _ => {
                if self.active_field().handle_key(key) {
                    self.error = None;
                }
            }
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::LoggedIn(_) => {
                self.submitting = false;
                self.error = None;
                self.info = None;
            }
            Action::LoginFailed(message) => {
                self.submitting = false;
                self.error = Some(message.clone());
                self.field = Field::Password;
            }
            Action::Registered(message) => {
                self.info = Some(message.clone());
                self.error = None;
                self.field = Field::Email;
            }
            Action::LoggedOut => {
                self.password.clear();
                self.info = Some("Signed out".into());
                self.field = Field::Password;
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
        let panel = centered(area, 56, 16);
        let block = Block::default()
            .title(Span::styled(" forgewatch \u{00B7} sign in ", theme::title_style()))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

        self.email.render(frame, rows[1], self.field == Field::Email);
        self.password
            .render(frame, rows[2], self.field == Field::Password);

        if self.submitting {
            let throbber = Throbber::default()
                .label(" Signing in...")
                .style(Style::default().fg(theme::TEXT))
                .throbber_style(Style::default().fg(theme::AMBER));
            frame.render_stateful_widget(throbber, rows[4], &mut self.throbber_state.clone());
        } else if let Some(ref err) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err.as_str(), theme::error()))
                    .alignment(Alignment::Center),
                rows[4],
            );
        } else if let Some(ref info) = self.info {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    info.as_str(),
                    Style::default()
                        .fg(theme::HEALTHY_GREEN)
                        .add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center),
                rows[4],
            );
        }

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("Enter ", theme::key_hint_key()),
                Span::styled("sign in  ", theme::key_hint()),
                Span::styled("Tab ", theme::key_hint_key()),
                Span::styled("next field  ", theme::key_hint()),
                Span::styled("Ctrl+R ", theme::key_hint_key()),
                Span::styled("register", theme::key_hint()),
            ]))
            .alignment(Alignment::Center),
            rows[6],
        );
    }

    fn captures_input(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use forgewatch_core::{BackendConfig, MemoryStorage};

    use super::*;

    fn screen(email: Option<&str>) -> LoginScreen {
        let config = BackendConfig::from_url("http://127.0.0.1:9").unwrap();
        let backend = Backend::new(config, Arc::new(MemoryStorage::new())).unwrap();
        LoginScreen::new(backend, email.map(str::to_owned))
    }

    fn press(s: &mut LoginScreen, code: KeyCode) -> Option<Action> {
        s.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn prefilled_email_focuses_password() {
        let s = screen(Some("ops@plant.io"));
        assert_eq!(s.field, Field::Password);
        assert_eq!(s.email.value(), "ops@plant.io");
    }

    #[test]
    fn empty_fields_are_rejected_locally() {
        let mut s = screen(None);
        s.field = Field::Password;
        press(&mut s, KeyCode::Enter);
        assert_eq!(s.error.as_deref(), Some("Email is required"));
        assert_eq!(s.field, Field::Email);
        assert!(!s.submitting);
    }

    #[test]
    fn submit_clears_password_and_waits() {
        let mut s = screen(Some("ops@plant.io"));
        for c in "hunter22".chars() {
            press(&mut s, KeyCode::Char(c));
        }
        press(&mut s, KeyCode::Enter);
        assert!(s.submitting);
        assert_eq!(s.password.value(), "");

        s.update(&Action::LoginFailed("Invalid credentials".into()))
            .unwrap();
        assert!(!s.submitting);
        assert_eq!(s.error.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn ctrl_r_opens_registration() {
        let mut s = screen(None);
        let action = s
            .handle_key_event(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(matches!(action, Some(Action::Navigate(Route::Register))));
    }
}
