//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use forgewatch_core::{Backend, Route, User, guard};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge::spawn_request;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Top-level application state and event loop.
pub struct App {
    backend: Backend,
    /// Current active screen.
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    search_active: bool,
    search_query: String,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmAction>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
    /// Signed-in user shown in the status bar.
    user: Option<User>,
}

impl App {
    /// Create the app. Starts on the dashboard when a session was restored,
    /// otherwise on the sign-in screen.
    pub fn new(backend: Backend, email: Option<String>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens(&backend, email).into_iter().collect();
        let active_screen = ScreenId::from(&guard(Route::Dashboard, backend.auth()));
        let user = backend.auth().user();

        Self {
            backend,
            active_screen,
            previous_screen: None,
            screens,
            running: true,
            help_visible: false,
            search_active: false,
            search_query: String::new(),
            action_tx,
            action_rx,
            pending_confirm: None,
            notification: None,
            user,
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.init_screens()?;
        if self.user.is_some() {
            self.refresh_profile();
        }

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!(screen = %self.active_screen, "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        self.backend.auth().is_authenticated()
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c {
            return Ok(Some(Action::Quit));
        }

        // Confirmation dialog captures all input
        if self.pending_confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        // Text entry owns the keyboard
        if self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input())
        {
            if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                return screen.handle_key_event(key);
            }
            return Ok(None);
        }

        if self.search_active {
            return Ok(match key.code {
                KeyCode::Esc => Some(Action::CloseSearch),
                KeyCode::Enter => Some(Action::SearchSubmit(self.search_query.clone())),
                KeyCode::Backspace => {
                    self.search_query.pop();
                    None
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    None
                }
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char('/')) if self.active_screen == ScreenId::Dashboard => {
                return Ok(Some(Action::OpenSearch));
            }
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='3')) => {
                let n = u8::try_from(u32::from(c) - u32::from('0')).unwrap_or(0);
                if let Some(screen) = ScreenId::from_number(n) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            (KeyModifiers::SHIFT | KeyModifiers::NONE, KeyCode::Char('L')) => {
                return Ok(Some(Action::ShowConfirm(ConfirmAction::Logout)));
            }
            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    /// Move focus to `target`. Protected screens redirect to sign-in while
    /// nobody is signed in.
    fn switch_to(&mut self, target: ScreenId) {
        let target = if target.is_protected() && !self.is_authenticated() {
            ScreenId::Login
        } else {
            target
        };
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.previous_screen = Some(self.active_screen).filter(|s| !s.is_fullscreen());
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn refresh_profile(&self) {
        let backend = self.backend.clone();
        spawn_request(
            &self.action_tx,
            async move { backend.refresh_profile().await },
            |result| match result {
                Ok(user) => Action::ProfileRefreshed(user),
                Err(e) => Action::Notify(Notification::error(format!(
                    "Could not refresh profile: {e}"
                ))),
            },
        );
    }

    fn logout(&mut self) -> Result<()> {
        if let Err(e) = self.backend.logout() {
            self.action_tx
                .send(Action::Notify(Notification::error(e.to_string())))?;
            return Ok(());
        }
        info!("signed out");
        self.user = None;
        self.search_active = false;
        self.search_query.clear();
        self.broadcast(&Action::LoggedOut)?;
        self.switch_to(ScreenId::Login);
        self.previous_screen = None;
        Ok(())
    }

    /// Process a single action: update app state and propagate to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Render | Action::Resize(..) => {}

            Action::SwitchScreen(target) => self.switch_to(*target),

            Action::Navigate(route) => {
                let route = guard(route.clone(), self.backend.auth());
                if let Route::MachineDetail(ref id) = route {
                    self.action_tx.send(Action::OpenMachine(id.clone()))?;
                } else {
                    self.switch_to(ScreenId::from(&route));
                }
            }

            Action::GoBack => {
                let target = self.previous_screen.take().unwrap_or(ScreenId::Dashboard);
                self.switch_to(target);
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            Action::OpenSearch => {
                self.search_active = true;
                self.search_query.clear();
            }

            Action::CloseSearch => {
                self.search_active = false;
                self.search_query.clear();
            }

            Action::SearchSubmit(_) => {
                self.search_active = false;
                self.broadcast(action)?;
            }

            Action::ShowConfirm(confirm) => self.pending_confirm = Some(confirm.clone()),

            Action::ConfirmYes => match self.pending_confirm.take() {
                Some(ConfirmAction::ResolveAlert { id, .. }) => {
                    self.action_tx.send(Action::ResolveAlert(id))?;
                }
                Some(ConfirmAction::Logout) => self.logout()?,
                None => {}
            },

            Action::ConfirmNo => self.pending_confirm = None,

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),

            Action::LoggedIn(user) => {
                info!(user = %user.display_name(), "signed in");
                self.user = Some(user.clone());
                self.broadcast(action)?;
                self.switch_to(ScreenId::Dashboard);
                self.previous_screen = None;
                self.notification = Some((
                    Notification::success(format!("Signed in as {}", user.display_name())),
                    Instant::now(),
                ));
                self.refresh_profile();
            }

            Action::ProfileRefreshed(user) => self.user = Some(user.clone()),

            Action::Registered(message) => {
                self.broadcast(action)?;
                self.notification = Some((Notification::success(message.clone()), Instant::now()));
                self.switch_to(ScreenId::Login);
            }

            Action::OpenMachine(id) => {
                let route = guard(Route::MachineDetail(id.clone()), self.backend.auth());
                if matches!(route, Route::MachineDetail(_)) {
                    self.switch_to(ScreenId::Detail);
                    self.broadcast(action)?;
                } else {
                    self.switch_to(ScreenId::Login);
                }
            }

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, created)| created.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
                self.broadcast(action)?;
            }

            other if other.is_broadcast() => self.broadcast(other)?,

            other => {
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(other)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        if self.active_screen.is_fullscreen() {
            if let Some(screen) = self.screens.get(&self.active_screen) {
                screen.render(frame, area);
            }
            if let Some((ref notif, _)) = self.notification {
                self.render_notification(frame, area, notif);
            }
            return;
        }

        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[0]);
        }
        self.render_tab_bar(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if let Some((ref notif, _)) = self.notification {
            self.render_notification(frame, area, notif);
        }
        if let Some(ref confirm) = self.pending_confirm {
            self.render_confirm_dialog(frame, area, confirm);
        }
        if self.help_visible {
            self.render_help_overlay(frame, area);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::TABS
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let mut tabs = Tabs::new(titles).divider(Span::styled(" ", theme::key_hint()));
        if let Some(idx) = ScreenId::TABS.iter().position(|&s| s == self.active_screen) {
            tabs = tabs.select(idx);
        }
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if self.search_active {
            let line = Line::from(vec![
                Span::styled(" / ", Style::default().fg(theme::AMBER)),
                Span::styled(&self.search_query, Style::default().fg(theme::TEXT)),
                Span::styled("\u{2588}", Style::default().fg(theme::STEEL_BLUE)),
                Span::styled("  Esc cancel  Enter search", theme::key_hint()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            return;
        }

        let user = self
            .user
            .as_ref()
            .map_or_else(|| "signed out".into(), User::display_name);
        let hints = self
            .screens
            .get(&self.active_screen)
            .map(|s| s.hints())
            .unwrap_or_default();

        let line = Line::from(vec![
            Span::styled(" \u{25CF} ", Style::default().fg(theme::HEALTHY_GREEN)),
            Span::styled(user, Style::default().fg(theme::TEXT)),
            Span::styled(format!(" \u{2502} {hints}"), theme::key_hint()),
            Span::styled(" \u{2502} ? help  L sign out  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    #[allow(clippy::unused_self)]
    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let help_area = crate::widgets::centered(area, 58, 20);
        frame.render_widget(Clear, help_area);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let row = |key: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<12}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };
        let heading = |text: &'static str| {
            Line::from(Span::styled(format!("  {text}"), Style::default().fg(theme::AMBER)))
        };

        let help_text = vec![
            Line::from(""),
            heading("Navigation"),
            row("1-3 Tab", "Machines / Alerts / Assistant"),
            row("j/k \u{2191}/\u{2193}", "Move up / down"),
            row("Enter", "Open"),
            row("Esc", "Back / close"),
            Line::from(""),
            heading("Machines"),
            row("/", "Search machines"),
            row("t r s", "Cycle type / risk / severity filter"),
            row("x", "Reset filters"),
            row("n/p \u{2190}/\u{2192}", "Next / previous page"),
            Line::from(""),
            heading("Alerts and assistant"),
            row("f  r", "Severity filter, resolve alert"),
            row("i  n", "Write a message, new chat"),
            Line::from(""),
            row("R", "Reload   L sign out   q quit"),
        ];
        frame.render_widget(Paragraph::new(help_text), inner);
    }

    #[allow(clippy::unused_self)]
    fn render_confirm_dialog(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
        let dialog_area = crate::widgets::centered(area, 54, 5);
        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .title(" Confirm ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::AMBER))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let text = vec![
            Line::from(Span::styled(
                format!("  {confirm}"),
                Style::default().fg(theme::TEXT),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("  y ", theme::key_hint_key()),
                Span::styled("confirm    ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ]),
        ];
        frame.render_widget(Paragraph::new(text), inner);
    }

    /// Toast in the bottom-right corner, above the status bar.
    #[allow(clippy::unused_self)]
    fn render_notification(&self, frame: &mut Frame, area: Rect, notif: &Notification) {
        let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
        let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
        let height = 3u16;

        let x = area.width.saturating_sub(width + 1);
        let y = area.height.saturating_sub(height + 2);
        let toast_area = Rect::new(area.x + x, area.y + y, width, height.min(area.height));

        let (border_color, icon) = match notif.level {
            NotificationLevel::Success => (theme::HEALTHY_GREEN, "\u{2713}"),
            NotificationLevel::Error => (theme::ALERT_RED, "\u{2717}"),
            NotificationLevel::Info => (theme::STEEL_BLUE, "\u{00B7}"),
        };

        frame.render_widget(Clear, toast_area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(toast_area);
        frame.render_widget(block, toast_area);

        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
            Span::styled(&notif.message, Style::default().fg(theme::TEXT)),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    use forgewatch_core::{BackendConfig, MemoryStorage, SessionStorage};

    use super::*;

    fn backend(signed_in: bool) -> Backend {
        let storage = MemoryStorage::new();
        if signed_in {
            storage.set("token", "tok-1").unwrap();
            storage
                .set("user", r#"{"id":7,"username":"ops","email":"ops@plant.io"}"#)
                .unwrap();
        }
        let config = BackendConfig::from_url("http://127.0.0.1:9").unwrap();
        Backend::new(config, Arc::new(storage)).unwrap()
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 32)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn unauthenticated_start_shows_sign_in() {
        let app = App::new(backend(false), None);
        assert_eq!(app.active_screen, ScreenId::Login);
        assert!(app.user.is_none());
        assert!(screen_text(&app).contains("sign in"));
    }

    #[test]
    fn protected_screens_redirect_to_sign_in() {
        let mut app = App::new(backend(false), None);
        app.process_action(&Action::SwitchScreen(ScreenId::Alerts))
            .unwrap();
        assert_eq!(app.active_screen, ScreenId::Login);

        app.process_action(&Action::Navigate(Route::Register)).unwrap();
        assert_eq!(app.active_screen, ScreenId::Register);

        app.process_action(&Action::OpenMachine("M-1".into())).unwrap();
        assert_eq!(app.active_screen, ScreenId::Login);
    }

    #[test]
    fn restored_session_lands_on_dashboard() {
        let app = App::new(backend(true), None);
        assert_eq!(app.active_screen, ScreenId::Dashboard);
        assert_eq!(app.user.as_ref().unwrap().display_name(), "ops");

        let text = screen_text(&app);
        assert!(text.contains("1 Machines"));
        assert!(text.contains("2 Alerts"));
        assert!(text.contains("3 Assistant"));
    }

    #[test]
    fn text_entry_screens_keep_global_keys() {
        let mut app = App::new(backend(false), None);
        let action = app
            .handle_key_event(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE))
            .unwrap();
        assert!(action.is_none());
        let action = app
            .handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(matches!(action, Some(Action::Quit)));
    }

    #[test]
    fn confirmed_logout_clears_session() {
        let mut app = App::new(backend(true), None);
        app.process_action(&Action::ShowConfirm(ConfirmAction::Logout))
            .unwrap();
        let key = app
            .handle_key_event(KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE))
            .unwrap();
        assert!(matches!(key, Some(Action::ConfirmYes)));

        app.process_action(&Action::ConfirmYes).unwrap();
        assert_eq!(app.active_screen, ScreenId::Login);
        assert!(app.user.is_none());
        assert!(!app.backend.auth().is_authenticated());
    }

    #[test]
    fn search_submit_closes_prompt() {
        let mut app = App::new(backend(true), None);
        app.process_action(&Action::OpenSearch).unwrap();
        for c in "M-7".chars() {
            app.handle_key_event(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
                .unwrap();
        }
        let action = app
            .handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .unwrap();
        assert!(matches!(action, Some(Action::SearchSubmit(ref q)) if q == "M-7"));
    }
}
