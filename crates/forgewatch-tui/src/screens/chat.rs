//! Assistant chat: past sessions on the left, the live thread on the right.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;

use forgewatch_core::{Backend, ChatMessage, ChatThread, SendTicket, Sender};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_request;
use crate::theme;
use crate::widgets::text_field::TextField;

pub struct ChatScreen {
    backend: Backend,
    action_tx: Option<UnboundedSender<Action>>,
    focused: bool,
    thread: ChatThread,
    input: TextField,
    composing: bool,
    list_state: ListState,
    throbber_state: ThrobberState,
}

impl ChatScreen {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            action_tx: None,
            focused: false,
            thread: ChatThread::new(),
            input: TextField::new("Message"),
            composing: false,
            list_state: ListState::default(),
            throbber_state: ThrobberState::default(),
        }
    }

    fn load_history(&mut self) {
        let seq = self.thread.begin_history();
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        spawn_request(
            tx,
            async move { backend.chat_history().await },
            move |result| Action::ChatHistoryLoaded { seq, result },
        );
    }

    fn send(&mut self) {
        let Some(SendTicket { seq, prompt }) = self.thread.begin_send(self.input.value()) else {
            return;
        };
        self.input.clear();
        let Some(tx) = self.action_tx.as_ref() else {
            return;
        };
        let backend = self.backend.clone();
        spawn_request(
            tx,
            async move { backend.send_chat(&prompt).await },
            move |result| Action::ChatReplied { seq, result },
        );
    }

    fn move_selection(&mut self, down: bool) {
        let len = self.thread.sessions().len();
        if len == 0 {
            return;
        }
        let next = match self.list_state.selected() {
            None => 0,
            Some(i) if down => (i + 1).min(len - 1),
            Some(i) => i.saturating_sub(1),
        };
        self.list_state.select(Some(next));
    }

    fn message_lines(message: &ChatMessage) -> Vec<Line<'static>> {
        let (who, style) = match message.sender {
            Sender::User => ("you", Style::default().fg(theme::AMBER).add_modifier(Modifier::BOLD)),
            Sender::Bot => (
                "assistant",
                Style::default()
                    .fg(theme::STEEL_BLUE)
                    .add_modifier(Modifier::BOLD),
            ),
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(who, style),
            Span::styled(
                format!("  {}", message.timestamp.format("%H:%M")),
                theme::key_hint(),
            ),
        ])];
        lines.extend(
            message
                .text
                .lines()
                .map(|l| Line::from(Span::styled(l.to_owned(), Style::default().fg(theme::TEXT)))),
        );
        lines.push(Line::from(""));
        lines
    }

    fn render_sessions(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" History ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused && !self.composing {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        if self.thread.sessions().is_empty() {
            let text = if self.thread.is_history_loading() {
                "Loading..."
            } else {
                "No previous chats"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(text, theme::key_hint())).block(block),
                area,
            );
            return;
        }

        let active = self.thread.active_session();
        let items: Vec<ListItem> = self
            .thread
            .sessions()
            .iter()
            .map(|s| {
                let style = if active == Some(s.id) {
                    theme::tab_active()
                } else {
                    theme::table_row()
                };
                ListItem::new(Line::from(Span::styled(s.title.clone(), style)))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(theme::table_selected())
            .highlight_symbol("\u{25B8} ");
        let mut state = self.list_state;
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_thread(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).split(area);

        let block = Block::default()
            .title(" Assistant ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(rows[0]);
        frame.render_widget(block, rows[0]);

        let mut lines: Vec<Line> = self
            .thread
            .messages()
            .iter()
            .flat_map(Self::message_lines)
            .collect();
        if self.thread.is_sending() {
            lines.push(Line::from(Span::styled("assistant is typing...", theme::key_hint())));
        }
        // keep the newest messages in view
        let overflow = lines.len().saturating_sub(usize::from(inner.height));
        let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0)),
            inner,
        );

        if self.thread.is_sending() {
            let throbber = Throbber::default()
                .label(" Waiting for the assistant...")
                .style(Style::default().fg(theme::TEXT))
                .throbber_style(Style::default().fg(theme::AMBER));
            let area = Rect { y: rows[1].y + 1, height: 1, ..rows[1] };
            frame.render_stateful_widget(throbber, area, &mut self.throbber_state.clone());
        } else if self.composing {
            self.input.render(frame, rows[1], true);
        } else {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("i ", theme::key_hint_key()),
                    Span::styled("write a message  ", theme::key_hint()),
                    Span::styled("n ", theme::key_hint_key()),
                    Span::styled("new chat", theme::key_hint()),
                ]))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(theme::border_default()),
                ),
                rows[1],
            );
        }
    }
}

impl Component for ChatScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.composing {
            match key.code {
                KeyCode::Esc => self.composing = false,
                KeyCode::Enter => self.send(),
                _ => {
                    self.input.handle_key(key);
                }
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('i') => self.composing = true,
            KeyCode::Char('n') => {
                self.thread.new_chat();
                self.list_state.select(None);
                self.composing = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            KeyCode::Enter => {
                let id = self
                    .list_state
                    .selected()
                    .and_then(|i| self.thread.sessions().get(i))
                    .map(|s| s.id);
                if let Some(id) = id {
                    self.thread.open_session(id);
                }
            }
            KeyCode::Char('R') => self.load_history(),
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ChatReplied { seq, result } => {
                if self.thread.finish_send(*seq, result.clone()) {
                    self.load_history();
                }
            }
            Action::ChatHistoryLoaded { seq, result } => {
                if self.thread.accept_history(*seq, result.clone()) {
                    let len = self.thread.sessions().len();
                    if self.list_state.selected().is_some_and(|i| i >= len) {
                        self.list_state.select(len.checked_sub(1));
                    }
                }
            }
            Action::LoggedOut => {
                self.thread.reset();
                self.input.clear();
                self.composing = false;
                self.list_state = ListState::default();
            }
            Action::Tick if self.thread.is_sending() => self.throbber_state.calc_next(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let cols = Layout::horizontal([Constraint::Length(36), Constraint::Min(20)]).split(area);
        self.render_sessions(frame, cols[0]);
        self.render_thread(frame, cols[1]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused {
            self.load_history();
        } else {
            self.composing = false;
        }
    }

    fn captures_input(&self) -> bool {
        self.composing
    }

    fn hints(&self) -> &'static str {
        if self.composing {
            "Enter send  Esc stop typing"
        } else {
            "i type  n new chat  j/k history  Enter open  R refresh"
        }
    }
}
