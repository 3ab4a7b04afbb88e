// ── Chat thread ──
//
// In-memory conversation with the assistant. The thread starts with a
// greeting, sends are optimistic, and past exchanges from the backend
// are exposed as read-only sessions that can replace the thread. Replies
// and history loads are sequence-stamped; anything answering a request
// the thread has moved past is dropped.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use forgewatch_api::ChatExchange;

use crate::sequence::RequestSequence;

pub const GREETING: &str = "Hello! How can I help you today?";
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble connecting. Please try again later.";

const TITLE_LEN: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: usize,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    fn new(id: usize, text: impl Into<String>, sender: Sender) -> Self {
        Self {
            id,
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }
}

/// One past prompt/reply pair, shown in the history sidebar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatSession {
    pub id: usize,
    pub title: String,
    pub last_message: String,
    pub messages: Vec<ChatMessage>,
}

/// First 30 characters of `message`, with `...` when it was cut.
pub fn session_title(message: &str) -> String {
    if message.chars().count() > TITLE_LEN {
        let head: String = message.chars().take(TITLE_LEN).collect();
        format!("{head}...")
    } else {
        message.to_owned()
    }
}

/// Build sidebar sessions from the backend history, ids starting at 1.
pub fn sessions_from_history(items: &[ChatExchange]) -> Vec<ChatSession> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| ChatSession {
            id: index + 1,
            title: session_title(&item.message),
            last_message: item.response.clone(),
            messages: vec![
                ChatMessage::new(1, item.message.clone(), Sender::User),
                ChatMessage::new(2, item.response.clone(), Sender::Bot),
            ],
        })
        .collect()
}

/// A prompt on its way to the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    pub seq: u64,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct ChatThread {
    messages: Vec<ChatMessage>,
    sending: bool,
    sessions: Vec<ChatSession>,
    history_loading: bool,
    active_session: Option<usize>,
    send_sequence: RequestSequence,
    history_sequence: RequestSequence,
}

impl Default for ChatThread {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatThread {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(1, GREETING, Sender::Bot)],
            sending: false,
            sessions: Vec::new(),
            history_loading: false,
            active_session: None,
            send_sequence: RequestSequence::default(),
            history_sequence: RequestSequence::default(),
        }
    }

    /// Back to a fresh thread, e.g. after sign-out. Pending replies and
    /// history loads are orphaned.
    pub fn reset(&mut self) {
        let mut send_sequence = self.send_sequence;
        let mut history_sequence = self.history_sequence;
        send_sequence.issue();
        history_sequence.issue();
        *self = Self {
            send_sequence,
            history_sequence,
            ..Self::new()
        };
    }

    /// Append the user's message and hand back the prompt to send.
    /// Blank input and sends while one is pending are ignored.
    pub fn begin_send(&mut self, text: &str) -> Option<SendTicket> {
        let prompt = text.trim();
        if prompt.is_empty() || self.sending {
            return None;
        }
        let id = self.messages.len() + 1;
        self.messages.push(ChatMessage::new(id, prompt, Sender::User));
        self.sending = true;
        Some(SendTicket {
            seq: self.send_sequence.issue(),
            prompt: prompt.to_owned(),
        })
    }

    /// Append the reply, or the fallback on failure. Returns `true` when
    /// the history list should be refreshed. A reply to a send the thread
    /// has moved past is dropped and returns `false`.
    pub fn finish_send<E: fmt::Display>(&mut self, seq: u64, result: Result<String, E>) -> bool {
        if !self.sending || !self.send_sequence.is_current(seq) {
            debug!(seq, latest = self.send_sequence.latest(), "dropping stale chat reply");
            return false;
        }
        self.sending = false;
        let id = self.messages.len() + 1;
        match result {
            Ok(reply) => {
                self.messages.push(ChatMessage::new(id, reply, Sender::Bot));
                true
            }
            Err(e) => {
                warn!(error = %e, "chat reply failed");
                self.messages
                    .push(ChatMessage::new(id, FALLBACK_REPLY, Sender::Bot));
                false
            }
        }
    }

    /// Stamp a history load.
    pub fn begin_history(&mut self) -> u64 {
        self.history_loading = true;
        self.history_sequence.issue()
    }

    pub fn accept_history<E: fmt::Display>(
        &mut self,
        seq: u64,
        result: Result<Vec<ChatExchange>, E>,
    ) -> bool {
        if !self.history_sequence.is_current(seq) {
            debug!(seq, "dropping stale chat history");
            return false;
        }
        self.history_loading = false;
        match result {
            Ok(items) => self.sessions = sessions_from_history(&items),
            Err(e) => warn!(error = %e, "chat history failed"),
        }
        true
    }

    /// Replace the thread with a past session. A pending reply is dropped.
    pub fn open_session(&mut self, id: usize) -> bool {
        let Some(messages) = self
            .sessions
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.messages.clone())
        else {
            return false;
        };
        self.abandon_send();
        self.messages = messages;
        self.active_session = Some(id);
        true
    }

    /// Start over with the greeting. A pending reply is dropped.
    pub fn new_chat(&mut self) {
        self.abandon_send();
        self.messages = vec![ChatMessage::new(1, GREETING, Sender::Bot)];
        self.active_session = None;
    }

    fn abandon_send(&mut self) {
        if self.sending {
            self.sending = false;
            self.send_sequence.issue();
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn is_history_loading(&self) -> bool {
        self.history_loading
    }

    pub fn active_session(&self) -> Option<usize> {
        self.active_session
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn exchange(message: &str, response: &str) -> ChatExchange {
        ChatExchange {
            message: message.into(),
            response: response.into(),
        }
    }

    #[test]
    fn starts_with_greeting() {
        let thread = ChatThread::new();
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.messages()[0].text, GREETING);
        assert_eq!(thread.messages()[0].sender, Sender::Bot);
    }

    #[test]
    fn send_appends_user_then_reply() {
        let mut thread = ChatThread::new();
        let ticket = thread.begin_send("  why is M-14 failing?  ").unwrap();
        assert_eq!(ticket.prompt, "why is M-14 failing?");
        assert!(thread.is_sending());
        assert_eq!(thread.messages()[1].id, 2);

        assert!(thread.finish_send::<String>(ticket.seq, Ok("Tool wear is high.".into())));
        let last = thread.messages().last().unwrap();
        assert_eq!(last.id, 3);
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, "Tool wear is high.");
        assert!(!thread.is_sending());
    }

    #[test]
    fn blank_and_concurrent_sends_ignored() {
        let mut thread = ChatThread::new();
        assert!(thread.begin_send("   ").is_none());
        assert!(thread.begin_send("first").is_some());
        assert!(thread.begin_send("second").is_none());
        assert_eq!(thread.messages().len(), 2);
    }

    #[test]
    fn failure_appends_fallback_without_refresh() {
        let mut thread = ChatThread::new();
        let ticket = thread.begin_send("hello").unwrap();
        assert!(!thread.finish_send(ticket.seq, Err("connection refused")));
        assert_eq!(thread.messages().last().unwrap().text, FALLBACK_REPLY);
        assert!(!thread.is_sending());
    }

    #[test]
    fn reply_after_new_chat_is_dropped() {
        let mut thread = ChatThread::new();
        let ticket = thread.begin_send("hello").unwrap();
        thread.new_chat();
        assert!(!thread.is_sending());
        assert!(!thread.finish_send::<String>(ticket.seq, Ok("late".into())));
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.messages()[0].text, GREETING);
    }

    #[test]
    fn duplicate_reply_is_dropped() {
        let mut thread = ChatThread::new();
        let ticket = thread.begin_send("hello").unwrap();
        assert!(thread.finish_send::<String>(ticket.seq, Ok("hi".into())));
        assert!(!thread.finish_send::<String>(ticket.seq, Ok("hi again".into())));
        assert_eq!(thread.messages().len(), 3);
    }

    #[test]
    fn reset_orphans_pending_reply_and_history() {
        let mut thread = ChatThread::new();
        let history = thread.begin_history();
        let ticket = thread.begin_send("user A question").unwrap();
        thread.reset();

        assert_eq!(thread.messages().len(), 1);
        assert!(!thread.is_sending());
        assert!(!thread.finish_send::<String>(ticket.seq, Ok("user A answer".into())));
        assert!(!thread.accept_history::<String>(history, Ok(vec![exchange("q", "a")])));
        assert_eq!(thread.messages().len(), 1);
        assert!(thread.sessions().is_empty());

        let next = thread.begin_send("user B question").unwrap();
        assert!(next.seq > ticket.seq);
    }

    #[test]
    fn titles_truncate_long_messages() {
        assert_eq!(session_title("short"), "short");
        let exact = "a".repeat(30);
        assert_eq!(session_title(&exact), exact);
        let long = "b".repeat(31);
        assert_eq!(session_title(&long), format!("{}...", "b".repeat(30)));
    }

    #[test]
    fn sessions_from_history_pairs_messages() {
        let sessions = sessions_from_history(&[exchange("q1", "a1"), exchange("q2", "a2")]);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1].id, 2);
        assert_eq!(sessions[1].last_message, "a2");
        assert_eq!(sessions[1].messages[0].sender, Sender::User);
        assert_eq!(sessions[1].messages[1].text, "a2");
    }

    #[test]
    fn open_session_replaces_thread_and_new_chat_resets() {
        let mut thread = ChatThread::new();
        let seq = thread.begin_history();
        assert!(thread.accept_history::<String>(seq, Ok(vec![exchange("q1", "a1")])));
        assert!(!thread.is_history_loading());

        assert!(thread.open_session(1));
        assert_eq!(thread.messages().len(), 2);
        assert_eq!(thread.messages()[0].text, "q1");
        assert_eq!(thread.active_session(), Some(1));
        assert!(!thread.open_session(7));

        thread.new_chat();
        assert_eq!(thread.messages().len(), 1);
        assert_eq!(thread.messages()[0].text, GREETING);
        assert_eq!(thread.active_session(), None);
    }
}
