//! Assistant chat handlers.

use tabled::Tabled;

use forgewatch_core::chat::sessions_from_history;
use forgewatch_core::{Backend, ChatMessage, ChatSession, ChatThread};

use crate::cli::{ChatArgs, ChatCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "#")]
    id: usize,
    #[tabled(rename = "Question")]
    title: String,
    #[tabled(rename = "Reply")]
    reply: String,
}

fn session_row(s: &ChatSession) -> SessionRow {
    let reply: String = s.last_message.chars().take(80).collect();
    SessionRow {
        id: s.id,
        title: s.title.clone(),
        reply: reply.replace('\n', " "),
    }
}

pub async fn handle(backend: &Backend, args: ChatArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ChatCommand::History => {
            let history = backend.chat_history().await?;
            let sessions = sessions_from_history(&history);
            let out = output::render_list(
                &global.output,
                &sessions,
                session_row,
                |s| s.title.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ChatCommand::Send { message } => {
            let mut thread = ChatThread::new();
            let text = message.join(" ");
            let ticket = thread.begin_send(&text).ok_or_else(|| CliError::Validation {
                field: "message".into(),
                reason: "message cannot be empty".into(),
            })?;

            let pb = util::spinner("Waiting for the assistant…", global);
            let reply = backend.send_chat(&ticket.prompt).await;
            pb.finish_and_clear();

            if let Err(e) = reply {
                thread.finish_send(ticket.seq, Err(&e));
                if let Some(fallback) = thread.messages().last() {
                    util::status(&fallback.text, global);
                }
                return Err(e.into());
            }
            thread.finish_send(ticket.seq, reply);

            let Some(answer) = thread.messages().last() else {
                return Ok(());
            };
            let out = output::render_single(
                &global.output,
                answer,
                |m: &ChatMessage| m.text.clone(),
                |m| m.text.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
