// Support chat endpoints
//
// Both endpoints answer `{status: "success", data: ...}`; any other status
// is treated as a malformed response.

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ChatExchange, ChatHistoryData, GenerateRequest, GeneratedReply, StatusEnvelope};

impl ApiClient {
    /// Full chat history, oldest first.
    ///
    /// `GET /message` → `{status, data: {message: [{message, response}]}}`
    pub async fn chat_history(&self) -> Result<Vec<ChatExchange>, Error> {
        let url = self.endpoint(&["message"])?;
        let resp: StatusEnvelope<ChatHistoryData> = self.get(url).await?;
        Ok(resp.into_success()?.message)
    }

    /// Ask the assistant and return its reply.
    ///
    /// `POST /generate` with `{prompt}` → `{status, data: {message}}`.
    /// A missing or blank reply counts as malformed.
    pub async fn generate_reply(&self, prompt: &str) -> Result<String, Error> {
        let url = self.endpoint(&["generate"])?;
        let resp: StatusEnvelope<GeneratedReply> =
            self.post(url, &GenerateRequest { prompt }).await?;
        resp.into_success()?
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::MalformedResponse {
                message: "Invalid response format".into(),
            })
    }
}
