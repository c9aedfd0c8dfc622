use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use anyhow::{Context, Result, anyhow};

use crate::conversation::Message;

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct SendMessageResponse {
    response: String,
}

#[derive(Deserialize)]
struct SaveCodeResponse {
    message: String,
}

/// The backend declares `{messages: [...]}` but has been seen returning a bare list
#[derive(Deserialize)]
#[serde(untagged)]
enum ChatHistoryResponse {
    List(Vec<Message>),
    Wrapped { messages: Vec<Message> },
}

impl ChatHistoryResponse {
    fn into_messages(self) -> Vec<Message> {
        match self {
            ChatHistoryResponse::List(messages) => messages,
            ChatHistoryResponse::Wrapped { messages } => messages,
        }
    }
}

/// Client for the Sonic Pi controller backend
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn chat_history(&self) -> Result<Vec<Message>> {
        let url = self.url("/api/chat-history");
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let history: ChatHistoryResponse = check_status(response, "Fetching chat history")
            .await?
            .json()
            .await
            .context("Chat history was not a list of messages")?;

        Ok(history.into_messages())
    }

    /// Send one user message and return the assistant's reply.
    pub async fn send_message(&self, message: &str) -> Result<String> {
        let url = self.url("/api/send-message");
        tracing::debug!("POST {} ({} chars)", url, message.chars().count());

        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest { message })
            .send()
            .await?;

        let reply: SendMessageResponse = check_status(response, "Sending message")
            .await?
            .json()
            .await
            .context("Reply did not contain a response")?;
        Ok(reply.response)
    }

    pub async fn new_chat(&self) -> Result<()> {
        self.post_ignoring_body("/api/new-chat", "Starting a new chat").await
    }

    pub async fn stop_music(&self) -> Result<()> {
        self.post_ignoring_body("/api/stop-music", "Stopping music").await
    }

    /// Ask the backend to save the current code; returns its message for the user.
    pub async fn save_code(&self) -> Result<String> {
        let url = self.url("/api/save-code");
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).send().await?;
        let saved: SaveCodeResponse = check_status(response, "Saving code")
            .await?
            .json()
            .await
            .context("Save response did not contain a message")?;
        Ok(saved.message)
    }

    async fn post_ignoring_body(&self, path: &str, action: &str) -> Result<()> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).send().await?;
        check_status(response, action).await?;
        Ok(())
    }
}

async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(anyhow!(
        "{} failed with status: {}. Make sure the controller backend is running. {}",
        action,
        status,
        body.trim()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:8000/");
        assert_eq!(client.url("/api/new-chat"), "http://localhost:8000/api/new-chat");
    }

    #[test]
    fn test_history_accepts_both_shapes() {
        let list: ChatHistoryResponse =
            serde_json::from_str(r#"[{"content":"hi","isUser":true}]"#).unwrap();
        assert_eq!(list.into_messages(), vec![Message::user("hi")]);

        let wrapped: ChatHistoryResponse =
            serde_json::from_str(r#"{"messages":[{"content":"yo","isUser":false}]}"#).unwrap();
        assert_eq!(wrapped.into_messages(), vec![Message::assistant("yo")]);
    }
}
