//! LLM completion provider abstraction.
//!
//! Defines the [`CompletionProvider`] trait used by the AI reply strategy,
//! plus the shared request types. One provider is implemented:
//! [`mistral::MistralProvider`], against the Mistral chat-completions API.

use async_trait::async_trait;

pub mod mistral;

/// Conversation participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Candidate message.
    User,
    /// Bot message.
    Assistant,
}

/// One prior turn of the conversation, passed as provider context.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub text: String,
}

/// A request for a free-form completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt framing the bot's persona.
    pub system: String,
    /// Recent conversation history, oldest first.
    pub history: Vec<ChatTurn>,
    /// The inbound message to answer.
    pub user: String,
}

/// Errors returned by completion providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response did not match the expected schema.
    #[error("provider response parse error: {0}")]
    Parse(String),
    /// Upstream provider responded with an error status.
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
}

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure,
/// `ProviderError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: truncate_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace and cap error bodies so log lines stay bounded.
fn truncate_error_body(raw: &str) -> String {
    const MAX_ERROR_BODY_CHARS: usize = 256;

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = collapsed
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }
    collapsed
}

/// Core completion provider interface.
///
/// Implementations must be `Send + Sync` so the dispatcher can call them
/// across task boundaries.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request a free-form text completion.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on API, network, or parse failure.
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// The model identifier string this provider is instantiated for.
    fn model_id(&self) -> &str;
}
