//! Mistral provider implementation using the `/v1/chat/completions` API.

use serde::{Deserialize, Serialize};

use super::{check_http_response, CompletionProvider, CompletionRequest, ProviderError, Role};

/// Default Mistral API base URL.
pub const DEFAULT_MISTRAL_URL: &str = "https://api.mistral.ai";

/// Sampling temperature for screening-chat replies.
const TEMPERATURE: f64 = 0.5;

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Mistral chat API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct MistralRequest {
    /// Model name.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<MistralMessage>,
    /// Sampling temperature.
    pub temperature: f64,
}

/// A message in Mistral format.
#[doc(hidden)]
#[derive(Debug, Serialize, Deserialize)]
pub struct MistralMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Message content.
    pub content: String,
}

/// Mistral chat API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct MistralResponse {
    /// Completion choices; the first is used.
    pub choices: Vec<MistralChoice>,
}

/// One completion choice.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct MistralChoice {
    /// The generated message.
    pub message: MistralMessage,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// Mistral chat API provider.
#[derive(Clone)]
pub struct MistralProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for MistralProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralProvider")
            .field("api_key", &"__REDACTED__")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl MistralProvider {
    /// Create a Mistral provider for the given key and model.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_MISTRAL_URL.to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL (used by tests against a local stub).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build a Mistral API request from a completion request.
#[doc(hidden)]
pub fn build_request(model: &str, request: &CompletionRequest) -> MistralRequest {
    let mut messages = Vec::new();

    messages.push(MistralMessage {
        role: "system".to_owned(),
        content: request.system.clone(),
    });

    for turn in &request.history {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        messages.push(MistralMessage {
            role: role.to_owned(),
            content: turn.text.clone(),
        });
    }

    messages.push(MistralMessage {
        role: "user".to_owned(),
        content: request.user.clone(),
    });

    MistralRequest {
        model: model.to_owned(),
        messages,
        temperature: TEMPERATURE,
    }
}

/// Parse a Mistral API response into the reply text.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the body cannot be deserialized or
/// contains no choices.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, ProviderError> {
    let resp: MistralResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    resp.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ProviderError::Parse("response contained no choices".to_owned()))
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl CompletionProvider for MistralProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let api_request = build_request(&self.model, &request);

        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await?;

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
