//! # OpenAI Provider
//!
//! Async HTTP client for the three OpenAI endpoints the photobooth uses:
//!
//! | Endpoint | Used for | Body |
//! |----------|----------|------|
//! | `POST /images/generations` | square background | JSON |
//! | `POST /images/edits` | left/right outpaint fills | multipart |
//! | `POST /chat/completions` | prompt enhancement | JSON |
//!
//! All image calls request a single image returned as `b64_json`. Each call is
//! a single attempt.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, multipart};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    FillRequest, FillResponse, ImageFillProvider, ImageGenerator, PromptEnhancer, ResponseFormat,
    size_label,
};
use crate::config::BoothConfig;
use crate::error::{BoothError, BoothResult};
use crate::prompt::{ENHANCE_SYSTEM_PROMPT, enhancement_user_message, expand_details};
use crate::raster::decode_base64_payload;

/// Provider name used in errors and logs.
pub const PROVIDER_NAME: &str = "openai";

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    prompt: &'a str,
    n: u32,
    size: String,
    response_format: &'static str,
}

#[derive(Deserialize, Debug)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize, Debug)]
struct ImageDatum {
    b64_json: Option<String>,
}

/// One chat message.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// OpenAI REST client.
///
/// Cheap to share behind an `Arc`; the inner `reqwest::Client` pools
/// connections and is never mutated after construction.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    api_base: String,
    chat_model: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_base", &self.api_base)
            .field("chat_model", &self.chat_model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Create a client with an explicit endpoint and timeout.
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        chat_model: impl Into<String>,
        timeout: Duration,
    ) -> BoothResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BoothError::external("reqwest", e))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            chat_model: chat_model.into(),
            timeout,
        })
    }

    /// Create a client from validated configuration.
    pub fn from_config(config: &BoothConfig) -> BoothResult<Self> {
        config.validate_credentials()?;
        Self::new(
            config.api_key.clone(),
            config.api_base.clone(),
            config.chat_model.clone(),
            config.request_timeout(),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn transport_error(&self, operation: &str, error: reqwest::Error) -> BoothError {
        if error.is_timeout() {
            BoothError::timeout(operation, self.timeout.as_millis() as u64)
        } else {
            BoothError::network(operation)
                .with_address(self.api_base.clone())
                .with_source(error)
        }
    }

    /// Return the body of a successful response, or a provider error built
    /// from the API's error envelope.
    async fn read_body(&self, operation: &str, response: reqwest::Response) -> BoothResult<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        if !status.is_success() {
            let reason = api_error_message(&body)
                .unwrap_or_else(|| format!("unexpected status {}", status));
            warn!("OpenAI {} failed with {}: {}", operation, status, reason);
            return Err(BoothError::provider(
                PROVIDER_NAME,
                operation,
                Some(status.as_u16()),
                reason,
            ));
        }
        Ok(body)
    }

    /// Generate one square image and return its encoded bytes.
    pub async fn create_image(&self, prompt: &str, size: u32) -> BoothResult<Vec<u8>> {
        const OPERATION: &str = "image_generation";
        info!(
            "Generating {} image | Prompt: '{}'",
            size_label(size),
            prompt.chars().take(100).collect::<String>()
        );

        let request = ImageGenerationRequest {
            prompt,
            n: 1,
            size: size_label(size),
            response_format: ResponseFormat::Base64Json.as_str(),
        };
        let response = self
            .client
            .post(self.endpoint("images/generations"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(OPERATION, e))?;

        let body = self.read_body(OPERATION, response).await?;
        let bytes = parse_image_payload(OPERATION, &body)?;
        debug!("Image generated | {} bytes", bytes.len());
        Ok(bytes)
    }

    /// Fill the transparent area of a square PNG.
    pub async fn create_image_edit(&self, request: FillRequest) -> BoothResult<Vec<u8>> {
        const OPERATION: &str = "image_edit";
        info!(
            "Requesting {} image edit | {} input bytes",
            request.size_label(),
            request.image_png.len()
        );

        let size = request.size_label();
        let image_part = multipart::Part::bytes(request.image_png)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| BoothError::external("reqwest", e))?;
        let form = multipart::Form::new()
            .part("image", image_part)
            .text("prompt", request.prompt)
            .text("n", request.count.to_string())
            .text("size", size)
            .text("response_format", request.format.as_str());

        let response = self
            .client
            .post(self.endpoint("images/edits"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(OPERATION, e))?;

        let body = self.read_body(OPERATION, response).await?;
        parse_image_payload(OPERATION, &body)
    }

    /// Run a chat completion and return the first reply's text.
    pub async fn create_chat_completion(&self, messages: &[ChatMessage]) -> BoothResult<String> {
        const OPERATION: &str = "chat_completion";
        debug!("Chat completion with {} | {} messages", self.chat_model, messages.len());

        let request = ChatCompletionRequest {
            model: &self.chat_model,
            messages,
        };
        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(OPERATION, e))?;

        let body = self.read_body(OPERATION, response).await?;
        parse_chat_payload(OPERATION, &body)
    }
}

#[async_trait]
impl ImageFillProvider for OpenAiClient {
    async fn fill(&self, request: FillRequest) -> BoothResult<FillResponse> {
        let image_bytes = self.create_image_edit(request).await?;
        Ok(FillResponse { image_bytes })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str, size: u32) -> BoothResult<Vec<u8>> {
        self.create_image(prompt, size).await
    }
}

#[async_trait]
impl PromptEnhancer for OpenAiClient {
    async fn enhance(&self, prompt: &str) -> BoothResult<String> {
        let messages = [
            ChatMessage::system(ENHANCE_SYSTEM_PROMPT),
            ChatMessage::user(enhancement_user_message(&expand_details(prompt))),
        ];
        self.create_chat_completion(&messages).await
    }
}

/// Extract `error.message` from an OpenAI error envelope.
pub fn api_error_message(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    match parsed.error.error_type {
        Some(kind) if !kind.is_empty() => Some(format!("{} ({})", parsed.error.message, kind)),
        _ => Some(parsed.error.message),
    }
}

/// Decode the first `b64_json` image of an images response.
pub fn parse_image_payload(operation: &str, body: &str) -> BoothResult<Vec<u8>> {
    let parsed: ImagesResponse = serde_json::from_str(body).map_err(|e| {
        BoothError::provider(PROVIDER_NAME, operation, None, format!("malformed response: {}", e))
    })?;
    let encoded = parsed
        .data
        .into_iter()
        .next()
        .and_then(|datum| datum.b64_json)
        .filter(|encoded| !encoded.is_empty())
        .ok_or_else(|| BoothError::provider(PROVIDER_NAME, operation, None, "missing image data"))?;
    decode_base64_payload(&encoded).map_err(|e| e.with_operation(operation))
}

/// Text of the first choice of a chat completion response.
pub fn parse_chat_payload(operation: &str, body: &str) -> BoothResult<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        BoothError::provider(PROVIDER_NAME, operation, None, format!("malformed response: {}", e))
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| {
            BoothError::provider(PROVIDER_NAME, operation, None, "missing message content")
        })
}
