//! services/api/src/adapters/vision.rs
//!
//! This module contains the adapter for the vision model used to identify a part
//! from a photo. It implements the `ImageDescriber` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageDetail,
        ImageUrlArgs,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use parts_finder_core::ports::{ImageDescriber, PortError, PortResult};
use std::time::Duration;

use crate::imaging::into_vision_ready;

const VISION_PROMPT: &str = "You are an automotive parts expert. Identify the replacement part \
shown in this photo. Respond with ONLY a short search phrase of at most six words that a \
shopper could type into an auto parts store, such as \"front brake caliper\" or \
\"serpentine belt tensioner\". Include the brand or vehicle only if it is clearly visible. \
No punctuation, no explanation.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ImageDescriber` using an OpenAI-compatible vision model.
#[derive(Clone)]
pub struct OpenAiVisionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiVisionAdapter {
    /// Creates a new `OpenAiVisionAdapter`. `timeout` bounds a whole call, including
    /// the client's own retries of server errors.
    pub fn new(client: Client<OpenAIConfig>, model: String, timeout: Duration) -> Self {
        Self {
            client,
            model,
            timeout,
        }
    }
}

/// Encodes a JPEG as a `data:` URI the chat API accepts in place of an image URL.
fn jpeg_data_uri(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

/// Keeps the first line of the model's answer and strips quoting around it.
fn clean_description(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
        .trim()
        .to_string()
}

//=========================================================================================
// `ImageDescriber` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageDescriber for OpenAiVisionAdapter {
    /// Resizes and normalises the photo, then asks the model for a search phrase.
    async fn describe_image(&self, image: &[u8]) -> PortResult<String> {
        let upload = image.to_vec();
        let jpeg = tokio::task::spawn_blocking(move || into_vision_ready(upload))
            .await
            .map_err(|e| PortError::Unexpected(format!("Image task failed: {}", e)))?
            .map_err(|e| PortError::InvalidInput(e.to_string()))?;

        let content: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(VISION_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestMessageContentPartImageArgs::default()
                .image_url(
                    ImageUrlArgs::default()
                        .url(jpeg_data_uri(&jpeg))
                        .detail(ImageDetail::Low)
                        .build()
                        .map_err(|e| PortError::Unexpected(e.to_string()))?,
                )
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into()])
            .max_tokens(40u32)
            .temperature(0.2)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let chat = self.client.chat();
        let response = tokio::time::timeout(self.timeout, chat.create(request))
            .await
            .map_err(|_| {
                PortError::Transient(format!("No answer from vision model in {:?}", self.timeout))
            })?
            .map_err(|e: OpenAIError| PortError::Transient(e.to_string()))?;

        let raw = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Vision model returned no text content.".to_string())
            })?;

        let description = clean_description(&raw);
        if description.is_empty() {
            return Err(PortError::Unexpected(
                "Vision model returned an empty description.".to_string(),
            ));
        }
        Ok(description)
    }
}
