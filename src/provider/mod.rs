//! # Image Provider Interfaces
//!
//! The hosted generative-image service is an external collaborator. The
//! library talks to it through three narrow traits so the compositor and the
//! session can be driven by the real HTTP client or by a test double.
//!
//! - [`ImageFillProvider`]: fill the transparent part of a square image
//! - [`ImageGenerator`]: produce a square image from text
//! - [`PromptEnhancer`]: rewrite a short keyword prompt into a vivid description
//!
//! [`openai::OpenAiClient`] implements all three.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoothResult;

pub mod openai;

pub use openai::OpenAiClient;

/// How the provider should return image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Inline base64 in the JSON body
    Base64Json,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Base64Json => "b64_json",
        }
    }
}

/// One fill (image edit) request.
#[derive(Debug, Clone)]
pub struct FillRequest {
    /// PNG-encoded square image; transparent pixels are the area to fill
    pub image_png: Vec<u8>,
    /// Text guiding the generated content, forwarded verbatim
    pub prompt: String,
    /// Number of images requested
    pub count: u32,
    /// Side of the requested square
    pub size: u32,
    pub format: ResponseFormat,
}

impl FillRequest {
    /// Single-image request returning base64.
    pub fn new(image_png: Vec<u8>, prompt: impl Into<String>, size: u32) -> Self {
        Self {
            image_png,
            prompt: prompt.into(),
            count: 1,
            size,
            format: ResponseFormat::Base64Json,
        }
    }

    /// `"{N}x{N}"` as the provider expects it.
    pub fn size_label(&self) -> String {
        size_label(self.size)
    }
}

/// Successful fill result.
#[derive(Debug, Clone)]
pub struct FillResponse {
    /// Encoded image bytes (base64 already removed)
    pub image_bytes: Vec<u8>,
}

/// `"{N}x{N}"` label for a square of side `size`.
pub fn size_label(size: u32) -> String {
    format!("{}x{}", size, size)
}

/// Fills the transparent region of a square image.
///
/// An unsuccessful call (non-success status, missing image data, transport
/// failure) is an `Err`; there is no partial success.
#[async_trait]
pub trait ImageFillProvider: Send + Sync {
    async fn fill(&self, request: FillRequest) -> BoothResult<FillResponse>;
}

/// Generates a square image from a text prompt, returning encoded image bytes.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, size: u32) -> BoothResult<Vec<u8>>;
}

/// Rewrites a keyword prompt into a richer description.
#[async_trait]
pub trait PromptEnhancer: Send + Sync {
    async fn enhance(&self, prompt: &str) -> BoothResult<String>;
}

#[async_trait]
impl<T: ImageFillProvider + ?Sized> ImageFillProvider for Arc<T> {
    async fn fill(&self, request: FillRequest) -> BoothResult<FillResponse> {
        (**self).fill(request).await
    }
}

#[async_trait]
impl<T: ImageGenerator + ?Sized> ImageGenerator for Arc<T> {
    async fn generate(&self, prompt: &str, size: u32) -> BoothResult<Vec<u8>> {
        (**self).generate(prompt, size).await
    }
}

#[async_trait]
impl<T: PromptEnhancer + ?Sized> PromptEnhancer for Arc<T> {
    async fn enhance(&self, prompt: &str) -> BoothResult<String> {
        (**self).enhance(prompt).await
    }
}
