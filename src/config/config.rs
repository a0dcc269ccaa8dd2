//! # Configuration Module
//!
//! Configuration shared by the `booth` CLI and the library entry points.
//!
//! ## Overview
//!
//! Values come from three layers, later layers winning:
//! 1. [`BoothConfig::default`]
//! 2. Environment variables via [`BoothConfig::from_env`]
//! 3. Command-line flags applied by the binary
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `api_key` | `String` | non-empty for network commands | Image provider API key |
//! | `api_base` | `String` | http(s) URL | Provider REST base URL |
//! | `image_size` | `u32` | 256, 512, 1024 | Side of the generated square |
//! | `target_width` | `u32` | `image_size < w <= 3 * image_size - 2` | Width of the widescreen result |
//! | `chat_model` | `String` | non-empty | Model used for prompt enhancement |
//! | `enhance_prompt` | `bool` | true/false | Rewrite prompts before generation |
//! | `request_timeout_secs` | `u64` | > 0 | Per-request HTTP timeout |
//! | `output_dir` | `String` | any path | Where finished backgrounds are written |
//!
//! ## Environment Variables
//!
//! - `IMAGE_GENERATOR_API`: provider name. Only `OpenAI` supports image edits;
//!   any other value logs a warning and falls back to OpenAI.
//! - `IMAGE_GENERATOR_API_KEY`, falling back to `OPENAI_API_KEY`
//! - `BOOTH_API_BASE`, `BOOTH_OUTPUT_DIR`
//!
//! ## Examples
//!
//! ```rust
//! use photobooth::config::config::BoothConfig;
//!
//! let config = BoothConfig::default();
//! assert_eq!(config.image_size, 1024);
//! assert_eq!(config.target_width, 1820);
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use booth_geometry::{max_target_width, WidescreenPreset};
use tracing::warn;

use crate::error::{BoothError, BoothResult};

/// Provider name accepted in `IMAGE_GENERATOR_API`.
pub const OPENAI_PROVIDER_NAME: &str = "OpenAI";

/// Square sizes the image generation and edit endpoints accept.
pub const SUPPORTED_IMAGE_SIZES: [u32; 3] = [256, 512, 1024];

/// Default public OpenAI REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for background generation.
///
/// # Examples
///
/// ```rust
/// use photobooth::config::config::BoothConfig;
///
/// let config = BoothConfig {
///     api_key: "sk-test".to_string(),
///     target_width: 1638, // 16:10
///     ..BoothConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// assert!(config.validate_credentials().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BoothConfig {
    /// API key sent as a bearer token to the provider.
    ///
    /// Empty by default; commands that talk to the provider call
    /// [`BoothConfig::validate_credentials`] first.
    pub api_key: String,

    /// Provider REST base URL without a trailing slash.
    pub api_base: String,

    /// Side length of the square image requested from the generator.
    ///
    /// Must be one of [`SUPPORTED_IMAGE_SIZES`]. Both side fills are requested
    /// at this size too.
    pub image_size: u32,

    /// Width of the final widescreen canvas. Height equals `image_size`.
    pub target_width: u32,

    /// Chat model used to enhance prompts.
    pub chat_model: String,

    /// Whether prompts are expanded and rewritten before generation.
    pub enhance_prompt: bool,

    /// Timeout applied to each HTTP request, in seconds.
    pub request_timeout_secs: u64,

    /// Directory finished backgrounds are written to.
    pub output_dir: String,
}

impl Default for BoothConfig {
    /// Default values:
    /// - `image_size`: 1024
    /// - `target_width`: 1820 (16:9 at 1024px)
    /// - `chat_model`: "gpt-3.5-turbo"
    /// - `enhance_prompt`: true
    /// - `request_timeout_secs`: 120 (image edits are slow)
    /// - `output_dir`: "backgrounds"
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            image_size: 1024,
            target_width: 1820,
            chat_model: "gpt-3.5-turbo".to_string(),
            enhance_prompt: true,
            request_timeout_secs: 120,
            output_dir: "backgrounds".to_string(),
        }
    }
}

impl BoothConfig {
    /// Build a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Empty values count as unset.
    ///
    /// Time complexity: O(1) - a fixed number of lookups.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(api) = get("IMAGE_GENERATOR_API") {
            if !api.eq_ignore_ascii_case(OPENAI_PROVIDER_NAME) {
                warn!(
                    "IMAGE_GENERATOR_API={} cannot outpaint (no image edit endpoint); using {}",
                    api, OPENAI_PROVIDER_NAME
                );
            }
        }

        if let Some(key) = get("IMAGE_GENERATOR_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            config.api_key = key;
        }
        if let Some(base) = get("BOOTH_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(dir) = get("BOOTH_OUTPUT_DIR") {
            config.output_dir = dir;
        }
        config
    }

    /// Set `target_width` from an aspect preset at the current `image_size`.
    pub fn with_aspect(mut self, preset: WidescreenPreset) -> Self {
        self.target_width = preset.target_width(self.image_size);
        self
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validates everything except credentials.
    ///
    /// Time complexity: O(1) - constant-time range checks.
    pub fn validate(&self) -> BoothResult<()> {
        if !SUPPORTED_IMAGE_SIZES.contains(&self.image_size) {
            return Err(BoothError::config(
                "image_size",
                self.image_size.to_string(),
                "must be 256, 512 or 1024",
            ));
        }
        let max_width = max_target_width(self.image_size);
        if self.target_width <= self.image_size || self.target_width > max_width {
            return Err(BoothError::config(
                "target_width",
                self.target_width.to_string(),
                format!(
                    "must be greater than {} and at most {}",
                    self.image_size, max_width
                ),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(BoothError::config(
                "request_timeout_secs",
                "0",
                "must be greater than 0",
            ));
        }
        if self.enhance_prompt && self.chat_model.trim().is_empty() {
            return Err(BoothError::config(
                "chat_model",
                "",
                "required when prompt enhancement is enabled",
            ));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(BoothError::config(
                "api_base",
                self.api_base.clone(),
                "must be an http(s) URL",
            ));
        }
        Ok(())
    }

    /// Validates that an API key is present.
    pub fn validate_credentials(&self) -> BoothResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(BoothError::config(
                "api_key",
                "",
                "no API key; set IMAGE_GENERATOR_API_KEY or OPENAI_API_KEY, or pass --api-key",
            ));
        }
        Ok(())
    }
}
