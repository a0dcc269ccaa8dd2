//! # Photobooth Background Library
//!
//! Generates widescreen photobooth backgrounds from a short prompt. A hosted
//! image model can only produce squares, so the square is extended sideways
//! by asking the same provider to fill in the left and right edges.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `compositor`: Outpaints a square image to a wider canvas (two concurrent fills)
//! - `provider`: Provider traits and the OpenAI HTTP client
//! - `raster`: RGBA images, PNG and base64 codecs
//! - `prompt`: Guided/free-form prompt form, presets and enhancement prompts
//! - `session`: Prompt → generate → extend → store flow
//! - `config`: Configuration management and validation
//! - `error`: Error types with context and classification
//!
//! Pure placement math lives in the `booth-geometry` crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use photobooth::{extend_file, ExtendOptions};
//! use photobooth::config::BoothConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ExtendOptions {
//!     input: "koala.png".into(),
//!     prompt: "Koala, Australian outback, style: Pastel".to_string(),
//!     target_width: None,
//!     config: BoothConfig::from_env(),
//! };
//!
//! let saved = extend_file(options).await?;
//! println!("{}", saved.display());
//! # Ok(())
//! # }
//! ```

// Standard library imports
use std::path::PathBuf;

// External crate imports
use tracing::info;

// Internal module imports
pub mod compositor;
pub mod config;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod raster;
pub mod session;

use config::BoothConfig;

/// Re-export error types for convenience
pub use error::{BoothError, BoothResult, HasRecoverySuggestion, HasSeverity, Retryable};

pub use compositor::OutpaintCompositor;
pub use prompt::{PromptField, PromptForm, PromptMode};
pub use provider::{FillRequest, FillResponse, ImageFillProvider, ImageGenerator, PromptEnhancer};
pub use raster::RasterImage;
pub use session::{Background, BackgroundSession};

/// Re-export commonly used types from dependencies
pub use booth_geometry::{OutpaintPlan, WidescreenPreset};

/// Options for extending an existing image file.
#[derive(Debug, Clone)]
pub struct ExtendOptions {
    /// Square PNG (or any format `image` decodes) to extend.
    pub input: PathBuf,

    /// Prompt guiding both side fills, forwarded verbatim.
    pub prompt: String,

    /// Exact width of the result. `None` scales the configured width to the
    /// input's side.
    pub target_width: Option<u32>,

    /// Aspect, output directory and provider settings.
    pub config: BoothConfig,
}

/// Generate a background from `form` with the OpenAI provider and write it to
/// the configured output directory.
///
/// # Errors
///
/// Returns an error if the configuration or form is invalid, if any provider
/// call fails, or if the output cannot be written.
///
/// # Performance Characteristics
///
/// **Time complexity**: dominated by three sequential network round trips
/// (enhance, generate, the joined pair of fills), not by local work.
pub async fn generate_background(
    config: BoothConfig,
    form: &PromptForm,
) -> BoothResult<(Background, PathBuf)> {
    let output_dir = config.output_dir.clone();
    let session = BackgroundSession::with_openai(config)?;
    let background = session.create(form).await?;
    let path = background.write_to_dir(&output_dir)?;
    Ok((background, path))
}

/// Extend an existing image file and write the result to the configured
/// output directory.
///
/// # Errors
///
/// Returns an error if the input cannot be read or decoded, is not a
/// supported square, if `target_width` does not suit the input's side, or
/// if either side fill fails.
pub async fn extend_file(options: ExtendOptions) -> BoothResult<PathBuf> {
    let ExtendOptions {
        input,
        prompt,
        target_width,
        config,
    } = options;

    let bytes = std::fs::read(&input).map_err(|e| {
        BoothError::io("read_input", e).with_path(input.display().to_string())
    })?;
    let source = RasterImage::decode(&bytes)?;
    info!(
        "Loaded {} ({}x{})",
        input.display(),
        source.width(),
        source.height()
    );

    let output_dir = config.output_dir.clone();
    let session = BackgroundSession::with_openai(config)?;
    let background = session
        .extend_existing_to(&source, &prompt, target_width)
        .await?;
    background.write_to_dir(&output_dir)
}
