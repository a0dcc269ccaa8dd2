//! # Background Session
//!
//! End-to-end flow behind the booth's "Generate" button:
//!
//! 1. **Prompt**: the form's final prompt, optionally expanded and rewritten
//!    by a [`PromptEnhancer`]
//! 2. **Generate**: one square image from an [`ImageGenerator`]
//! 3. **Extend**: the square is outpainted to the configured width by the
//!    [`OutpaintCompositor`]
//! 4. **Store**: the caller may write the finished [`Background`] to disk
//!
//! Uploaded images skip steps 1 and 2 through
//! [`BackgroundSession::extend_existing`].

// Standard library imports
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// External crate imports
use booth_geometry::max_target_width;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

// Internal module imports
use crate::compositor::OutpaintCompositor;
use crate::config::config::SUPPORTED_IMAGE_SIZES;
use crate::config::BoothConfig;
use crate::error::{BoothError, BoothResult};
use crate::prompt::PromptForm;
use crate::provider::{ImageFillProvider, ImageGenerator, OpenAiClient, PromptEnhancer};
use crate::raster::RasterImage;

/// A finished widescreen background.
#[derive(Debug, Clone)]
pub struct Background {
    /// `"{unix_millis}-{suffix}"`
    pub id: String,
    /// Prompt the guest asked for
    pub prompt: String,
    /// Rewritten prompt actually sent to the provider, when enhancement ran
    pub enhanced_prompt: Option<String>,
    pub image: RasterImage,
    pub created_at_ms: u64,
}

/// Metadata written next to the PNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundRecord {
    pub id: String,
    pub prompt: String,
    pub enhanced_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    pub created_at_ms: u64,
    pub file: String,
}

impl Background {
    pub fn new(
        prompt: impl Into<String>,
        enhanced_prompt: Option<String>,
        image: RasterImage,
    ) -> Self {
        let created_at_ms = unix_millis();
        Self {
            id: format!("{}-{}", created_at_ms, random_suffix()),
            prompt: prompt.into(),
            enhanced_prompt,
            image,
            created_at_ms,
        }
    }

    pub fn png_file_name(&self) -> String {
        format!("{}.png", self.id)
    }

    pub fn record(&self) -> BackgroundRecord {
        BackgroundRecord {
            id: self.id.clone(),
            prompt: self.prompt.clone(),
            enhanced_prompt: self.enhanced_prompt.clone(),
            width: self.image.width(),
            height: self.image.height(),
            created_at_ms: self.created_at_ms,
            file: self.png_file_name(),
        }
    }

    /// Write `{id}.png` and `{id}.json` into `dir`, creating it if needed.
    /// Returns the PNG path.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> BoothResult<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            BoothError::io("create_output_dir", e).with_path(dir.display().to_string())
        })?;

        let png_path = dir.join(self.png_file_name());
        fs::write(&png_path, self.image.encode_png()?).map_err(|e| {
            BoothError::io("write_background", e).with_path(png_path.display().to_string())
        })?;

        let json_path = dir.join(format!("{}.json", self.id));
        let json = serde_json::to_string_pretty(&self.record())?;
        fs::write(&json_path, json).map_err(|e| {
            BoothError::io("write_metadata", e).with_path(json_path.display().to_string())
        })?;

        info!("Background saved | {}", png_path.display());
        Ok(png_path)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Ten hex digits, enough to keep same-millisecond ids apart.
fn random_suffix() -> String {
    format!("{:010x}", rand::thread_rng().gen_range(0..1u64 << 40))
}

/// Generates and extends backgrounds with injected providers.
pub struct BackgroundSession {
    config: BoothConfig,
    generator: Arc<dyn ImageGenerator>,
    enhancer: Arc<dyn PromptEnhancer>,
    compositor: OutpaintCompositor<Arc<dyn ImageFillProvider>>,
}

impl BackgroundSession {
    /// Validates `config` and wires the providers together.
    pub fn new(
        config: BoothConfig,
        generator: Arc<dyn ImageGenerator>,
        enhancer: Arc<dyn PromptEnhancer>,
        filler: Arc<dyn ImageFillProvider>,
    ) -> BoothResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            generator,
            enhancer,
            compositor: OutpaintCompositor::new(filler),
        })
    }

    /// Session backed by one shared [`OpenAiClient`].
    pub fn with_openai(config: BoothConfig) -> BoothResult<Self> {
        let client = Arc::new(OpenAiClient::from_config(&config)?);
        Self::new(config, client.clone(), client.clone(), client)
    }

    /// Bound the wait for the two side fills of every extension.
    pub fn with_fill_timeout(mut self, timeout: Duration) -> Self {
        self.compositor = self.compositor.with_fill_timeout(timeout);
        self
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    pub fn compositor(&self) -> &OutpaintCompositor<Arc<dyn ImageFillProvider>> {
        &self.compositor
    }

    /// The form's prompt, and its enhanced rewrite when enhancement is on.
    pub async fn prepare_prompt(&self, form: &PromptForm) -> BoothResult<(String, Option<String>)> {
        let prompt = form.final_prompt()?;
        if !self.config.enhance_prompt {
            return Ok((prompt, None));
        }
        let enhanced = self
            .enhancer
            .enhance(&prompt)
            .await
            .map_err(|e| e.with_context("prompt enhancement"))?;
        info!("Prompt enhanced | '{}' -> '{}'", prompt, enhanced);
        Ok((prompt, Some(enhanced)))
    }

    /// Generate a square background from `form` and extend it.
    pub async fn create(&self, form: &PromptForm) -> BoothResult<Background> {
        let (prompt, enhanced) = self.prepare_prompt(form).await?;
        let generation_prompt = enhanced.as_deref().unwrap_or(&prompt).to_string();
        let side = self.config.image_size;

        info!("Generating {}px background", side);
        let bytes = self.generator.generate(&generation_prompt, side).await?;
        let square = RasterImage::decode(&bytes).map_err(|e| e.with_operation("generate"))?;
        if square.width() != side || square.height() != side {
            return Err(BoothError::provider(
                "image_generator",
                "generate",
                None,
                format!(
                    "malformed payload: image is {}x{}, expected {}x{}",
                    square.width(),
                    square.height(),
                    side,
                    side
                ),
            ));
        }

        let image = self
            .compositor
            .extend(&square, self.config.target_width, &generation_prompt)
            .await?;
        Ok(Background::new(prompt, enhanced, image))
    }

    /// Extend an image the guest supplied, keeping the configured aspect.
    pub async fn extend_existing(
        &self,
        source: &RasterImage,
        prompt: &str,
    ) -> BoothResult<Background> {
        self.extend_existing_to(source, prompt, None).await
    }

    /// Extend an uploaded image to `target_width`, or to the configured
    /// aspect when it is `None`. An explicit width is used as given and is
    /// checked against the upload's own side.
    pub async fn extend_existing_to(
        &self,
        source: &RasterImage,
        prompt: &str,
        target_width: Option<u32>,
    ) -> BoothResult<Background> {
        if prompt.trim().is_empty() {
            return Err(BoothError::validation("prompt", "must not be empty", ""));
        }
        let side = source.width();
        if source.is_square() && !SUPPORTED_IMAGE_SIZES.contains(&side) {
            return Err(BoothError::validation(
                "image_size",
                "must be 256, 512 or 1024 pixels square",
                side.to_string(),
            ));
        }

        let target_width = match target_width {
            Some(width) if source.is_square() => {
                let max_width = max_target_width(side);
                if width <= side || width > max_width {
                    return Err(BoothError::validation(
                        "target_width",
                        format!(
                            "must be greater than {} and at most {} for a {}px image",
                            side, max_width, side
                        ),
                        width.to_string(),
                    ));
                }
                width
            }
            Some(width) => width,
            None => self.target_width_for(side),
        };
        info!(
            "Extending {}x{} image to {}px",
            source.width(),
            source.height(),
            target_width
        );
        let image = self.compositor.extend(source, target_width, prompt).await?;
        Ok(Background::new(prompt, None, image))
    }

    /// Configured target width scaled to a square of `side`.
    ///
    /// The result is kept inside `side + 1 ..= 3 * side - 2`, the range the
    /// compositor accepts, so truncation at small sides never produces a
    /// canvas that is too narrow or too wide.
    pub fn target_width_for(&self, side: u32) -> u32 {
        if side == self.config.image_size {
            return self.config.target_width;
        }
        let scaled = u64::from(self.config.target_width) * u64::from(side)
            / u64::from(self.config.image_size);
        let lower = side.saturating_add(1);
        let upper = max_target_width(side).max(lower);
        u32::try_from(scaled).unwrap_or(u32::MAX).clamp(lower, upper)
    }
}
