//! # Outpainting Compositor
//!
//! Turns one square image into a widescreen one. The square is centered on a
//! transparent canvas, the two edge squares of the canvas are sent out for
//! filling at the same time, and the fills are painted back over their slots.
//!
//! ```text
//!  0          T-S                        overlap_offset + S        T
//!  |  left crop  |                                |                 |
//!  [=============]
//!  |        [========= source (centered) =========]                 |
//!                                  [==========  right crop  ========]
//! ```
//!
//! The fills are drawn last and overwrite the source where they overlap it.
//! Nothing is drawn unless both fills succeed.

use std::time::Duration;

use booth_geometry::{build_plan, OutpaintPlan};
use futures_util::future::try_join;
use tracing::debug;

use crate::error::{BoothError, BoothResult};
use crate::provider::{FillRequest, FillResponse, ImageFillProvider};
use crate::raster::RasterImage;

/// Provider label used for errors raised while checking fill results.
const FILL_PROVIDER: &str = "image_fill";

/// Which edge slot a fill belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillSide {
    Left,
    Right,
}

impl FillSide {
    pub fn operation(&self) -> &'static str {
        match self {
            FillSide::Left => "left_fill",
            FillSide::Right => "right_fill",
        }
    }
}

/// Extends square images to a wider canvas through an [`ImageFillProvider`].
///
/// The provider is shared and never mutated; every call to
/// [`OutpaintCompositor::extend`] owns its own canvas, so one compositor can
/// serve concurrent calls.
pub struct OutpaintCompositor<P> {
    provider: P,
    fill_timeout: Option<Duration>,
}

impl<P: ImageFillProvider> OutpaintCompositor<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            fill_timeout: None,
        }
    }

    /// Bound the wait for both fills. Without it the compositor waits as long
    /// as the provider does.
    pub fn with_fill_timeout(mut self, timeout: Duration) -> Self {
        self.fill_timeout = Some(timeout);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Placement plan for `source` at `target_width`.
    pub fn plan(&self, source: &RasterImage, target_width: u32) -> BoothResult<OutpaintPlan> {
        build_plan(source.size(), target_width)
            .map_err(|e| BoothError::invalid_geometry("extend", e))
    }

    /// Extend `source` to `target_width`, filling both sides with content
    /// guided by `prompt`.
    ///
    /// Geometry is checked before any provider call. Either fill failing
    /// fails the whole call; when one fails first the other request is
    /// dropped.
    pub async fn extend(
        &self,
        source: &RasterImage,
        target_width: u32,
        prompt: &str,
    ) -> BoothResult<RasterImage> {
        let plan = self.plan(source, target_width)?;
        let side = plan.side();
        debug!(
            "Outpaint plan | source {}x{} -> {}x{} | offset {} | overlap {}/{}",
            plan.source.w,
            plan.source.h,
            plan.canvas.w,
            plan.canvas.h,
            plan.overlap_offset,
            plan.overlap_width(),
            plan.right_overlap_width()
        );

        let mut canvas = RasterImage::transparent(plan.canvas.w, plan.canvas.h);
        canvas.draw(source, plan.center.x, plan.center.y)?;

        let left_crop = canvas.crop(plan.left_crop)?.encode_png()?;
        let right_crop = canvas.crop(plan.right_crop)?.encode_png()?;
        let left_request = FillRequest::new(left_crop, prompt, side);
        let right_request = FillRequest::new(right_crop, prompt, side);

        let fills = try_join(
            self.provider.fill(left_request),
            self.provider.fill(right_request),
        );
        let (left, right) = match self.fill_timeout {
            Some(limit) => tokio::time::timeout(limit, fills)
                .await
                .map_err(|_| BoothError::timeout("outpaint_fill", limit.as_millis() as u64))??,
            None => fills.await?,
        };

        let left = decode_fill(FillSide::Left, &left, side)?;
        let right = decode_fill(FillSide::Right, &right, side)?;

        canvas.draw(&left, plan.left_crop.x, plan.left_crop.y)?;
        canvas.draw(&right, plan.right_crop.x, plan.right_crop.y)?;
        debug!("Outpaint composite ready | {}x{}", canvas.width(), canvas.height());
        Ok(canvas)
    }
}

/// Decode a fill and check it is a `side`×`side` square.
fn decode_fill(which: FillSide, response: &FillResponse, side: u32) -> BoothResult<RasterImage> {
    let image = RasterImage::decode(&response.image_bytes)
        .map_err(|e| e.with_operation(which.operation()))?;
    if image.width() != side || image.height() != side {
        return Err(BoothError::provider(
            FILL_PROVIDER,
            which.operation(),
            None,
            format!(
                "malformed payload: fill is {}x{}, expected {}x{}",
                image.width(),
                image.height(),
                side,
                side
            ),
        ));
    }
    Ok(image)
}
