// SPDX-License-Identifier: MIT
//! # Outpaint Plan Computation
//!
//! Computes where a square source lands on a wider canvas and which two
//! squares must be sent out for filling.
//!
//! ## Layout
//!
//! ```text
//!  0            overlap_offset                 target_width - side      target_width
//!  |----------------|----------------------------------|------------------------|
//!  |<------------ left crop (side x side) ------------>|                        |
//!  |                |<-------- centered source ------------------->|          |
//!  |                                    |<------------ right crop (side x side)->|
//! ```
//!
//! The left crop keeps `side - overlap_offset` columns of the original so the
//! provider has existing content to continue from. The right crop keeps the
//! same amount, or one column fewer when the excess is odd.
//!
//! ## Rounding
//!
//! An odd excess (`target_width - side`) is truncated when computing the
//! centered offset. The right crop is always anchored at `target_width - side`
//! so it ends flush with the canvas, which leaves the source one pixel closer
//! to the left edge than to the right one.

use std::fmt;

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// True when width equals height.
    pub fn is_square(&self) -> bool {
        self.w == self.h
    }

    /// Number of bytes an RGBA8 buffer of this size occupies.
    pub fn rgba_len(&self) -> usize {
        (self.w as usize) * (self.h as usize) * 4
    }
}

/// Rectangle in canvas pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    /// Exclusive right edge.
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.w)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.h)
    }

    /// Whether this rectangle lies entirely inside a `bounds`-sized area at the origin.
    pub fn fits_within(&self, bounds: Size) -> bool {
        self.right() <= u64::from(bounds.w) && self.bottom() <= u64::from(bounds.h)
    }

    /// Width of the horizontal intersection with `other`, 0 when disjoint.
    pub fn horizontal_overlap(&self, other: &Rect) -> u32 {
        let start = self.x.max(other.x) as u64;
        let end = self.right().min(other.right());
        end.saturating_sub(start) as u32
    }
}

/// Errors raised while planning or addressing pixel regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Source image has zero width or height
    Empty,
    /// Source image is not square
    NotSquare { w: u32, h: u32 },
    /// Requested canvas is not wider than the source
    TargetTooNarrow { side: u32, target_width: u32 },
    /// Requested canvas is so wide the side crops would not reach the source
    TargetTooWide { side: u32, target_width: u32, max_width: u32 },
    /// A rectangle does not fit inside the image it addresses
    RectOutOfBounds { rect: Rect, bounds: Size },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::Empty => write!(f, "Source image has no pixels"),
            GeometryError::NotSquare { w, h } => {
                write!(f, "Source image must be square, got {}x{}", w, h)
            }
            GeometryError::TargetTooNarrow { side, target_width } => write!(
                f,
                "Target width {} must exceed the source width {}",
                target_width, side
            ),
            GeometryError::TargetTooWide {
                side,
                target_width,
                max_width,
            } => write!(
                f,
                "Target width {} leaves no overlap with a {}px source (at most {})",
                target_width, side, max_width
            ),
            GeometryError::RectOutOfBounds { rect, bounds } => write!(
                f,
                "Region {}x{} at ({}, {}) does not fit inside {}x{}",
                rect.w, rect.h, rect.x, rect.y, bounds.w, bounds.h
            ),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Complete placement plan for one outpainting call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutpaintPlan {
    /// Square source dimensions
    pub source: Size,
    /// Final canvas: `target_width x side`
    pub canvas: Size,
    /// X offset of the centered source, `(target_width - side) / 2` truncated
    pub overlap_offset: u32,
    /// Where the source is drawn on the canvas
    pub center: Rect,
    /// Square region sent for the left fill, anchored at x = 0
    pub left_crop: Rect,
    /// Square region sent for the right fill, anchored at x = target_width - side
    pub right_crop: Rect,
}

impl OutpaintPlan {
    /// Side length of the source square and of both crops.
    pub fn side(&self) -> u32 {
        self.source.w
    }

    /// Columns of original content visible inside the left crop.
    pub fn overlap_width(&self) -> u32 {
        self.side().saturating_sub(self.overlap_offset)
    }

    /// Columns of original content visible inside the right crop.
    pub fn right_overlap_width(&self) -> u32 {
        self.right_crop.horizontal_overlap(&self.center)
    }
}

/// Compute the outpainting plan for a square source and a wider target.
///
/// # Arguments
/// * `source` - Dimensions of the square source image
/// * `target_width` - Width of the final canvas; height stays `source.h`
///
/// # Errors
/// Fails with [`GeometryError::Empty`], [`GeometryError::NotSquare`],
/// [`GeometryError::TargetTooNarrow`] or [`GeometryError::TargetTooWide`].
/// Each crop must keep at least one column of the source, so the widest
/// accepted canvas is `3 * side - 2`.
///
/// # Performance
/// O(1) integer arithmetic.
pub fn build_plan(source: Size, target_width: u32) -> Result<OutpaintPlan, GeometryError> {
    if source.w == 0 || source.h == 0 {
        return Err(GeometryError::Empty);
    }
    if !source.is_square() {
        return Err(GeometryError::NotSquare {
            w: source.w,
            h: source.h,
        });
    }
    let side = source.w;
    if target_width <= side {
        return Err(GeometryError::TargetTooNarrow { side, target_width });
    }

    let max_width = max_target_width(side);
    if target_width > max_width {
        return Err(GeometryError::TargetTooWide {
            side,
            target_width,
            max_width,
        });
    }

    let overlap_offset = (target_width - side) / 2;
    let right_x = target_width - side;

    Ok(OutpaintPlan {
        source,
        canvas: Size {
            w: target_width,
            h: side,
        },
        overlap_offset,
        center: Rect {
            x: overlap_offset,
            y: 0,
            w: side,
            h: side,
        },
        left_crop: Rect {
            x: 0,
            y: 0,
            w: side,
            h: side,
        },
        right_crop: Rect {
            x: right_x,
            y: 0,
            w: side,
            h: side,
        },
    })
}

/// Widest canvas whose side crops still overlap a `side`-pixel source.
pub fn max_target_width(side: u32) -> u32 {
    side.saturating_mul(3).saturating_sub(2)
}

/// Canvas width for a square of `side` pixels at aspect `num:den`, truncated.
///
/// 1024 at 16:9 gives 1820.
pub fn widescreen_width(side: u32, num: u32, den: u32) -> u32 {
    if den == 0 {
        return side;
    }
    (u64::from(side) * u64::from(num) / u64::from(den)) as u32
}

/// Common widescreen aspect ratios for photobooth backgrounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum WidescreenPreset {
    /// Standard HD displays and projectors
    #[value(name = "16:9")]
    Wide16x9,
    /// Common laptop panels
    #[value(name = "16:10")]
    Wide16x10,
    /// Ultrawide monitors
    #[value(name = "21:9")]
    Ultra21x9,
    /// Classic photo print ratio
    #[value(name = "3:2")]
    Photo3x2,
}

impl WidescreenPreset {
    /// `(num, den)` aspect pair.
    pub fn ratio(self) -> (u32, u32) {
        match self {
            WidescreenPreset::Wide16x9 => (16, 9),
            WidescreenPreset::Wide16x10 => (16, 10),
            WidescreenPreset::Ultra21x9 => (21, 9),
            WidescreenPreset::Photo3x2 => (3, 2),
        }
    }

    /// Target canvas width for a square of `side` pixels.
    pub fn target_width(self, side: u32) -> u32 {
        let (num, den) = self.ratio();
        widescreen_width(side, num, den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_1024_to_1820_plan() {
        let plan = build_plan(Size { w: 1024, h: 1024 }, 1820).unwrap();
        assert_eq!(plan.overlap_offset, 398);
        assert_eq!(plan.canvas, Size { w: 1820, h: 1024 });
        assert_eq!(plan.center, Rect { x: 398, y: 0, w: 1024, h: 1024 });
        assert_eq!(plan.left_crop, Rect { x: 0, y: 0, w: 1024, h: 1024 });
        assert_eq!(plan.right_crop, Rect { x: 796, y: 0, w: 1024, h: 1024 });
        assert_eq!(plan.overlap_width(), 626);
        assert_eq!(plan.right_overlap_width(), 626);
    }

    #[test]
    fn test_crops_overlap_center_by_overlap_width() {
        for (side, target) in [(64u32, 100u32), (64, 127), (512, 910), (10, 11), (256, 766)] {
            let plan = build_plan(Size { w: side, h: side }, target).unwrap();
            assert!(plan.left_crop.fits_within(plan.canvas));
            assert!(plan.right_crop.fits_within(plan.canvas));
            assert!(plan.center.fits_within(plan.canvas));
            assert_eq!(plan.left_crop.w, side);
            assert_eq!(plan.right_crop.w, side);
            assert_eq!(plan.right_crop.right(), u64::from(target));
            assert_eq!(
                plan.left_crop.horizontal_overlap(&plan.center),
                plan.overlap_width()
            );
            assert!(plan.right_overlap_width() >= 1);
        }
    }

    #[test]
    fn test_odd_excess_truncates() {
        let plan = build_plan(Size { w: 100, h: 100 }, 151).unwrap();
        assert_eq!(plan.overlap_offset, 25);
        assert_eq!(plan.right_crop.x, 51);
        // 25 columns of padding on the left, 26 on the right
        assert_eq!(u64::from(plan.canvas.w) - plan.center.right(), 26);
    }

    #[test]
    fn test_rejects_non_square() {
        let err = build_plan(Size { w: 1024, h: 900 }, 1820).unwrap_err();
        assert_eq!(err, GeometryError::NotSquare { w: 1024, h: 900 });
    }

    #[test]
    fn test_rejects_narrow_target() {
        assert!(matches!(
            build_plan(Size { w: 512, h: 512 }, 512),
            Err(GeometryError::TargetTooNarrow { .. })
        ));
        assert!(matches!(
            build_plan(Size { w: 512, h: 512 }, 300),
            Err(GeometryError::TargetTooNarrow { .. })
        ));
        assert_eq!(build_plan(Size { w: 0, h: 0 }, 10), Err(GeometryError::Empty));
    }

    #[test]
    fn test_rejects_target_without_overlap() {
        assert_eq!(
            build_plan(Size { w: 256, h: 256 }, 767),
            Err(GeometryError::TargetTooWide {
                side: 256,
                target_width: 767,
                max_width: 766,
            })
        );
        let widest = build_plan(Size { w: 256, h: 256 }, 766).unwrap();
        assert_eq!(widest.overlap_width(), 1);
        assert_eq!(widest.right_overlap_width(), 1);
    }

    #[test]
    fn test_widescreen_presets() {
        assert_eq!(WidescreenPreset::Wide16x9.target_width(1024), 1820);
        assert_eq!(WidescreenPreset::Wide16x10.target_width(1024), 1638);
        assert_eq!(WidescreenPreset::Ultra21x9.target_width(512), 1194);
        assert_eq!(WidescreenPreset::Photo3x2.target_width(256), 384);
        assert_eq!(widescreen_width(1024, 16, 0), 1024);
    }
}
