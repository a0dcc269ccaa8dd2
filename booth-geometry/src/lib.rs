// SPDX-License-Identifier: MIT
//! # booth-geometry: Crop Planning for Square-to-Widescreen Outpainting
//!
//! Image generators that only emit square images can still produce a
//! widescreen background: place the square in the middle of a wider canvas,
//! cut a square off each end (part empty, part original), have the provider
//! fill those two squares in, and paste them back.
//!
//! This crate holds the pure pixel math for that process. It does no I/O and
//! knows nothing about providers or image codecs.
//!
//! ## Key Components
//!
//! - [`plan`]: Canvas size, centered placement and the two side crops
//!
//! ## Usage Example
//!
//! ```rust
//! use booth_geometry::plan::{build_plan, Rect, Size};
//!
//! let plan = build_plan(Size { w: 1024, h: 1024 }, 1820).unwrap();
//! assert_eq!(plan.overlap_offset, 398);
//! assert_eq!(plan.left_crop, Rect { x: 0, y: 0, w: 1024, h: 1024 });
//! assert_eq!(plan.right_crop, Rect { x: 796, y: 0, w: 1024, h: 1024 });
//! assert_eq!(plan.canvas, Size { w: 1820, h: 1024 });
//! ```

pub mod plan;

pub use plan::{
    build_plan, max_target_width, widescreen_width, GeometryError, OutpaintPlan, Rect, Size,
    WidescreenPreset,
};
