//! # Raster Images
//!
//! [`RasterImage`] is the in-memory RGBA8 pixel grid every stage works on:
//! decoded provider responses, crops sent out for filling, and the final
//! widescreen composite.
//!
//! Decoding is a plain synchronous call. Callers decode all inputs up front
//! and then draw them in a fixed order.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use booth_geometry::{GeometryError, Rect, Size};
use image::{ImageFormat, RgbaImage, imageops};

use crate::error::{BoothError, BoothResult};

/// Prefix of a PNG data URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// An RGBA8 image with integer width and height.
///
/// Values handed out by the library are never modified afterwards; only the
/// compositor draws into the canvas it owns before returning it.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    /// A fully transparent image.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Wrap a tightly packed RGBA8 buffer.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> BoothResult<Self> {
        let expected = Size {
            w: width,
            h: height,
        }
        .rgba_len();
        let actual = rgba.len();
        RgbaImage::from_raw(width, height, rgba)
            .map(|pixels| Self { pixels })
            .ok_or_else(|| {
                BoothError::decode(
                    "from_rgba",
                    format!("buffer has {} bytes, expected {}", actual, expected),
                )
            })
    }

    /// Decode any format the `image` crate can sniff (PNG in practice).
    pub fn decode(bytes: &[u8]) -> BoothResult<Self> {
        if bytes.is_empty() {
            return Err(BoothError::decode("decode", "no image bytes"));
        }
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| BoothError::decode("decode", e.to_string()))?;
        Ok(Self {
            pixels: decoded.to_rgba8(),
        })
    }

    /// Decode a base64 payload, with or without a `data:image/...;base64,` prefix.
    pub fn decode_base64(encoded: &str) -> BoothResult<Self> {
        let bytes = decode_base64_payload(encoded)?;
        Self::decode(&bytes)
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> BoothResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.pixels
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| BoothError::external("image", e))?;
        Ok(out.into_inner())
    }

    /// PNG bytes, base64 encoded.
    pub fn to_base64_png(&self) -> BoothResult<String> {
        Ok(general_purpose::STANDARD.encode(self.encode_png()?))
    }

    /// `data:image/png;base64,...`
    pub fn to_data_url(&self) -> BoothResult<String> {
        Ok(format!("{}{}", PNG_DATA_URL_PREFIX, self.to_base64_png()?))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.width(),
            h: self.height(),
        }
    }

    pub fn is_square(&self) -> bool {
        self.size().is_square()
    }

    /// RGBA value at `(x, y)`; panics when out of bounds, like indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Raw tightly packed RGBA8 bytes, row-major.
    pub fn as_rgba(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Copy out the pixels inside `rect`.
    pub fn crop(&self, rect: Rect) -> BoothResult<Self> {
        self.check_region(rect)?;
        Ok(Self {
            pixels: imageops::crop_imm(&self.pixels, rect.x, rect.y, rect.w, rect.h).to_image(),
        })
    }

    /// Overwrite the region at `(x, y)` with `src`, alpha included.
    ///
    /// Fails without writing anything when `src` would extend past an edge.
    pub(crate) fn draw(&mut self, src: &RasterImage, x: u32, y: u32) -> BoothResult<()> {
        self.check_region(Rect {
            x,
            y,
            w: src.width(),
            h: src.height(),
        })?;
        imageops::replace(&mut self.pixels, &src.pixels, i64::from(x), i64::from(y));
        Ok(())
    }

    fn check_region(&self, rect: Rect) -> BoothResult<()> {
        if !rect.fits_within(self.size()) {
            return Err(GeometryError::RectOutOfBounds {
                rect,
                bounds: self.size(),
            }
            .into());
        }
        Ok(())
    }
}

/// Strip an optional data URL header and decode the base64 body.
pub fn decode_base64_payload(encoded: &str) -> BoothResult<Vec<u8>> {
    let body = match encoded.find(";base64,") {
        Some(idx) if encoded.starts_with("data:") => &encoded[idx + ";base64,".len()..],
        _ => encoded,
    };
    general_purpose::STANDARD
        .decode(body.trim())
        .map_err(|e| BoothError::decode("base64", e.to_string()))
}
