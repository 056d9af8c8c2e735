//! Parameter types for image operations.
//!
//! These structs describe *what* to render, not *how*. They are the interface
//! between the [`operations`](super::operations) layer (which decides file
//! names, formats and geometry for a breakpoint) and the
//! [`backend`](super::backend) (which does the pixel work). Keeping them plain
//! data lets the orchestrator be tested against a mock backend.
//!
//! ## Types
//!
//! - [`Quality`] — Encoding quality (1–100, default 87). Clamped on construction.
//! - [`OutputFormat`] — Container formats with explicit encoding parameters.
//! - [`Gravity`] — One of nine overlay anchors for the watermark.
//! - [`Geometry`] — Target width plus optional height.
//! - [`RenderParams`] — Everything one variant render needs besides the source.

use super::watermark::WatermarkLayer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Quality setting for image encoding (1-100).
///
/// Lossy formats use it directly; PNG reinterprets it as compression effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(87)
    }
}

/// Output container formats the renderer can convert to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(alias = "jpeg")]
    Jpg,
    Png,
    Webp,
    Avif,
}

impl OutputFormat {
    /// Resolve a file extension (with or without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Canonical extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    pub fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
            Self::Avif => image::ImageFormat::Avif,
        }
    }

    pub fn mime_type(self) -> &'static str {
        self.image_format().to_mime_type()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where an overlay is anchored on the base image.
///
/// Compass names follow the usual image-library convention: `north` is the
/// top edge centered horizontally, `southeast` the bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    #[serde(alias = "top-left")]
    Northwest,
    #[serde(alias = "top")]
    North,
    #[serde(alias = "top-right")]
    Northeast,
    #[serde(alias = "left")]
    West,
    #[default]
    #[serde(alias = "centre")]
    Center,
    #[serde(alias = "right")]
    East,
    #[serde(alias = "bottom-left")]
    Southwest,
    #[serde(alias = "bottom")]
    South,
    #[serde(alias = "bottom-right")]
    Southeast,
}

/// Largest edge, in pixels, a variant may have. JPEG frame headers store
/// dimensions in 16 bits.
pub const MAX_DIMENSION: u32 = 65_535;

/// Target size of a variant. A missing height keeps the source aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub width: u32,
    pub height: Option<u32>,
}

impl Geometry {
    pub fn new(width: u32, height: Option<u32>) -> Self {
        Self {
            width,
            height: height.filter(|&h| h > 0),
        }
    }

    /// Double-resolution counterpart, or `None` when either edge would
    /// exceed [`MAX_DIMENSION`].
    pub fn doubled(self) -> Option<Self> {
        let double = |edge: u32| edge.checked_mul(2).filter(|&d| d <= MAX_DIMENSION);
        let height = match self.height {
            Some(h) => Some(double(h)?),
            None => None,
        };
        Some(Self {
            width: double(self.width)?,
            height,
        })
    }
}

/// Full specification for rendering one variant.
#[derive(Debug, Clone)]
pub struct RenderParams {
    pub output: PathBuf,
    pub geometry: Geometry,
    /// Encoder to use. `None` leaves the choice to the output extension.
    pub format: Option<OutputFormat>,
    pub quality: Quality,
    pub progressive: bool,
    pub auto_orientation: bool,
    pub watermark: Option<Arc<WatermarkLayer>>,
}
