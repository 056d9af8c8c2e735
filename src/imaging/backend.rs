//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations the variant pipeline
//! needs from pixel code: identify a source, synthesize the watermark layer,
//! render one variant to disk, and probe a rendered file.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests drive the
//! orchestrator through the recording `MockBackend` instead.

use super::params::RenderParams;
use super::watermark::{WatermarkLayer, WatermarkSpec};
use crate::source::SourceImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encoding failed: {0}")]
    Encoding(String),
    #[error("Watermark render failed: {0}")]
    Render(String),
    #[error("Invalid color format: {0}")]
    InvalidColorFormat(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Measured facts about a written variant file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub width: u32,
    pub height: u32,
    /// File size in bytes.
    pub size: u64,
}

/// Trait for image processing backends.
///
/// Implementations must be shareable across the worker pool: every method
/// takes `&self` and the orchestrator calls `render` concurrently.
pub trait ImageBackend: Send + Sync {
    /// Get source image dimensions.
    fn identify(&self, source: &SourceImage) -> Result<Dimensions, BackendError>;

    /// Rasterize the watermark text into a padded, transparent layer.
    fn synthesize_watermark(&self, spec: &WatermarkSpec) -> Result<WatermarkLayer, BackendError>;

    /// Render one variant of `source` to `params.output`.
    fn render(&self, source: &SourceImage, params: &RenderParams) -> Result<(), BackendError>;

    /// Read dimensions and byte size back from a written file.
    fn probe(&self, path: &Path) -> Result<Probe, BackendError>;
}
