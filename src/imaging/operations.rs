//! High-level image operations.
//!
//! These functions combine calculations with backend execution: decide the
//! output name, hash, extension and encoder for one variant, hand the pixel
//! work to the backend, then read the written file back for its metadata.

use super::backend::{BackendError, ImageBackend};
use super::calculations::bytes_to_kb;
use super::params::{Geometry, OutputFormat, Quality, RenderParams};
use super::watermark::WatermarkLayer;
use crate::source::SourceImage;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get source dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, source: &SourceImage) -> Result<(u32, u32)> {
    let dims = backend.identify(source)?;
    Ok((dims.width, dims.height))
}

/// Encoding options shared by every variant of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub quality: Quality,
    pub progressive: bool,
    pub auto_orientation: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            progressive: true,
            auto_orientation: false,
        }
    }
}

/// A variant file written to the working directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantFile {
    /// `{key}_{source name}`
    pub name: String,
    /// `{key}_{source hash}`, also the file name under the working directory.
    pub hash: String,
    /// Extension with leading dot.
    pub ext: String,
    pub mime: String,
    /// Storage path inherited from the source.
    pub path: Option<String>,
    /// Where the bytes were written.
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Size in KB (1000 bytes), two decimals.
    pub size: f64,
}

impl VariantFile {
    /// Open a fresh reader over the written bytes.
    pub fn open(&self) -> io::Result<BufReader<File>> {
        Ok(BufReader::new(File::open(&self.output)?))
    }
}

/// Which encoder a variant gets: the conversion target, else the format the
/// source extension names. `None` leaves it to the detected source format.
pub fn resolve_format(
    source: &SourceImage,
    convert_to_format: Option<OutputFormat>,
) -> Option<OutputFormat> {
    convert_to_format.or_else(|| OutputFormat::from_extension(&source.ext))
}

/// Render one keyed variant of `source` into `work_dir` and describe it.
///
/// The file lands at `work_dir/{key}_{hash}`. When `convert_to_format` is
/// set the extension becomes `.{format}` and the mime type follows it;
/// otherwise both are inherited from the source.
#[allow(clippy::too_many_arguments)]
pub fn resize_file_to(
    backend: &impl ImageBackend,
    source: &SourceImage,
    key: &str,
    geometry: Geometry,
    convert_to_format: Option<OutputFormat>,
    options: RenderOptions,
    watermark: Option<Arc<WatermarkLayer>>,
    work_dir: &Path,
) -> Result<VariantFile> {
    let name = format!("{}_{}", key, source.name);
    let hash = format!("{}_{}", key, source.hash);
    let output = work_dir.join(&hash);

    let params = RenderParams {
        output: output.clone(),
        geometry,
        format: resolve_format(source, convert_to_format),
        quality: options.quality,
        progressive: options.progressive,
        auto_orientation: options.auto_orientation,
        watermark,
    };
    backend.render(source, &params)?;
    let probe = backend.probe(&output)?;

    let (ext, mime) = match convert_to_format {
        Some(format) => (format!(".{}", format.extension()), format.mime_type().to_string()),
        None => (source.ext.clone(), source.mime.clone()),
    };

    Ok(VariantFile {
        name,
        hash,
        ext,
        mime,
        path: source.path.clone(),
        output,
        width: probe.width,
        height: probe.height,
        size: bytes_to_kb(probe.size),
    })
}
