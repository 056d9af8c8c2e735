//! Image processing.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Color codec** | [`rgba_to_hex`], hand-parsed functional notation |
//! | **Watermark text** | usvg + resvg rasterization |
//! | **Resize + composite** | Lanczos3, `imageops::overlay` |
//! | **Encode** | `jpeg-encoder` (JPEG), `webp` (WebP), `image` (PNG, AVIF) |
//! | **Probe** | `image` headers, `avif-parse` for AVIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry and encoder math (unit testable)
//! - **Parameters**: Data structures describing one render
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: One keyed variant, from parameters to [`VariantFile`]

pub mod backend;
pub mod calculations;
pub mod color;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod watermark;

pub use backend::{BackendError, Dimensions, ImageBackend, Probe};
pub use color::{rgba_to_hex, rgba_to_hex_opaque};
pub use operations::{RenderOptions, VariantFile, get_dimensions, resize_file_to};
pub use params::{Geometry, Gravity, MAX_DIMENSION, OutputFormat, Quality, RenderParams};
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use watermark::{
    DEFAULT_WATERMARK_COLOR, WATERMARK_PADDING, WatermarkFont, WatermarkLayer, WatermarkSpec,
    WatermarkSynthesizer,
};
