//! Image processing backend on the `image` crate ecosystem.
//!
//! Everything is statically linked into the binary; no ImageMagick, no libvips.
//! The one C component, libwebp, is compiled in by `libwebp-sys`.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image::ImageReader`, format sniffed from content |
//! | Auto-orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize (width only) | `DynamicImage::resize_exact`, Lanczos3, aspect-derived height |
//! | Resize (width × height) | `DynamicImage::resize_to_fill` (cover, center crop) |
//! | Watermark composite | `image::imageops::overlay` at the gravity anchor |
//! | Encode → JPEG | `jpeg_encoder::Encoder`, progressive scans on request |
//! | Encode → PNG | `PngEncoder::new_with_quality`, level = `floor(q/100*9)` |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy at the given quality) |
//! | Encode → AVIF | `AvifEncoder::new_with_speed_quality` (rav1e, speed 6) |
//! | Probe | `image::image_dimensions`; AVIF via `avif-parse` container metadata |
//! | Watermark text | [`WatermarkSynthesizer`] (usvg + resvg) |
//!
//! ## Limitations
//!
//! - The `progressive` flag only affects JPEG output.
//! - AVIF sources cannot be decoded (the `avif` feature is encode-only).

use super::backend::{BackendError, Dimensions, ImageBackend, Probe};
use super::calculations::{gravity_offset, output_dimensions, png_compression_level};
use super::params::{OutputFormat, Quality, RenderParams};
use super::watermark::{WatermarkFont, WatermarkLayer, WatermarkSpec, WatermarkSynthesizer};
use crate::source::SourceImage;
use image::codecs::avif::AvifEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

/// AVIF encoder speed (1 = slowest/best, 10 = fastest).
const AVIF_SPEED: u8 = 6;

/// Formats whose decoders are compiled in. AVIF is absent on purpose: the
/// `"avif"` feature only enables the encoder, even though
/// `ImageFormat::reading_enabled()` claims otherwise.
const DECODABLE: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    DECODABLE
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Image file extensions (without dot) that can be used as sources.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    synthesizer: WatermarkSynthesizer,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::with_font(WatermarkFont::default())
    }

    pub fn with_font(font: WatermarkFont) -> Self {
        Self {
            synthesizer: WatermarkSynthesizer::new(font),
        }
    }

    pub fn synthesizer(&self) -> &WatermarkSynthesizer {
        &self.synthesizer
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

fn decode_error(source: &SourceImage, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode(format!("{}: {}", source.name, e))
}

/// Decode the source from a fresh stream, applying EXIF orientation first
/// when asked. Returns the image and the container format that was sniffed.
fn load_source(
    source: &SourceImage,
    auto_orientation: bool,
) -> Result<(DynamicImage, Option<ImageFormat>), BackendError> {
    let reader = ImageReader::new(source.open()?).with_guessed_format()?;
    let detected = reader.format();
    if detected == Some(ImageFormat::Avif) {
        return Err(decode_error(source, "AVIF sources are not supported"));
    }

    let mut decoder = reader
        .into_decoder()
        .map_err(|e| decode_error(source, e))?;
    // Orientation lives in metadata the decoder drops once pixels are read.
    let orientation = if auto_orientation {
        Some(decoder.orientation().map_err(|e| decode_error(source, e))?)
    } else {
        None
    };
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(source, e))?;
    if let Some(orientation) = orientation {
        img.apply_orientation(orientation);
    }
    Ok((img, detected))
}

fn resize(img: &DynamicImage, params: &RenderParams) -> DynamicImage {
    let (width, height) = output_dimensions((img.width(), img.height()), params.geometry);
    if params.geometry.height.is_some() {
        img.resize_to_fill(width, height, FilterType::Lanczos3)
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    }
}

fn composite(img: DynamicImage, layer: &WatermarkLayer) -> DynamicImage {
    let mut canvas = img.into_rgba8();
    let (x, y) = gravity_offset(canvas.dimensions(), layer.dimensions(), layer.gravity());
    image::imageops::overlay(&mut canvas, layer.image(), x, y);
    DynamicImage::ImageRgba8(canvas)
}

fn encoding_error(format: impl std::fmt::Display, e: impl std::fmt::Display) -> BackendError {
    BackendError::Encoding(format!("{format} encode failed: {e}"))
}

/// The encoders take quality as a byte in 1-100.
fn encoder_quality(quality: Quality) -> Result<u8, BackendError> {
    u8::try_from(quality.value())
        .ok()
        .filter(|q| (1..=100).contains(q))
        .ok_or_else(|| {
            BackendError::Encoding(format!("quality {} is outside 1-100", quality.value()))
        })
}

/// The JPEG frame header stores each edge in 16 bits.
fn jpeg_edge(value: u32) -> Result<u16, BackendError> {
    u16::try_from(value).map_err(|_| encoding_error("JPEG", format!("{value} px edge too large")))
}

/// Encode `img` into `writer` with format-specific parameters.
fn encode<W: Write + std::io::Seek>(
    img: &DynamicImage,
    writer: &mut W,
    params: &RenderParams,
    quality: u8,
    fallback: Option<ImageFormat>,
) -> Result<(), BackendError> {
    match params.format {
        Some(OutputFormat::Jpg) => {
            let rgb = img.to_rgb8();
            let (width, height) = (jpeg_edge(rgb.width())?, jpeg_edge(rgb.height())?);
            let mut encoder = jpeg_encoder::Encoder::new(writer, quality);
            encoder.set_progressive(params.progressive);
            encoder
                .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
                .map_err(|e| encoding_error("JPEG", e))
        }
        Some(OutputFormat::Png) => {
            let compression = match png_compression_level(params.quality) {
                0 => CompressionType::Uncompressed,
                level => CompressionType::Level(level),
            };
            let encoder = PngEncoder::new_with_quality(writer, compression, PngFilter::Adaptive);
            img.write_with_encoder(encoder)
                .map_err(|e| encoding_error("PNG", e))
        }
        Some(OutputFormat::Webp) => {
            let rgba = img.to_rgba8();
            let encoded = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                .encode_simple(false, f32::from(quality))
                .map_err(|e| encoding_error("WebP", format!("{e:?}")))?;
            writer.write_all(&encoded)?;
            Ok(())
        }
        Some(OutputFormat::Avif) => {
            let encoder = AvifEncoder::new_with_speed_quality(writer, AVIF_SPEED, quality);
            img.write_with_encoder(encoder)
                .map_err(|e| encoding_error("AVIF", e))
        }
        None => {
            let format = fallback.ok_or_else(|| {
                BackendError::Encoding("no output format and source format unknown".into())
            })?;
            if !format.writing_enabled() {
                return Err(encoding_error(
                    format!("{format:?}"),
                    "writing not supported",
                ));
            }
            img.write_to(writer, format)
                .map_err(|e| encoding_error(format!("{format:?}"), e))
        }
    }
}

/// Extract dimensions from an AVIF file's container metadata (no decode).
fn identify_avif(path: &Path) -> Result<Dimensions, BackendError> {
    let data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&data)).map_err(|e| {
        BackendError::Decode(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::Decode(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &SourceImage) -> Result<Dimensions, BackendError> {
        let reader = ImageReader::new(source.open()?).with_guessed_format()?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| decode_error(source, e))?;
        Ok(Dimensions { width, height })
    }

    fn synthesize_watermark(&self, spec: &WatermarkSpec) -> Result<WatermarkLayer, BackendError> {
        self.synthesizer.synthesize(spec)
    }

    fn render(&self, source: &SourceImage, params: &RenderParams) -> Result<(), BackendError> {
        let quality = encoder_quality(params.quality)?;
        let (img, detected) = load_source(source, params.auto_orientation)?;
        let mut out = resize(&img, params);
        drop(img);
        if let Some(layer) = &params.watermark {
            out = composite(out, layer);
        }

        let file = File::create(&params.output)?;
        let mut writer = BufWriter::new(file);
        encode(&out, &mut writer, params, quality, detected)?;
        writer.flush()?;
        Ok(())
    }

    fn probe(&self, path: &Path) -> Result<Probe, BackendError> {
        let size = std::fs::metadata(path)?.len();
        let dims = if is_avif(path) || sniff_avif(path)? {
            identify_avif(path)?
        } else {
            let (width, height) = ImageReader::open(path)?
                .with_guessed_format()?
                .into_dimensions()
                .map_err(|e| {
                    BackendError::Decode(format!("Failed to probe {}: {e}", path.display()))
                })?;
            Dimensions { width, height }
        };
        Ok(Probe {
            width: dims.width,
            height: dims.height,
            size,
        })
    }
}

/// Variant files are named by hash without an extension, so AVIF output is
/// recognized by content.
fn sniff_avif(path: &Path) -> Result<bool, BackendError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.format() == Some(ImageFormat::Avif))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Geometry, Gravity};
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageEncoder, RgbImage, RgbaImage};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Encode a small gradient JPEG in memory.
    fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, 95)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 200, 255])
        });
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
            .unwrap();
        out
    }

    fn params(output: PathBuf, geometry: Geometry, format: Option<OutputFormat>) -> RenderParams {
        RenderParams {
            output,
            geometry,
            format,
            quality: Quality::new(80),
            progressive: false,
            auto_orientation: false,
            watermark: None,
        }
    }

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp", "gif"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
        assert!(!exts.contains(&"avif"));
    }

    #[test]
    fn identify_in_memory_jpeg() {
        let source = SourceImage::from_bytes("a.jpg", "a", jpeg_bytes(200, 150));
        let dims = RustBackend::new().identify(&source).unwrap();
        assert_eq!((dims.width, dims.height), (200, 150));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let source = SourceImage::from_path("/nonexistent/image.jpg", "x");
        assert!(matches!(
            RustBackend::new().identify(&source),
            Err(BackendError::Io(_))
        ));
    }

    #[test]
    fn render_width_only_keeps_aspect() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.jpg", "a", jpeg_bytes(400, 300));
        let output = tmp.path().join("small_a");
        let backend = RustBackend::new();
        backend
            .render(
                &source,
                &params(output.clone(), Geometry::new(200, None), Some(OutputFormat::Jpg)),
            )
            .unwrap();

        let probe = backend.probe(&output).unwrap();
        assert_eq!((probe.width, probe.height), (200, 150));
        assert!(probe.size > 0);
    }

    #[test]
    fn render_width_and_height_crops_to_box() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.jpg", "a", jpeg_bytes(400, 300));
        let output = tmp.path().join("thumb_a");
        let backend = RustBackend::new();
        backend
            .render(
                &source,
                &params(output.clone(), Geometry::new(100, Some(100)), Some(OutputFormat::Jpg)),
            )
            .unwrap();

        let probe = backend.probe(&output).unwrap();
        assert_eq!((probe.width, probe.height), (100, 100));
    }

    #[test]
    fn render_png_to_webp() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.png", "a", png_bytes(120, 60));
        let output = tmp.path().join("w_a");
        let backend = RustBackend::new();
        backend
            .render(
                &source,
                &params(output.clone(), Geometry::new(60, None), Some(OutputFormat::Webp)),
            )
            .unwrap();

        let reader = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::WebP));
        let probe = backend.probe(&output).unwrap();
        assert_eq!((probe.width, probe.height), (60, 30));
    }

    #[test]
    fn render_png_with_compression_level() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.png", "a", png_bytes(64, 64));
        let output = tmp.path().join("p_a");
        let backend = RustBackend::new();
        let mut p = params(output.clone(), Geometry::new(32, None), Some(OutputFormat::Png));
        p.quality = Quality::new(5);
        backend.render(&source, &p).unwrap();

        let probe = backend.probe(&output).unwrap();
        assert_eq!((probe.width, probe.height), (32, 32));
    }

    #[test]
    fn render_avif_and_probe_container() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.jpg", "a", jpeg_bytes(64, 48));
        let output = tmp.path().join("av_a");
        let backend = RustBackend::new();
        backend
            .render(
                &source,
                &params(output.clone(), Geometry::new(32, None), Some(OutputFormat::Avif)),
            )
            .unwrap();

        let probe = backend.probe(&output).unwrap();
        assert_eq!((probe.width, probe.height), (32, 24));
    }

    #[test]
    fn render_without_format_uses_source_format() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.png", "a", png_bytes(50, 50));
        let output = tmp.path().join("n_a");
        RustBackend::new()
            .render(&source, &params(output.clone(), Geometry::new(25, None), None))
            .unwrap();

        let reader = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Png));
    }

    #[test]
    fn render_garbage_source_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.jpg", "a", b"not an image".to_vec());
        let result = RustBackend::new().render(
            &source,
            &params(tmp.path().join("x"), Geometry::new(10, None), Some(OutputFormat::Jpg)),
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn render_into_missing_directory_is_io_error() {
        let source = SourceImage::from_bytes("a.jpg", "a", jpeg_bytes(20, 20));
        let result = RustBackend::new().render(
            &source,
            &params(
                PathBuf::from("/nonexistent/dir/out"),
                Geometry::new(10, None),
                Some(OutputFormat::Jpg),
            ),
        );
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn watermark_is_composited_at_gravity() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.png", "a", png_bytes(100, 100));
        let output = tmp.path().join("wm_a");

        let mark = RgbaImage::from_pixel(10, 10, image::Rgba([255, 0, 0, 255]));
        let layer = WatermarkLayer::from_image(mark, Gravity::Southeast).unwrap();
        let mut p = params(output.clone(), Geometry::new(100, None), Some(OutputFormat::Png));
        p.watermark = Some(Arc::new(layer));
        RustBackend::new().render(&source, &p).unwrap();

        let out = ImageReader::open(&output)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap()
            .to_rgba8();
        assert_eq!(out.get_pixel(95, 95).0, [255, 0, 0, 255]);
        assert_ne!(out.get_pixel(5, 5).0, [255, 0, 0, 255]);
    }

    /// Insert an EXIF APP1 segment carrying `orientation` right after SOI.
    fn with_exif_orientation(jpeg: Vec<u8>, orientation: u8) -> Vec<u8> {
        let mut app1 = vec![0xFF, 0xE1, 0x00, 0x22];
        app1.extend_from_slice(b"Exif\0\0");
        // Big-endian TIFF header, first IFD at offset 8.
        app1.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        // One entry: tag 0x0112 (Orientation), SHORT, count 1.
        app1.extend_from_slice(&[0x00, 0x01]);
        app1.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        app1.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        app1.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(app1.len(), 2 + 0x22);

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn plain_jpeg_keeps_orientation() {
        let source = SourceImage::from_bytes("a.jpg", "a", jpeg_bytes(40, 20));
        let (img, format) = load_source(&source, true).unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
        assert_eq!(format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn auto_orientation_rotates_before_resize() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes(
            "a.jpg",
            "a",
            with_exif_orientation(jpeg_bytes(40, 20), 6),
        );
        let backend = RustBackend::new();

        let output = tmp.path().join("oriented_a");
        let mut p = params(output.clone(), Geometry::new(20, None), Some(OutputFormat::Jpg));
        p.auto_orientation = true;
        backend.render(&source, &p).unwrap();
        let probe = backend.probe(&output).unwrap();
        assert_eq!((probe.width, probe.height), (20, 40));

        let output = tmp.path().join("raw_a");
        let p = params(output.clone(), Geometry::new(20, None), Some(OutputFormat::Jpg));
        backend.render(&source, &p).unwrap();
        let probe = backend.probe(&output).unwrap();
        assert_eq!((probe.width, probe.height), (20, 10));
    }

    /// Start-of-frame marker of the first frame header in a JPEG stream.
    fn sof_marker(jpeg: &[u8]) -> Option<u8> {
        jpeg.windows(2)
            .find(|w| w[0] == 0xFF && matches!(w[1], 0xC0 | 0xC1 | 0xC2))
            .map(|w| w[1])
    }

    #[test]
    fn progressive_flag_selects_jpeg_scan_mode() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.jpg", "a", jpeg_bytes(64, 48));
        let backend = RustBackend::new();

        let progressive = tmp.path().join("prog_a");
        let mut p = params(progressive.clone(), Geometry::new(32, None), Some(OutputFormat::Jpg));
        p.progressive = true;
        backend.render(&source, &p).unwrap();
        assert_eq!(sof_marker(&std::fs::read(&progressive).unwrap()), Some(0xC2));

        let baseline = tmp.path().join("base_a");
        let p = params(baseline.clone(), Geometry::new(32, None), Some(OutputFormat::Jpg));
        backend.render(&source, &p).unwrap();
        assert_eq!(sof_marker(&std::fs::read(&baseline).unwrap()), Some(0xC0));

        let probe = backend.probe(&progressive).unwrap();
        assert_eq!((probe.width, probe.height), (32, 24));
    }

    #[test]
    fn webp_quality_changes_output_size() {
        let tmp = TempDir::new().unwrap();
        let source = SourceImage::from_bytes("a.png", "a", png_bytes(128, 128));
        let backend = RustBackend::new();
        let size_at = |quality: u32, name: &str| {
            let output = tmp.path().join(name);
            let mut p = params(output.clone(), Geometry::new(128, None), Some(OutputFormat::Webp));
            p.quality = Quality::new(quality);
            backend.render(&source, &p).unwrap();
            backend.probe(&output).unwrap().size
        };
        assert!(size_at(10, "low") < size_at(95, "high"));
    }

    #[test]
    fn out_of_range_quality_is_encoding_error() {
        let tmp = TempDir::new().unwrap();
        let backend = RustBackend::new();
        let cases = [
            ("a.png", png_bytes(16, 16), OutputFormat::Png),
            ("a.jpg", jpeg_bytes(16, 16), OutputFormat::Jpg),
            ("a.jpg", jpeg_bytes(16, 16), OutputFormat::Avif),
        ];
        for (name, bytes, format) in cases {
            let source = SourceImage::from_bytes(name, "a", bytes);
            let mut p = params(tmp.path().join("q_a"), Geometry::new(8, None), Some(format));
            p.quality = Quality(300);
            let result = backend.render(&source, &p);
            assert!(
                matches!(result, Err(BackendError::Encoding(ref msg)) if msg.contains("300")),
                "{format}: {result:?}"
            );
        }
        assert!(!tmp.path().join("q_a").exists());
    }

    #[test]
    fn encoder_quality_bounds() {
        assert_eq!(encoder_quality(Quality::new(1)).unwrap(), 1);
        assert_eq!(encoder_quality(Quality::new(100)).unwrap(), 100);
        assert!(encoder_quality(Quality(0)).is_err());
        assert!(encoder_quality(Quality(101)).is_err());
        assert!(encoder_quality(Quality(u32::MAX)).is_err());
    }
}
