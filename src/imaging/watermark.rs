//! Text watermark synthesis.
//!
//! The label is written as SVG markup (a `<text>` element whose `<tspan>`
//! carries the configured color), laid out with `usvg` against the system
//! font database, and rasterized with `resvg`. The glyph image is cropped to
//! its ink bounds, then padded with [`WATERMARK_PADDING`] transparent pixels on
//! every side so the text never touches the edge it is anchored to.
//!
//! One [`WatermarkLayer`] is built per generation run and shared read-only by
//! every breakpoint job.

use super::backend::BackendError;
use super::color::rgba_to_hex;
use super::params::Gravity;
use image::{ImageEncoder, Rgba, RgbaImage};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Transparent margin around the rendered text, in pixels.
pub const WATERMARK_PADDING: u32 = 20;

/// Color used when a watermark is configured without one.
pub const DEFAULT_WATERMARK_COLOR: &str = "rgba(255,255,255,0.5)";

/// What to stamp on every variant.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkSpec {
    pub text: String,
    pub position: Gravity,
    /// `rgb()` / `rgba()` functional color.
    pub color: String,
}

/// A rasterized watermark, ready to composite.
///
/// Holds the straight-alpha pixels for compositing and the same pixels as a
/// PNG buffer for callers that want the encoded layer.
#[derive(Clone)]
pub struct WatermarkLayer {
    image: RgbaImage,
    png: Arc<[u8]>,
    gravity: Gravity,
}

impl fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("png_bytes", &self.png.len())
            .field("gravity", &self.gravity)
            .finish()
    }
}

impl WatermarkLayer {
    /// Wrap already-rendered pixels, encoding them losslessly as PNG.
    pub fn from_image(image: RgbaImage, gravity: Gravity) -> Result<Self, BackendError> {
        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| BackendError::Render(format!("watermark PNG encode failed: {e}")))?;
        Ok(Self {
            image,
            png: png.into(),
            gravity,
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// The layer as a PNG with alpha.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Font settings for the watermark label.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkFont {
    /// CSS-style family list, e.g. `"Arial, sans-serif"`.
    pub family: String,
    /// Font size in pixels.
    pub size: f32,
    /// Extra directory of `.ttf`/`.otf`/`.ttc` files to load.
    pub font_dir: Option<PathBuf>,
}

impl Default for WatermarkFont {
    fn default() -> Self {
        Self {
            family: "Arial, sans-serif".to_string(),
            size: 42.0,
            font_dir: None,
        }
    }
}

/// Renders watermark labels. Loads the font database once at construction.
pub struct WatermarkSynthesizer {
    fontdb: Arc<usvg::fontdb::Database>,
    font: WatermarkFont,
}

impl WatermarkSynthesizer {
    pub fn new(font: WatermarkFont) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = &font.font_dir {
            load_fonts_from_dir(&mut db, dir);
        }
        ensure_sans_serif_fallback(&mut db);
        tracing::debug!(faces = db.len(), "watermark font database loaded");
        Self {
            fontdb: Arc::new(db),
            font,
        }
    }

    /// Number of font faces available for layout.
    pub fn font_count(&self) -> usize {
        self.fontdb.len()
    }

    pub fn synthesize(&self, spec: &WatermarkSpec) -> Result<WatermarkLayer, BackendError> {
        let color = rgba_to_hex(&spec.color)?;
        let svg = text_markup(&spec.text, &color, &self.font);

        let options = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| BackendError::Render(format!("watermark markup rejected: {e}")))?;

        let root = tree.root();
        let bounds = root.abs_bounding_box();
        if !root.has_children() || bounds.width() < 1.0 || bounds.height() < 1.0 {
            return Err(BackendError::Render(format!(
                "no glyphs rendered for {:?} (font family {:?}, {} faces loaded)",
                spec.text,
                self.font.family,
                self.fontdb.len()
            )));
        }

        let width = bounds.width().ceil() as u32;
        let height = bounds.height().ceil() as u32;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| BackendError::Render("failed to allocate text pixmap".into()))?;
        let transform = resvg::tiny_skia::Transform::from_translate(-bounds.x(), -bounds.y());
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let padded = pad_layer(&pixmap, WATERMARK_PADDING);
        tracing::debug!(
            text = %spec.text,
            width = padded.width(),
            height = padded.height(),
            "watermark synthesized"
        );
        WatermarkLayer::from_image(padded, spec.position)
    }
}

/// Copy a premultiplied pixmap into a straight-alpha image with a transparent
/// border of `padding` pixels.
fn pad_layer(pixmap: &resvg::tiny_skia::Pixmap, padding: u32) -> RgbaImage {
    let width = pixmap.width();
    let mut canvas = RgbaImage::new(width + 2 * padding, pixmap.height() + 2 * padding);
    for (index, pixel) in pixmap.pixels().iter().enumerate() {
        let color = pixel.demultiply();
        let x = index as u32 % width;
        let y = index as u32 / width;
        canvas.put_pixel(
            x + padding,
            y + padding,
            Rgba([color.red(), color.green(), color.blue(), color.alpha()]),
        );
    }
    canvas
}

/// SVG document for a single line of watermark text.
///
/// `hex` is `#rrggbb` or `#rrggbbaa`; the alpha byte becomes `fill-opacity`.
pub fn text_markup(text: &str, hex: &str, font: &WatermarkFont) -> String {
    let (fill, opacity) = split_alpha(hex);
    let size = font.size;
    // Generous canvas; the render step crops to the ink bounds anyway.
    let canvas_w = ((text.chars().count().max(1) as f32 + 2.0) * size).ceil();
    let canvas_h = (size * 2.0).ceil();
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{canvas_w}" height="{canvas_h}"><text x="{x}" y="{y}" font-family="{family}" font-size="{size}"><tspan fill="{fill}" fill-opacity="{opacity}">{body}</tspan></text></svg>"#,
        x = size / 2.0,
        y = size * 1.25,
        family = escape_xml(&font.family),
        body = escape_xml(text),
    )
}

fn split_alpha(hex: &str) -> (&str, f32) {
    if hex.len() == 9
        && let Ok(alpha) = u8::from_str_radix(&hex[7..9], 16)
    {
        return (&hex[..7], alpha as f32 / 255.0);
    }
    (hex, 1.0)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Point the generic `sans-serif` family at an installed face when the
/// database default (Arial) is missing, so unknown families still render.
fn ensure_sans_serif_fallback(db: &mut usvg::fontdb::Database) {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    let query = Query {
        families: &[Family::SansSerif],
        weight: Weight::NORMAL,
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    if db.query(&query).is_some() {
        return;
    }
    let fallback = db
        .faces()
        .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
    if let Some(name) = fallback {
        tracing::debug!(family = %name, "using fallback sans-serif family");
        db.set_sans_serif_family(name);
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "watermark font directory not readable");
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|e| e == "ttf" || e == "otf" || e == "ttc");
        if is_font && db.load_font_file(&path).is_err() {
            tracing::warn!(font = %path.display(), "failed to load font");
        }
    }
}
