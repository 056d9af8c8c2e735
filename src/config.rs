//! Settings module.
//!
//! Handles loading, validating, and merging `responsive.toml`. Stock defaults
//! are the base layer; a user file overrides only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [upload]
//! responsive_dimensions = true   # Master switch for variant generation
//! auto_orientation = false       # Apply EXIF orientation before resizing
//!
//! [responsive]
//! quality = 87                   # Encoder quality (1-100)
//! progressive = true
//! # watermark_text = "© Studio"  # No text = no watermark
//! watermark_position = "center"  # One of nine compass anchors
//! # watermark_color = "rgba(255,255,255,0.5)"
//!
//! [[responsive.formats]]
//! name = "large"
//! width = 1000
//! # height = 600                # Omit to keep the aspect ratio
//! # x2 = true                    # Also emit large_x2 at double size
//! # convert_to_format = "webp"   # jpg, png, webp or avif
//!
//! [watermark]
//! font_family = "Arial, sans-serif"
//! font_size = 42.0
//! # font_dir = "fonts"
//!
//! [processing]
//! # max_processes = 4            # Omit for auto = CPU cores
//! # job_timeout_secs = 120       # Omit or 0 for no limit
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [responsive]
//! quality = 75
//! watermark_text = "example.com"
//! ```
//!
//! Tables merge key by key. Arrays replace: a file that lists
//! `[[responsive.formats]]` replaces the whole stock breakpoint set.
//!
//! ## Validation
//!
//! Unknown keys are rejected. Quality must be 1-100, there must be at least
//! one format, format names must be unique, non-empty and usable in file
//! names, widths must be positive, and a configured watermark color must
//! parse.

use crate::imaging::{Gravity, MAX_DIMENSION, Quality, WatermarkFont, rgba_to_hex};
use crate::responsive::{
    Breakpoint, GenerationConfig, default_breakpoints, watermark_from_settings,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "responsive.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `responsive.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Upload-level switches.
    pub upload: UploadConfig,
    /// Breakpoints, encoding and watermark text.
    pub responsive: ResponsiveConfig,
    /// How watermark text is set.
    pub watermark: WatermarkConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Settings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let responsive = &self.responsive;
        if !(1..=100).contains(&responsive.quality) {
            return Err(ConfigError::Validation(
                "responsive.quality must be 1-100".into(),
            ));
        }
        if responsive.formats.is_empty() {
            return Err(ConfigError::Validation(
                "responsive.formats must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for format in &responsive.formats {
            let name = format.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Validation(
                    "responsive.formats: name must not be empty".into(),
                ));
            }
            if name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(ConfigError::Validation(format!(
                    "responsive.formats: name {name:?} is not usable in a file name"
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Validation(format!(
                    "responsive.formats: duplicate name {name:?}"
                )));
            }
            if format.width == 0 {
                return Err(ConfigError::Validation(format!(
                    "responsive.formats: {name} width must be greater than 0"
                )));
            }
            // x2 variants are rendered at twice the configured size.
            let limit = if format.x2 {
                MAX_DIMENSION / 2
            } else {
                MAX_DIMENSION
            };
            let largest = format.width.max(format.height.unwrap_or(0));
            if largest > limit {
                return Err(ConfigError::Validation(format!(
                    "responsive.formats: {name} exceeds {limit} px per edge{}",
                    if format.x2 { " (x2 doubles it)" } else { "" }
                )));
            }
        }
        // The x2 key of one breakpoint must not shadow another breakpoint.
        for format in responsive.formats.iter().filter(|f| f.x2) {
            let doubled = format!("{}_x2", format.name.trim());
            if seen.contains(doubled.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "responsive.formats: {doubled} clashes with the x2 variant of {}",
                    format.name
                )));
            }
        }

        if let Some(color) = &responsive.watermark_color {
            rgba_to_hex(color).map_err(|e| {
                ConfigError::Validation(format!("responsive.watermark_color: {e}"))
            })?;
        }
        if !(self.watermark.font_size.is_finite() && self.watermark.font_size > 0.0) {
            return Err(ConfigError::Validation(
                "watermark.font_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Build the explicit configuration a generation run consumes.
    pub fn to_generation_config(&self) -> GenerationConfig {
        let responsive = &self.responsive;
        GenerationConfig {
            responsive_dimensions: self.upload.responsive_dimensions,
            auto_orientation: self.upload.auto_orientation,
            breakpoints: responsive.formats.clone(),
            quality: Quality::new(responsive.quality),
            progressive: responsive.progressive,
            watermark: watermark_from_settings(
                responsive.watermark_text.as_deref(),
                responsive.watermark_position,
                responsive.watermark_color.as_deref(),
            ),
            max_workers: effective_threads(&self.processing),
            job_timeout: self
                .processing
                .job_timeout_secs
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
        }
    }

    /// Font settings for the watermark synthesizer.
    pub fn watermark_font(&self) -> WatermarkFont {
        WatermarkFont {
            family: self.watermark.font_family.clone(),
            size: self.watermark.font_size,
            font_dir: self.watermark.font_dir.clone(),
        }
    }
}

/// Switches the upload subsystem owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Generate responsive variants at all.
    pub responsive_dimensions: bool,
    /// Rotate per EXIF orientation before resizing.
    pub auto_orientation: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            responsive_dimensions: true,
            auto_orientation: false,
        }
    }
}

/// Breakpoints and encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponsiveConfig {
    pub quality: u32,
    pub progressive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark_text: Option<String>,
    pub watermark_position: Gravity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark_color: Option<String>,
    pub formats: Vec<Breakpoint>,
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
            progressive: true,
            watermark_text: None,
            watermark_position: Gravity::default(),
            watermark_color: None,
            formats: default_breakpoints(),
        }
    }
}

/// Watermark typography.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    pub font_family: String,
    pub font_size: f32,
    /// Directory of extra fonts, loaded on top of the system fonts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_dir: Option<PathBuf>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        let font = WatermarkFont::default();
        Self {
            font_family: font.family,
            font_size: font.size,
            font_dir: font.font_dir,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of concurrently rendering variants.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
    /// Per-variant time limit in seconds. Absent or 0 means no limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_timeout_secs: Option<u64>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay (arrays included) replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Settings = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load settings from `responsive.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(dir: &Path) -> Result<Settings, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Like [`load_config`], for an explicit file path. The file must exist.
pub fn load_config_file(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock `responsive.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Responsive Variants Configuration
# =================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Upload
# ---------------------------------------------------------------------------
[upload]
# Generate responsive variants for every upload. When false, nothing is
# rendered regardless of the formats below.
responsive_dimensions = true

# Rotate images according to their EXIF orientation before resizing.
auto_orientation = false

# ---------------------------------------------------------------------------
# Responsive variants
# ---------------------------------------------------------------------------
[responsive]
# Encoder quality (1 = worst, 100 = best). PNG maps this onto compression
# effort: level = floor(quality / 100 * 9).
quality = 87

# Write progressive JPEG scans. Other formats ignore it.
progressive = true

# Text stamped onto every variant. Leave unset for no watermark.
# watermark_text = "© Your Name"

# Anchor: northwest, north, northeast, west, center, east,
#         southwest, south, southeast.
watermark_position = "center"

# rgb(r,g,b) or rgba(r,g,b,a) with a in 0-1.
# watermark_color = "rgba(255,255,255,0.5)"

# One table per breakpoint. Listing any replaces the whole stock set.
# height: omit to keep the aspect ratio; with a height the image is
#         scaled to cover the box and center-cropped.
# x2: also emit "{name}_x2" at double width (and height).
# convert_to_format: jpg, png, webp or avif.
[[responsive.formats]]
name = "large"
width = 1000

[[responsive.formats]]
name = "medium"
width = 750

[[responsive.formats]]
name = "small"
width = 500

[[responsive.formats]]
name = "thumbnail"
width = 245
height = 156

# ---------------------------------------------------------------------------
# Watermark typography
# ---------------------------------------------------------------------------
[watermark]
# CSS-style family list, resolved against system fonts.
font_family = "Arial, sans-serif"

# Text size in pixels.
font_size = 42.0

# Extra directory of .ttf/.otf/.ttc files.
# font_dir = "fonts"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum concurrently rendering variants.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Fail a variant that takes longer than this many seconds.
# Omit or set to 0 for no limit.
# job_timeout_secs = 120
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::OutputFormat;
    use tempfile::TempDir;

    fn cores() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    #[test]
    fn default_config_has_stock_breakpoints() {
        let config = Settings::default();
        let names: Vec<&str> = config
            .responsive
            .formats
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["large", "medium", "small", "thumbnail"]);
        assert_eq!(config.responsive.formats[3].height, Some(156));
        assert_eq!(config.responsive.quality, 87);
        assert!(config.responsive.progressive);
        assert!(config.upload.responsive_dimensions);
        assert!(!config.upload.auto_orientation);
    }

    #[test]
    fn default_config_validates() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[responsive]
quality = 75
watermark_text = "example.com"
"#;
        let config: Settings = toml::from_str(toml).unwrap();
        assert_eq!(config.responsive.quality, 75);
        assert_eq!(config.responsive.watermark_text.as_deref(), Some("example.com"));
        // Defaults preserved
        assert_eq!(config.responsive.formats.len(), 4);
        assert_eq!(config.watermark.font_size, 42.0);
    }

    #[test]
    fn parse_formats_with_conversion_and_x2() {
        let toml = r#"
[[responsive.formats]]
name = "hero"
width = 1600
height = 900
x2 = true
convert_to_format = "webp"

[[responsive.formats]]
name = "card"
width = 400
"#;
        let config: Settings = toml::from_str(toml).unwrap();
        assert_eq!(config.responsive.formats.len(), 2);
        let hero = &config.responsive.formats[0];
        assert!(hero.x2);
        assert_eq!(hero.convert_to_format, Some(OutputFormat::Webp));
        assert_eq!(config.responsive.formats[1].height, None);
    }

    #[test]
    fn generation_config_from_settings() {
        let toml = r#"
[upload]
auto_orientation = true

[responsive]
quality = 60
progressive = false
watermark_text = "© Studio"
watermark_position = "southeast"

[processing]
max_processes = 1
job_timeout_secs = 30
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        let generation = settings.to_generation_config();
        assert!(generation.responsive_dimensions);
        assert!(generation.auto_orientation);
        assert_eq!(generation.quality.value(), 60);
        assert!(!generation.progressive);
        assert_eq!(generation.max_workers, 1);
        assert_eq!(generation.job_timeout, Some(Duration::from_secs(30)));
        let watermark = generation.watermark.unwrap();
        assert_eq!(watermark.text, "© Studio");
        assert_eq!(watermark.position, Gravity::Southeast);
        assert_eq!(watermark.color, "rgba(255,255,255,0.5)");
    }

    #[test]
    fn zero_timeout_means_none() {
        let settings: Settings = toml::from_str("[processing]\njob_timeout_secs = 0").unwrap();
        assert_eq!(settings.to_generation_config().job_timeout, None);
    }

    #[test]
    fn blank_watermark_text_means_no_watermark() {
        let settings: Settings =
            toml::from_str("[responsive]\nwatermark_text = \"\"").unwrap();
        assert!(settings.to_generation_config().watermark.is_none());
    }

    #[test]
    fn watermark_font_from_settings() {
        let settings: Settings = toml::from_str(
            "[watermark]\nfont_family = \"DejaVu Sans\"\nfont_size = 24.0\nfont_dir = \"fonts\"",
        )
        .unwrap();
        let font = settings.watermark_font();
        assert_eq!(font.family, "DejaVu Sans");
        assert_eq!(font.size, 24.0);
        assert_eq!(font.font_dir, Some(PathBuf::from("fonts")));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    fn invalid(toml: &str) -> String {
        let settings = resolve_config(
            stock_defaults_value(),
            Some(toml::from_str(toml).unwrap()),
        );
        match settings {
            Err(ConfigError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn quality_out_of_range_rejected() {
        assert!(invalid("[responsive]\nquality = 0").contains("quality"));
        assert!(invalid("[responsive]\nquality = 101").contains("quality"));
    }

    #[test]
    fn empty_formats_rejected() {
        assert!(invalid("[responsive]\nformats = []").contains("must not be empty"));
    }

    #[test]
    fn duplicate_format_names_rejected() {
        let msg = invalid(
            r#"
[[responsive.formats]]
name = "a"
width = 100
[[responsive.formats]]
name = "a"
width = 200
"#,
        );
        assert!(msg.contains("duplicate"));
    }

    #[test]
    fn x2_key_clash_rejected() {
        let msg = invalid(
            r#"
[[responsive.formats]]
name = "a"
width = 100
x2 = true
[[responsive.formats]]
name = "a_x2"
width = 200
"#,
        );
        assert!(msg.contains("a_x2"));
    }

    #[test]
    fn path_separator_in_name_rejected() {
        let msg = invalid("[[responsive.formats]]\nname = \"../evil\"\nwidth = 100");
        assert!(msg.contains("file name"));
    }

    #[test]
    fn zero_width_rejected() {
        let msg = invalid("[[responsive.formats]]\nname = \"a\"\nwidth = 0");
        assert!(msg.contains("width"));
    }

    #[test]
    fn oversized_width_rejected() {
        let msg = invalid("[[responsive.formats]]\nname = \"a\"\nwidth = 70000");
        assert!(msg.contains("65535 px"));
    }

    #[test]
    fn oversized_x2_width_rejected() {
        let msg = invalid(
            "[[responsive.formats]]\nname = \"a\"\nwidth = 3000000000\nx2 = true",
        );
        assert!(msg.contains("x2 doubles it"));

        let msg = invalid(
            "[[responsive.formats]]\nname = \"a\"\nwidth = 500\nheight = 40000\nx2 = true",
        );
        assert!(msg.contains("32767 px"));
    }

    #[test]
    fn largest_x2_width_accepted() {
        let toml: toml::Value =
            toml::from_str("[[responsive.formats]]\nname = \"a\"\nwidth = 32767\nx2 = true")
                .unwrap();
        assert!(resolve_config(stock_defaults_value(), Some(toml)).is_ok());
    }

    #[test]
    fn malformed_watermark_color_rejected() {
        let msg = invalid("[responsive]\nwatermark_color = \"rgba(255,0,0,2)\"");
        assert!(msg.contains("watermark_color"));
        let msg = invalid("[responsive]\nwatermark_color = \"white\"");
        assert!(msg.contains("watermark_color"));
    }

    #[test]
    fn nonpositive_font_size_rejected() {
        assert!(invalid("[watermark]\nfont_size = 0.0").contains("font_size"));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.responsive.quality, 87);
        assert_eq!(config.responsive.formats.len(), 4);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
[upload]
responsive_dimensions = false

[responsive]
quality = 70
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert!(!config.upload.responsive_dimensions);
        assert_eq!(config.responsive.quality, 70);
        // Stock breakpoints preserved
        assert_eq!(config.responsive.formats.len(), 4);
    }

    #[test]
    fn load_config_file_formats_replace_stock_set() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.toml");
        fs::write(&path, "[[responsive.formats]]\nname = \"only\"\nwidth = 320\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.responsive.formats.len(), 1);
        assert_eq!(config.responsive.formats[0].name, "only");
    }

    #[test]
    fn load_config_file_missing_explicit_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config_file(&tmp.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[responsive]\nquality = 500\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_toml_parses_to_defaults() {
        let parsed: Settings = toml::from_str(stock_config_toml()).unwrap();
        parsed.validate().unwrap();
        let defaults = Settings::default();
        assert_eq!(parsed.responsive.formats, defaults.responsive.formats);
        assert_eq!(parsed.responsive.quality, defaults.responsive.quality);
        assert_eq!(parsed.watermark.font_family, defaults.watermark.font_family);
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn default_processing_config() {
        let config = ProcessingConfig::default();
        assert_eq!(config.max_processes, None);
        assert_eq!(config.job_timeout_secs, None);
    }

    #[test]
    fn effective_threads_auto() {
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores());
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&config), cores());
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
            ..ProcessingConfig::default()
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"quality = 90"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"quality = 70"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("quality").unwrap().as_integer(), Some(70));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[responsive]
quality = 87
progressive = true
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[responsive]\nquality = 70").unwrap();
        let merged = merge_toml(base, overlay);
        let responsive = merged.get("responsive").unwrap();
        assert_eq!(responsive.get("quality").unwrap().as_integer(), Some(70));
        assert_eq!(responsive.get("progressive").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str("sizes = [1, 2, 3]").unwrap();
        let overlay: toml::Value = toml::from_str("sizes = [9]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("sizes").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn stock_defaults_roundtrip_through_merge() {
        let config = resolve_config(stock_defaults_value(), None).unwrap();
        assert_eq!(config.responsive.formats, default_breakpoints());
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<Settings, _> = toml::from_str("[responsive]\nqualty = 90");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<Settings, _> = toml::from_str("[imagez]\nquality = 90");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_breakpoint_key_rejected() {
        let result: Result<Settings, _> =
            toml::from_str("[[responsive.formats]]\nname = \"a\"\nwidth = 1\nretina = true");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[processing]\nmax_procs = 2\n",
        )
        .unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }
}
