//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Each source is shown by its positional index and file name, with the
//! variants it produced as indented context lines. Paths are secondary: the
//! `Source:` line and the arrow on each variant let users trace the output
//! back to files.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! 001 sunset.jpg (5 variants)
//!     Source: photos/sunset.jpg
//!     large: 1000x563 image/jpeg 84.21 KB → work/large_sunset_4f1c2a9b7e
//!     large_x2: 2000x1125 image/jpeg 260.5 KB → work/large_x2_sunset_4f1c2a9b7e
//!     thumbnail: 245x156 image/webp 9.87 KB → work/thumbnail_sunset_4f1c2a9b7e
//! ```
//!
//! ## Check
//!
//! ```text
//! Config
//!     responsive.toml
//!     large 1000w
//!     thumbnail 245x156 x2 → webp
//!     Quality: 87, progressive
//!     Watermark: "© Studio" southeast rgba(255,255,255,0.5)
//! ```
//!
//! Failures are printed by `main` to stderr; this module only formats data.

use crate::imaging::Gravity;
use crate::responsive::{Breakpoint, GenerationConfig, ResponsiveVariant};
use serde::Serialize;
use std::path::Path;

/// Everything generated for one source, as printed or serialized.
#[derive(Debug, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub hash: String,
    pub variants: Vec<ResponsiveVariant>,
}

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn variant_line(variant: &ResponsiveVariant) -> String {
    let file = &variant.file;
    format!(
        "{}: {}x{} {} {} KB → {}",
        variant.key,
        file.width,
        file.height,
        file.mime,
        file.size,
        file.output.display()
    )
}

fn breakpoint_line(bp: &Breakpoint) -> String {
    let mut line = match bp.height.filter(|&h| h > 0) {
        Some(h) => format!("{} {}x{}", bp.name, bp.width, h),
        None => format!("{} {}w", bp.name, bp.width),
    };
    if bp.x2 {
        line.push_str(" x2");
    }
    if let Some(format) = bp.convert_to_format {
        line.push_str(&format!(" → {format}"));
    }
    line
}

fn gravity_name(gravity: Gravity) -> String {
    format!("{gravity:?}").to_lowercase()
}

/// Lines for one processed source.
pub fn format_source_report(index: usize, source_path: &Path, report: &SourceReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({} variants)",
        format_index(index),
        report.source,
        report.variants.len()
    )];
    lines.push(format!("{}Source: {}", indent(1), source_path.display()));
    if report.variants.is_empty() {
        lines.push(format!("{}responsive dimensions disabled", indent(1)));
    }
    for variant in &report.variants {
        lines.push(format!("{}{}", indent(1), variant_line(variant)));
    }
    lines
}

pub fn print_source_report(index: usize, source_path: &Path, report: &SourceReport) {
    for line in format_source_report(index, source_path, report) {
        println!("{}", line);
    }
}

/// Serialize reports as pretty JSON for `--json`.
pub fn format_json(reports: &[SourceReport]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(reports)
}

/// Lines describing a resolved configuration.
pub fn format_config_summary(config_path: Option<&Path>, config: &GenerationConfig) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];
    match config_path {
        Some(path) => lines.push(format!("{}{}", indent(1), path.display())),
        None => lines.push(format!("{}(stock defaults)", indent(1))),
    }
    if !config.responsive_dimensions {
        lines.push(format!("{}responsive dimensions disabled", indent(1)));
    }
    for bp in &config.breakpoints {
        lines.push(format!("{}{}", indent(1), breakpoint_line(bp)));
    }
    lines.push(format!(
        "{}Quality: {}{}",
        indent(1),
        config.quality.value(),
        if config.progressive { ", progressive" } else { "" }
    ));
    match &config.watermark {
        Some(spec) => lines.push(format!(
            "{}Watermark: {:?} {} {}",
            indent(1),
            spec.text,
            gravity_name(spec.position),
            spec.color
        )),
        None => lines.push(format!("{}Watermark: none", indent(1))),
    }
    lines
}

pub fn print_config_summary(config_path: Option<&Path>, config: &GenerationConfig) {
    for line in format_config_summary(config_path, config) {
        println!("{}", line);
    }
}
