//! Pure calculation functions for variant geometry and encoding parameters.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Geometry, Gravity, Quality};

/// Resolve the final output size for a geometry against a source size.
///
/// With both sides given the output is exactly that box (the backend fills
/// and center-crops). With only a width the height follows the source aspect
/// ratio, rounded to the nearest pixel and never below 1.
///
/// # Examples
/// ```
/// # use responsive_variants::imaging::calculations::output_dimensions;
/// # use responsive_variants::imaging::Geometry;
/// assert_eq!(output_dimensions((2000, 1000), Geometry::new(500, None)), (500, 250));
/// assert_eq!(output_dimensions((2000, 1000), Geometry::new(300, Some(300))), (300, 300));
/// ```
pub fn output_dimensions(source: (u32, u32), geometry: Geometry) -> (u32, u32) {
    match geometry.height {
        Some(height) => (geometry.width, height),
        None => {
            let (src_w, src_h) = source;
            let ratio = geometry.width as f64 / src_w.max(1) as f64;
            let height = (src_h as f64 * ratio).round().max(1.0) as u32;
            (geometry.width, height)
        }
    }
}

/// Map 1–100 quality onto a PNG compression level in `0..=9`.
///
/// PNG is lossless, so "quality" here means compression effort:
/// `floor(quality / 100 * 9)`.
pub fn png_compression_level(quality: Quality) -> u8 {
    (quality.value().min(100) as f64 / 100.0 * 9.0).floor() as u8
}

/// Top-left offset for placing an overlay of `overlay` size onto `base`.
///
/// Offsets go negative when the overlay is larger than the base; the
/// compositor clips whatever falls outside.
pub fn gravity_offset(base: (u32, u32), overlay: (u32, u32), gravity: Gravity) -> (i64, i64) {
    let (bw, bh) = (base.0 as i64, base.1 as i64);
    let (ow, oh) = (overlay.0 as i64, overlay.1 as i64);

    let left = 0;
    let center_x = (bw - ow) / 2;
    let right = bw - ow;
    let top = 0;
    let center_y = (bh - oh) / 2;
    let bottom = bh - oh;

    match gravity {
        Gravity::Northwest => (left, top),
        Gravity::North => (center_x, top),
        Gravity::Northeast => (right, top),
        Gravity::West => (left, center_y),
        Gravity::Center => (center_x, center_y),
        Gravity::East => (right, center_y),
        Gravity::Southwest => (left, bottom),
        Gravity::South => (center_x, bottom),
        Gravity::Southeast => (right, bottom),
    }
}

/// Bytes → kilobytes (1 KB = 1000 bytes), rounded to two decimals.
pub fn bytes_to_kb(bytes: u64) -> f64 {
    ((bytes as f64 / 1000.0) * 100.0).round() / 100.0
}
