//! `rgb()` / `rgba()` functional colors → `#rrggbb[aa]` hex.
//!
//! The watermark markup wants a hex color, while settings store colors the way
//! a CSS color picker emits them. Channels are taken as-is (rounded to the
//! nearest integer); alpha is rescaled from `[0, 1]` to `[0, 255]`.
//!
//! ```text
//! rgba(255, 0, 0, 1)   →  #ff0000ff
//! rgb(0,0,0)           →  #000000
//! rgba(255,255,255,.5) →  #ffffff80
//! ```
//!
//! Malformed input is an error, never a garbage hex string.

use super::backend::BackendError;

/// Convert a functional-notation color to lowercase hex with a leading `#`.
///
/// Three components give six hex digits, four give eight. The wrapper is
/// optional: `"255,0,0"` parses the same as `"rgb(255,0,0)"`.
pub fn rgba_to_hex(rgba: &str) -> Result<String, BackendError> {
    to_hex(rgba, false)
}

/// Like [`rgba_to_hex`] but drops the alpha channel, always yielding `#rrggbb`.
pub fn rgba_to_hex_opaque(rgba: &str) -> Result<String, BackendError> {
    to_hex(rgba, true)
}

fn to_hex(rgba: &str, drop_alpha: bool) -> Result<String, BackendError> {
    let components = parse_components(rgba)?;
    let mut hex = String::with_capacity(9);
    hex.push('#');
    for (index, value) in components.iter().enumerate() {
        if index == 3 && drop_alpha {
            break;
        }
        let byte = if index == 3 {
            (value * 255.0).round()
        } else {
            value.round()
        };
        hex.push_str(&format!("{:02x}", byte as u8));
    }
    Ok(hex)
}

fn parse_components(rgba: &str) -> Result<Vec<f64>, BackendError> {
    let invalid = |reason: &str| BackendError::InvalidColorFormat(format!("{rgba:?}: {reason}"));

    let compact: String = rgba.chars().filter(|c| !c.is_whitespace()).collect();
    let lower = compact.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .map(|rest| rest.strip_suffix(')').unwrap_or(rest))
        .unwrap_or(&lower);

    if inner.is_empty() {
        return Err(invalid("empty color"));
    }

    let components = inner
        .split(',')
        .map(|part| {
            part.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid(&format!("component {part:?} is not a number")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !(3..=4).contains(&components.len()) {
        return Err(invalid("expected 3 or 4 components"));
    }
    for (index, value) in components.iter().enumerate() {
        let in_range = if index == 3 {
            (0.0..=1.0).contains(value)
        } else {
            (0.0..=255.0).contains(value)
        };
        if !in_range {
            return Err(invalid(&format!("component {value} out of range")));
        }
    }
    Ok(components)
}
