//! Text shown for a detection.
//!
//! The overlay label and the side list use different
//! precision: one decimal place on the image, two in the list.

use crate::types::Detection;

/// Label drawn above a box, e.g. `"cat (92.0%)"`.
#[must_use]
pub fn overlay_label(detection: &Detection) -> String {
    format!(
        "{} ({}%)",
        detection.class_name(),
        to_fixed(detection.confidence() * 100.0, 1)
    )
}

/// Entry for the textual detection list, e.g.
/// `"cat (Confidence: 92.00%)"`.
#[must_use]
pub fn list_entry(detection: &Detection) -> String {
    format!(
        "{} (Confidence: {})",
        detection.class_name(),
        confidence_percent(detection)
    )
}

/// Confidence as a two-decimal percentage, e.g. `"92.00%"`.
#[must_use]
pub fn confidence_percent(detection: &Detection) -> String {
    format!("{}%", to_fixed(detection.confidence() * 100.0, 2))
}

/// Format `value` with `digits` decimals, rounding exact ties away from
/// zero (`{:.N}` rounds them to even).
///
/// The decision is made on the exact binary value, so `1.005` (stored
/// just below) still rounds down to `"1.00"`.
#[must_use]
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    // Exact decimal expansion: no f64 has more than 1074 fractional digits.
    let exact = format!("{:.1074}", value.abs());
    let (int_part, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let kept = frac.get(..digits).unwrap_or(frac);
    let round_up = frac.as_bytes().get(digits).is_some_and(|d| *d >= b'5');

    let mut scaled: u128 = format!("{int_part}{kept}").parse().unwrap_or(0);
    scaled += u128::from(round_up);

    let mut text = format!("{scaled:0>width$}", width = digits + 1);
    if digits > 0 {
        text.insert(text.len() - digits, '.');
    }
    if value < 0.0 && text.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        text.insert(0, '-');
    }
    text
}
