//! Observed multiplier samples.
//!
//! A sample is one textual observation of the payout multiplier as rendered
//! by the remote page (e.g. `"1.52x"`). Parsing never fails: text that does
//! not parse is surfaced with a value of `0.0`, which always sits below any
//! sensible trigger threshold.

use serde::{Deserialize, Serialize};

/// One observation of the monitored value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Raw text exactly as read from the page. Deduplication compares this.
    pub raw: String,
    /// Parsed multiplier (`0.0` when the text did not parse).
    pub value: f64,
    /// The text parsed. Tells a genuine `0x` apart from a fallback zero.
    #[serde(default)]
    pub parsed: bool,
}

impl Sample {
    /// Build a sample from raw page text.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = try_parse_multiplier(&raw);
        Self {
            raw,
            value: parsed.unwrap_or(0.0),
            parsed: parsed.is_some(),
        }
    }
}

/// Parse multiplier text such as `"200.5x"` into a number, `0.0` on failure.
pub fn parse_multiplier(text: &str) -> f64 {
    try_parse_multiplier(text).unwrap_or(0.0)
}

/// Parse multiplier text, or `None` when it is not a finite number.
///
/// Strips surrounding whitespace and a trailing `x`/`X` marker.
pub fn try_parse_multiplier(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let without_marker = trimmed
        .strip_suffix('x')
        .or_else(|| trimmed.strip_suffix('X'))
        .unwrap_or(trimmed)
        .trim();

    without_marker
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
