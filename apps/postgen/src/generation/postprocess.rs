//! Post-processing of raw completion text.

use crate::corpus::LengthBucket;

/// Lead-ins the model sometimes adds despite being told not to.
pub const PREAMBLE_STARTS: &[&str] = &["Here's", "This is", "Below is", "Here is"];

/// Drops blank lines and truncates to the bucket's maximum line count.
pub fn enforce_length(text: &str, length: LengthBucket) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .take(length.max_lines())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Removes the first line when the text opens with a known preamble.
/// Applied once; a second preamble line is left alone.
pub fn strip_preamble(text: &str) -> String {
    if PREAMBLE_STARTS.iter().any(|p| text.starts_with(p)) {
        text.lines().skip(1).collect::<Vec<_>>().join("\n").trim().to_string()
    } else {
        text.to_string()
    }
}
