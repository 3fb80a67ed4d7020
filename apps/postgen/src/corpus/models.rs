use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Language assumed for posts whose record carries none.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Target length of a post, derived from its line count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LengthBucket {
    Short,
    Medium,
    Long,
}

impl LengthBucket {
    pub const ALL: [LengthBucket; 3] = [LengthBucket::Short, LengthBucket::Medium, LengthBucket::Long];

    /// Short below 5 lines, Medium for 5–15 inclusive, Long above 15.
    pub fn from_line_count(line_count: u32) -> Self {
        match line_count {
            0..=4 => LengthBucket::Short,
            5..=15 => LengthBucket::Medium,
            _ => LengthBucket::Long,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LengthBucket::Short => "Short",
            LengthBucket::Medium => "Medium",
            LengthBucket::Long => "Long",
        }
    }

    /// Line range the model is asked to produce.
    pub fn range_description(self) -> &'static str {
        match self {
            LengthBucket::Short => "1 to 5 lines",
            LengthBucket::Medium => "6 to 10 lines",
            LengthBucket::Long => "11 to 15 lines",
        }
    }

    /// Hard cap applied to generated output.
    pub fn max_lines(self) -> usize {
        match self {
            LengthBucket::Short => 5,
            LengthBucket::Medium => 10,
            LengthBucket::Long => 15,
        }
    }
}

/// Output language style offered to users and accepted from metadata extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    /// Mixed Hindi and English, always written in Latin script.
    Hinglish,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Hinglish];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hinglish => "Hinglish",
        }
    }
}

/// One corpus record as it appears on disk, before derivation.
/// Every field except `text` may be missing. A field of the wrong type is
/// logged and treated as missing so the derivation rules fill it in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_line_count")]
    pub line_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default)]
    pub engagement: Option<serde_json::Value>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match serde_json::from_value(v.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Ignoring malformed corpus field {v}: {e}");
            None
        }
    }))
}

/// Accepts `7`, `7.0` and `"7"`.
fn lenient_line_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match &value {
        None => return Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };
    let line_count = parsed.and_then(|n| u32::try_from(n).ok());
    if line_count.is_none() {
        if let Some(v) = value {
            warn!("Ignoring malformed line_count {v}");
        }
    }
    Ok(line_count)
}

/// Keeps the string entries of a tag list and drops everything else.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None => None,
        Some(serde_json::Value::Array(items)) => {
            let total = items.len();
            let tags: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(tag) => Some(tag),
                    _ => None,
                })
                .collect();
            if tags.len() < total {
                warn!("Dropped {} non-string entries from corpus tags", total - tags.len());
            }
            Some(tags)
        }
        Some(other) => {
            warn!("Ignoring malformed corpus tags {other}");
            None
        }
    })
}

/// A fully derived corpus entry. Immutable once the store is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamplePost {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement: Option<serde_json::Value>,
    pub line_count: u32,
    pub length: LengthBucket,
    pub language: String,
    pub tags: Vec<String>,
    pub title: String,
}

impl ExamplePost {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(LengthBucket::from_line_count(1), LengthBucket::Short);
        assert_eq!(LengthBucket::from_line_count(4), LengthBucket::Short);
        assert_eq!(LengthBucket::from_line_count(5), LengthBucket::Medium);
        assert_eq!(LengthBucket::from_line_count(15), LengthBucket::Medium);
        assert_eq!(LengthBucket::from_line_count(16), LengthBucket::Long);
        assert_eq!(LengthBucket::from_line_count(200), LengthBucket::Long);
    }

    #[test]
    fn test_bucket_serde_uses_variant_names() {
        let bucket: LengthBucket = serde_json::from_str(r#""Long""#).unwrap();
        assert_eq!(bucket, LengthBucket::Long);
        assert_eq!(serde_json::to_string(&LengthBucket::Short).unwrap(), r#""Short""#);
    }

    #[test]
    fn test_max_lines_per_bucket() {
        assert_eq!(LengthBucket::Short.max_lines(), 5);
        assert_eq!(LengthBucket::Medium.max_lines(), 10);
        assert_eq!(LengthBucket::Long.max_lines(), 15);
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let result: Result<Language, _> = serde_json::from_str(r#""French""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let record: PostRecord = serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert_eq!(record.text.as_deref(), Some("hello"));
        assert!(record.tags.is_none());
        assert!(record.line_count.is_none());
    }

    #[test]
    fn test_record_line_count_accepts_float_and_string() {
        let record: PostRecord = serde_json::from_str(r#"{"text": "x", "line_count": 7.0}"#).unwrap();
        assert_eq!(record.line_count, Some(7));
        let record: PostRecord = serde_json::from_str(r#"{"text": "x", "line_count": " 7 "}"#).unwrap();
        assert_eq!(record.line_count, Some(7));
    }

    #[test]
    fn test_record_malformed_fields_read_as_missing() {
        let record: PostRecord = serde_json::from_str(
            r#"{"text": "x", "line_count": 2.5, "language": 3, "title": ["t"], "tags": "Mindset"}"#,
        )
        .unwrap();
        assert!(record.line_count.is_none());
        assert!(record.language.is_none());
        assert!(record.title.is_none());
        assert!(record.tags.is_none());

        let record: PostRecord = serde_json::from_str(r#"{"text": "x", "line_count": -1}"#).unwrap();
        assert!(record.line_count.is_none());
    }

    #[test]
    fn test_record_tags_drop_non_string_entries() {
        let record: PostRecord =
            serde_json::from_str(r#"{"text": "x", "tags": ["Mindset", null, 4, "Wealth"]}"#).unwrap();
        assert_eq!(record.tags, Some(vec!["Mindset".to_string(), "Wealth".to_string()]));
    }

    #[test]
    fn test_record_explicit_nulls_are_missing() {
        let record: PostRecord =
            serde_json::from_str(r#"{"text": "x", "line_count": null, "tags": null}"#).unwrap();
        assert!(record.line_count.is_none());
        assert!(record.tags.is_none());
    }
}
