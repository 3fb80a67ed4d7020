// LLM prompt templates for metadata extraction and tag unification.
// The JSON-only fragment comes from llm_client::prompts.

/// Allowed categories every free-form tag is unified into.
pub const CANONICAL_TAGS: &[&str] = &[
    "Entrepreneurship",
    "Business",
    "Leadership",
    "Motivation",
    "Finance",
    "Productivity",
    "Personal Growth",
    "Mindset",
];

/// Metadata extraction prompt. Replace: {json_only}, {post}
pub const EXTRACT_METADATA_PROMPT_TEMPLATE: &str = r#"You are given a LinkedIn post. You need to extract number of lines, language of the post and tags.
1. {json_only}
2. JSON object should have exactly three keys: line_count, language and tags.
3. tags is an array of text tags. Extract maximum two tags.
4. Language should be English or Hinglish (Hinglish means Hindi + English).
5. For tags, pick from themes like: entrepreneurship, business, leadership, motivation, finance, productivity, personal growth, mindset.

Example output:
{"line_count": 7, "language": "English", "tags": ["Leadership", "Mindset"]}

Here is the actual post on which you need to perform this task:
{post}"#;

/// Tag unification prompt. Replace: {json_only}, {canonical}, {tags}
pub const UNIFY_TAGS_PROMPT_TEMPLATE: &str = r#"I will give you a list of tags. You need to unify tags with the following requirements.

1. Tags are unified and merged to create a shorter list.
   Example 1: "Jobseekers", "Job Hunting" -> "Job Search"
   Example 2: "Motivation", "Inspiration", "Drive" -> "Motivation"
   Example 3: "Personal Growth", "Personal Development", "Self Improvement" -> "Personal Growth"
   Example 4: "Scam Alert", "Job Scam" -> "Scams"

2. Each unified tag MUST be one of these allowed (Title Case) categories:
   {canonical}

3. Output should be a JSON object. {json_only}
4. Output must map the ORIGINAL tag to the UNIFIED tag.
   For example: {"Jobseekers": "Job Search", "Drive": "Motivation"}

Here is the list of tags to unify:
{tags}"#;
