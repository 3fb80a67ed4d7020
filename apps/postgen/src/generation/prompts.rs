// LLM prompt templates for post generation.
// The no-preamble fragment comes from llm_client::prompts.

/// Post generation prompt.
/// Replace: {topic}, {length}, {length_range}, {language}, {language_note}, {no_preamble}
pub const POST_PROMPT_TEMPLATE: &str = r#"Generate a LinkedIn post using the below Information.

1) Topic: {topic}
2) Length: {length} ({length_range})
   - Short = 1 to 5 lines
   - Medium = 6 to 10 lines
   - Long = 11 to 15 lines
3) Language: {language}{language_note}

{no_preamble}"#;

/// Appended under the language line when the language is Hinglish.
pub const HINGLISH_NOTE: &str = "
   - If the Language is Hinglish it means it is mix of Hindi and English.
   - The script for the generated post should always be English.";

/// Heading placed before the single style example.
pub const EXAMPLE_HEADING: &str = "4) Use the writing style as per the following example";
