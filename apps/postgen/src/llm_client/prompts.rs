// Shared prompt fragments. Each module that calls the LLM keeps its own
// prompts.rs alongside it; only cross-cutting pieces live here.

/// Appended to every prompt whose reply is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Return valid JSON only. No preamble. \
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";

/// Appended to every free-text generation prompt.
pub const NO_PREAMBLE_INSTRUCTION: &str = "\u{26a0}\u{fe0f} Important:
- Do NOT write any preamble like \"Here's a post\", \"This is a sample\", \"Below is...\", etc.
- Directly output only the LinkedIn post content.";
