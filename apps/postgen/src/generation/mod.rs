// Post generation: prompt assembly with example fallback, the completion
// call, and post-processing of the returned text.
// All LLM calls go through llm_client — no direct Groq calls here.

pub mod assembler;
pub mod generator;
pub mod handlers;
pub mod postprocess;
pub mod prompts;
