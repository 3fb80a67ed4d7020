// Tag unification: metadata extraction, canonical tag mapping and the
// offline preprocessing job that produces the enriched corpus.
// All LLM calls go through llm_client::CompletionService.

pub mod pipeline;
pub mod prompts;
pub mod unifier;
