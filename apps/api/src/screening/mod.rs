// Resume screening: capability backends, the five-stage pipeline, and the
// on-demand candidate email task.
// All LLM calls go through llm_client — no direct Anthropic calls here.

pub mod backend;
pub mod email;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod ranking;
