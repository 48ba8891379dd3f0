// Book generation pipeline: prompt validation, narrative generation,
// illustration fan-out, and lifecycle orchestration.
// All text-generation calls go through llm_client; all image-generation
// calls go through image_client.

pub mod book_type;
pub mod catalog;
pub mod handlers;
pub mod illustration;
pub mod narrative;
pub mod orchestrator;
pub mod prompts;
pub mod validator;
