// Itinerary generation: prompt building, response normalization, orchestration.
// All provider calls go through llm_client::TextGenerator.

pub mod normalizer;
pub mod prompts;
pub mod service;
