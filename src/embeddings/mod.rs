// Embeddings module
// Client for the embedding service and per-row vector generation

pub mod client;
pub mod orchestrator;

pub use client::{ContentKind, EmbeddingClient, FieldInput, classify_content};
pub use orchestrator::EmbeddingOrchestrator;
