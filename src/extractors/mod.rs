// src/extractors/mod.rs
pub mod chunker;
pub mod llm;
pub mod prompt;
pub mod schema;

// Re-export key extraction types for convenience
pub use chunker::chunk_text;
pub use llm::{ExtractorConfig, OpenAiExtractor, RecordExtractor};
