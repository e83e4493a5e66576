//! Knowledge-base index - TF-IDF similarity search over curated guidance snippets
//!
//! This crate provides:
//! - KbEntry and the imperative-language corpus filter
//! - Offline corpus ingestion from JSONL chunk files
//! - A term-weighted (TF-IDF) vector index with cosine-similarity search
//! - A JSON snapshot format that persists vocabulary and idf weights,
//!   never opaque vectors

pub mod builder;
pub mod entry;
pub mod error;
pub mod index;
pub mod vectorizer;

pub use entry::{is_rule_candidate, stable_id, KbEntry};
pub use error::KbError;
pub use index::KbIndex;
pub use vectorizer::TfidfVectorizer;
