#![deny(missing_docs)]
//! Textbook retrieval-augmented generation (spec §4.7): embed, search,
//! assemble context, and generate an answer grounded in the textbook
//! corpus. Grounded in `original_source/embedding/{database.py,
//! embedding_service.py, rag_orchestrator.py}`.

mod corpus;
mod engine;
mod error;

pub use corpus::{cosine_similarity, Corpus, InMemoryCorpus, SearchFilters};
pub use engine::{RagEngine, RetrievalResult, RetrievedSource, NO_MATCH_ANSWER};
pub use error::RetrievalError;
