//! RAG orchestration (spec §4.7), grounded in
//! `original_source/embedding/rag_orchestrator.py::RAGOrchestrator.query`:
//! embed the query, retrieve the top-k similar passages, format them as
//! context, and ask the generative provider to answer from that context.

use crate::corpus::{Corpus, SearchFilters};
use crate::error::RetrievalError;
use paathshala_provider::{CompletionRequest, EmbeddingProvider, GenerativeProvider};
use paathshala_types::CorpusDocument;
use std::sync::Arc;

/// Canned reply when no document in the corpus is relevant, matching
/// `rag_orchestrator.py::query`'s inline literal.
pub const NO_MATCH_ANSWER: &str =
    "I couldn't find any relevant information in the textbooks to answer your question.";

const ANSWER_SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based on \
textbook content. Use the provided excerpts to answer the question. If the information is not \
available in the provided context, say so clearly. Cite the source (class, subject, book, page \
number) when appropriate.";

const CONTENT_PREVIEW_CHARS: usize = 200;

/// One retrieved passage, formatted for display alongside the answer.
#[derive(Debug, Clone)]
pub struct RetrievedSource {
    /// Class/grade label, if the source string parsed.
    pub class: Option<String>,
    /// Subject label, if the source string parsed.
    pub subject: Option<String>,
    /// Book title, if the source string parsed.
    pub book: Option<String>,
    /// Language, if the source string parsed.
    pub language: Option<String>,
    /// Page number (as text), if the source string parsed.
    pub page: Option<String>,
    /// The raw source string, always present (used when parsing fails).
    pub raw_source: String,
    /// First 200 characters of the passage, ellipsized if truncated.
    pub content_preview: String,
}

impl RetrievedSource {
    fn from_document(doc: &CorpusDocument) -> Self {
        let content_preview = if doc.content.chars().count() > CONTENT_PREVIEW_CHARS {
            format!(
                "{}...",
                doc.content.chars().take(CONTENT_PREVIEW_CHARS).collect::<String>()
            )
        } else {
            doc.content.clone()
        };

        match doc.parsed_source() {
            Some(parsed) => Self {
                class: Some(parsed.class),
                subject: Some(parsed.subject),
                book: Some(parsed.book),
                language: Some(parsed.language),
                page: Some(parsed.page),
                raw_source: doc.source.clone(),
                content_preview,
            },
            None => Self {
                class: None,
                subject: None,
                book: None,
                language: None,
                page: None,
                raw_source: doc.source.clone(),
                content_preview,
            },
        }
    }
}

/// Result of one retrieval-augmented query.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    /// The generated answer, or [`NO_MATCH_ANSWER`] if nothing relevant
    /// was found.
    pub answer: String,
    /// The passages the answer was (or would have been) grounded on.
    pub sources: Vec<RetrievedSource>,
    /// The original query text.
    pub query: String,
}

/// Retrieval-augmented question answering over the textbook corpus.
pub struct RagEngine {
    corpus: Arc<dyn Corpus>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerativeProvider>,
}

impl RagEngine {
    /// Construct the engine over a corpus, embedding provider, and
    /// generative provider.
    pub fn new(
        corpus: Arc<dyn Corpus>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerativeProvider>,
    ) -> Self {
        Self {
            corpus,
            embedder,
            generator,
        }
    }

    /// Embed and store a passage. `source` must be the five-field
    /// `class|subject|book|language|page` string; malformed sources are
    /// still stored (retrieval still works; provenance display falls
    /// back to the raw string), matching the Python reference's
    /// equally permissive `insert_document`.
    pub async fn ingest(&self, content: String, source: String) -> Result<CorpusDocument, RetrievalError> {
        let formatted = format!("passage: {content}");
        let mut embeddings = self
            .embedder
            .embed(&[formatted])
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;
        let embedding = embeddings.pop().ok_or_else(|| {
            RetrievalError::EmbeddingFailed("embedding provider returned no vectors".into())
        })?;
        Ok(self.corpus.add_document(content, embedding, source).await)
    }

    /// Answer `query_text` using the top `top_k` similar passages,
    /// optionally narrowed by `filters`.
    pub async fn query(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &SearchFilters,
    ) -> Result<RetrievalResult, RetrievalError> {
        let formatted = format!("query: {query_text}");
        let mut embeddings = self
            .embedder
            .embed(&[formatted])
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;
        let query_embedding = embeddings.pop().ok_or_else(|| {
            RetrievalError::EmbeddingFailed("embedding provider returned no vectors".into())
        })?;

        let matches = self.corpus.search(&query_embedding, top_k, filters).await;

        if matches.is_empty() {
            tracing::warn!(query = %query_text, "no relevant documents found");
            return Ok(RetrievalResult {
                answer: NO_MATCH_ANSWER.to_string(),
                sources: vec![],
                query: query_text.to_string(),
            });
        }

        let docs: Vec<&CorpusDocument> = matches.iter().map(|(_, doc)| doc).collect();
        let context = format_context(&docs);
        let answer = self.generate_answer(query_text, &context).await?;
        let sources = docs.iter().map(|doc| RetrievedSource::from_document(doc)).collect();

        tracing::info!(query = %query_text, sources = docs.len(), "generated retrieval answer");

        Ok(RetrievalResult {
            answer,
            sources,
            query: query_text.to_string(),
        })
    }

    /// Corpus size, for diagnostics.
    pub async fn document_count(&self) -> usize {
        self.corpus.document_count().await
    }

    async fn generate_answer(&self, query: &str, context: &str) -> Result<String, RetrievalError> {
        let user = format!("Context from textbooks:\n{context}\n\nQuestion: {query}");
        let request = CompletionRequest::single_turn(ANSWER_SYSTEM_PROMPT, user);
        let response = self
            .generator
            .complete(request)
            .await
            .map_err(|e| RetrievalError::GenerationFailed(e.to_string()))?;
        Ok(response.text)
    }
}

/// Format retrieved documents into a context block for the generative
/// prompt, matching `rag_orchestrator.py::_format_context`: numbered,
/// with provenance in the header when the source string parses and a
/// bare fallback otherwise.
fn format_context(docs: &[&CorpusDocument]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| {
            let n = i + 1;
            match doc.parsed_source() {
                Some(p) => format!(
                    "[Source {n} - {}, {}, {} ({}), Page {}]:\n{}\n",
                    p.class, p.subject, p.book, p.language, p.page, doc.content
                ),
                None => format!("[Source {n} - {}]:\n{}\n", doc.source, doc.content),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
