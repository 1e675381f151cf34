//! The retrieval corpus (spec §4.7), grounded in
//! `original_source/embedding/database.py`: one flat collection of
//! textbook passages, each with a fixed-dimension embedding and a
//! strict `class|subject|book|language|page` provenance string.
//! `database.py::search_similar` keeps the whole table in memory and
//! scores it linearly; this implementation does the same behind a
//! trait so a future SQLite-backed corpus can replace it without
//! touching the engine.

use async_trait::async_trait;
use paathshala_types::CorpusDocument;
use std::sync::RwLock;

/// Optional filters narrowing a search to a class, subject, and/or
/// language, matched against [`CorpusDocument::parsed_source`].
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Restrict to this class/grade label.
    pub class: Option<String>,
    /// Restrict to this subject label.
    pub subject: Option<String>,
    /// Restrict to this language.
    pub language: Option<String>,
}

impl SearchFilters {
    /// No filtering at all.
    pub fn none() -> Self {
        Self::default()
    }

    fn matches(&self, doc: &CorpusDocument) -> bool {
        let Some(parsed) = doc.parsed_source() else {
            // Malformed source strings never match a filtered search —
            // matching `database.py::search_similar`'s `len(source_parts) >= 4`
            // guard, which silently drops documents it can't parse.
            return self.class.is_none() && self.subject.is_none() && self.language.is_none();
        };
        if let Some(class) = &self.class {
            if &parsed.class != class {
                return false;
            }
        }
        if let Some(subject) = &self.subject {
            if &parsed.subject != subject {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if &parsed.language != language {
                return false;
            }
        }
        true
    }
}

/// Cosine similarity of two equal-length vectors. `0.0` if either is
/// the zero vector, matching `database.py::search_similar`'s
/// `query_norm > 0 and doc_norm > 0` guard.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Storage and similarity search over the textbook corpus.
#[async_trait]
pub trait Corpus: Send + Sync {
    /// Store a document with its precomputed embedding, assigning it the
    /// next monotonic id.
    async fn add_document(&self, content: String, embedding: Vec<f32>, source: String) -> CorpusDocument;

    /// Find the `top_k` documents most similar to `query_embedding`,
    /// narrowed by `filters`, sorted by similarity descending with an
    /// ascending-id tie-break.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Vec<(f32, CorpusDocument)>;

    /// Total documents currently stored.
    async fn document_count(&self) -> usize;
}

/// The default [`Corpus`]: a `Vec` behind a lock, matching spec.md §6's
/// "one table, realized as an in-memory `Vec`" schema.
#[derive(Default)]
pub struct InMemoryCorpus {
    docs: RwLock<Vec<CorpusDocument>>,
}

impl InMemoryCorpus {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Corpus for InMemoryCorpus {
    async fn add_document(&self, content: String, embedding: Vec<f32>, source: String) -> CorpusDocument {
        let mut docs = self.docs.write().unwrap();
        let id = docs.len() as u64 + 1;
        let doc = CorpusDocument {
            id,
            content,
            embedding,
            source,
        };
        docs.push(doc.clone());
        doc
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filters: &SearchFilters,
    ) -> Vec<(f32, CorpusDocument)> {
        let docs = self.docs.read().unwrap();
        let mut scored: Vec<(f32, CorpusDocument)> = docs
            .iter()
            .filter(|doc| filters.matches(doc))
            .map(|doc| (cosine_similarity(query_embedding, &doc.embedding), doc.clone()))
            .collect();

        scored.sort_by(|(sim_a, doc_a), (sim_b, doc_b)| {
            sim_b
                .partial_cmp(sim_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| doc_a.id.cmp(&doc_b.id))
        });
        scored.truncate(top_k);
        scored
    }

    async fn document_count(&self) -> usize {
        self.docs.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: u64, embedding: Vec<f32>, source: &str) -> CorpusDocument {
        CorpusDocument {
            id,
            content: format!("content {id}"),
            embedding,
            source: source.to_string(),
        }
    }

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn search_sorts_descending_with_ascending_id_tiebreak() {
        let corpus = InMemoryCorpus::new();
        corpus
            .add_document("low".into(), vec![0.0, 1.0], "Class_8|Science|Book|en|1".into())
            .await;
        corpus
            .add_document("high_a".into(), vec![1.0, 0.0], "Class_8|Science|Book|en|2".into())
            .await;
        corpus
            .add_document("high_b".into(), vec![1.0, 0.0], "Class_8|Science|Book|en|3".into())
            .await;

        let results = corpus.search(&[1.0, 0.0], 5, &SearchFilters::none()).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].1.content, "high_a");
        assert_eq!(results[1].1.content, "high_b");
        assert_eq!(results[2].1.content, "low");
    }

    #[tokio::test]
    async fn search_respects_top_k() {
        let corpus = InMemoryCorpus::new();
        for i in 0..5u64 {
            corpus
                .add_document(
                    format!("doc {i}"),
                    vec![1.0, 0.0],
                    format!("Class_8|Science|Book|en|{i}"),
                )
                .await;
        }
        let results = corpus.search(&[1.0, 0.0], 2, &SearchFilters::none()).await;
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn search_filters_by_class_subject_and_language() {
        let corpus = InMemoryCorpus::new();
        corpus
            .add_document("match".into(), vec![1.0, 0.0], "Class_8|Science|Book|en|1".into())
            .await;
        corpus
            .add_document("wrong_class".into(), vec![1.0, 0.0], "Class_10|Science|Book|en|1".into())
            .await;
        corpus
            .add_document("wrong_subject".into(), vec![1.0, 0.0], "Class_8|Maths|Book|en|1".into())
            .await;
        corpus
            .add_document("wrong_language".into(), vec![1.0, 0.0], "Class_8|Science|Book|hi|1".into())
            .await;

        let filters = SearchFilters {
            class: Some("Class_8".into()),
            subject: Some("Science".into()),
            language: Some("en".into()),
        };
        let results = corpus.search(&[1.0, 0.0], 10, &filters).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.content, "match");
    }

    #[tokio::test]
    async fn malformed_source_is_excluded_from_a_filtered_search() {
        let corpus = InMemoryCorpus::new();
        corpus
            .add_document("malformed".into(), vec![1.0, 0.0], "not|enough|fields".into())
            .await;
        let filters = SearchFilters {
            class: Some("Class_8".into()),
            ..SearchFilters::none()
        };
        let results = corpus.search(&[1.0, 0.0], 10, &filters).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn document_count_tracks_insertions() {
        let corpus = InMemoryCorpus::new();
        assert_eq!(corpus.document_count().await, 0);
        corpus
            .add_document("a".into(), vec![1.0], "Class_8|Science|Book|en|1".into())
            .await;
        assert_eq!(corpus.document_count().await, 1);
    }
}
