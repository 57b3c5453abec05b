//! Knowledge ingestion: raw text blob in, Q&A pairs out
//!
//! An LLM turns a tenant's raw content (policies, FAQs, product notes)
//! into question/answer pairs. Pairs are cleaned, deduplicated, written to
//! the store of record, indexed per-pair (best effort), and the tenant's
//! chat caches are invalidated.

use std::collections::HashSet;
use std::sync::Arc;

use domain_vector::{EmbeddingProvider, VectorIndex, VectorRecord};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::cache::{ResponseCache, chat_config_key};
use crate::chat::CompletionClient;
use crate::error::{KnowledgeError, KnowledgeResult};
use crate::models::{CreateKnowledgePair, IngestReport};
use crate::repository::KnowledgeRepository;

/// Minimum blob length after trimming
const MIN_BLOB_CHARS: usize = 50;
/// Bounds and default for requested pair counts
const MIN_PAIRS: usize = 5;
const MAX_PAIRS: usize = 40;
const DEFAULT_PAIRS: usize = 18;
/// Cap on the raw-output preview carried in parse errors
const RAW_PREVIEW_CHARS: usize = 600;
/// Number of pairs echoed back in the ingest report
const REPORT_PREVIEW_PAIRS: usize = 6;

/// A question/answer pair as emitted by the LLM
#[derive(Debug, Clone, Deserialize)]
struct RawPair {
    question: String,
    answer: String,
}

/// Normalize a question for storage
///
/// Collapses internal whitespace and guarantees exactly one trailing
/// question mark. Empty input stays empty.
pub fn normalize_question(question: &str) -> String {
    let collapsed = question.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = collapsed.trim_end_matches('?').trim_end();
    if stripped.is_empty() {
        return String::new();
    }
    format!("{}?", stripped)
}

/// Clamp a requested pair count into the supported range
fn clamp_max_pairs(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_PAIRS).clamp(MIN_PAIRS, MAX_PAIRS)
}

/// Slice out the JSON array from LLM output that may carry prose around it
fn extract_json_array(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if start < end { Some(&raw[start..=end]) } else { None }
}

fn raw_preview(raw: &str) -> String {
    raw.chars().take(RAW_PREVIEW_CHARS).collect()
}

/// Parse LLM output into raw pairs
///
/// Anything that does not contain a parseable JSON array becomes a
/// `GenerationParse` error carrying a bounded preview of the output.
fn parse_generated_pairs(raw: &str) -> KnowledgeResult<Vec<RawPair>> {
    let slice = extract_json_array(raw).ok_or_else(|| KnowledgeError::GenerationParse {
        preview: raw_preview(raw),
    })?;

    serde_json::from_str(slice).map_err(|_| KnowledgeError::GenerationParse {
        preview: raw_preview(raw),
    })
}

/// Normalize, drop unusable entries, dedup, cap at max_pairs
///
/// Deduplication is case-insensitive on the normalized question and keeps
/// the first occurrence.
fn clean_pairs(pairs: Vec<RawPair>, max_pairs: usize) -> Vec<RawPair> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut cleaned = Vec::new();

    for pair in pairs {
        let question = normalize_question(&pair.question);
        let answer = pair.answer.trim().to_string();

        if question.is_empty() || answer.is_empty() {
            continue;
        }
        if !seen.insert(question.to_lowercase()) {
            continue;
        }

        cleaned.push(RawPair { question, answer });
        if cleaned.len() == max_pairs {
            break;
        }
    }

    cleaned
}

fn build_extraction_prompts(blob: &str, max_pairs: usize) -> (String, String) {
    let system = format!(
        "You are a data extraction assistant. Extract up to {} question/answer \
         pairs a customer might ask about the content provided. Cover as many \
         distinct topics as the content supports. Respond with ONLY a JSON array \
         of objects with \"question\" and \"answer\" string fields, no other text.",
        max_pairs
    );
    let user = format!("Content:\n\n{}", blob);
    (system, user)
}

/// Ingestion engine turning raw tenant content into indexed knowledge pairs
pub struct IngestionEngine<R: KnowledgeRepository, C: CompletionClient> {
    repository: Arc<R>,
    completion: Arc<C>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    cache: Arc<dyn ResponseCache>,
    collection: String,
}

impl<R: KnowledgeRepository, C: CompletionClient> IngestionEngine<R, C> {
    pub fn new(
        repository: Arc<R>,
        completion: Arc<C>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        cache: Arc<dyn ResponseCache>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            completion,
            embedder,
            index,
            cache,
            collection: collection.into(),
        }
    }

    /// Run one ingestion: generate, clean, store, index, invalidate
    ///
    /// The store-of-record write is all-or-nothing; per-pair indexing is
    /// best effort and a failed pair never aborts the batch.
    #[instrument(skip(self, blob), fields(blob_chars = blob.chars().count()))]
    pub async fn ingest(
        &self,
        tenant_id: &str,
        blob: &str,
        max_pairs: Option<usize>,
    ) -> KnowledgeResult<IngestReport> {
        let blob = blob.trim();
        if blob.chars().count() < MIN_BLOB_CHARS {
            return Err(KnowledgeError::Validation(format!(
                "Content must be at least {} characters",
                MIN_BLOB_CHARS
            )));
        }

        let max_pairs = clamp_max_pairs(max_pairs);
        let (system, user) = build_extraction_prompts(blob, max_pairs);

        let raw = self.completion.complete(&system, &user).await?;

        let parsed = parse_generated_pairs(&raw)?;
        let cleaned = clean_pairs(parsed, max_pairs);
        if cleaned.is_empty() {
            return Err(KnowledgeError::EmptyGeneration);
        }

        let inputs: Vec<CreateKnowledgePair> = cleaned
            .into_iter()
            .map(|pair| CreateKnowledgePair {
                tenant_id: tenant_id.to_string(),
                question: pair.question,
                answer: pair.answer,
            })
            .collect();

        let pairs = self.repository.insert_pairs(inputs).await?;

        let mut skipped = 0usize;
        for pair in &pairs {
            if let Err(err) = self.index_pair(pair).await {
                warn!(pair_id = %pair.id, error = %err, "Pair not indexed; continuing batch");
                skipped += 1;
            }
        }
        if skipped > 0 {
            warn!(skipped, total = pairs.len(), "Some pairs were not indexed");
        }

        if let Err(err) = self.cache.delete(&chat_config_key(tenant_id)).await {
            warn!(tenant_id, error = %err, "Chat config cache not invalidated");
        }
        if let Err(err) = self.cache.bump_knowledge_version(tenant_id).await {
            warn!(tenant_id, error = %err, "Knowledge version not bumped");
        }

        let preview = pairs.iter().take(REPORT_PREVIEW_PAIRS).cloned().collect();
        Ok(IngestReport {
            tenant_id: tenant_id.to_string(),
            inserted: pairs.len(),
            ids: pairs.iter().map(|pair| pair.id).collect(),
            preview,
        })
    }

    async fn index_pair(&self, pair: &crate::models::KnowledgePair) -> KnowledgeResult<()> {
        let text = pair.embedding_text();
        let values = self.embedder.embed(&text).await?;
        let record = VectorRecord::new(pair.id, &pair.tenant_id, text, values);
        self.index.insert(&self.collection, record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MockResponseCache;
    use crate::chat::MockCompletionClient;
    use crate::models::KnowledgePair;
    use crate::repository::MockKnowledgeRepository;
    use crate::test_support::{MockEmbedder, MockIndex};
    use domain_vector::VectorError;
    use mockall::predicate::eq;

    const DIM: usize = 384;

    #[test]
    fn test_normalize_question() {
        assert_eq!(
            normalize_question("  What   is\tthe return policy??  "),
            "What is the return policy?"
        );
        assert_eq!(normalize_question("Do you ship"), "Do you ship?");
        assert_eq!(normalize_question("???"), "");
        assert_eq!(normalize_question(""), "");
    }

    #[test]
    fn test_clamp_max_pairs() {
        assert_eq!(clamp_max_pairs(None), 18);
        assert_eq!(clamp_max_pairs(Some(2)), 5);
        assert_eq!(clamp_max_pairs(Some(100)), 40);
        assert_eq!(clamp_max_pairs(Some(12)), 12);
    }

    #[test]
    fn test_extract_json_array_ignores_surrounding_prose() {
        let raw = "Sure! Here are the pairs:\n[{\"question\": \"Q\", \"answer\": \"A\"}]\nHope that helps.";
        assert_eq!(
            extract_json_array(raw),
            Some("[{\"question\": \"Q\", \"answer\": \"A\"}]")
        );
        assert_eq!(extract_json_array("no array here"), None);
        assert_eq!(extract_json_array("] backwards ["), None);
    }

    #[test]
    fn test_parse_failure_carries_bounded_preview() {
        let raw = "x".repeat(2000);
        let err = parse_generated_pairs(&raw).unwrap_err();
        match err {
            KnowledgeError::GenerationParse { preview } => {
                assert_eq!(preview.chars().count(), 600);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_clean_pairs_dedups_case_insensitively_keeping_first() {
        let pairs = vec![
            RawPair {
                question: "Do you ship abroad".to_string(),
                answer: "Yes.".to_string(),
            },
            RawPair {
                question: "DO YOU SHIP ABROAD?".to_string(),
                answer: "Different answer.".to_string(),
            },
            RawPair {
                question: "What about returns?".to_string(),
                answer: "  30 days.  ".to_string(),
            },
            RawPair {
                question: "   ".to_string(),
                answer: "orphan".to_string(),
            },
            RawPair {
                question: "No answer?".to_string(),
                answer: "".to_string(),
            },
        ];

        let cleaned = clean_pairs(pairs, 40);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].question, "Do you ship abroad?");
        assert_eq!(cleaned[0].answer, "Yes.");
        assert_eq!(cleaned[1].answer, "30 days.");
    }

    #[test]
    fn test_clean_pairs_caps_at_max() {
        let pairs: Vec<RawPair> = (0..20)
            .map(|i| RawPair {
                question: format!("Question number {}?", i),
                answer: "A".to_string(),
            })
            .collect();
        assert_eq!(clean_pairs(pairs, 5).len(), 5);
    }

    fn long_blob() -> String {
        "Our store sells hand-made widgets and ships worldwide within five business days."
            .to_string()
    }

    fn engine(
        repository: MockKnowledgeRepository,
        completion: MockCompletionClient,
        embedder: MockEmbedder,
        index: MockIndex,
        cache: MockResponseCache,
    ) -> IngestionEngine<MockKnowledgeRepository, MockCompletionClient> {
        IngestionEngine::new(
            Arc::new(repository),
            Arc::new(completion),
            Arc::new(embedder),
            Arc::new(index),
            Arc::new(cache),
            "knowledge_base",
        )
    }

    #[tokio::test]
    async fn test_short_blob_is_rejected_before_generation() {
        let mut completion = MockCompletionClient::new();
        completion.expect_complete().times(0);

        let engine = engine(
            MockKnowledgeRepository::new(),
            completion,
            MockEmbedder::new(),
            MockIndex::new(),
            MockResponseCache::new(),
        );

        let result = engine.ingest("store-1", "too short", None).await;
        assert!(matches!(result, Err(KnowledgeError::Validation(_))));
    }

    #[tokio::test]
    async fn test_ingest_happy_path() {
        let mut completion = MockCompletionClient::new();
        completion
            .expect_complete()
            .withf(|system, user| system.contains("18") && user.contains("widgets"))
            .returning(|_, _| {
                Ok("Here you go:\n[\
                    {\"question\": \"Do you ship worldwide\", \"answer\": \"Yes.\"},\
                    {\"question\": \"do you SHIP worldwide?\", \"answer\": \"dup\"},\
                    {\"question\": \"How long is delivery?\", \"answer\": \"Five business days.\"}\
                   ]"
                .to_string())
            });

        let mut repository = MockKnowledgeRepository::new();
        repository
            .expect_insert_pairs()
            .withf(|inputs| {
                inputs.len() == 2
                    && inputs[0].question == "Do you ship worldwide?"
                    && inputs[1].question == "How long is delivery?"
            })
            .returning(|inputs| Ok(inputs.into_iter().map(KnowledgePair::new).collect()));

        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().times(2).returning(|_| Ok(vec![0.1; DIM]));

        let mut index = MockIndex::new();
        index
            .expect_insert()
            .times(2)
            .returning(|_, record| Ok(record.id));

        let mut cache = MockResponseCache::new();
        cache
            .expect_delete()
            .with(eq("chat_configs:store-1"))
            .times(1)
            .returning(|_| Ok(()));
        cache
            .expect_bump_knowledge_version()
            .with(eq("store-1"))
            .times(1)
            .returning(|_| Ok(1));

        let engine = engine(repository, completion, embedder, index, cache);
        let report = engine.ingest("store-1", &long_blob(), None).await.unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.ids.len(), 2);
        assert_eq!(report.preview.len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_generation() {
        let mut completion = MockCompletionClient::new();
        completion
            .expect_complete()
            .returning(|_, _| Ok("I'm sorry, I can't do that.".to_string()));

        let engine = engine(
            MockKnowledgeRepository::new(),
            completion,
            MockEmbedder::new(),
            MockIndex::new(),
            MockResponseCache::new(),
        );

        let result = engine.ingest("store-1", &long_blob(), None).await;
        assert!(matches!(
            result,
            Err(KnowledgeError::GenerationParse { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_generation() {
        let mut completion = MockCompletionClient::new();
        completion
            .expect_complete()
            .returning(|_, _| Ok("[]".to_string()));

        let engine = engine(
            MockKnowledgeRepository::new(),
            completion,
            MockEmbedder::new(),
            MockIndex::new(),
            MockResponseCache::new(),
        );

        let result = engine.ingest("store-1", &long_blob(), None).await;
        assert!(matches!(result, Err(KnowledgeError::EmptyGeneration)));
    }

    #[tokio::test]
    async fn test_index_failure_does_not_abort_batch() {
        let mut completion = MockCompletionClient::new();
        completion.expect_complete().returning(|_, _| {
            Ok("[\
                {\"question\": \"First?\", \"answer\": \"A.\"},\
                {\"question\": \"Second?\", \"answer\": \"B.\"}\
               ]"
            .to_string())
        });

        let mut repository = MockKnowledgeRepository::new();
        repository
            .expect_insert_pairs()
            .returning(|inputs| Ok(inputs.into_iter().map(KnowledgePair::new).collect()));

        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_| Ok(vec![0.1; DIM]));

        let mut index = MockIndex::new();
        index
            .expect_insert()
            .times(2)
            .returning(|_, _| Err(VectorError::Unavailable("down".to_string())));

        let mut cache = MockResponseCache::new();
        cache.expect_delete().returning(|_| Ok(()));
        cache.expect_bump_knowledge_version().returning(|_| Ok(1));

        let engine = engine(repository, completion, embedder, index, cache);
        let report = engine.ingest("store-1", &long_blob(), None).await.unwrap();

        // all pairs are durable even though none were indexed
        assert_eq!(report.inserted, 2);
    }
}
