//! End-to-end tests for build-or-load, retrieval, and grounded answers.
//!
//! The embedding model and language model are replaced by in-process fakes
//! that count their calls; dumps and indexes live in temp directories.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use newsrag_llm::{LanguageModel, LlmError};
use newsrag_rag::{
    search, AnswerRequest, Assembler, CacheKey, DumpDirectory, DumpFile, Embedder, FlatL2Index,
    Intent, IndexBuilder, RagError,
};

const DIM: usize = 16;

/// Bag-of-words hashing embedder with call counters.
#[derive(Clone, Default)]
struct CountingEmbedder {
    calls: Arc<AtomicUsize>,
    texts: Arc<AtomicUsize>,
}

impl CountingEmbedder {
    fn vector_for(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; DIM];
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            let bucket = word
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(usize::from(b)));
            v[bucket % DIM] += 1.0;
        }
        v
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn texts(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

impl Embedder for CountingEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }
}

/// Language model that records prompts and replies with a canned answer.
#[derive(Clone)]
struct RecordingModel {
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingModel {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Arc::default(),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LanguageModel for RecordingModel {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

struct Fixture {
    _tmp: tempfile::TempDir,
    dump_dir: PathBuf,
    index_dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let dump_dir = tmp.path().join("dump");
        let index_dir = tmp.path().join("vector_store");
        std::fs::create_dir_all(&dump_dir).unwrap();
        Self {
            _tmp: tmp,
            dump_dir,
            index_dir,
        }
    }

    fn write_dump(&self, query: &str, built_at_ms: i64, texts: &[&str]) -> DumpFile {
        let path = self.dump_dir.join(format!("{query}_{built_at_ms}.jsonl"));
        let body: String = texts
            .iter()
            .map(|t| {
                let line = serde_json::json!({
                    "title": "headline",
                    "authors": ["Reporter"],
                    "text": t,
                    "publish_date": null,
                    "url": "https://example.com/a",
                });
                format!("{line}\n")
            })
            .collect();
        std::fs::write(&path, body).unwrap();
        DumpFile::from_path(path).unwrap()
    }

    fn index_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.index_dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

const ARTICLES: &[&str] = &[
    "ACME reported record quarterly revenue. Profit margins expanded for the third straight quarter.",
    "The ACME chief executive resigned unexpectedly on Monday. The board named an interim leader.",
    "Regulators opened an inquiry into ACME   factory safety practices. Shares fell sharply in late trading.",
];

fn builder(embedder: &CountingEmbedder, index_dir: &Path) -> IndexBuilder<CountingEmbedder> {
    IndexBuilder::new(embedder.clone(), index_dir).with_max_chunk_words(12)
}

#[tokio::test]
async fn second_build_reuses_index_without_embedding() {
    let fx = Fixture::new();
    let dump = fx.write_dump("ACME", 1_000, ARTICLES);
    let embedder = CountingEmbedder::default();
    let builder = builder(&embedder, &fx.index_dir);

    let first = builder.build_or_load(&dump).await.unwrap();
    assert!(!first.reused);
    assert_eq!(embedder.calls(), 1);
    assert_eq!(embedder.texts(), first.chunks.len());
    assert_eq!(
        fx.index_files(),
        vec![CacheKey::new("ACME", 1_000).index_path(&fx.index_dir)]
    );

    let second = builder.build_or_load(&dump).await.unwrap();
    assert!(second.reused);
    assert_eq!(embedder.calls(), 1, "cached index must not be re-embedded");
    assert_eq!(second.chunks, first.chunks);
    assert_eq!(second.index, first.index);
}

#[tokio::test]
async fn chunk_i_maps_to_vector_i_on_build_and_load() {
    let fx = Fixture::new();
    let dump = fx.write_dump("ACME", 2_000, ARTICLES);
    let embedder = CountingEmbedder::default();
    let builder = builder(&embedder, &fx.index_dir);

    for _ in 0..2 {
        let corpus = builder.build_or_load(&dump).await.unwrap();
        assert_eq!(corpus.index.len(), corpus.chunks.len());
        for (i, chunk) in corpus.chunks.iter().enumerate() {
            assert_eq!(
                corpus.index.vector(i).unwrap(),
                CountingEmbedder::vector_for(chunk).as_slice(),
                "row {i} is not the embedding of chunk {i}"
            );
        }
    }
}

#[tokio::test]
async fn chunks_follow_article_then_sentence_order() {
    let fx = Fixture::new();
    let dump = fx.write_dump("ACME", 3_000, ARTICLES);
    let embedder = CountingEmbedder::default();

    let corpus = builder(&embedder, &fx.index_dir)
        .build_or_load(&dump)
        .await
        .unwrap();

    assert_eq!(
        corpus.chunks,
        vec![
            "ACME reported record quarterly revenue.",
            "Profit margins expanded for the third straight quarter.",
            "The ACME chief executive resigned unexpectedly on Monday.",
            "The board named an interim leader.",
            "Regulators opened an inquiry into ACME factory safety practices.",
            "Shares fell sharply in late trading.",
        ]
    );
}

#[tokio::test]
async fn empty_corpus_is_fatal_and_writes_nothing() {
    let fx = Fixture::new();
    let dump = fx.write_dump("Ghost", 4_000, &["", "   ", "\\n\t"]);
    let embedder = CountingEmbedder::default();

    let err = builder(&embedder, &fx.index_dir)
        .build_or_load(&dump)
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::EmptyCorpus { .. }), "got {err:?}");
    assert_eq!(embedder.calls(), 0);
    assert!(fx.index_files().is_empty());
}

#[tokio::test]
async fn mismatched_persisted_index_is_rebuilt() {
    let fx = Fixture::new();
    let dump = fx.write_dump("ACME", 5_000, ARTICLES);
    let embedder = CountingEmbedder::default();

    let coarse = builder(&embedder, &fx.index_dir)
        .with_max_chunk_words(150)
        .build_or_load(&dump)
        .await
        .unwrap();
    assert_eq!(coarse.chunks.len(), 3);

    // Same dump, different chunking: the persisted rows no longer line up.
    let fine = builder(&embedder, &fx.index_dir)
        .build_or_load(&dump)
        .await
        .unwrap();
    assert!(!fine.reused);
    assert_eq!(embedder.calls(), 2);
    assert_eq!(fine.index.len(), fine.chunks.len());

    let on_disk = FlatL2Index::load(&CacheKey::new("ACME", 5_000).index_path(&fx.index_dir))
        .await
        .unwrap()
        .unwrap();
    assert!(on_disk.matches_chunks(&fine.chunks));
}

#[tokio::test]
async fn corrupt_persisted_index_is_rebuilt() {
    let fx = Fixture::new();
    let dump = fx.write_dump("ACME", 6_000, ARTICLES);
    std::fs::create_dir_all(&fx.index_dir).unwrap();
    std::fs::write(
        CacheKey::new("ACME", 6_000).index_path(&fx.index_dir),
        b"garbage",
    )
    .unwrap();
    let embedder = CountingEmbedder::default();

    let corpus = builder(&embedder, &fx.index_dir)
        .build_or_load(&dump)
        .await
        .unwrap();

    assert!(!corpus.reused);
    assert_eq!(embedder.calls(), 1);
    let reloaded = builder(&embedder, &fx.index_dir)
        .build_or_load(&dump)
        .await
        .unwrap();
    assert!(reloaded.reused);
}

#[tokio::test]
async fn new_dump_for_same_query_gets_its_own_index() {
    let fx = Fixture::new();
    let old = fx.write_dump("ACME", 7_000, ARTICLES);
    let new = fx.write_dump("ACME", 8_000, &ARTICLES[..1]);
    let embedder = CountingEmbedder::default();
    let builder = builder(&embedder, &fx.index_dir);

    let a = builder.build_or_load(&old).await.unwrap();
    let b = builder.build_or_load(&new).await.unwrap();

    assert!(!b.reused);
    assert_ne!(a.key, b.key);
    assert_eq!(b.index.len(), 2);
    assert_eq!(fx.index_files().len(), 2);
}

#[tokio::test]
async fn queries_with_the_same_slug_keep_separate_indexes() {
    let fx = Fixture::new();
    let spaced = fx.write_dump("Apple Inc", 7_500, &ARTICLES[..1]);
    let dashed = fx.write_dump("apple-inc", 7_500, &ARTICLES[1..2]);
    let embedder = CountingEmbedder::default();
    let builder = builder(&embedder, &fx.index_dir);

    builder.build_or_load(&spaced).await.unwrap();
    builder.build_or_load(&dashed).await.unwrap();
    assert_eq!(fx.index_files().len(), 2);

    assert!(builder.build_or_load(&spaced).await.unwrap().reused);
    assert!(builder.build_or_load(&dashed).await.unwrap().reused);
    assert_eq!(embedder.calls(), 2);
}

#[tokio::test]
async fn search_finds_the_matching_chunk() {
    let fx = Fixture::new();
    let dump = fx.write_dump("ACME", 9_000, ARTICLES);
    let embedder = CountingEmbedder::default();
    let builder = builder(&embedder, &fx.index_dir);
    let corpus = builder.build_or_load(&dump).await.unwrap();

    let hits = search(
        builder.embedder(),
        &corpus,
        "The board named an interim leader.",
        1,
    )
    .await
    .unwrap();
    assert_eq!(hits.hits[0].chunk_index, 3);
    assert!(hits.hits[0].distance.abs() < f32::EPSILON);

    let all = search(builder.embedder(), &corpus, "ACME", 100).await.unwrap();
    assert_eq!(all.len(), corpus.chunks.len());
}

fn assembler(
    fx: &Fixture,
    embedder: &CountingEmbedder,
    model: &RecordingModel,
) -> Assembler<CountingEmbedder, RecordingModel, DumpDirectory> {
    Assembler::new(
        builder(embedder, &fx.index_dir),
        model.clone(),
        DumpDirectory::new(&fx.dump_dir, Duration::from_secs(24 * 3600)),
    )
    .with_top_k(2)
}

#[tokio::test]
async fn outlook_answer_is_grounded_and_scored() {
    let fx = Fixture::new();
    let now = chrono::Utc::now().timestamp_millis();
    fx.write_dump("ACME", now - 60_000, ARTICLES);
    let embedder = CountingEmbedder::default();
    let model = RecordingModel::new("Mixed quarter with leadership risk.\n**Score: -0.2**");

    let answer = assembler(&fx, &embedder, &model)
        .answer("ACME", &AnswerRequest::outlook("ACME"))
        .await
        .unwrap();

    assert_eq!(answer.intent, Intent::SentimentGrounded);
    assert_eq!(answer.sources.len(), 2);
    assert!((answer.sentiment_score().unwrap() + 0.2).abs() < f32::EPSILON);
    // one batch for the corpus, one for the question
    assert_eq!(embedder.calls(), 2);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("You are a professional financial analyst."));
    assert!(prompts[0].contains("What are the latest news and outlook for ACME?"));
    assert!(prompts[0].contains(&format!("[1] {}", answer.sources[0].text)));
}

#[tokio::test]
async fn freeform_question_is_passed_through_without_context() {
    let fx = Fixture::new();
    let now = chrono::Utc::now().timestamp_millis();
    fx.write_dump("ACME", now, ARTICLES);
    let embedder = CountingEmbedder::default();
    let model = RecordingModel::new("It depends on your horizon.");

    let text = assembler(&fx, &embedder, &model)
        .answer_text("ACME", "Is ACME a good long-term hold?")
        .await
        .unwrap();

    assert_eq!(text, "It depends on your horizon.");
    assert_eq!(model.prompts(), vec!["Is ACME a good long-term hold?".to_string()]);
    // the index is warmed, but the question itself is never embedded
    assert_eq!(embedder.calls(), 1);
    assert_eq!(fx.index_files().len(), 1);
}

#[tokio::test]
async fn missing_score_is_recoverable() {
    let fx = Fixture::new();
    let now = chrono::Utc::now().timestamp_millis();
    fx.write_dump("ACME", now, ARTICLES);
    let embedder = CountingEmbedder::default();
    let model = RecordingModel::new("I would rather not put a number on it.");

    let answer = assembler(&fx, &embedder, &model)
        .answer("ACME", &AnswerRequest::outlook("ACME"))
        .await
        .unwrap();

    assert!(matches!(answer.sentiment_score(), Err(RagError::MissingScore)));
    assert!(!answer.text.is_empty());
}

#[tokio::test]
async fn stale_dump_aborts_the_answer() {
    let fx = Fixture::new();
    let two_days_ago = chrono::Utc::now().timestamp_millis() - 2 * 24 * 3600 * 1000;
    fx.write_dump("ACME", two_days_ago, ARTICLES);
    let embedder = CountingEmbedder::default();
    let model = RecordingModel::new("unused");

    let err = assembler(&fx, &embedder, &model)
        .answer("ACME", &AnswerRequest::outlook("ACME"))
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::NoFreshDump { .. }), "got {err:?}");
    assert!(model.prompts().is_empty());
    assert_eq!(embedder.calls(), 0);
}
