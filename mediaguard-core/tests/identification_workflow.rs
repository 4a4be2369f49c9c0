//! End-to-end identification workflows against the in-memory store.
//!
//! Fake algorithms count their invocations so the tests can assert not
//! only what is stored but what was (not) recomputed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mediaguard_core::{
    primary_digest, AlgorithmInfo, AlgorithmSelection, ContentId, ContentIdentityStore,
    ContentRecord, Digests, HashOrchestrator, Hasher, HashingRegistry, MediaFile, MediaGuardError,
    MemoryIdentityStore, QueryEngine, Result, Sha256Hasher, SimilarityResult, StoreError,
    StoreResult, WatermarkHistoryEntry, WatermarkOrchestrator, Watermarker, WatermarkingRegistry,
    ALGORITHM_SHA256,
};

// ============================================================================
// Fake algorithms
// ============================================================================

/// Deterministic digest derived from the content; counts every computation.
struct CountingHasher {
    prefix: &'static str,
    extractions: AtomicUsize,
}

impl CountingHasher {
    fn new(prefix: &'static str) -> Arc<Self> {
        Arc::new(Self {
            prefix,
            extractions: AtomicUsize::new(0),
        })
    }

    fn digest_of(&self, content: &[u8]) -> String {
        format!("{}-{}", self.prefix, &primary_digest(content)[..16])
    }

    fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }
}

impl AlgorithmInfo for CountingHasher {
    fn description(&self) -> &str {
        "counting fake"
    }
}

#[async_trait]
impl Hasher for CountingHasher {
    async fn extract_digest(&self, content: &[u8]) -> Result<String> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        Ok(self.digest_of(content))
    }

    async fn check_against_corpus(&self, content: &[u8]) -> Result<Vec<SimilarityResult>> {
        Ok(vec![
            SimilarityResult::unresolved("whatever", self.digest_of(content), 100.0),
            SimilarityResult::unresolved("whatever", "never-recorded", 42.0),
        ])
    }
}

/// Returns a fixed digest and a fixed set of raw candidates.
struct ScriptedHasher {
    digest: &'static str,
    candidates: Vec<SimilarityResult>,
}

impl AlgorithmInfo for ScriptedHasher {
    fn description(&self) -> &str {
        "scripted fake"
    }
}

#[async_trait]
impl Hasher for ScriptedHasher {
    async fn extract_digest(&self, _content: &[u8]) -> Result<String> {
        Ok(self.digest.to_string())
    }

    async fn check_against_corpus(&self, _content: &[u8]) -> Result<Vec<SimilarityResult>> {
        Ok(self.candidates.clone())
    }
}

struct BrokenHasher;

impl AlgorithmInfo for BrokenHasher {
    fn description(&self) -> &str {
        "always fails"
    }
}

#[async_trait]
impl Hasher for BrokenHasher {
    async fn extract_digest(&self, _content: &[u8]) -> Result<String> {
        Err(MediaGuardError::computation("broken", "matching service unavailable"))
    }

    async fn check_against_corpus(&self, _content: &[u8]) -> Result<Vec<SimilarityResult>> {
        Err(MediaGuardError::Extraction("unexpected plugin failure".into()))
    }
}

const MARKER: &[u8] = b"|WM|";

/// Appends the payload after a marker; extraction reads it back.
struct TrailerWatermarker;

impl AlgorithmInfo for TrailerWatermarker {
    fn description(&self) -> &str {
        "trailer fake"
    }
}

#[async_trait]
impl Watermarker for TrailerWatermarker {
    async fn embed(&self, content: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
        if content.is_empty() {
            return Err(MediaGuardError::Embed("empty content".into()));
        }
        let mut out = content.to_vec();
        out.extend_from_slice(MARKER);
        out.extend_from_slice(payload);
        Ok(out)
    }

    async fn extract(&self, content: &[u8]) -> Result<Vec<u8>> {
        if content.is_empty() {
            return Err(MediaGuardError::Extraction("empty content".into()));
        }
        content
            .windows(MARKER.len())
            .rposition(|w| w == MARKER)
            .map(|pos| content[pos + MARKER.len()..].to_vec())
            .ok_or_else(|| MediaGuardError::NotFound("no trailer".into()))
    }
}

/// Memory store whose history writes always fail.
struct HistoryOutageStore {
    inner: MemoryIdentityStore,
}

#[async_trait]
impl ContentIdentityStore for HistoryOutageStore {
    async fn find_identity_by_primary_digest(
        &self,
        primary_digest: &str,
    ) -> StoreResult<Option<ContentId>> {
        self.inner.find_identity_by_primary_digest(primary_digest).await
    }

    async fn create_identity(
        &self,
        primary_digest: &str,
        display_name: &str,
        media_kind: &str,
    ) -> StoreResult<ContentId> {
        self.inner.create_identity(primary_digest, display_name, media_kind).await
    }

    async fn get_content(&self, id: ContentId) -> StoreResult<Option<ContentRecord>> {
        self.inner.get_content(id).await
    }

    async fn list_digests(&self, id: ContentId) -> StoreResult<Digests> {
        self.inner.list_digests(id).await
    }

    async fn insert_digest_if_absent(
        &self,
        id: ContentId,
        algorithm: &str,
        digest: &str,
    ) -> StoreResult<()> {
        self.inner.insert_digest_if_absent(id, algorithm, digest).await
    }

    async fn find_identity_by_algorithm_digest(
        &self,
        algorithm: &str,
        digest: &str,
    ) -> StoreResult<Option<ContentId>> {
        self.inner.find_identity_by_algorithm_digest(algorithm, digest).await
    }

    async fn append_watermark_history(
        &self,
        _id: ContentId,
        _algorithm: &str,
        _post_digest: &str,
    ) -> StoreResult<()> {
        Err(StoreError::Connection("history table unavailable".into()))
    }

    async fn list_watermark_history(
        &self,
        id: ContentId,
    ) -> StoreResult<Vec<WatermarkHistoryEntry>> {
        self.inner.list_watermark_history(id).await
    }

    async fn find_identity_by_watermark_digest(
        &self,
        post_digest: &str,
    ) -> StoreResult<Option<WatermarkHistoryEntry>> {
        self.inner.find_identity_by_watermark_digest(post_digest).await
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    store: Arc<MemoryIdentityStore>,
    ingest: HashOrchestrator,
    query: QueryEngine,
    watermarks: WatermarkOrchestrator,
    alg1: Arc<CountingHasher>,
    alg2: Arc<CountingHasher>,
}

fn harness() -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let alg1 = CountingHasher::new("d1");
    let alg2 = CountingHasher::new("d2");

    let mut hashers = HashingRegistry::hashing();
    hashers.register("alg1", alg1.clone()).unwrap();
    hashers.register("alg2", alg2.clone()).unwrap();
    hashers.register(ALGORITHM_SHA256, Arc::new(Sha256Hasher)).unwrap();
    hashers.register("broken", Arc::new(BrokenHasher)).unwrap();
    hashers
        .register(
            "graded",
            Arc::new(ScriptedHasher {
                digest: "graded-digest",
                candidates: vec![
                    SimilarityResult {
                        algorithm: "graded".into(),
                        content_id: None,
                        digest: "graded-digest".into(),
                        similarity: 180.0,
                    },
                    SimilarityResult {
                        algorithm: "graded".into(),
                        content_id: None,
                        digest: "graded-digest".into(),
                        similarity: -12.0,
                    },
                    SimilarityResult {
                        algorithm: "graded".into(),
                        content_id: None,
                        digest: "graded-digest".into(),
                        similarity: f64::NAN,
                    },
                ],
            }),
        )
        .unwrap();

    let mut watermarkers = WatermarkingRegistry::watermarking();
    watermarkers.register("algX", Arc::new(TrailerWatermarker)).unwrap();

    let hashers = Arc::new(hashers);
    let store = Arc::new(MemoryIdentityStore::new());

    Harness {
        ingest: HashOrchestrator::new(hashers.clone(), store.clone()),
        query: QueryEngine::new(hashers, store.clone()),
        watermarks: WatermarkOrchestrator::new(Arc::new(watermarkers), store.clone()),
        store,
        alg1,
        alg2,
    }
}

fn select(names: &[&str]) -> Vec<AlgorithmSelection> {
    names.iter().map(|n| AlgorithmSelection::named(*n)).collect()
}

fn media(bytes: &[u8]) -> MediaFile {
    MediaFile::new(bytes.to_vec(), "clip.mp4").with_media_kind("video/mp4")
}

// ============================================================================
// Ingestion
// ============================================================================

#[tokio::test]
async fn test_reingest_subset_is_pure_read() {
    let h = harness();
    let file = media(b"file F");

    let first = h.ingest.ensure_hashes(&file, &select(&["alg1", "alg2"])).await.unwrap();
    assert_eq!(first.digests.len(), 2);
    assert_eq!(first.digests["alg1"], h.alg1.digest_of(b"file F"));
    assert_eq!(first.digests["alg2"], h.alg2.digest_of(b"file F"));
    assert_eq!(h.alg1.extractions(), 1);

    let second = h.ingest.ensure_hashes(&file, &select(&["alg1"])).await.unwrap();
    assert_eq!(second.content_id, first.content_id);
    assert_eq!(second.digests, first.digests);
    assert!(second.computed.is_empty());
    assert_eq!(h.alg1.extractions(), 1);
    assert_eq!(h.alg2.extractions(), 1);
}

#[tokio::test]
async fn test_reingest_superset_computes_only_missing() {
    let h = harness();
    let file = media(b"file F");

    let first = h.ingest.ensure_hashes(&file, &select(&["alg1"])).await.unwrap();
    assert_eq!(first.digests.len(), 1);

    let second = h.ingest.ensure_hashes(&file, &select(&["alg1", "alg2"])).await.unwrap();
    assert_eq!(second.content_id, first.content_id);
    assert_eq!(second.computed, vec!["alg2".to_string()]);
    assert_eq!(second.digests["alg1"], first.digests["alg1"]);
    assert!(second.digests.contains_key("alg2"));
    assert_eq!(h.alg1.extractions(), 1);
    assert_eq!(h.alg2.extractions(), 1);
}

#[tokio::test]
async fn test_identical_bytes_share_identity_and_union_digests() {
    let h = harness();
    let a = MediaFile::new(b"same bytes".to_vec(), "a.mp4");
    let b = MediaFile::new(b"same bytes".to_vec(), "b.mp4");

    let first = h.ingest.ensure_hashes(&a, &select(&["alg1", ALGORITHM_SHA256])).await.unwrap();
    let second = h.ingest.ensure_hashes(&b, &select(&["alg2"])).await.unwrap();

    assert_eq!(first.content_id, second.content_id);
    let names: Vec<&str> = second.digests.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["alg1", "alg2", ALGORITHM_SHA256]);

    let record = h.store.get_content(first.content_id).await.unwrap().unwrap();
    assert_eq!(record.file_name, "a.mp4");
    assert_eq!(record.primary_digest, primary_digest(b"same bytes"));
    assert_eq!(h.store.identity_count(), 1);
}

#[tokio::test]
async fn test_unknown_algorithm_fails_without_creating_identity() {
    let h = harness();

    let err = h
        .ingest
        .ensure_hashes(&media(b"never seen"), &select(&["alg1", "nonexistentAlgo"]))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaGuardError::InvalidConfiguration(_)));
    assert_eq!(h.store.identity_count(), 0);
    assert_eq!(h.alg1.extractions(), 0);
}

#[tokio::test]
async fn test_failing_algorithm_keeps_earlier_digests() {
    let h = harness();
    let file = media(b"partial");

    let err = h
        .ingest
        .ensure_hashes(&file, &select(&["alg1", "broken", "alg2"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MediaGuardError::Computation { ref algorithm, .. } if algorithm == "broken"
    ));

    let id = h
        .store
        .find_identity_by_primary_digest(&primary_digest(b"partial"))
        .await
        .unwrap()
        .unwrap();
    let digests = h.store.list_digests(id).await.unwrap();
    assert!(digests.contains_key("alg1"));
    assert!(!digests.contains_key("alg2"));
    assert_eq!(h.alg2.extractions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingestion_converges() {
    let h = Arc::new(harness());
    let selections = [
        select(&["alg1"]),
        select(&["alg2"]),
        select(&["alg1", "alg2"]),
        select(&["alg2", "alg1"]),
    ];

    let mut handles = Vec::new();
    for i in 0..16 {
        let h = h.clone();
        let selection = selections[i % selections.len()].clone();
        handles.push(tokio::spawn(async move {
            h.ingest
                .ensure_hashes(&media(b"hot content"), &selection)
                .await
                .unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().content_id);
    }

    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(h.store.identity_count(), 1);
    assert_eq!(h.store.digest_record_count(), 2);

    let digests = h.store.list_digests(ids[0]).await.unwrap();
    assert_eq!(digests["alg1"], h.alg1.digest_of(b"hot content"));
    assert_eq!(digests["alg2"], h.alg2.digest_of(b"hot content"));
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_query_by_digest_exact_and_unknown() {
    let h = harness();
    let outcome = h.ingest.ensure_hashes(&media(b"file F"), &select(&["alg1"])).await.unwrap();
    let d1 = outcome.digests["alg1"].clone();

    let results = h
        .query
        .query_by_digest(&BTreeMap::from([("alg1".to_string(), d1.clone())]))
        .await
        .unwrap();
    assert_eq!(
        results,
        vec![SimilarityResult {
            algorithm: "alg1".into(),
            content_id: Some(outcome.content_id),
            digest: d1.clone(),
            similarity: 100.0,
        }]
    );

    let results = h
        .query
        .query_by_digest(&BTreeMap::from([("alg1".to_string(), "unknown".to_string())]))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_query_by_digest_skips_unknown_algorithm() {
    let h = harness();
    let outcome = h.ingest.ensure_hashes(&media(b"file F"), &select(&["alg1"])).await.unwrap();

    let query = BTreeMap::from([
        ("alg1".to_string(), outcome.digests["alg1"].clone()),
        ("no-such-algorithm".to_string(), "whatever".to_string()),
    ]);
    let results = h.query.query_by_digest(&query).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].algorithm, "alg1");
}

#[tokio::test]
async fn test_query_by_content_returns_only_resolvable_matches() {
    let h = harness();
    let outcome = h
        .ingest
        .ensure_hashes(&media(b"file F"), &select(&["alg1", ALGORITHM_SHA256]))
        .await
        .unwrap();

    let results = h
        .query
        .query_by_content(
            b"file F",
            &["alg1".to_string(), "alg2".to_string(), ALGORITHM_SHA256.to_string()],
        )
        .await
        .unwrap();

    // alg2 was never recorded and "never-recorded" candidates are dropped.
    assert_eq!(results.len(), 2);
    for result in &results {
        let id = result.content_id.expect("results are resolved");
        assert_eq!(id, outcome.content_id);
        assert_eq!(
            h.store
                .find_identity_by_algorithm_digest(&result.algorithm, &result.digest)
                .await
                .unwrap(),
            Some(id)
        );
        assert_eq!(result.similarity, 100.0);
    }
    assert_eq!(results[0].algorithm, "alg1");
    assert_eq!(results[1].algorithm, ALGORITHM_SHA256);
}

#[tokio::test]
async fn test_query_by_content_unseen_content_is_empty() {
    let h = harness();
    h.ingest.ensure_hashes(&media(b"file F"), &select(&["alg1"])).await.unwrap();

    let results = h.query.query_by_content(b"other file", &["alg1".to_string()]).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_query_by_content_unknown_algorithm_rejected() {
    let h = harness();
    let err = h
        .query
        .query_by_content(b"file F", &["nonexistentAlgo".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, MediaGuardError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_query_by_content_plugin_failure_propagates() {
    let h = harness();
    let err = h
        .query
        .query_by_content(b"file F", &["broken".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MediaGuardError::Computation { ref algorithm, .. } if algorithm == "broken"
    ));
}

#[tokio::test]
async fn test_similarity_scores_are_bounded() {
    let h = harness();
    h.ingest.ensure_hashes(&media(b"graded"), &select(&["graded"])).await.unwrap();

    let results = h.query.query_by_content(b"graded", &["graded".to_string()]).await.unwrap();
    let scores: Vec<f64> = results.iter().map(|r| r.similarity).collect();
    assert_eq!(scores, vec![100.0, 0.0, 0.0]);
    assert!(results.iter().all(|r| r.algorithm == "graded"));
}

// ============================================================================
// Watermarking
// ============================================================================

#[tokio::test]
async fn test_embed_extract_round_trip_records_history() {
    let h = harness();
    let file = media(b"original F");
    let payload = br#"{"owner":"acme"}"#;

    let outcome = h.watermarks.embed_and_record(&file, "algX", payload).await.unwrap();
    assert_ne!(outcome.artifact, file.bytes);

    let extracted = h.watermarks.extract(&outcome.artifact, "algX").await.unwrap();
    assert_eq!(extracted, payload);

    let history = h.store.list_watermark_history(outcome.content_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].algorithm, "algX");
    assert_eq!(history[0].post_digest, primary_digest(&outcome.artifact));

    // Watermarked content needs no prior digests, and the identity is the
    // one ingestion would later resolve.
    let ingested = h.ingest.ensure_hashes(&file, &select(&["alg1"])).await.unwrap();
    assert_eq!(ingested.content_id, outcome.content_id);

    let origin = h.watermarks.trace_origin(&outcome.artifact).await.unwrap();
    assert_eq!(origin.content_id, outcome.content_id);
}

#[tokio::test]
async fn test_trace_origin_of_unmarked_content_is_not_found() {
    let h = harness();
    let err = h.watermarks.trace_origin(b"never marked").await.unwrap_err();
    assert!(matches!(err, MediaGuardError::NotFound(_)));
}

#[tokio::test]
async fn test_embed_unknown_algorithm_has_no_side_effects() {
    let h = harness();
    let err = h
        .watermarks
        .embed_and_record(&media(b"new content"), "missing", b"payload")
        .await
        .unwrap_err();

    assert!(matches!(err, MediaGuardError::UnknownAlgorithm { .. }));
    assert_eq!(h.store.identity_count(), 0);
}

#[tokio::test]
async fn test_embed_failure_writes_no_history() {
    let h = harness();
    let err = h
        .watermarks
        .embed_and_record(&media(b""), "algX", b"payload")
        .await
        .unwrap_err();
    assert!(matches!(err, MediaGuardError::Embed(_)));

    let id = h
        .store
        .find_identity_by_primary_digest(&primary_digest(b""))
        .await
        .unwrap()
        .unwrap();
    assert!(h.store.list_watermark_history(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_extract_distinguishes_missing_from_malformed() {
    let h = harness();

    let missing = h.watermarks.extract(b"plain content", "algX").await.unwrap_err();
    assert!(matches!(missing, MediaGuardError::NotFound(_)));

    let malformed = h.watermarks.extract(b"", "algX").await.unwrap_err();
    assert!(matches!(malformed, MediaGuardError::Extraction(_)));
}

#[tokio::test]
async fn test_history_outage_still_returns_artifact() {
    let mut watermarkers = WatermarkingRegistry::watermarking();
    watermarkers.register("algX", Arc::new(TrailerWatermarker)).unwrap();
    let store = Arc::new(HistoryOutageStore {
        inner: MemoryIdentityStore::new(),
    });
    let orchestrator = WatermarkOrchestrator::new(Arc::new(watermarkers), store.clone());

    let err = orchestrator
        .embed_and_record(&media(b"original"), "algX", b"payload")
        .await
        .unwrap_err();

    match err {
        MediaGuardError::PartialRecording {
            content_id,
            post_digest,
            artifact,
            source,
        } => {
            assert_eq!(artifact, b"original|WM|payload");
            assert_eq!(post_digest, primary_digest(&artifact));
            assert!(matches!(source, StoreError::Connection(_)));
            assert!(store.inner.get_content(content_id).await.unwrap().is_some());
        }
        other => panic!("expected PartialRecording, got {other:?}"),
    }
}
