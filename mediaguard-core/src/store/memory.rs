//! In-memory identity store.
//!
//! Used by tests and for running the server without a database. Entries
//! are held in `DashMap`s; the map entry APIs give the same first-writer-wins
//! behaviour the SQL store gets from its unique constraints. Nothing
//! survives a restart.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{ContentIdentityStore, StoreResult};
use crate::model::{ContentId, ContentRecord, Digests, WatermarkHistoryEntry};

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    by_primary_digest: DashMap<String, ContentId>,
    contents: DashMap<ContentId, ContentRecord>,
    digests: DashMap<ContentId, Digests>,
    /// (algorithm, digest) → first identity that recorded it
    reverse: DashMap<(String, String), ContentId>,
    history: DashMap<ContentId, Vec<WatermarkHistoryEntry>>,
    /// post digest → first history entry that produced it
    by_post_digest: DashMap<String, WatermarkHistoryEntry>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of content identities.
    pub fn identity_count(&self) -> usize {
        self.contents.len()
    }

    /// Number of (identity, algorithm) digest records across all identities.
    pub fn digest_record_count(&self) -> usize {
        self.digests.iter().map(|entry| entry.value().len()).sum()
    }
}

#[async_trait]
impl ContentIdentityStore for MemoryIdentityStore {
    async fn find_identity_by_primary_digest(
        &self,
        primary_digest: &str,
    ) -> StoreResult<Option<ContentId>> {
        Ok(self.by_primary_digest.get(primary_digest).map(|id| *id))
    }

    async fn create_identity(
        &self,
        primary_digest: &str,
        display_name: &str,
        media_kind: &str,
    ) -> StoreResult<ContentId> {
        // The entry guard is held until the record is inserted, so a racing
        // creator either sees no entry or a fully created identity.
        let entry = self
            .by_primary_digest
            .entry(primary_digest.to_string())
            .or_insert_with(|| {
                let id = ContentId::generate();
                self.contents.insert(
                    id,
                    ContentRecord {
                        id,
                        file_name: display_name.to_string(),
                        media_kind: media_kind.to_string(),
                        primary_digest: primary_digest.to_string(),
                        created_at: Utc::now(),
                    },
                );
                id
            });
        Ok(*entry)
    }

    async fn get_content(&self, id: ContentId) -> StoreResult<Option<ContentRecord>> {
        Ok(self.contents.get(&id).map(|record| record.clone()))
    }

    async fn list_digests(&self, id: ContentId) -> StoreResult<Digests> {
        Ok(self
            .digests
            .get(&id)
            .map(|digests| digests.clone())
            .unwrap_or_default())
    }

    async fn insert_digest_if_absent(
        &self,
        id: ContentId,
        algorithm: &str,
        digest: &str,
    ) -> StoreResult<()> {
        let mut digests = self.digests.entry(id).or_default();
        if digests.contains_key(algorithm) {
            return Ok(());
        }
        digests.insert(algorithm.to_string(), digest.to_string());
        drop(digests);

        self.reverse
            .entry((algorithm.to_string(), digest.to_string()))
            .or_insert(id);
        Ok(())
    }

    async fn find_identity_by_algorithm_digest(
        &self,
        algorithm: &str,
        digest: &str,
    ) -> StoreResult<Option<ContentId>> {
        Ok(self
            .reverse
            .get(&(algorithm.to_string(), digest.to_string()))
            .map(|id| *id))
    }

    async fn append_watermark_history(
        &self,
        id: ContentId,
        algorithm: &str,
        post_digest: &str,
    ) -> StoreResult<()> {
        let entry = WatermarkHistoryEntry {
            content_id: id,
            algorithm: algorithm.to_string(),
            post_digest: post_digest.to_string(),
            recorded_at: Utc::now(),
        };

        self.by_post_digest
            .entry(post_digest.to_string())
            .or_insert_with(|| entry.clone());
        self.history.entry(id).or_default().push(entry);
        Ok(())
    }

    async fn list_watermark_history(
        &self,
        id: ContentId,
    ) -> StoreResult<Vec<WatermarkHistoryEntry>> {
        Ok(self
            .history
            .get(&id)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }

    async fn find_identity_by_watermark_digest(
        &self,
        post_digest: &str,
    ) -> StoreResult<Option<WatermarkHistoryEntry>> {
        Ok(self.by_post_digest.get(post_digest).map(|entry| entry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_create_identity_is_create_or_get() {
        let store = MemoryIdentityStore::new();
        let first = store.create_identity("d1", "a.mp4", "video/mp4").await.unwrap();
        let second = store.create_identity("d1", "renamed.mp4", "video/mp4").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.identity_count(), 1);

        let record = store.get_content(first).await.unwrap().unwrap();
        assert_eq!(record.file_name, "a.mp4");
        assert_eq!(record.primary_digest, "d1");
        assert_eq!(
            store.find_identity_by_primary_digest("d1").await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_insert_digest_never_overwrites() {
        let store = MemoryIdentityStore::new();
        let id = store.create_identity("d1", "a", "video/mp4").await.unwrap();

        store.insert_digest_if_absent(id, "sha256", "first").await.unwrap();
        store.insert_digest_if_absent(id, "sha256", "second").await.unwrap();

        let digests = store.list_digests(id).await.unwrap();
        assert_eq!(digests.get("sha256").map(String::as_str), Some("first"));
        assert_eq!(store.digest_record_count(), 1);
        assert_eq!(
            store.find_identity_by_algorithm_digest("sha256", "first").await.unwrap(),
            Some(id)
        );
        assert_eq!(
            store.find_identity_by_algorithm_digest("sha256", "second").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_algorithm_digest_lookup_is_per_algorithm() {
        let store = MemoryIdentityStore::new();
        let id = store.create_identity("d1", "a", "image/png").await.unwrap();
        store.insert_digest_if_absent(id, "vt", "abcd").await.unwrap();

        assert!(store
            .find_identity_by_algorithm_digest("sha256", "abcd")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_watermark_history_append_only() {
        let store = MemoryIdentityStore::new();
        let id = store.create_identity("d1", "a", "video/mp4").await.unwrap();

        store.append_watermark_history(id, "basic", "post1").await.unwrap();
        store.append_watermark_history(id, "basic", "post2").await.unwrap();

        let history = store.list_watermark_history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].post_digest, "post1");
        assert_eq!(history[1].post_digest, "post2");

        let origin = store.find_identity_by_watermark_digest("post2").await.unwrap().unwrap();
        assert_eq!(origin.content_id, id);
        assert!(store.find_identity_by_watermark_digest("post3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_create_converges() {
        let store = Arc::new(MemoryIdentityStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_identity("same", &format!("copy-{i}"), "video/mp4")
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.identity_count(), 1);
    }
}
