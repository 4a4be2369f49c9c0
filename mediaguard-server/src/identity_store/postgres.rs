//! PostgreSQL implementation of the content identity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediaguard_core::{
    ContentId, ContentIdentityStore, ContentRecord, Digests, StoreError, StoreResult,
    WatermarkHistoryEntry,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed identity store.
///
/// Uniqueness of identities and of (identity, algorithm) digests is enforced
/// by the schema, so concurrent server instances converge on the same rows.
#[derive(Clone)]
pub struct PostgresIdentityStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct FileRow {
    uuid: Uuid,
    filename: String,
    media_type: String,
    primary_digest: String,
    created_at: DateTime<Utc>,
}

impl From<FileRow> for ContentRecord {
    fn from(row: FileRow) -> Self {
        Self {
            id: ContentId::from_uuid(row.uuid),
            file_name: row.filename,
            media_kind: row.media_type,
            primary_digest: row.primary_digest,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct HistoryRow {
    file_uuid: Uuid,
    algorithm: String,
    post_digest: String,
    created_at: DateTime<Utc>,
}

impl From<HistoryRow> for WatermarkHistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            content_id: ContentId::from_uuid(row.file_uuid),
            algorithm: row.algorithm,
            post_digest: row.post_digest,
            recorded_at: row.created_at,
        }
    }
}

/// Classify a driver error into the store's error kinds.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(ref db)
            if db.is_unique_violation() || db.is_foreign_key_violation() =>
        {
            StoreError::Constraint(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Connection(err.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

impl PostgresIdentityStore {
    /// Connect to the database and run pending migrations.
    pub async fn new(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!("Identity store connected and migrations applied");

        Ok(Self { pool })
    }

    /// Create a store from an existing pool (for testing).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check database connectivity.
    pub async fn check_health(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

#[async_trait]
impl ContentIdentityStore for PostgresIdentityStore {
    async fn find_identity_by_primary_digest(
        &self,
        primary_digest: &str,
    ) -> StoreResult<Option<ContentId>> {
        let uuid: Option<Uuid> =
            sqlx::query_scalar("SELECT uuid FROM files WHERE primary_digest = $1")
                .bind(primary_digest)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_error)?;

        Ok(uuid.map(ContentId::from_uuid))
    }

    async fn create_identity(
        &self,
        primary_digest: &str,
        display_name: &str,
        media_kind: &str,
    ) -> StoreResult<ContentId> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let uuid: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO files (uuid, filename, media_type, primary_digest)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (primary_digest) DO UPDATE SET
                primary_digest = EXCLUDED.primary_digest
            RETURNING uuid
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(display_name)
        .bind(media_kind)
        .bind(primary_digest)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        tracing::debug!(file_uuid = %uuid, "Identity resolved");

        Ok(ContentId::from_uuid(uuid))
    }

    async fn get_content(&self, id: ContentId) -> StoreResult<Option<ContentRecord>> {
        let row: Option<FileRow> = sqlx::query_as(
            r#"
            SELECT uuid, filename, media_type, primary_digest, created_at
            FROM files
            WHERE uuid = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Into::into))
    }

    async fn list_digests(&self, id: ContentId) -> StoreResult<Digests> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT algorithm, hash_value FROM hashes WHERE file_uuid = $1")
                .bind(id.as_uuid())
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;

        Ok(rows.into_iter().collect())
    }

    async fn insert_digest_if_absent(
        &self,
        id: ContentId,
        algorithm: &str,
        digest: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hashes (file_uuid, algorithm, hash_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (file_uuid, algorithm) DO NOTHING
            "#,
        )
        .bind(id.as_uuid())
        .bind(algorithm)
        .bind(digest)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn find_identity_by_algorithm_digest(
        &self,
        algorithm: &str,
        digest: &str,
    ) -> StoreResult<Option<ContentId>> {
        let uuid: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT file_uuid FROM hashes
            WHERE algorithm = $1 AND hash_value = $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(algorithm)
        .bind(digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(uuid.map(ContentId::from_uuid))
    }

    async fn append_watermark_history(
        &self,
        id: ContentId,
        algorithm: &str,
        post_digest: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO watermark_history (file_uuid, algorithm, post_digest) VALUES ($1, $2, $3)",
        )
        .bind(id.as_uuid())
        .bind(algorithm)
        .bind(post_digest)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn list_watermark_history(
        &self,
        id: ContentId,
    ) -> StoreResult<Vec<WatermarkHistoryEntry>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT file_uuid, algorithm, post_digest, created_at
            FROM watermark_history
            WHERE file_uuid = $1
            ORDER BY id
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_identity_by_watermark_digest(
        &self,
        post_digest: &str,
    ) -> StoreResult<Option<WatermarkHistoryEntry>> {
        let row: Option<HistoryRow> = sqlx::query_as(
            r#"
            SELECT file_uuid, algorithm, post_digest, created_at
            FROM watermark_history
            WHERE post_digest = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(post_digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_connection_errors() {
        assert!(matches!(store_error(sqlx::Error::PoolTimedOut), StoreError::Connection(_)));
        assert!(matches!(store_error(sqlx::Error::PoolClosed), StoreError::Connection(_)));
    }

    #[test]
    fn test_other_errors_are_query_errors() {
        assert!(matches!(store_error(sqlx::Error::RowNotFound), StoreError::Query(_)));
        assert!(matches!(
            store_error(sqlx::Error::ColumnNotFound("hash_value".into())),
            StoreError::Query(_)
        ));
    }

    #[test]
    fn test_file_row_into_record() {
        let uuid = Uuid::new_v4();
        let record: ContentRecord = FileRow {
            uuid,
            filename: "clip.mp4".into(),
            media_type: "video/mp4".into(),
            primary_digest: "ab".repeat(32),
            created_at: Utc::now(),
        }
        .into();

        assert_eq!(record.id.as_uuid(), uuid);
        assert_eq!(record.file_name, "clip.mp4");
        assert_eq!(record.media_kind, "video/mp4");
    }
}
