//! Persistence for normalized records and favorites.

use crate::error::Result;
use crate::models::{Favorite, FileKind, MetadataRecord};
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;
use tracing::debug;

const RECORDS: &str = "records";
const FAVORITES: &str = "favorites";

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts `record`, replacing any earlier record for the same kind and filename.
    async fn put(&self, record: &MetadataRecord) -> Result<()>;

    /// Every stored record, ordered by path.
    async fn all(&self) -> Result<Vec<MetadataRecord>>;

    /// Returns `false` when the user had already favorited the file.
    async fn add_favorite(&self, filename: &str, user_id: &str) -> Result<bool>;

    async fn remove_favorite(&self, filename: &str, user_id: &str) -> Result<bool>;

    /// The user's favorites, oldest first.
    async fn favorites(&self, user_id: &str) -> Result<Vec<Favorite>>;
}

pub struct SurrealStore {
    db: Surreal<Db>,
}

impl SurrealStore {
    /// Opens (or creates) a RocksDB-backed store at `path`.
    pub async fn open(path: &str) -> Result<Self> {
        let db = Surreal::new::<RocksDb>(path).await?;
        Self::init(db).await
    }

    /// A store that lives only as long as the process.
    pub async fn memory() -> Result<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        Self::init(db).await
    }

    async fn init(db: Surreal<Db>) -> Result<Self> {
        db.use_ns("archive").use_db("records").await?;
        Ok(Self { db })
    }
}

fn digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Stable key for a record, derived from its kind and filename.
pub fn record_key(kind: FileKind, filename: &str) -> String {
    digest(&[kind.label(), filename])
}

pub fn favorite_key(filename: &str, user_id: &str) -> String {
    digest(&[user_id, filename])
}

#[async_trait]
impl RecordStore for SurrealStore {
    async fn put(&self, record: &MetadataRecord) -> Result<()> {
        let key = record_key(record.file_kind(), &record.filename);
        let _: Option<MetadataRecord> = self
            .db
            .update((RECORDS, key.as_str()))
            .content(record.clone())
            .await?;
        debug!(filename = %record.filename, key = %key, "stored record");
        Ok(())
    }

    async fn all(&self) -> Result<Vec<MetadataRecord>> {
        let mut records: Vec<MetadataRecord> = self.db.select(RECORDS).await?;
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    async fn add_favorite(&self, filename: &str, user_id: &str) -> Result<bool> {
        let key = favorite_key(filename, user_id);
        let existing: Option<Favorite> = self.db.select((FAVORITES, key.as_str())).await?;
        if existing.is_some() {
            return Ok(false);
        }

        let favorite = Favorite {
            filename: filename.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        let _: Option<Favorite> = self
            .db
            .create((FAVORITES, key.as_str()))
            .content(favorite)
            .await?;
        Ok(true)
    }

    async fn remove_favorite(&self, filename: &str, user_id: &str) -> Result<bool> {
        let key = favorite_key(filename, user_id);
        let removed: Option<Favorite> = self.db.delete((FAVORITES, key.as_str())).await?;
        Ok(removed.is_some())
    }

    async fn favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let mut favorites: Vec<Favorite> = self
            .db
            .query("SELECT * FROM favorites WHERE user_id = $user")
            .bind(("user", user_id.to_string()))
            .await?
            .take(0)?;
        favorites.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(favorites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_USER;
    use tempfile::TempDir;

    fn record(filename: &str, kind: FileKind, title: &str) -> MetadataRecord {
        let mut record = MetadataRecord::minimal(filename, &format!("/archive/{filename}"), kind, 10);
        record.title = Some(title.to_string());
        record
    }

    #[tokio::test]
    async fn test_put_replaces_same_key() -> Result<()> {
        let store = SurrealStore::memory().await?;
        store.put(&record("a.pdf", FileKind::Document, "First")).await?;
        store.put(&record("a.pdf", FileKind::Document, "Second")).await?;
        store.put(&record("a.pdf", FileKind::Image, "Other kind")).await?;

        let records = store.all().await?;
        assert_eq!(records.len(), 2);
        let doc = records
            .iter()
            .find(|r| r.file_kind() == FileKind::Document)
            .unwrap();
        assert_eq!(doc.title.as_deref(), Some("Second"));
        Ok(())
    }

    #[tokio::test]
    async fn test_round_trips_kind_details() -> Result<()> {
        let store = SurrealStore::memory().await?;
        let mut original = record("song.mp3", FileKind::Audio, "Song");
        original.keywords = vec!["song".to_string()];
        store.put(&original).await?;

        let records = store.all().await?;
        assert_eq!(records, vec![original]);
        Ok(())
    }

    #[tokio::test]
    async fn test_favorites_are_unique_per_user() -> Result<()> {
        let store = SurrealStore::memory().await?;
        assert!(store.add_favorite("a.pdf", DEFAULT_USER).await?);
        assert!(!store.add_favorite("a.pdf", DEFAULT_USER).await?);
        assert!(store.add_favorite("a.pdf", "alice").await?);
        assert!(store.add_favorite("b.jpg", DEFAULT_USER).await?);

        let favorites = store.favorites(DEFAULT_USER).await?;
        let names: Vec<&str> = favorites.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["a.pdf", "b.jpg"]);

        assert!(store.remove_favorite("a.pdf", DEFAULT_USER).await?);
        assert!(!store.remove_favorite("a.pdf", DEFAULT_USER).await?);
        assert_eq!(store.favorites(DEFAULT_USER).await?.len(), 1);
        assert_eq!(store.favorites("alice").await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_rocksdb_store() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test_db");

        let store = SurrealStore::open(&db_path.to_string_lossy()).await?;
        store.put(&record("a.pdf", FileKind::Document, "A")).await?;
        assert_eq!(store.all().await?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_keys_are_stable_hex() {
        let key = record_key(FileKind::Document, "a.pdf");
        assert_eq!(key.len(), 64);
        assert_eq!(key, record_key(FileKind::Document, "a.pdf"));
        assert_ne!(key, record_key(FileKind::Slides, "a.pdf"));
        assert_ne!(favorite_key("a.pdf", "x"), favorite_key("a.pdf", "y"));
    }
}
