//! The archive facade: indexes files into a [`RecordStore`] and answers
//! searches over the stored corpus.

use crate::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};
use crate::extract::{degraded_record, extract_file, Extraction, SlideTable};
use crate::history::SearchLog;
use crate::models::{Favorite, FileKind, MetadataRecord, SearchResult, DEFAULT_USER};
use crate::search::{self, OperatorMatcher, ScoredRecord, SearchQuery, TextMatcher};
use crate::store::{RecordStore, SurrealStore};
use futures::stream::{self, StreamExt};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome counts of a directory scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexReport {
    pub indexed: usize,
    pub degraded: usize,
    pub skipped: usize,
}

impl IndexReport {
    pub fn total(&self) -> usize {
        self.indexed + self.degraded + self.skipped
    }
}

pub struct FileArchiveSystem {
    store: Arc<dyn RecordStore>,
    slides: Arc<SlideTable>,
    matcher: Arc<dyn TextMatcher>,
    config: ArchiveConfig,
}

impl FileArchiveSystem {
    pub fn new(store: impl RecordStore + 'static, config: ArchiveConfig) -> Self {
        Self {
            store: Arc::new(store),
            slides: Arc::new(SlideTable::default()),
            matcher: Arc::new(OperatorMatcher),
            config,
        }
    }

    /// Opens the on-disk store and the slide table named by `config`.
    pub async fn open(config: ArchiveConfig) -> Result<Self> {
        let store = SurrealStore::open(&config.db_path).await?;
        let slides = match &config.slide_table {
            Some(path) => SlideTable::load(path)?,
            None => SlideTable::default(),
        };
        Ok(Self::new(store, config).with_slide_table(slides))
    }

    pub fn with_slide_table(mut self, slides: SlideTable) -> Self {
        self.slides = Arc::new(slides);
        self
    }

    pub fn with_matcher(mut self, matcher: impl TextMatcher + 'static) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    /// Runs the extractor on the blocking pool. A panic, a failed join or
    /// the timeout all degrade the record.
    async fn extract(&self, path: PathBuf, kind: FileKind) -> Extraction {
        let slides = Arc::clone(&self.slides);
        let task_path = path.clone();
        let task = tokio::task::spawn_blocking(move || extract_file(&task_path, kind, &slides));

        let failure = match tokio::time::timeout(self.config.extract_timeout(), task).await {
            Ok(Ok(extraction)) => return extraction,
            Ok(Err(e)) => e.to_string(),
            Err(_) => ArchiveError::Timeout(self.config.extract_timeout_secs).to_string(),
        };
        warn!("Error extracting metadata from {}: {}", path.display(), failure);
        Extraction {
            record: degraded_record(&path, kind),
            degraded: true,
        }
    }

    pub async fn index_file(&self, path: PathBuf) -> Result<Extraction> {
        let metadata = fs::metadata(&path)?;
        let kind = FileKind::from_path(&path).filter(|_| metadata.is_file());

        debug!("Attempting to index: {}", path.display());

        let Some(kind) = kind else {
            debug!("Skipping unsupported file: {}", path.display());
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| String::from("unknown"));
            return Err(ArchiveError::UnsupportedFileType(extension));
        };

        let extraction = self.extract(path, kind).await;
        self.store.put(&extraction.record).await?;
        info!(
            degraded = extraction.degraded,
            "Indexed {} as {}",
            extraction.record.path,
            kind
        );
        Ok(extraction)
    }

    /// Walks `dir_path` and indexes every supported file. Extraction runs
    /// with bounded concurrency; records are stored in walk order.
    pub async fn index_directory(&self, dir_path: &Path) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        let mut candidates = Vec::new();

        for entry in WalkDir::new(dir_path).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            match FileKind::from_path(entry.path()) {
                Some(kind) => candidates.push((entry.into_path(), kind)),
                None => {
                    debug!("Skipping unsupported file: {}", entry.path().display());
                    report.skipped += 1;
                }
            }
        }

        let extractions: Vec<Extraction> = stream::iter(candidates)
            .map(|(path, kind)| self.extract(path, kind))
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        for extraction in extractions {
            self.store.put(&extraction.record).await?;
            if extraction.degraded {
                report.degraded += 1;
            } else {
                report.indexed += 1;
            }
        }

        info!(
            indexed = report.indexed,
            degraded = report.degraded,
            skipped = report.skipped,
            "Indexed {}",
            dir_path.display()
        );
        Ok(report)
    }

    pub async fn records(&self) -> Result<Vec<MetadataRecord>> {
        self.store.all().await
    }

    /// Evaluates `query` against every stored record. Searches with a term
    /// are reported to `log` when one is given.
    pub async fn search(
        &self,
        query: &SearchQuery,
        log: Option<&mut dyn SearchLog>,
    ) -> Result<Vec<SearchResult>> {
        let records = self.store.all().await?;
        debug!("Total records in store: {}", records.len());

        let results: Vec<SearchResult> = search::search(&records, query, self.matcher.as_ref())
            .iter()
            .map(ScoredRecord::to_result)
            .collect();

        if let (Some(log), Some(term)) = (log, query.term()) {
            log.record(term, results.len());
        }
        info!("Found {} results", results.len());
        Ok(results)
    }

    pub async fn add_favorite(&self, filename: &str, user_id: Option<&str>) -> Result<bool> {
        self.store
            .add_favorite(filename, user_id.unwrap_or(DEFAULT_USER))
            .await
    }

    pub async fn remove_favorite(&self, filename: &str, user_id: Option<&str>) -> Result<bool> {
        self.store
            .remove_favorite(filename, user_id.unwrap_or(DEFAULT_USER))
            .await
    }

    pub async fn favorites(&self, user_id: Option<&str>) -> Result<Vec<Favorite>> {
        self.store.favorites(user_id.unwrap_or(DEFAULT_USER)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::slides::SlideRow;
    use crate::extract::UNKNOWN_AUDIO_TITLE;
    use crate::history::SearchHistory;
    use crate::search::{FuzzyMatcher, SortField};
    use tempfile::TempDir;

    async fn setup_test_system() -> Result<FileArchiveSystem> {
        let store = SurrealStore::memory().await?;
        let slides = SlideTable::from_rows([SlideRow {
            digest: "DECK01".to_string(),
            title: "Coastal Erosion Study".to_string(),
            company: "USGS".to_string(),
            slide_count: 18,
            ..SlideRow::default()
        }]);
        Ok(FileArchiveSystem::new(store, ArchiveConfig::default()).with_slide_table(slides))
    }

    fn write_corpus(dir: &Path) -> std::io::Result<()> {
        let files: [(&str, &[u8]); 5] = [
            ("deck01.ppt", &[0u8; 2048]),
            ("photos/harbor.jpg", &[0xFF, 0xD8, 0xFF, 0xD9]),
            ("broken.pdf", b"Not a real PDF file"),
            ("music/broken.mp3", b"Not a real MP3 file"),
            ("notes.txt", b"Some content"),
        ];
        for (name, content) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_directory_indexing() -> Result<()> {
        let system = setup_test_system().await?;
        let test_dir = TempDir::new()?;
        write_corpus(test_dir.path())?;

        let report = system.index_directory(test_dir.path()).await?;
        assert_eq!(
            report,
            IndexReport {
                indexed: 2,
                degraded: 2,
                skipped: 1,
            }
        );
        assert_eq!(report.total(), 5);

        let records = system.records().await?;
        assert_eq!(records.len(), 4);
        let audio = records
            .iter()
            .find(|r| r.file_kind() == FileKind::Audio)
            .unwrap();
        assert_eq!(audio.title.as_deref(), Some(UNKNOWN_AUDIO_TITLE));
        assert_eq!(audio.file_size_bytes, 19);
        Ok(())
    }

    #[tokio::test]
    async fn test_reindexing_replaces_records() -> Result<()> {
        let system = setup_test_system().await?;
        let test_dir = TempDir::new()?;
        write_corpus(test_dir.path())?;

        system.index_directory(test_dir.path()).await?;
        system.index_directory(test_dir.path()).await?;
        assert_eq!(system.records().await?.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_unsupported_file_types() -> Result<()> {
        let system = setup_test_system().await?;
        let test_dir = TempDir::new()?;
        let test_file = test_dir.path().join("test.xyz");
        fs::write(&test_file, "Some content")?;

        let result = system.index_file(test_file).await;
        assert!(matches!(result, Err(ArchiveError::UnsupportedFileType(_))));

        let missing = system.index_file(test_dir.path().join("missing.pdf")).await;
        assert!(matches!(missing, Err(ArchiveError::Io(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_pdf_handling() -> Result<()> {
        let system = setup_test_system().await?;
        let test_dir = TempDir::new()?;
        let pdf_path = test_dir.path().join("test.pdf");
        fs::write(&pdf_path, b"Not a real PDF file")?;

        let extraction = system.index_file(pdf_path).await?;
        assert!(extraction.degraded);
        assert_eq!(extraction.record.filename, "test.pdf");
        assert_eq!(extraction.record.file_kind(), FileKind::Document);
        assert!(extraction.record.keywords.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_search_and_history() -> Result<()> {
        let system = setup_test_system().await?;
        let test_dir = TempDir::new()?;
        write_corpus(test_dir.path())?;
        system.index_directory(test_dir.path()).await?;

        let mut history = SearchHistory::default();
        let query = SearchQuery::builder().term("erosion").build();
        let results = system.search(&query, Some(&mut history)).await?;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.filename, "deck01.ppt");
        assert!(results[0].score >= 10);

        let query = SearchQuery::builder().sort_field(SortField::Size).build();
        let all = system.search(&query, Some(&mut history)).await?;
        let sizes: Vec<u64> = all.iter().map(|r| r.record.file_size_bytes).collect();
        assert_eq!(sizes, [4, 19, 19, 2048]);

        // only searches with a term are logged
        assert_eq!(history.len(), 1);
        assert_eq!(history.entries().next().unwrap().term, "erosion");
        Ok(())
    }

    #[tokio::test]
    async fn test_fuzzy_matcher() -> Result<()> {
        let system = setup_test_system().await?.with_matcher(FuzzyMatcher::default());
        let test_dir = TempDir::new()?;
        write_corpus(test_dir.path())?;
        system.index_directory(test_dir.path()).await?;

        let query = SearchQuery::builder().term("erosian").build();
        let results = system.search(&query, None).await?;
        assert_eq!(results.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_favorites() -> Result<()> {
        let system = setup_test_system().await?;
        assert!(system.add_favorite("deck01.ppt", None).await?);
        assert!(!system.add_favorite("deck01.ppt", Some(DEFAULT_USER)).await?);
        assert!(system.add_favorite("deck01.ppt", Some("alice")).await?);

        let favorites = system.favorites(None).await?;
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].user_id, DEFAULT_USER);

        assert!(system.remove_favorite("deck01.ppt", None).await?);
        assert!(system.favorites(None).await?.is_empty());
        Ok(())
    }
}
