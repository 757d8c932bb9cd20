//! Metadata normalization and search over a mixed archive of PDF documents,
//! JPEG images, MP3 audio and PowerPoint decks.

pub mod archive;
pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod models;
pub mod normalize;
pub mod search;
pub mod signals;
pub mod store;

pub use archive::{FileArchiveSystem, IndexReport};
pub use config::ArchiveConfig;
pub use error::{ArchiveError, Result};
pub use history::{SearchHistory, SearchLog};
pub use models::{FileKind, MetadataRecord, SearchResult};
pub use search::{SearchQuery, SortField, SortOrder};
pub use store::{RecordStore, SurrealStore};
