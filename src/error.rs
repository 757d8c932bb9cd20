use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),
    #[error("Image metadata error: {0}")]
    ImageMetadata(String),
    #[error("Audio metadata error: {0}")]
    AudioMetadata(String),
    #[error("Slide table error: {0}")]
    SlideTable(String),
    #[error("Extraction timed out after {0} seconds")]
    Timeout(u64),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
