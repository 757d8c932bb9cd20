//! Per-format metadata extraction.
//!
//! Every extractor turns one file into an [`Extracted`] value; [`extract_file`]
//! wraps them so that a bad file degrades to a minimal record instead of
//! failing the scan.

pub mod audio;
pub mod document;
pub mod image;
pub mod slides;

use crate::error::{ArchiveError, Result};
use crate::models::{FileKind, KindDetails, MetadataRecord};
use crate::normalize::normalize;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub use slides::SlideTable;

/// Title given to audio files whose tags could not be read.
pub const UNKNOWN_AUDIO_TITLE: &str = "Unknown Title";

/// Raw output of a format extractor, before text signals are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub filename: String,
    pub path: String,
    pub file_size_bytes: u64,
    pub mime_type: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Full text, only available for documents.
    pub text: Option<String>,
    pub details: KindDetails,
}

impl Extracted {
    pub fn new(path: &Path, kind: FileKind, file_size_bytes: u64) -> Self {
        Extracted {
            filename: file_name(path),
            path: path.to_string_lossy().to_string(),
            file_size_bytes,
            mime_type: mime_guess::from_path(path).first().map(|m| m.to_string()),
            title: None,
            author: None,
            created_at: None,
            modified_at: None,
            text: None,
            details: KindDetails::empty(kind),
        }
    }
}

/// Result of extracting one file. `degraded` is set when the extractor failed
/// and the record only carries identity fields.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: MetadataRecord,
    pub degraded: bool,
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Extracts and normalizes one file. Never fails.
pub fn extract_file(path: &Path, kind: FileKind, slides: &SlideTable) -> Extraction {
    let outcome = match kind {
        FileKind::Document => document::extract_document(path),
        FileKind::Image => image::extract_image(path),
        FileKind::Audio => audio::extract_audio(path),
        FileKind::Slides => slides::extract_slides(path, slides),
    };

    match outcome {
        Ok(extracted) => {
            debug!("Extracted {} metadata from {}", kind, path.display());
            Extraction {
                record: normalize(extracted),
                degraded: false,
            }
        }
        Err(e) => {
            warn!("Error extracting metadata from {}: {}", path.display(), e);
            Extraction {
                record: degraded_record(path, kind),
                degraded: true,
            }
        }
    }
}

/// Minimal record for a file whose extractor failed.
pub fn degraded_record(path: &Path, kind: FileKind) -> MetadataRecord {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let mut record = MetadataRecord::minimal(
        &file_name(path),
        &path.to_string_lossy(),
        kind,
        size,
    );
    if kind == FileKind::Audio {
        record.title = Some(UNKNOWN_AUDIO_TITLE.to_string());
    }
    record
}

pub(crate) fn file_size(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(ArchiveError::UnsupportedFileType(format!(
            "not a regular file: {}",
            path.display()
        )));
    }
    Ok(metadata.len())
}

static FILENAME_DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\d{4})-(\d{2})-(\d{2})",
        r"(\d{4})(\d{2})(\d{2})",
        r"(\d{2})-(\d{2})-(\d{4})",
        r"(\d{2})(\d{2})(\d{4})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static date pattern"))
    .collect()
});

/// Finds a `YYYY-MM-DD`, `YYYYMMDD`, `MM-DD-YYYY` or `MMDDYYYY` date in a
/// filename. Patterns are tried in that order; a match that is not a real
/// calendar date moves on to the next pattern.
pub fn date_from_filename(filename: &str) -> Option<DateTime<Utc>> {
    for pattern in FILENAME_DATE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(filename) else {
            continue;
        };
        let parts: Vec<u32> = (1..=3)
            .filter_map(|i| caps.get(i)?.as_str().parse().ok())
            .collect();
        if parts.len() != 3 {
            continue;
        }

        let year_first = caps.get(1).map_or(0, |m| m.as_str().len()) == 4;
        let (year, month, day) = if year_first {
            (parts[0], parts[1], parts[2])
        } else {
            (parts[2], parts[0], parts[1])
        };

        if let Some(date) = NaiveDate::from_ymd_opt(year as i32, month, day) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Parses the loose timestamp formats found in side tables and tags.
pub fn parse_loose_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y:%m:%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}
