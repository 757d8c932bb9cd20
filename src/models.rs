use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The four source formats the archive understands.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Document,
    Image,
    Audio,
    Slides,
}

impl FileKind {
    /// Label shown to users and matched by free-text search.
    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Document => "PDF",
            FileKind::Image => "JPG",
            FileKind::Audio => "MP3",
            FileKind::Slides => "PPT",
        }
    }

    /// Detects the kind from the path's extension via its guessed mime type.
    pub fn from_path(path: &Path) -> Option<FileKind> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        if matches!(extension.as_deref(), Some("ppt") | Some("pptx")) {
            return Some(FileKind::Slides);
        }

        let mime = mime_guess::from_path(path).first()?;
        match mime.essence_str() {
            "application/pdf" => Some(FileKind::Document),
            "image/jpeg" => Some(FileKind::Image),
            "audio/mpeg" | "audio/mp3" => Some(FileKind::Audio),
            "application/vnd.ms-powerpoint"
            | "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                Some(FileKind::Slides)
            }
            _ => None,
        }
    }

    /// Parses the web layer's `fileType` values. `all` and unknown values yield `None`.
    pub fn parse(value: &str) -> Option<FileKind> {
        match value.trim().to_lowercase().as_str() {
            "pdf" | "document" => Some(FileKind::Document),
            "jpg" | "jpeg" | "image" => Some(FileKind::Image),
            "mp3" | "audio" => Some(FileKind::Audio),
            "ppt" | "pptx" | "slides" => Some(FileKind::Slides),
            _ => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    Swedish,
    English,
    Mixed,
    #[default]
    Unknown,
}

impl Language {
    pub fn label(&self) -> &'static str {
        match self {
            Language::Swedish => "swedish",
            Language::English => "english",
            Language::Mixed => "mixed",
            Language::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    Report,
    Article,
    Legal,
    Government,
    News,
    Technical,
    Financial,
    Medical,
    #[default]
    Unknown,
}

impl Category {
    /// Classification order. On equal scores the category listed last wins.
    pub const EVALUATION_ORDER: [Category; 8] = [
        Category::Report,
        Category::Article,
        Category::Legal,
        Category::Government,
        Category::News,
        Category::Technical,
        Category::Financial,
        Category::Medical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Report => "report",
            Category::Article => "article",
            Category::Legal => "legal",
            Category::Government => "government",
            Category::News => "news",
            Category::Technical => "technical",
            Category::Financial => "financial",
            Category::Medical => "medical",
            Category::Unknown => "unknown",
        }
    }
}

/// A validated WGS84 coordinate in decimal degrees.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Returns `None` unless both components are finite and in range.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(GeoPoint {
            latitude,
            longitude,
        })
    }
}

/// Attributes that only exist for one file kind.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind")]
pub enum KindDetails {
    Document {
        page_count: Option<u32>,
        format_version: Option<String>,
    },
    Image {
        dimensions: Option<String>,
        camera: Option<String>,
        orientation: Option<u32>,
        coordinate: Option<GeoPoint>,
    },
    Audio {
        duration_secs: Option<u64>,
        album: Option<String>,
        artist: Option<String>,
        genre: Option<String>,
        year: Option<u32>,
    },
    Slides {
        slide_count: Option<u32>,
        word_count: Option<u32>,
        company: Option<String>,
        revision: Option<String>,
    },
}

impl KindDetails {
    /// Details for `kind` with every attribute unset.
    pub fn empty(kind: FileKind) -> Self {
        match kind {
            FileKind::Document => KindDetails::Document {
                page_count: None,
                format_version: None,
            },
            FileKind::Image => KindDetails::Image {
                dimensions: None,
                camera: None,
                orientation: None,
                coordinate: None,
            },
            FileKind::Audio => KindDetails::Audio {
                duration_secs: None,
                album: None,
                artist: None,
                genre: None,
                year: None,
            },
            FileKind::Slides => KindDetails::Slides {
                slide_count: None,
                word_count: None,
                company: None,
                revision: None,
            },
        }
    }

    pub fn kind(&self) -> FileKind {
        match self {
            KindDetails::Document { .. } => FileKind::Document,
            KindDetails::Image { .. } => FileKind::Image,
            KindDetails::Audio { .. } => FileKind::Audio,
            KindDetails::Slides { .. } => FileKind::Slides,
        }
    }

    /// Populated free-text attributes, in a fixed order.
    pub fn text_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        match self {
            KindDetails::Document { format_version, .. } => {
                fields.extend(format_version.iter().map(|v| format!("PDF {v}")));
            }
            KindDetails::Image {
                dimensions, camera, ..
            } => {
                fields.extend(camera.iter().cloned());
                fields.extend(dimensions.iter().cloned());
            }
            KindDetails::Audio {
                album,
                artist,
                genre,
                year,
                ..
            } => {
                fields.extend(artist.iter().cloned());
                fields.extend(album.iter().cloned());
                fields.extend(genre.iter().cloned());
                fields.extend(year.iter().map(|y| y.to_string()));
            }
            KindDetails::Slides {
                company, revision, ..
            } => {
                fields.extend(company.iter().cloned());
                fields.extend(revision.iter().map(|r| format!("revision {r}")));
            }
        }
        fields
    }
}

/// The format-agnostic record produced by extraction and consumed by search.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MetadataRecord {
    pub filename: String,
    pub path: String,
    pub file_size_bytes: u64,
    pub mime_type: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub keywords: Vec<String>,
    pub language: Language,
    pub category: Category,
    pub details: KindDetails,
    pub raw_text: Option<String>,
}

impl MetadataRecord {
    /// A record carrying only the identity fields, used when extraction fails.
    pub fn minimal(filename: &str, path: &str, kind: FileKind, file_size_bytes: u64) -> Self {
        MetadataRecord {
            filename: filename.to_string(),
            path: path.to_string(),
            file_size_bytes,
            mime_type: None,
            title: None,
            author: None,
            created_at: None,
            modified_at: None,
            keywords: Vec::new(),
            language: Language::Unknown,
            category: Category::Unknown,
            details: KindDetails::empty(kind),
            raw_text: None,
        }
    }

    pub fn file_kind(&self) -> FileKind {
        self.details.kind()
    }

    pub fn coordinate(&self) -> Option<GeoPoint> {
        match &self.details {
            KindDetails::Image { coordinate, .. } => *coordinate,
            _ => None,
        }
    }

    /// File size in whole kilobytes, rounded to nearest.
    pub fn size_kb(&self) -> u64 {
        (self.file_size_bytes as f64 / 1024.0).round() as u64
    }

    pub fn keyword_string(&self) -> String {
        self.keywords.join(", ")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SearchResult {
    pub record: MetadataRecord,
    pub score: u32,
}

pub const DEFAULT_USER: &str = "default";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Favorite {
    pub filename: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Formats a byte count as `"1.5 MB"` from one megabyte up, otherwise as whole kilobytes.
pub fn format_file_size(bytes: u64) -> String {
    let megabytes = (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
    if megabytes >= 1.0 {
        format!("{} MB", megabytes)
    } else {
        format!("{} KB", (bytes as f64 / 1024.0).round() as u64)
    }
}
