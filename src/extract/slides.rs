//! Slide decks are not parsed directly. Their metadata comes from an external
//! table keyed by content digest, joined on the digest encoded in the filename.

use super::{date_from_filename, file_name, parse_loose_datetime, Extracted};
use crate::error::{ArchiveError, Result};
use crate::models::{FileKind, KindDetails};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const PLACEHOLDER_COMPANY: &str = "Unknown Company";
const PLACEHOLDER_TITLE: &str = "Unknown Title";

const FONT_NAMES: &[&str] = &[
    "arial",
    "arial black",
    "calibri",
    "cambria",
    "century gothic",
    "comic sans ms",
    "courier",
    "courier new",
    "garamond",
    "georgia",
    "helvetica",
    "impact",
    "tahoma",
    "times",
    "times new roman",
    "trebuchet ms",
    "verdana",
    "wingdings",
];

/// One row of the slide-deck metadata export.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideRow {
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub revision_number: String,
    #[serde(default, deserialize_with = "loose_u64")]
    pub slide_count: u64,
    #[serde(default, deserialize_with = "loose_u64")]
    pub word_count: u64,
    #[serde(default, deserialize_with = "loose_u64")]
    pub file_size: u64,
    #[serde(default)]
    pub urlkey: String,
    #[serde(default)]
    pub mimetype: String,
}

fn loose_u64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn loose_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Slide-deck metadata keyed by upper-cased digest.
#[derive(Debug, Default, Clone)]
pub struct SlideTable {
    rows: HashMap<String, SlideRow>,
}

impl SlideTable {
    pub fn from_rows(rows: impl IntoIterator<Item = SlideRow>) -> Self {
        let rows = rows
            .into_iter()
            .filter(|row| !row.digest.trim().is_empty())
            .map(|row| (row.digest.trim().to_uppercase(), row))
            .collect();
        SlideTable { rows }
    }

    /// Loads either the JSON array export or the tab-separated export,
    /// chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let table = if is_json {
            let rows: Vec<SlideRow> = serde_json::from_slice(&bytes)?;
            Self::from_rows(rows)
        } else {
            Self::from_tsv(&bytes)?
        };
        info!("Loaded {} slide rows from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parses the latin-1, tab-separated export. NUL bytes are stripped from
    /// every cell.
    pub fn from_tsv(bytes: &[u8]) -> Result<Self> {
        let content: String = bytes.iter().map(|b| *b as char).collect();
        let mut lines = content.lines();

        let headers: Vec<String> = lines
            .next()
            .ok_or_else(|| ArchiveError::SlideTable("empty table".to_string()))?
            .split('\t')
            .map(clean_cell)
            .collect();
        if !headers.iter().any(|h| h == "digest") {
            return Err(ArchiveError::SlideTable("missing digest column".to_string()));
        }

        let mut rows = Vec::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let cells: HashMap<&str, String> = headers
                .iter()
                .map(String::as_str)
                .zip(line.split('\t').map(clean_cell))
                .collect();
            let cell = |name: &str| cells.get(name).cloned().unwrap_or_default();
            let number = |name: &str| cell(name).parse::<u64>().unwrap_or(0);

            rows.push(SlideRow {
                digest: cell("digest"),
                title: cell("title"),
                company: cell("company"),
                creation_date: cell("creation_date"),
                last_modified: cell("last_modified"),
                revision_number: cell("revision_number"),
                slide_count: number("slide_count"),
                word_count: number("word_count"),
                file_size: number("file_size"),
                urlkey: cell("urlkey"),
                mimetype: cell("mimetype"),
            });
        }
        Ok(Self::from_rows(rows))
    }

    pub fn get(&self, digest: &str) -> Option<&SlideRow> {
        self.rows.get(&digest.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn clean_cell(cell: &str) -> String {
    cell.replace('\0', "").trim().to_string()
}

/// Lookup key for a deck: its filename stem, upper-cased.
pub fn digest_key(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

static SLIDE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^slide\s*\d+$").expect("static slide pattern"));

/// Titles that carry no information: missing, very short, numeric,
/// "Slide N", a bare font name, or the export's placeholder.
pub fn is_degenerate_title(title: Option<&str>) -> bool {
    let Some(title) = title.map(str::trim) else {
        return true;
    };
    title.chars().count() < 3
        || title.chars().all(|c| c.is_ascii_digit())
        || SLIDE_NUMBER.is_match(title)
        || FONT_NAMES.contains(&title.to_lowercase().as_str())
        || title.eq_ignore_ascii_case(PLACEHOLDER_TITLE)
}

/// Title for a deck whose own title is degenerate.
pub fn synthesize_title(company: Option<&str>, slide_count: Option<u32>, filename: &str) -> String {
    if let (Some(company), Some(count)) = (company, slide_count.filter(|c| *c > 0)) {
        return format!("{company} presentation ({count} slides)");
    }
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    stem.replace(['_', '-'], " ").trim().to_string()
}

fn present(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn extract_slides(path: &Path, table: &SlideTable) -> Result<Extracted> {
    let filename = file_name(path);
    let row = table.get(&digest_key(&filename));
    if row.is_none() {
        debug!("No slide metadata row for {}", filename);
    }

    let disk_size = fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len());
    let size = match (disk_size, row) {
        (Some(size), _) => size,
        (None, Some(row)) => row.file_size,
        (None, None) => {
            return Err(ArchiveError::SlideTable(format!(
                "{} is neither on disk nor in the slide table",
                path.display()
            )))
        }
    };

    let mut extracted = Extracted::new(path, FileKind::Slides, size);
    let company = row
        .and_then(|r| present(&r.company))
        .filter(|c| c != PLACEHOLDER_COMPANY);
    let slide_count = row
        .map(|r| r.slide_count)
        .filter(|c| *c > 0)
        .map(|c| c.min(u32::MAX as u64) as u32);
    let word_count = row
        .map(|r| r.word_count)
        .filter(|c| *c > 0)
        .map(|c| c.min(u32::MAX as u64) as u32);

    let title = row.and_then(|r| present(&r.title));
    extracted.title = Some(if is_degenerate_title(title.as_deref()) {
        synthesize_title(company.as_deref(), slide_count, &filename)
    } else {
        title.unwrap_or_default()
    });
    extracted.created_at = row
        .and_then(|r| parse_loose_datetime(&r.creation_date))
        .or_else(|| date_from_filename(&filename));
    extracted.modified_at = row.and_then(|r| parse_loose_datetime(&r.last_modified));
    if let Some(mime) = row.and_then(|r| present(&r.mimetype)) {
        extracted.mime_type = Some(mime);
    }
    extracted.details = KindDetails::Slides {
        slide_count,
        word_count,
        company,
        revision: row.and_then(|r| present(&r.revision_number)),
    };
    Ok(extracted)
}
