use super::{date_from_filename, file_size, Extracted};
use crate::error::{ArchiveError, Result};
use crate::models::{FileKind, KindDetails};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lopdf::{Dictionary, Document, Object};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

const MAX_TITLE_CHARS: usize = 100;
const MIN_TITLE_CHARS: usize = 10;
const AUTHOR_SCAN_LINES: usize = 10;

/// Embedded document information dictionary.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: Option<u32>,
    pub version: Option<String>,
}

pub fn extract_document(path: &Path) -> Result<Extracted> {
    let size = file_size(path)?;
    let bytes = fs::read(path)?;

    let info = read_document_info(&bytes)?;
    let text = extract_text(&bytes).unwrap_or_else(|e| {
        debug!("No text layer in {}: {}", path.display(), e);
        String::new()
    });

    let mut extracted = Extracted::new(path, FileKind::Document, size);
    extracted.title = non_empty(info.title.as_deref()).or_else(|| title_from_text(&text));
    extracted.author = author_from_text(&text, info.author.as_deref());
    extracted.created_at = info
        .creation_date
        .as_deref()
        .and_then(parse_pdf_date)
        .or_else(|| date_from_filename(&extracted.filename));
    extracted.modified_at = info.modification_date.as_deref().and_then(parse_pdf_date);
    extracted.details = KindDetails::Document {
        page_count: info.page_count,
        format_version: info.version,
    };
    extracted.text = Some(text);
    Ok(extracted)
}

pub fn read_document_info(bytes: &[u8]) -> Result<DocumentInfo> {
    let document =
        Document::load_mem(bytes).map_err(|e| ArchiveError::PdfExtraction(e.to_string()))?;

    let mut info = DocumentInfo {
        page_count: Some(document.get_pages().len() as u32),
        version: non_empty(Some(document.version.as_str())),
        ..DocumentInfo::default()
    };

    if let Some(dict) = info_dictionary(&document) {
        info.title = dictionary_string(&document, dict, b"Title");
        info.author = dictionary_string(&document, dict, b"Author");
        info.creation_date = dictionary_string(&document, dict, b"CreationDate");
        info.modification_date = dictionary_string(&document, dict, b"ModDate");
    }
    Ok(info)
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let object = document.trailer.get(b"Info").ok()?;
    let object = match object {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    object.as_dict().ok()
}

fn dictionary_string(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    let object = match dict.get(key).ok()? {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    match object {
        Object::String(bytes, _) => non_empty(Some(decode_pdf_string(bytes).as_str())),
        _ => None,
    }
}

/// Decodes a PDF text string: UTF-16BE with a byte order mark, otherwise
/// one byte per character.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|b| *b as char).collect()
}

fn extract_text(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed content streams.
    panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes)))
        .map_err(|_| ArchiveError::PdfExtraction("text extraction panicked".to_string()))?
        .map_err(|e| ArchiveError::PdfExtraction(e.to_string()))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Keeps word characters, whitespace and hyphens, then truncates.
fn clean_title(raw: &str) -> String {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_TITLE_CHARS).collect()
}

/// Title from the first non-blank line, or from the first sentence when that
/// line is too short to be meaningful.
pub fn title_from_text(text: &str) -> Option<String> {
    let first_line = text.lines().find(|line| !line.trim().is_empty())?;
    let title = clean_title(first_line);
    if title.chars().count() >= MIN_TITLE_CHARS {
        return Some(title);
    }

    let first_sentence = text.split('.').next().unwrap_or_default();
    let title = clean_title(first_sentence);
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

static AUTHOR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    const NAME: &str = r"([A-Z][a-z]+\s+[A-Z][a-z]+)";
    [
        format!(r"\b(?i:by)\s+{NAME}"),
        format!(r"\b(?i:author):\s*{NAME}"),
        format!(r"\b(?i:written\s+by)\s+{NAME}"),
        format!(r"\b(?i:prepared\s+by)\s+{NAME}"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static author pattern"))
    .collect()
});

/// The embedded author if present, otherwise a two-word capitalised name
/// following "by", "Author:", "written by" or "prepared by" in the first lines.
pub fn author_from_text(text: &str, embedded: Option<&str>) -> Option<String> {
    if let Some(author) = non_empty(embedded) {
        return Some(author);
    }

    for line in text.lines().take(AUTHOR_SCAN_LINES) {
        let line = line.trim();
        for pattern in AUTHOR_PATTERNS.iter() {
            if let Some(name) = pattern.captures(line).and_then(|c| c.get(1)) {
                return Some(name.as_str().trim().to_string());
            }
        }
    }
    None
}

/// Parses `D:YYYYMMDDHHmmSSOHH'mm'`. Every component after the year is
/// optional; anything unparseable yields `None`.
pub fn parse_pdf_date(value: &str) -> Option<DateTime<Utc>> {
    let cleaned: String = value
        .trim()
        .trim_start_matches("D:")
        .chars()
        .filter(|c| *c != '\'')
        .collect();

    let digits: String = cleaned.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let zone = &cleaned[digits.len()..];

    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match digits.get(range) {
            Some(s) if !s.is_empty() => s.parse().ok(),
            _ => Some(default),
        }
    };
    let year: i32 = digits[0..4].parse().ok()?;
    let month = field(4..6, 1)?;
    let day = field(6..8, 1)?;
    let hour = field(8..10, 0)?;
    let minute = field(10..12, 0)?;
    let second = field(12..14, 0)?;

    let naive: NaiveDateTime =
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    let offset = match zone.chars().next() {
        None | Some('Z') => FixedOffset::east_opt(0)?,
        Some(sign @ ('+' | '-')) => {
            let rest = &zone[1..];
            let hours: i32 = rest.get(0..2)?.parse().ok()?;
            let minutes: i32 = rest.get(2..4).map_or(Some(0), |m| m.parse().ok())?;
            let seconds = hours * 3600 + minutes * 60;
            FixedOffset::east_opt(if sign == '-' { -seconds } else { seconds })?
        }
        Some(_) => return None,
    };

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
