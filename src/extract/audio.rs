use super::{date_from_filename, file_size, Extracted};
use crate::error::{ArchiveError, Result};
use crate::models::{FileKind, KindDetails};
use chrono::NaiveDate;
use lofty::prelude::*;
use lofty::tag::Tag;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AudioTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u32>,
}

impl AudioTags {
    pub fn from_tag(tag: &Tag) -> Self {
        AudioTags {
            title: clean(tag.title().as_deref()),
            artist: clean(tag.artist().as_deref()),
            album: clean(tag.album().as_deref()),
            genre: tag.genre().as_deref().and_then(first_genre),
            year: tag.year().filter(|y| *y > 0),
        }
    }
}

pub fn extract_audio(path: &Path) -> Result<Extracted> {
    let size = file_size(path)?;
    let tagged_file =
        lofty::read_from_path(path).map_err(|e| ArchiveError::AudioMetadata(e.to_string()))?;

    let duration = tagged_file.properties().duration();
    let tags = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .map(AudioTags::from_tag)
        .unwrap_or_default();

    let mut extracted = Extracted::new(path, FileKind::Audio, size);
    extracted.title = tags.title.clone();
    extracted.author = tags.artist.clone();
    extracted.created_at = tags
        .year
        .and_then(|year| NaiveDate::from_ymd_opt(year as i32, 1, 1))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .or_else(|| date_from_filename(&extracted.filename));
    extracted.details = KindDetails::Audio {
        duration_secs: duration_seconds(duration),
        album: tags.album,
        artist: tags.artist,
        genre: tags.genre,
        year: tags.year,
    };
    Ok(extracted)
}

/// Whole seconds, rounded. A zero duration means the stream had no frames.
pub fn duration_seconds(duration: Duration) -> Option<u64> {
    if duration.is_zero() {
        return None;
    }
    Some(duration.as_secs_f64().round() as u64)
}

/// First entry of a multi-valued genre field.
pub fn first_genre(raw: &str) -> Option<String> {
    raw.split(['\0', ';', '/'])
        .map(str::trim)
        .find(|g| !g.is_empty())
        .map(str::to_string)
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim_matches(|c: char| c.is_whitespace() || c == '\0'))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
