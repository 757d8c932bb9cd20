use super::{date_from_filename, file_size, parse_loose_datetime, Extracted};
use crate::error::{ArchiveError, Result};
use crate::models::{FileKind, GeoPoint, KindDetails};
use chrono::{DateTime, Utc};
use exif::{Exif, In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Capture metadata embedded in an image.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImageMetadata {
    pub description: Option<String>,
    pub artist: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub orientation: Option<u32>,
    pub dimensions: Option<(u32, u32)>,
    pub coordinate: Option<GeoPoint>,
}

impl ImageMetadata {
    /// `"{make} {model}"`, only when both are known.
    pub fn camera(&self) -> Option<String> {
        match (&self.make, &self.model) {
            (Some(make), Some(model)) => Some(format!("{make} {model}")),
            _ => None,
        }
    }

    pub fn dimensions_label(&self) -> Option<String> {
        self.dimensions
            .map(|(width, height)| format!("{width} x {height}"))
    }
}

pub fn extract_image(path: &Path) -> Result<Extracted> {
    let size = file_size(path)?;
    let file = File::open(path)?;
    let metadata = read_image_metadata(&mut BufReader::new(file))?;

    let mut extracted = Extracted::new(path, FileKind::Image, size);
    extracted.title = metadata.description.clone();
    extracted.author = metadata.artist.clone();
    extracted.created_at = metadata
        .captured_at
        .or_else(|| date_from_filename(&extracted.filename));
    extracted.details = KindDetails::Image {
        dimensions: metadata.dimensions_label(),
        camera: metadata.camera(),
        orientation: metadata.orientation,
        coordinate: metadata.coordinate,
    };
    Ok(extracted)
}

/// Reads EXIF from an image container. An image without an EXIF block yields
/// empty metadata; an unreadable container is an error.
pub fn read_image_metadata<R: std::io::BufRead + std::io::Seek>(
    reader: &mut R,
) -> Result<ImageMetadata> {
    let mut exif_reader = exif::Reader::new();
    exif_reader.continue_on_error(true);

    let exif = match exif_reader
        .read_from_container(reader)
        .or_else(|e| e.distill_partial_result(|errors| {
            debug!("Ignoring {} malformed EXIF fields", errors.len());
        })) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Ok(ImageMetadata::default()),
        Err(e) => return Err(ArchiveError::ImageMetadata(e.to_string())),
    };

    Ok(ImageMetadata {
        description: string_field(&exif, Tag::ImageDescription),
        artist: string_field(&exif, Tag::Artist),
        captured_at: captured_at(&exif),
        make: string_field(&exif, Tag::Make),
        model: string_field(&exif, Tag::Model),
        orientation: uint_field(&exif, Tag::Orientation),
        dimensions: dimensions(&exif),
        coordinate: coordinate(&exif),
    })
}

fn captured_at(exif: &Exif) -> Option<DateTime<Utc>> {
    [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
        .iter()
        .filter_map(|tag| exif.get_field(*tag, In::PRIMARY))
        .find_map(|field| match &field.value {
            Value::Ascii(parts) => parts
                .first()
                .and_then(|raw| std::str::from_utf8(raw).ok())
                .and_then(parse_loose_datetime),
            _ => None,
        })
}

/// Both latitude and longitude must be present and in range.
fn coordinate(exif: &Exif) -> Option<GeoPoint> {
    let latitude = gps_component(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
    let longitude = gps_component(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
    GeoPoint::new(latitude, longitude)
}

fn gps_component(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let rationals = match &field.value {
        Value::Rational(r) if r.len() >= 3 => r,
        _ => return None,
    };
    let decimal = dms_to_decimal(
        rationals[0].to_f64(),
        rationals[1].to_f64(),
        rationals[2].to_f64(),
    );

    let reference = string_field(exif, ref_tag).unwrap_or_default();
    Some(apply_reference(decimal, &reference))
}

pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// South and west references negate the value.
pub fn apply_reference(decimal: f64, reference: &str) -> f64 {
    match reference.trim() {
        "S" | "W" => -decimal,
        _ => decimal,
    }
}

fn dimensions(exif: &Exif) -> Option<(u32, u32)> {
    let width =
        uint_field(exif, Tag::PixelXDimension).or_else(|| uint_field(exif, Tag::ImageWidth))?;
    let height =
        uint_field(exif, Tag::PixelYDimension).or_else(|| uint_field(exif, Tag::ImageLength))?;
    Some((width, height))
}

fn string_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let value = match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .filter_map(|raw| std::str::from_utf8(raw).ok())
            .collect::<Vec<_>>()
            .join(" "),
        _ => field.display_value().to_string(),
    };
    let value = value.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn uint_field(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}
