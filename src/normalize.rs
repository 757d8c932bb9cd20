use crate::extract::Extracted;
use crate::models::{FileKind, MetadataRecord};
use crate::signals::derive_signals;

/// Text the signals are derived from: the full text for documents, otherwise
/// the populated descriptive fields joined together.
pub fn signal_text(extracted: &Extracted) -> String {
    if let Some(text) = full_text(extracted) {
        return text.to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    parts.extend(extracted.title.iter().cloned());
    parts.extend(extracted.author.iter().cloned());
    for field in extracted.details.text_fields() {
        if !parts.contains(&field) {
            parts.push(field);
        }
    }
    parts.join(" ")
}

fn full_text(extracted: &Extracted) -> Option<&str> {
    match extracted.details.kind() {
        FileKind::Document => extracted.text.as_deref().filter(|t| !t.trim().is_empty()),
        _ => None,
    }
}

/// Projects extractor output onto the canonical record.
pub fn normalize(extracted: Extracted) -> MetadataRecord {
    let text = signal_text(&extracted);
    // Synthesized text already starts with the title.
    let title = match full_text(&extracted) {
        Some(_) => extracted.title.as_deref().unwrap_or_default(),
        None => "",
    };
    let signals = derive_signals(title, &text);

    let raw_text = match extracted.details.kind() {
        FileKind::Document => extracted.text.filter(|t| !t.trim().is_empty()),
        _ => None,
    };

    MetadataRecord {
        filename: extracted.filename,
        path: extracted.path,
        file_size_bytes: extracted.file_size_bytes,
        mime_type: extracted.mime_type,
        title: extracted.title,
        author: extracted.author,
        created_at: extracted.created_at,
        modified_at: extracted.modified_at,
        keywords: signals.keywords,
        language: signals.language,
        category: signals.category,
        details: extracted.details,
        raw_text,
    }
}
