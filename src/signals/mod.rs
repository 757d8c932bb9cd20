//! Text heuristics shared by every file kind: keywords, language and category.
//!
//! All three are pure functions of their input text, so re-deriving them from
//! the same text always gives the same result.

pub mod category;
pub mod keywords;
pub mod language;

pub use category::classify_category;
pub use keywords::extract_keywords;
pub use language::detect_language;

use crate::models::{Category, Language};

#[derive(Debug, Clone, PartialEq)]
pub struct TextSignals {
    pub keywords: Vec<String>,
    pub language: Language,
    pub category: Category,
}

pub fn derive_signals(title: &str, text: &str) -> TextSignals {
    TextSignals {
        keywords: extract_keywords(text),
        language: detect_language(text),
        category: classify_category(title, text),
    }
}
