use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

pub const MAX_KEYWORDS: usize = 8;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Swedish
        "och", "att", "det", "som", "för", "med", "den", "har", "inte", "till", "var", "ett",
        "jag", "han", "hon", "men", "sig", "vid", "kan", "vara", "från", "när", "där", "alla",
        "man", "eller", "efter", "mot", "under", "över", "också", "hade", "blev", "skulle",
        "detta", "denna", "dessa", "deras", "sina", "sitt", "sin", "hur", "vad", "vem", "vilka",
        "vilken", "vilket", "mellan", "genom", "utan", "även", "bara", "mycket", "nu", "dem",
        "oss", "dig", "mig", "ska", "får", "kommer", "andra", "samt", "enligt", "sedan", "inom",
        // English
        "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her",
        "was", "one", "our", "out", "has", "have", "him", "his", "how", "its", "may", "new",
        "now", "old", "see", "two", "who", "did", "get", "she", "too", "use", "that", "with",
        "this", "from", "they", "will", "would", "there", "their", "what", "about", "which",
        "when", "were", "been", "into", "than", "them", "then", "these", "those", "some",
        "such", "also", "other", "more", "most", "only", "over", "very", "your", "each",
        "shall", "should", "could", "where", "while", "being", "upon", "because", "between",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Lower-cases `text` and removes every character that is not an ASCII word
/// character, whitespace or one of å, ä, ö.
pub fn clean_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace() || matches!(c, 'å' | 'ä' | 'ö'))
        .collect()
}

/// Top keywords of `text` by frequency. Ties keep the order of first appearance.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let cleaned = clean_text(text);

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for token in cleaned.split_whitespace() {
        if token.chars().count() <= 2
            || is_stop_word(token)
            || token.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        let count = counts.entry(token).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    // Stable sort keeps first-appearance order among equal counts.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}
