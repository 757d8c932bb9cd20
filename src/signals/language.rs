use crate::models::Language;
use once_cell::sync::Lazy;
use regex::Regex;

const SWEDISH_WORDS: &[&str] = &[
    "och", "att", "det", "som", "en", "är", "för", "med", "den", "har", "inte", "till", "av",
    "på", "var", "ett", "jag", "om", "de", "vi", "kan", "vara", "från", "eller", "också",
    "när", "där", "efter", "under", "mellan", "enligt", "samt", "rapport", "år", "utan",
];

const ENGLISH_WORDS: &[&str] = &[
    "the", "and", "of", "to", "is", "in", "that", "for", "with", "as", "on", "by", "this",
    "are", "be", "it", "from", "or", "an", "was", "which", "have", "not", "were", "has",
    "been", "their", "will", "would", "about", "report", "these", "between", "under",
];

fn word_list_pattern(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("static word list pattern")
}

static SWEDISH_PATTERN: Lazy<Regex> = Lazy::new(|| word_list_pattern(SWEDISH_WORDS));
static ENGLISH_PATTERN: Lazy<Regex> = Lazy::new(|| word_list_pattern(ENGLISH_WORDS));

pub fn swedish_score(text: &str) -> usize {
    let lower = text.to_lowercase();
    let letters = ['å', 'ä', 'ö']
        .iter()
        .filter(|c| lower.contains(**c))
        .count();
    letters * 3 + SWEDISH_PATTERN.find_iter(&lower).count()
}

pub fn english_score(text: &str) -> usize {
    ENGLISH_PATTERN.find_iter(&text.to_lowercase()).count()
}

/// Word-list heuristic; short or bilingual text is expected to misclassify.
pub fn detect_language(text: &str) -> Language {
    let swedish = swedish_score(text);
    let english = english_score(text);

    if swedish > english && swedish > 2 {
        Language::Swedish
    } else if english > swedish && english > 2 {
        Language::English
    } else if swedish == english && swedish > 0 {
        Language::Mixed
    } else {
        Language::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_swedish() {
        let text = "Detta är en rapport om kommunens ekonomi och budget för året.";
        assert_eq!(detect_language(text), Language::Swedish);
    }

    #[test]
    fn test_detect_english() {
        let text = "This is the annual report of the company and its subsidiaries.";
        assert_eq!(detect_language(text), Language::English);
    }

    #[test]
    fn test_swedish_letters_weigh_three_each() {
        assert_eq!(swedish_score("åäö"), 9);
        assert_eq!(swedish_score("ååå"), 3);
        assert_eq!(swedish_score("xyz"), 0);
    }

    #[test]
    fn test_whole_word_matches_only() {
        assert_eq!(english_score("theory thesis"), 0);
        assert_eq!(english_score("The theory of the thesis"), 3);
    }

    #[test]
    fn test_mixed_on_equal_scores() {
        // "och" scores 1 Swedish, "the" scores 1 English
        assert_eq!(detect_language("och the"), Language::Mixed);
    }

    #[test]
    fn test_unknown_below_threshold() {
        assert_eq!(detect_language(""), Language::Unknown);
        assert_eq!(detect_language("lorem ipsum"), Language::Unknown);
        // English wins on score but does not clear the threshold
        assert_eq!(detect_language("the and"), Language::Unknown);
    }

    #[test]
    fn test_detection_idempotent() {
        let text = "Årsredovisning and the annual report för 2021";
        assert_eq!(detect_language(text), detect_language(text));
    }
}
