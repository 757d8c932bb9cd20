use crate::models::Category;
use once_cell::sync::Lazy;
use regex::Regex;

/// Lowest score a category needs before it is assigned.
pub const MIN_CATEGORY_SCORE: usize = 2;

struct CategoryRule {
    category: Category,
    /// Each occurrence scores 2.
    pattern: Regex,
    /// Each listed keyword present in the text scores 1.
    keywords: &'static [&'static str],
}

fn rule(category: Category, words: &str, keywords: &'static [&'static str]) -> CategoryRule {
    CategoryRule {
        category,
        pattern: Regex::new(&format!(r"(?i)\b(?:{words})\b")).expect("static category pattern"),
        keywords,
    }
}

static RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    let rules = vec![
        rule(
            Category::Report,
            "report|rapport|annual|årsredovisning|summary|sammanfattning|findings",
            &["analysis", "results", "review", "utvärdering", "uppföljning", "evaluation"],
        ),
        rule(
            Category::Article,
            "article|artikel|journal|abstract|introduction|conclusion",
            &["research", "study", "forskning", "author", "references", "published"],
        ),
        rule(
            Category::Legal,
            "law|lag|legal|court|domstol|contract|avtal|regulation|förordning",
            &["section", "paragraf", "plaintiff", "defendant", "clause", "jurisdiction"],
        ),
        rule(
            Category::Government,
            "government|regering|kommun|ministry|departement|agency|myndighet|federal",
            &["public", "policy", "offentlig", "parliament", "riksdag", "congress"],
        ),
        rule(
            Category::News,
            "news|nyheter|press|breaking|reporter|headline",
            &["today", "idag", "announced", "meddelade", "according", "latest"],
        ),
        rule(
            Category::Technical,
            "technical|teknisk|specification|manual|system|software|engineering",
            &["data", "version", "configuration", "installation", "architecture", "protocol"],
        ),
        rule(
            Category::Financial,
            "financial|finansiell|budget|revenue|intäkter|profit|ekonomi|invoice|faktura",
            &["cost", "kostnad", "tax", "skatt", "investment", "balance"],
        ),
        rule(
            Category::Medical,
            "medical|medicinsk|health|hälsa|patient|clinical|klinisk|hospital|sjukhus",
            &["treatment", "behandling", "disease", "sjukdom", "diagnosis", "symptoms"],
        ),
    ];
    debug_assert!(rules
        .iter()
        .map(|r| r.category)
        .eq(Category::EVALUATION_ORDER.iter().copied()));
    rules
});

/// Score of every category in evaluation order.
pub fn category_scores(title: &str, text: &str) -> Vec<(Category, usize)> {
    let combined = format!("{title} {text}");
    let lower = combined.to_lowercase();
    RULES
        .iter()
        .map(|rule| {
            let pattern_hits = rule.pattern.find_iter(&combined).count();
            let keyword_hits = rule
                .keywords
                .iter()
                .filter(|keyword| lower.contains(**keyword))
                .count();
            (rule.category, pattern_hits * 2 + keyword_hits)
        })
        .collect()
}

/// Highest-scoring category, or `Unknown` below [`MIN_CATEGORY_SCORE`].
pub fn classify_category(title: &str, text: &str) -> Category {
    let mut best = (Category::Unknown, 0);
    for (category, score) in category_scores(title, text) {
        // `>=` hands ties to the later category.
        if score >= best.1 {
            best = (category, score);
        }
    }

    if best.1 < MIN_CATEGORY_SCORE {
        Category::Unknown
    } else {
        best.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_report() {
        let category = classify_category("Annual Report 2021", "Summary of findings and analysis.");
        assert_eq!(category, Category::Report);
    }

    #[test]
    fn test_classify_financial_swedish() {
        let category = classify_category("", "Kommunens budget och ekonomi. Kostnad och skatt.");
        assert_eq!(category, Category::Financial);
    }

    #[test]
    fn test_pattern_counts_every_occurrence() {
        let scores = category_scores("patient", "patient patient");
        let medical = scores
            .iter()
            .find(|(c, _)| *c == Category::Medical)
            .map(|(_, s)| *s);
        assert_eq!(medical, Some(6));
    }

    #[test]
    fn test_unknown_below_threshold() {
        // one keyword hit only scores 1
        assert_eq!(classify_category("", "the latest"), Category::Unknown);
        assert_eq!(classify_category("", ""), Category::Unknown);
    }

    #[test]
    fn test_tie_goes_to_later_category() {
        // "report" -> Report 2, "patient" -> Medical 2
        assert_eq!(classify_category("report", "patient"), Category::Medical);
        // "court" -> Legal 2, "news" -> News 2
        assert_eq!(classify_category("news", "court"), Category::News);
    }

    #[test]
    fn test_scores_in_evaluation_order() {
        let order: Vec<Category> = category_scores("", "").into_iter().map(|(c, _)| c).collect();
        assert_eq!(order, Category::EVALUATION_ORDER.to_vec());
    }

    #[test]
    fn test_classification_idempotent() {
        let text = "Clinical treatment guidelines for hospital staff";
        assert_eq!(classify_category("Guide", text), classify_category("Guide", text));
    }
}
