use super::query::Operator;

/// Applies `operator` to a record value and a search term. Total: numeric
/// operators on non-numeric input simply do not match.
pub fn apply_operator(value: &str, term: &str, operator: Operator) -> bool {
    match operator {
        Operator::Contains => value.to_lowercase().contains(&term.to_lowercase()),
        Operator::Equals => value.to_lowercase() == term.to_lowercase(),
        Operator::NotEquals => value.to_lowercase() != term.to_lowercase(),
        Operator::GreaterThan => match (parse_number(value), parse_number(term)) {
            (Some(v), Some(t)) => v > t,
            _ => false,
        },
        Operator::LessThan => match (parse_number(value), parse_number(term)) {
            (Some(v), Some(t)) => v < t,
            _ => false,
        },
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Decides whether a field value satisfies the query term.
pub trait TextMatcher: Send + Sync {
    fn matches(&self, value: &str, term: &str, operator: Operator) -> bool;
}

/// Exact operator semantics.
#[derive(Debug, Default, Clone, Copy)]
pub struct OperatorMatcher;

impl TextMatcher for OperatorMatcher {
    fn matches(&self, value: &str, term: &str, operator: Operator) -> bool {
        apply_operator(value, term, operator)
    }
}

/// Relaxes `contains` to also accept a value token whose normalized
/// Levenshtein similarity to the term reaches `threshold`. Every other
/// operator keeps its exact meaning.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    pub threshold: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        FuzzyMatcher { threshold: 0.8 }
    }
}

impl TextMatcher for FuzzyMatcher {
    fn matches(&self, value: &str, term: &str, operator: Operator) -> bool {
        if apply_operator(value, term, operator) {
            return true;
        }
        if operator != Operator::Contains {
            return false;
        }

        let term = term.to_lowercase();
        value
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .any(|token| strsim::normalized_levenshtein(token, &term) >= self.threshold)
    }
}
