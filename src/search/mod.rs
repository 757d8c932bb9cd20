//! Query evaluation and ranking over an in-memory corpus.
//!
//! Evaluation only reads records; the corpus can be shared between
//! concurrent searches without locking.

pub mod evaluator;
pub mod matcher;
pub mod query;
pub mod ranker;

pub use evaluator::{evaluate, evaluate_with, MatchResult};
pub use matcher::{FuzzyMatcher, OperatorMatcher, TextMatcher};
pub use query::{GeoOperator, GeoQuery, Operator, SearchQuery, SearchQueryBuilder, SortField, SortOrder};
pub use ranker::{rank, ScoredRecord};

use crate::models::MetadataRecord;

/// Filters `records` through `query` and returns the matches in ranked order.
pub fn search<'a>(
    records: &'a [MetadataRecord],
    query: &SearchQuery,
    matcher: &dyn TextMatcher,
) -> Vec<ScoredRecord<'a>> {
    let mut results: Vec<ScoredRecord<'a>> = records
        .iter()
        .filter_map(|record| {
            let result = evaluate_with(record, query, matcher);
            result.matches.then_some(ScoredRecord {
                record,
                score: result.relevance_score,
            })
        })
        .collect();
    rank(&mut results, query);
    results
}
