use super::query::{SearchQuery, SortField, SortOrder};
use crate::models::{MetadataRecord, SearchResult};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A matching record borrowed from the corpus, with its relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRecord<'a> {
    pub record: &'a MetadataRecord,
    pub score: u32,
}

impl ScoredRecord<'_> {
    pub fn to_result(&self) -> SearchResult {
        SearchResult {
            record: self.record.clone(),
            score: self.score,
        }
    }
}

/// Orders `results` in place. The sort is stable, so equal keys keep the
/// order the evaluator produced them in. Relevance ordering needs a term;
/// without one the input order is left alone.
pub fn rank(results: &mut [ScoredRecord<'_>], query: &SearchQuery) {
    let order = query.sort_order();
    match query.sort_field() {
        SortField::Relevance => {
            if query.term().is_some() {
                results.sort_by(|a, b| directed(a.score.cmp(&b.score), order));
            }
        }
        SortField::Title => {
            results.sort_by(|a, b| directed(title_key(a.record).cmp(&title_key(b.record)), order))
        }
        SortField::Size => results.sort_by(|a, b| {
            directed(a.record.file_size_bytes.cmp(&b.record.file_size_bytes), order)
        }),
        SortField::Date => {
            results.sort_by(|a, b| directed(date_key(a.record).cmp(&date_key(b.record)), order))
        }
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn title_key(record: &MetadataRecord) -> String {
    record.title.as_deref().unwrap_or_default().to_lowercase()
}

fn date_key(record: &MetadataRecord) -> DateTime<Utc> {
    record.created_at.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileKind;
    use chrono::TimeZone;

    fn record(name: &str, title: Option<&str>, size: u64) -> MetadataRecord {
        let mut record = MetadataRecord::minimal(name, name, FileKind::Document, size);
        record.title = title.map(str::to_string);
        record
    }

    fn names(results: &[ScoredRecord<'_>]) -> Vec<String> {
        results.iter().map(|r| r.record.filename.clone()).collect()
    }

    #[test]
    fn test_relevance_ties_keep_input_order() {
        let corpus = [
            record("a", None, 1),
            record("b", None, 1),
            record("c", None, 1),
            record("d", None, 1),
        ];
        let mut results: Vec<ScoredRecord> = corpus
            .iter()
            .zip([3, 7, 7, 1])
            .map(|(record, score)| ScoredRecord { record, score })
            .collect();

        let query = SearchQuery::builder().term("x").build();
        rank(&mut results, &query);
        assert_eq!(names(&results), ["b", "c", "a", "d"]);
    }

    #[test]
    fn test_relevance_without_term_keeps_order() {
        let corpus = [record("a", None, 1), record("b", None, 1)];
        let mut results: Vec<ScoredRecord> = corpus
            .iter()
            .zip([1, 9])
            .map(|(record, score)| ScoredRecord { record, score })
            .collect();
        rank(&mut results, &SearchQuery::default());
        assert_eq!(names(&results), ["a", "b"]);
    }

    #[test]
    fn test_title_sort_is_case_insensitive_and_stable() {
        let corpus = [
            record("1", Some("beta"), 1),
            record("2", Some("Alpha"), 1),
            record("3", None, 1),
            record("4", Some("ALPHA"), 1),
        ];
        let mut results: Vec<ScoredRecord> =
            corpus.iter().map(|record| ScoredRecord { record, score: 0 }).collect();

        let query = SearchQuery::builder().sort_field(SortField::Title).build();
        rank(&mut results, &query);
        assert_eq!(names(&results), ["3", "2", "4", "1"]);

        let query = SearchQuery::builder()
            .sort_field(SortField::Title)
            .sort_order(SortOrder::Desc)
            .build();
        let mut results: Vec<ScoredRecord> =
            corpus.iter().map(|record| ScoredRecord { record, score: 0 }).collect();
        rank(&mut results, &query);
        assert_eq!(names(&results), ["1", "2", "4", "3"]);
    }

    #[test]
    fn test_size_sort_numeric() {
        let corpus = [
            record("big", None, 10_000),
            record("small", None, 9),
            record("mid", None, 100),
        ];
        let mut results: Vec<ScoredRecord> =
            corpus.iter().map(|record| ScoredRecord { record, score: 0 }).collect();
        let query = SearchQuery::builder().sort_field(SortField::Size).build();
        rank(&mut results, &query);
        assert_eq!(names(&results), ["small", "mid", "big"]);
    }

    #[test]
    fn test_date_sort_treats_missing_as_epoch() {
        let mut old = record("old", None, 1);
        old.created_at = Some(Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap());
        let mut new = record("new", None, 1);
        new.created_at = Some(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        let undated = record("undated", None, 1);

        let corpus = [new, undated, old];
        let mut results: Vec<ScoredRecord> =
            corpus.iter().map(|record| ScoredRecord { record, score: 0 }).collect();
        let query = SearchQuery::builder()
            .sort_field(SortField::Date)
            .sort_order(SortOrder::Desc)
            .build();
        rank(&mut results, &query);
        assert_eq!(names(&results), ["new", "old", "undated"]);
    }
}
