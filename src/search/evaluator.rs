use super::matcher::{OperatorMatcher, TextMatcher};
use super::query::{GeoOperator, GeoQuery, Operator, SearchQuery};
use crate::models::MetadataRecord;
use std::borrow::Cow;

/// Coordinates closer than this many degrees are considered equal.
pub const GEO_TOLERANCE: f64 = 0.001;

pub const EXACT_MATCH_BONUS: u32 = 5;
pub const BOUNDARY_MATCH_BONUS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub matches: bool,
    pub relevance_score: u32,
}

/// Record fields that free-text search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Author,
    FullText,
    Keywords,
    Language,
    Category,
    FileKind,
}

impl SearchField {
    pub const ALL: [SearchField; 7] = [
        SearchField::Title,
        SearchField::Author,
        SearchField::FullText,
        SearchField::Keywords,
        SearchField::Language,
        SearchField::Category,
        SearchField::FileKind,
    ];

    pub fn weight(&self) -> u32 {
        match self {
            SearchField::Title => 10,
            SearchField::Author => 8,
            SearchField::FullText => 5,
            SearchField::Keywords => 6,
            SearchField::Language => 2,
            SearchField::Category => 2,
            SearchField::FileKind => 1,
        }
    }

    /// The field's value on `record`, `None` when unset.
    pub fn value<'a>(&self, record: &'a MetadataRecord) -> Option<Cow<'a, str>> {
        match self {
            SearchField::Title => record.title.as_deref().map(Cow::Borrowed),
            SearchField::Author => record.author.as_deref().map(Cow::Borrowed),
            SearchField::FullText => record.raw_text.as_deref().map(Cow::Borrowed),
            SearchField::Keywords => {
                (!record.keywords.is_empty()).then(|| Cow::Owned(record.keyword_string()))
            }
            SearchField::Language => Some(Cow::Borrowed(record.language.label())),
            SearchField::Category => Some(Cow::Borrowed(record.category.label())),
            SearchField::FileKind => Some(Cow::Borrowed(record.file_kind().label())),
        }
    }
}

pub fn evaluate(record: &MetadataRecord, query: &SearchQuery) -> MatchResult {
    evaluate_with(record, query, &OperatorMatcher)
}

/// Applies every predicate of `query` to `record` and scores it.
pub fn evaluate_with(
    record: &MetadataRecord,
    query: &SearchQuery,
    matcher: &dyn TextMatcher,
) -> MatchResult {
    let matches = text_matches(record, query, matcher)
        && query.geo().map_or(true, |geo| geo_matches(record, geo))
        && query.file_kind().map_or(true, |kind| record.file_kind() == kind)
        && size_matches(record, query)
        && date_matches(record, query);

    let relevance_score = match query.term() {
        Some(term) if matches => relevance_score(record, term, query.operator(), matcher),
        _ => 0,
    };

    MatchResult {
        matches,
        relevance_score,
    }
}

/// True without a term, otherwise when any searchable field satisfies the operator.
pub fn text_matches(record: &MetadataRecord, query: &SearchQuery, matcher: &dyn TextMatcher) -> bool {
    let Some(term) = query.term() else {
        return true;
    };
    SearchField::ALL.iter().any(|field| {
        field
            .value(record)
            .is_some_and(|value| matcher.matches(&value, term, query.operator()))
    })
}

/// Records without a coordinate never match a geographic query.
pub fn geo_matches(record: &MetadataRecord, geo: &GeoQuery) -> bool {
    let Some(point) = record.coordinate() else {
        return false;
    };
    let near = |a: f64, b: f64| (a - b).abs() < GEO_TOLERANCE;

    match geo.operator {
        GeoOperator::Equals => match (geo.latitude, geo.longitude) {
            (Some(lat), Some(lon)) => near(point.latitude, lat) && near(point.longitude, lon),
            (Some(lat), None) => near(point.latitude, lat),
            (None, Some(lon)) => near(point.longitude, lon),
            (None, None) => false,
        },
        GeoOperator::GreaterThan => geo.longitude.is_some_and(|lon| point.longitude > lon),
        GeoOperator::LessThan => geo.longitude.is_some_and(|lon| point.longitude < lon),
        GeoOperator::GreaterThanLat => geo.latitude.is_some_and(|lat| point.latitude > lat),
        GeoOperator::LessThanLat => geo.latitude.is_some_and(|lat| point.latitude < lat),
    }
}

/// Compares the size in whole kilobytes against the inclusive range.
pub fn size_matches(record: &MetadataRecord, query: &SearchQuery) -> bool {
    let (min, max) = query.size_range_kb();
    let kb = record.size_kb() as f64;
    kb >= min && kb <= max
}

/// Applied only when both bounds are set; undated records pass.
pub fn date_matches(record: &MetadataRecord, query: &SearchQuery) -> bool {
    match (query.date_range(), record.created_at) {
        (Some((min, max)), Some(created)) => created >= min && created <= max,
        _ => true,
    }
}

/// Weighted sum over the fields that satisfy the operator, with bonuses for
/// an exact value match and for a match at the start or end of the value.
pub fn relevance_score(
    record: &MetadataRecord,
    term: &str,
    operator: Operator,
    matcher: &dyn TextMatcher,
) -> u32 {
    let term_lower = term.to_lowercase();
    SearchField::ALL
        .iter()
        .filter_map(|field| field.value(record).map(|value| (field, value)))
        .filter(|(_, value)| matcher.matches(value, term, operator))
        .map(|(field, value)| {
            let value_lower = value.to_lowercase();
            let mut score = field.weight();
            if value_lower == term_lower {
                score += EXACT_MATCH_BONUS;
            }
            if value_lower.starts_with(&term_lower) || value_lower.ends_with(&term_lower) {
                score += BOUNDARY_MATCH_BONUS;
            }
            score
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, FileKind, GeoPoint, KindDetails, Language};
    use crate::search::query::SearchQuery;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn annual_report() -> MetadataRecord {
        let mut record = MetadataRecord::minimal("ar.pdf", "/a/ar.pdf", FileKind::Document, 1000);
        record.title = Some("Annual Report 2021".to_string());
        record.author = Some("Alice Smith".to_string());
        record
    }

    fn photo(lat: f64, lon: f64) -> MetadataRecord {
        let mut record = MetadataRecord::minimal("leaves.jpg", "/a/leaves.jpg", FileKind::Image, 500);
        record.details = KindDetails::Image {
            dimensions: None,
            camera: None,
            orientation: None,
            coordinate: GeoPoint::new(lat, lon),
        };
        record
    }

    fn geo(latitude: Option<f64>, longitude: Option<f64>, operator: GeoOperator) -> GeoQuery {
        GeoQuery {
            latitude,
            longitude,
            operator,
        }
    }

    #[test]
    fn test_title_match_scores_title_weight() {
        let query = SearchQuery::builder().term("report").build();
        let result = evaluate(&annual_report(), &query);
        assert!(result.matches);
        assert_eq!(result.relevance_score, 10);
    }

    #[test]
    fn test_exact_and_boundary_bonuses() {
        let record = annual_report();
        // title starts with the term: 10 + 2
        let query = SearchQuery::builder().term("annual").build();
        assert_eq!(evaluate(&record, &query).relevance_score, 12);
        // author is exactly the term: 8 + 5 + 2
        let query = SearchQuery::builder().term("alice smith").build();
        assert_eq!(evaluate(&record, &query).relevance_score, 15);
    }

    #[test]
    fn test_exact_match_strictly_increases_score() {
        let mut record = annual_report();
        let query = SearchQuery::builder().term("smith").build();
        let before = evaluate(&record, &query).relevance_score;
        record.keywords = vec!["smith".to_string()];
        let after = evaluate(&record, &query).relevance_score;
        assert!(after > before);
        assert_eq!(after - before, 6 + EXACT_MATCH_BONUS + BOUNDARY_MATCH_BONUS);
    }

    #[test]
    fn test_free_text_covers_every_field() {
        let mut record = annual_report();
        record.language = Language::Swedish;
        record.category = Category::Legal;
        record.raw_text = Some("Inside the body text".to_string());
        record.keywords = vec!["watershed".to_string()];

        for term in ["body", "watershed", "swedish", "legal", "pdf", "alice"] {
            let query = SearchQuery::builder().term(term).build();
            assert!(evaluate(&record, &query).matches, "term {term} should match");
        }
        let query = SearchQuery::builder().term("nothing-here").build();
        assert_eq!(evaluate(&record, &query), MatchResult { matches: false, relevance_score: 0 });
    }

    #[test]
    fn test_no_term_matches_with_zero_score() {
        let result = evaluate(&annual_report(), &SearchQuery::default());
        assert_eq!(result, MatchResult { matches: true, relevance_score: 0 });
    }

    #[test]
    fn test_numeric_operator_on_text_fields() {
        let mut record = annual_report();
        record.title = Some("2021".to_string());
        let query = SearchQuery::builder().term("2000").operator(Operator::GreaterThan).build();
        let result = evaluate(&record, &query);
        assert!(result.matches);
        // only the title parses as a number
        assert_eq!(result.relevance_score, 10);
    }

    #[test]
    fn test_geo_equals() {
        let record = photo(42.0350, -70.9380);
        let exact = geo(Some(42.0350), Some(-70.9380), GeoOperator::Equals);
        assert!(geo_matches(&record, &exact));
        let lat_only = geo(Some(43.0), None, GeoOperator::Equals);
        assert!(!geo_matches(&record, &lat_only));
        let lon_only = geo(None, Some(-70.9385), GeoOperator::Equals);
        assert!(geo_matches(&record, &lon_only));
        assert!(!geo_matches(&record, &geo(None, None, GeoOperator::Equals)));
    }

    #[test]
    fn test_geo_directional_operators() {
        let record = photo(42.035, -70.938);
        assert!(geo_matches(&record, &geo(Some(0.0), Some(-71.0), GeoOperator::GreaterThan)));
        assert!(!geo_matches(&record, &geo(Some(0.0), Some(-70.0), GeoOperator::GreaterThan)));
        assert!(geo_matches(&record, &geo(Some(43.0), Some(-70.0), GeoOperator::LessThan)));
        assert!(!geo_matches(&record, &geo(Some(43.0), None, GeoOperator::LessThan)));
        assert!(geo_matches(&record, &geo(Some(42.0), None, GeoOperator::GreaterThanLat)));
        assert!(geo_matches(&record, &geo(Some(43.0), None, GeoOperator::LessThanLat)));
        assert!(!geo_matches(&record, &geo(None, Some(-80.0), GeoOperator::LessThanLat)));
    }

    #[test]
    fn test_geo_requires_coordinate() {
        let query = geo(Some(42.035), Some(-70.938), GeoOperator::Equals);
        assert!(!geo_matches(&annual_report(), &query));
        assert!(!geo_matches(
            &MetadataRecord::minimal("x.jpg", "x.jpg", FileKind::Image, 1),
            &query
        ));
        let search = SearchQuery::builder().geo(query).build();
        assert!(!evaluate(&annual_report(), &search).matches);
    }

    #[test]
    fn test_size_filter_in_kilobytes() {
        let record = MetadataRecord::minimal("big.pdf", "big.pdf", FileKind::Document, 2_097_152);
        let query = SearchQuery::builder().min_size_kb(1024.0).max_size_kb(4096.0).build();
        assert!(evaluate(&record, &query).matches);
        let query = SearchQuery::builder().min_size_kb(3000.0).build();
        assert!(!evaluate(&record, &query).matches);
        let query = SearchQuery::builder().min_size_kb(2048.0).max_size_kb(2048.0).build();
        assert!(size_matches(&record, &query));
    }

    #[test]
    fn test_date_filter_needs_both_bounds() {
        let mut record = annual_report();
        record.created_at = Some(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap());
        let jan = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let mar = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();

        let query = SearchQuery::builder().min_date(jan).max_date(mar).build();
        assert!(!date_matches(&record, &query));
        let query = SearchQuery::builder().min_date(jan).build();
        assert!(date_matches(&record, &query));

        record.created_at = None;
        let query = SearchQuery::builder().min_date(jan).max_date(mar).build();
        assert!(date_matches(&record, &query));
    }

    #[test]
    fn test_kind_filter() {
        let query = SearchQuery::builder().file_kind(FileKind::Image).build();
        assert!(!evaluate(&annual_report(), &query).matches);
        assert!(evaluate(&photo(1.0, 1.0), &query).matches);
    }

    proptest! {
        #[test]
        fn prop_geo_equals_within_tolerance(
            lat in -80.0f64..80.0,
            lon in -170.0f64..170.0,
            dlat in -0.0009f64..0.0009,
            dlon in -0.0009f64..0.0009,
        ) {
            let record = photo(lat, lon);
            let query = geo(Some(lat + dlat), Some(lon + dlon), GeoOperator::Equals);
            prop_assert!(geo_matches(&record, &query));
        }

        #[test]
        fn prop_geo_equals_outside_tolerance(
            lat in -80.0f64..80.0,
            lon in -170.0f64..170.0,
            offset in 0.0011f64..1.0,
            shift_latitude in any::<bool>(),
        ) {
            let record = photo(lat, lon);
            let query = if shift_latitude {
                geo(Some(lat + offset), Some(lon), GeoOperator::Equals)
            } else {
                geo(Some(lat), Some(lon - offset), GeoOperator::Equals)
            };
            prop_assert!(!geo_matches(&record, &query));
        }
    }
}
