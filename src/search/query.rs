use crate::models::FileKind;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field-level comparison applied between a record value and the search term.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    Contains,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
}

impl Operator {
    /// Unknown names fall back to `Contains`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            _ => Operator::Contains,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeoOperator {
    #[default]
    Equals,
    /// Longitude greater than the query longitude.
    GreaterThan,
    /// Longitude less than the query longitude.
    LessThan,
    GreaterThanLat,
    LessThanLat,
}

impl GeoOperator {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "greater_than" => GeoOperator::GreaterThan,
            "less_than" => GeoOperator::LessThan,
            "greater_than_lat" => GeoOperator::GreaterThanLat,
            "less_than_lat" => GeoOperator::LessThanLat,
            _ => GeoOperator::Equals,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct GeoQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub operator: GeoOperator,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Relevance,
    Title,
    Size,
    Date,
}

impl SortField {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "title" | "name" => SortField::Title,
            "size" => SortField::Size,
            "date" => SortField::Date,
            _ => SortField::Relevance,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    /// Descending for relevance, ascending for every other field.
    pub fn default_for(field: SortField) -> Self {
        match field {
            SortField::Relevance => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// One search request. Built once through [`SearchQueryBuilder`] or
/// [`SearchQuery::from_params`] and never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchQuery {
    term: Option<String>,
    operator: Operator,
    file_kind: Option<FileKind>,
    geo: Option<GeoQuery>,
    min_size_kb: Option<f64>,
    max_size_kb: Option<f64>,
    min_date: Option<DateTime<Utc>>,
    max_date: Option<DateTime<Utc>>,
    sort_field: SortField,
    sort_order: SortOrder,
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQueryBuilder::default().build()
    }
}

impl SearchQuery {
    pub fn builder() -> SearchQueryBuilder {
        SearchQueryBuilder::default()
    }

    /// Builds a query from web-layer parameters (`q`, `operator`, `fileType`,
    /// `gps`, `latitude`, `longitude`, `gpsOperator`, `minSize`, `maxSize`,
    /// `minDate`, `maxDate`, `sortBy`, `sortOrder`). Unparseable values are
    /// treated as absent.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let number = |key: &str| get(key).and_then(|v| v.parse::<f64>().ok()).filter(|v| v.is_finite());

        let mut builder = SearchQuery::builder();
        if let Some(term) = get("q") {
            builder = builder.term(term);
        }
        if let Some(operator) = get("operator") {
            builder = builder.operator(Operator::parse(operator));
        }
        if let Some(kind) = get("fileType").and_then(FileKind::parse) {
            builder = builder.file_kind(kind);
        }
        if get("gps").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            builder = builder.geo(GeoQuery {
                latitude: number("latitude"),
                longitude: number("longitude"),
                operator: get("gpsOperator").map(GeoOperator::parse).unwrap_or_default(),
            });
        }
        if let Some(min) = number("minSize") {
            builder = builder.min_size_kb(min);
        }
        if let Some(max) = number("maxSize") {
            builder = builder.max_size_kb(max);
        }
        if let Some(min) = get("minDate").and_then(|v| parse_date_bound(v, false)) {
            builder = builder.min_date(min);
        }
        if let Some(max) = get("maxDate").and_then(|v| parse_date_bound(v, true)) {
            builder = builder.max_date(max);
        }
        if let Some(field) = get("sortBy") {
            builder = builder.sort_field(SortField::parse(field));
        }
        if let Some(order) = get("sortOrder").and_then(SortOrder::parse) {
            builder = builder.sort_order(order);
        }
        builder.build()
    }

    /// The trimmed term, `None` when empty.
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn file_kind(&self) -> Option<FileKind> {
        self.file_kind
    }

    pub fn geo(&self) -> Option<&GeoQuery> {
        self.geo.as_ref()
    }

    /// Size bounds in kilobytes; defaults are 0 and unbounded.
    pub fn size_range_kb(&self) -> (f64, f64) {
        (
            self.min_size_kb.unwrap_or(0.0),
            self.max_size_kb.unwrap_or(f64::INFINITY),
        )
    }

    /// Present only when both bounds were given.
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.min_date?, self.max_date?))
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchQueryBuilder {
    term: Option<String>,
    operator: Operator,
    file_kind: Option<FileKind>,
    geo: Option<GeoQuery>,
    min_size_kb: Option<f64>,
    max_size_kb: Option<f64>,
    min_date: Option<DateTime<Utc>>,
    max_date: Option<DateTime<Utc>>,
    sort_field: SortField,
    sort_order: Option<SortOrder>,
}

impl SearchQueryBuilder {
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn file_kind(mut self, kind: FileKind) -> Self {
        self.file_kind = Some(kind);
        self
    }

    pub fn geo(mut self, geo: GeoQuery) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn min_size_kb(mut self, kb: f64) -> Self {
        self.min_size_kb = Some(kb);
        self
    }

    pub fn max_size_kb(mut self, kb: f64) -> Self {
        self.max_size_kb = Some(kb);
        self
    }

    pub fn min_date(mut self, date: DateTime<Utc>) -> Self {
        self.min_date = Some(date);
        self
    }

    pub fn max_date(mut self, date: DateTime<Utc>) -> Self {
        self.max_date = Some(date);
        self
    }

    pub fn sort_field(mut self, field: SortField) -> Self {
        self.sort_field = field;
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    pub fn build(self) -> SearchQuery {
        let term = self
            .term
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        SearchQuery {
            term,
            operator: self.operator,
            file_kind: self.file_kind,
            geo: self.geo,
            min_size_kb: self.min_size_kb,
            max_size_kb: self.max_size_kb,
            min_date: self.min_date,
            max_date: self.max_date,
            sort_field: self.sort_field,
            sort_order: self
                .sort_order
                .unwrap_or_else(|| SortOrder::default_for(self.sort_field)),
        }
    }
}

/// `YYYY-MM-DD` or RFC 3339. A date-only upper bound covers the whole day.
pub fn parse_date_bound(value: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(time.and_utc())
}
