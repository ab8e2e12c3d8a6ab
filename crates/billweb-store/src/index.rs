//! Full-text index contract
//!
//! Documents are flat maps of text fields plus an optional date and time,
//! which the date-range filter and the chronological sort operate on.

use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeMap;

use crate::StoreResult;

/// Indexable view of a stored entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Text fields, tokenized for matching
    pub fields: BTreeMap<String, String>,
    /// Designated date field for range filters and sorting
    pub date: Option<NaiveDate>,
    /// Time of day, second sort key
    pub time: Option<NaiveTime>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn with_time(mut self, time: Option<NaiveTime>) -> Self {
        self.time = time;
        self
    }
}

/// How match clauses combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolMode {
    /// Every clause must match
    All,
    /// At least one clause must match
    Any,
}

/// Inclusive date bounds on [`Document::date`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Boolean combination of match clauses with an optional date filter.
///
/// A query with no clauses matches every document passing the date filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub clauses: Vec<String>,
    pub mode: BoolMode,
    pub date_range: Option<DateRange>,
}

impl Query {
    pub fn new(clauses: Vec<String>, mode: BoolMode) -> Self {
        Self {
            clauses,
            mode,
            date_range: None,
        }
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Best match first
    ScoreDesc,
    /// Oldest first: date, then time, then score
    DateTimeAsc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Query,
    pub sort: SortOrder,
    /// Hits to skip
    pub from: usize,
    /// Hits to return, capped by the index's maximum
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    /// Total matches before pagination
    pub total: usize,
}

/// Trait for full-text indexes
pub trait SearchIndex: Send + Sync {
    /// Add or replace the document stored under `id`
    fn index(&self, id: &str, doc: Document) -> StoreResult<()>;

    /// Remove `id`; removing an unknown id is not an error
    fn delete(&self, id: &str) -> StoreResult<()>;

    /// Drop every document
    fn clear(&self) -> StoreResult<()>;

    fn search(&self, request: &SearchRequest) -> StoreResult<SearchResults>;

    /// Number of indexed documents
    fn doc_count(&self) -> StoreResult<usize>;

    /// Hard cap on hits per search
    fn max_results(&self) -> usize;
}
