//! In-memory inverted index
//!
//! Text is lowercased and split on anything that is not alphanumeric. A match
//! clause hits a document when any of its tokens occurs in any field; the score
//! is the summed term frequency of the matched tokens.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{NaiveDate, NaiveTime};

use crate::index::{BoolMode, Document, SearchHit, SearchIndex, SearchRequest, SearchResults, SortOrder};
use crate::{StoreError, StoreResult};

#[derive(Debug)]
struct IndexedDoc {
    terms: HashMap<String, u32>,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
}

#[derive(Debug)]
pub struct MemoryIndex {
    docs: RwLock<HashMap<String, IndexedDoc>>,
    max_results: usize,
}

/// Lowercase and split text into tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Poisoned { resource: "memory index" }
}

impl MemoryIndex {
    pub fn new(max_results: usize) -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            max_results,
        }
    }

    /// Score of one clause against a document, `None` when nothing matched
    fn clause_score(doc: &IndexedDoc, clause: &str) -> Option<f64> {
        let mut score = 0u32;
        for token in tokenize(clause) {
            if let Some(freq) = doc.terms.get(&token) {
                score += freq;
            }
        }
        if score > 0 {
            Some(f64::from(score))
        } else {
            None
        }
    }

    fn score(doc: &IndexedDoc, clauses: &[String], mode: BoolMode) -> Option<f64> {
        if clauses.is_empty() {
            return Some(0.0);
        }
        let scores: Vec<Option<f64>> = clauses.iter().map(|c| Self::clause_score(doc, c)).collect();
        match mode {
            BoolMode::All => scores.iter().copied().sum::<Option<f64>>(),
            BoolMode::Any => {
                let matched: Vec<f64> = scores.into_iter().flatten().collect();
                if matched.is_empty() {
                    None
                } else {
                    Some(matched.iter().sum())
                }
            }
        }
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl SearchIndex for MemoryIndex {
    fn index(&self, id: &str, doc: Document) -> StoreResult<()> {
        let mut terms: HashMap<String, u32> = HashMap::new();
        for value in doc.fields.values() {
            for token in tokenize(value) {
                *terms.entry(token).or_insert(0) += 1;
            }
        }
        let mut docs = self.docs.write().map_err(poisoned)?;
        docs.insert(
            id.to_string(),
            IndexedDoc {
                terms,
                date: doc.date,
                time: doc.time,
            },
        );
        Ok(())
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        docs.remove(id);
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut docs = self.docs.write().map_err(poisoned)?;
        docs.clear();
        Ok(())
    }

    fn search(&self, request: &SearchRequest) -> StoreResult<SearchResults> {
        let docs = self.docs.read().map_err(poisoned)?;
        let query = &request.query;

        let mut matches: Vec<(&String, &IndexedDoc, f64)> = docs
            .iter()
            .filter(|(_, doc)| match (&query.date_range, doc.date) {
                (None, _) => true,
                (Some(range), Some(date)) => range.contains(date),
                (Some(_), None) => false,
            })
            .filter_map(|(id, doc)| {
                Self::score(doc, &query.clauses, query.mode).map(|score| (id, doc, score))
            })
            .collect();

        match request.sort {
            SortOrder::ScoreDesc => matches.sort_by(|a, b| {
                b.2.total_cmp(&a.2).then_with(|| a.0.cmp(b.0))
            }),
            SortOrder::DateTimeAsc => matches.sort_by(|a, b| {
                cmp_date(a.1.date, b.1.date)
                    .then_with(|| a.1.time.unwrap_or(NaiveTime::MIN).cmp(&b.1.time.unwrap_or(NaiveTime::MIN)))
                    .then_with(|| a.2.total_cmp(&b.2))
                    .then_with(|| a.0.cmp(b.0))
            }),
        }

        let total = matches.len();
        let size = request.size.min(self.max_results);
        let hits = matches
            .into_iter()
            .skip(request.from)
            .take(size)
            .map(|(id, _, score)| SearchHit {
                id: id.clone(),
                score,
            })
            .collect();

        Ok(SearchResults { hits, total })
    }

    fn doc_count(&self) -> StoreResult<usize> {
        Ok(self.docs.read().map_err(poisoned)?.len())
    }

    fn max_results(&self) -> usize {
        self.max_results
    }
}

/// Undated documents sort after dated ones
fn cmp_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{DateRange, Query};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn doc(text: &str, d: NaiveDate, time: Option<&str>) -> Document {
        Document::new()
            .field("description", text)
            .with_date(Some(d))
            .with_time(time.and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok()))
    }

    fn sample_index() -> MemoryIndex {
        let index = MemoryIndex::new(1000);
        index.index("record:1", doc("Coffee at the station", date(2024, 6, 3), Some("09:00"))).unwrap();
        index.index("record:2", doc("Lunch with coffee, coffee again", date(2024, 6, 1), Some("12:30"))).unwrap();
        index.index("record:3", doc("Train ticket", date(2024, 6, 1), Some("08:15"))).unwrap();
        index.index("record:4", doc("Coffee beans", date(2024, 7, 1), None)).unwrap();
        index
    }

    fn request(query: Query, sort: SortOrder) -> SearchRequest {
        SearchRequest { query, sort, from: 0, size: 100 }
    }

    fn ids(results: &SearchResults) -> Vec<&str> {
        results.hits.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Coffee, TEA & cake!"), vec!["coffee", "tea", "cake"]);
        assert_eq!(tokenize("점심 식사"), vec!["점심", "식사"]);
        assert!(tokenize("--").is_empty());
    }

    #[test]
    fn test_any_mode_sorted_by_score() {
        let index = sample_index();
        let query = Query::new(vec!["coffee".to_string(), "train".to_string()], BoolMode::Any);
        let results = index.search(&request(query, SortOrder::ScoreDesc)).unwrap();
        assert_eq!(results.total, 4);
        assert_eq!(results.hits[0].id, "record:2");
        assert_eq!(results.hits[0].score, 2.0);
    }

    #[test]
    fn test_all_mode_requires_every_clause() {
        let index = sample_index();
        let query = Query::new(vec!["coffee".to_string(), "lunch".to_string()], BoolMode::All);
        let results = index.search(&request(query, SortOrder::ScoreDesc)).unwrap();
        assert_eq!(ids(&results), vec!["record:2"]);
    }

    #[test]
    fn test_date_range_is_inclusive_and_sorted_chronologically() {
        let index = sample_index();
        let query = Query::new(vec![], BoolMode::Any)
            .with_date_range(DateRange { start: date(2024, 6, 1), end: date(2024, 6, 3) });
        let results = index.search(&request(query, SortOrder::DateTimeAsc)).unwrap();
        assert_eq!(ids(&results), vec!["record:3", "record:2", "record:1"]);
    }

    #[test]
    fn test_pagination_and_cap() {
        let index = MemoryIndex::new(2);
        for i in 0..5 {
            index.index(&format!("record:{}", i), doc("bus", date(2024, 1, i + 1), None)).unwrap();
        }
        let query = Query::new(vec!["bus".to_string()], BoolMode::All);
        let mut req = request(query, SortOrder::DateTimeAsc);
        req.size = 50;
        let results = index.search(&req).unwrap();
        assert_eq!(results.total, 5);
        assert_eq!(results.hits.len(), 2);

        req.from = 4;
        let results = index.search(&req).unwrap();
        assert_eq!(ids(&results), vec!["record:4"]);
    }

    #[test]
    fn test_reindex_replaces_and_delete_removes() {
        let index = sample_index();
        index.index("record:3", doc("Taxi", date(2024, 6, 1), None)).unwrap();
        let query = Query::new(vec!["train".to_string()], BoolMode::Any);
        assert_eq!(index.search(&request(query.clone(), SortOrder::ScoreDesc)).unwrap().total, 0);

        index.delete("record:1").unwrap();
        index.delete("record:unknown").unwrap();
        assert_eq!(index.doc_count().unwrap(), 3);

        index.clear().unwrap();
        assert_eq!(index.doc_count().unwrap(), 0);
    }
}
