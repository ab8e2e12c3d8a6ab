//! Core ledger processing and business logic
//!
//! [`Ledger`] owns handles to the key-value store and the search index and
//! exposes every operation of the service: entity CRUD, the statement-cycle
//! aware aggregate query, relevance search and period sums.

pub mod aggregate;
pub mod classify;
pub mod cycle;
pub mod error;
pub mod models;
pub mod types;
pub mod validate;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use billweb_config::SearchConfig;
use billweb_store::{
    BoolMode, DateRange, KvStore, Query, SearchHit, SearchIndex, SearchRequest, SortOrder,
    WriteBatch,
};
use billweb_utils::{format_reg_dttm, generate_key};

pub use aggregate::{aggregate_records, AggregateReport, CategoryAggregator, Stat};
pub use classify::{classify_credit, Classification, Reason};
pub use cycle::{resolve_cycle, CycleDates, CycleDays, CycleError};
pub use error::{CoreError, CoreResult, ErrorKind, ErrorSeverity};
pub use models::{Account, Category, Record, ACCOUNT_PREFIX, CATEGORY_PREFIX, RECORD_PREFIX};
pub use types::{Bucket, PayType, QueryMode, TransactionType};

/// Shared handle to a key-value backend
pub type StoreRef = Arc<dyn KvStore>;
/// Shared handle to a search index
pub type IndexRef = Arc<dyn SearchIndex>;

impl From<QueryMode> for BoolMode {
    fn from(mode: QueryMode) -> Self {
        match mode {
            QueryMode::And => BoolMode::All,
            QueryMode::Or => BoolMode::Any,
        }
    }
}

// ==================== Queries and Results ====================

/// Parameters of the aggregate query
#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    /// Text terms; empty matches every record in the range
    pub terms: Vec<String>,
    pub mode: QueryMode,
    /// First day of the range, inclusive
    pub start: NaiveDate,
    /// Last day of the range, inclusive; also the classification reference
    pub end: NaiveDate,
}

/// Parameters of a paginated relevance search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub terms: Vec<String>,
    pub mode: QueryMode,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
}

/// One page of search results
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchPage {
    pub records: Vec<Record>,
    /// Sum of payments on this page
    pub sum_pay: Decimal,
    /// Sum of income on this page
    pub sum_income: Decimal,
    /// Matches across all pages
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Records of a date range with their sums
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PeriodSum {
    pub records: Vec<Record>,
    pub sum_pay: Decimal,
    pub sum_income: Decimal,
}

/// Entity counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LedgerSummary {
    pub records: usize,
    pub accounts: usize,
    pub categories: usize,
    /// Documents in the search index
    pub indexed: usize,
    /// Storage backend name
    pub backend: String,
}

fn sum_by_type(records: &[Record]) -> (Decimal, Decimal) {
    records.iter().fold((Decimal::ZERO, Decimal::ZERO), |(pay, income), r| {
        match r.transaction_type {
            Some(TransactionType::Payment) => (pay + r.amount, income),
            Some(TransactionType::Income) => (pay, income + r.amount),
            None => (pay, income),
        }
    })
}

// ==================== Ledger ====================

/// Main ledger service
pub struct Ledger {
    store: StoreRef,
    index: IndexRef,
    search: SearchConfig,
}

impl Ledger {
    /// Create a ledger over the given collaborators
    pub fn new(store: StoreRef, index: IndexRef, search: SearchConfig) -> Self {
        Self {
            store,
            index,
            search,
        }
    }

    // ==================== Storage Helpers ====================

    fn load<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        match self.store.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> CoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.apply(WriteBatch::new().set(key, bytes))?;
        Ok(())
    }

    /// Every entity under `prefix`; undecodable entries are skipped
    fn scan<T: DeserializeOwned>(&self, prefix: &str) -> CoreResult<Vec<T>> {
        let pairs = self.store.scan_prefix(&format!("{}:", prefix))?;
        let mut items = Vec::with_capacity(pairs.len());
        for (key, bytes) in pairs {
            match serde_json::from_slice(&bytes) {
                Ok(item) => items.push(item),
                Err(e) => log::warn!("Skipping undecodable entry {}: {}", key, e),
            }
        }
        Ok(items)
    }

    /// Store a record and index it. When indexing fails the store write is
    /// undone, so a failed call leaves no unsearchable record behind.
    fn save_indexed(&self, record: &Record, previous: Option<&Record>) -> CoreResult<()> {
        let undo = match previous {
            Some(prev) => WriteBatch::new().set(prev.id.as_str(), serde_json::to_vec(prev)?),
            None => WriteBatch::new().delete(record.id.as_str()),
        };

        self.save(&record.id, record)?;
        if let Err(e) = self.index.index(&record.id, record.to_document()) {
            if let Err(undo_err) = self.store.apply(undo) {
                log::error!("Failed to roll back record {} after index error: {}", record.id, undo_err);
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn has_prefix(id: &str, prefix: &str) -> bool {
        id.strip_prefix(prefix).map_or(false, |rest| rest.starts_with(':'))
    }

    // ==================== Records ====================

    /// Validate and store a new record, returning it with id and timestamp
    pub fn add_record(&self, mut record: Record) -> CoreResult<Record> {
        validate::validate_record(&record)?;

        let now = Local::now();
        record.id = generate_key(RECORD_PREFIX, now);
        record.reg_dttm = format_reg_dttm(now);

        self.save_indexed(&record, None)?;
        log::info!("Added record {}", record.id);
        Ok(record)
    }

    /// Replace a record, keeping its id and registration timestamp
    pub fn update_record(&self, id: &str, mut record: Record) -> CoreResult<Record> {
        validate::validate_record(&record)?;
        let existing = self.record(id)?;

        record.id = existing.id.clone();
        record.reg_dttm = existing.reg_dttm.clone();

        self.save_indexed(&record, Some(&existing))?;
        log::info!("Updated record {}", record.id);
        Ok(record)
    }

    pub fn delete_record(&self, id: &str) -> CoreResult<()> {
        self.record(id)?;
        self.store.apply(WriteBatch::new().delete(id))?;
        self.index.delete(id)?;
        log::info!("Deleted record {}", id);
        Ok(())
    }

    pub fn record(&self, id: &str) -> CoreResult<Record> {
        let not_found = || CoreError::RecordNotFound { id: id.to_string() };
        if !Self::has_prefix(id, RECORD_PREFIX) {
            return Err(not_found());
        }
        self.load(id)?.ok_or_else(not_found)
    }

    // ==================== Accounts ====================

    pub fn add_account(&self, mut account: Account) -> CoreResult<Account> {
        validate::validate_account(&account)?;

        let now = Local::now();
        account.id = generate_key(ACCOUNT_PREFIX, now);
        account.reg_dttm = format_reg_dttm(now);

        self.save(&account.id, &account)?;
        log::info!("Added account {} ({})", account.id, account.account_name);
        Ok(account)
    }

    /// Replace an account. New cycle markers apply to every later query,
    /// including queries over past periods.
    pub fn update_account(&self, id: &str, mut account: Account) -> CoreResult<Account> {
        validate::validate_account(&account)?;
        let existing = self.account(id)?;

        account.id = existing.id;
        account.reg_dttm = existing.reg_dttm;

        self.save(&account.id, &account)?;
        log::info!("Updated account {}", account.id);
        Ok(account)
    }

    pub fn delete_account(&self, id: &str) -> CoreResult<()> {
        self.account(id)?;
        self.store.apply(WriteBatch::new().delete(id))?;
        log::info!("Deleted account {}", id);
        Ok(())
    }

    pub fn account(&self, id: &str) -> CoreResult<Account> {
        let not_found = || CoreError::AccountNotFound { id: id.to_string() };
        if !Self::has_prefix(id, ACCOUNT_PREFIX) {
            return Err(not_found());
        }
        self.load(id)?.ok_or_else(not_found)
    }

    pub fn accounts(&self) -> CoreResult<Vec<Account>> {
        self.scan(ACCOUNT_PREFIX)
    }

    /// Every account keyed by id, loaded in one scan
    pub fn account_map(&self) -> CoreResult<HashMap<String, Account>> {
        Ok(self
            .accounts()?
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect())
    }

    // ==================== Categories ====================

    pub fn add_category(&self, mut category: Category) -> CoreResult<Category> {
        validate::validate_category(&category)?;

        let now = Local::now();
        category.id = generate_key(CATEGORY_PREFIX, now);
        category.reg_dttm = format_reg_dttm(now);

        self.save(&category.id, &category)?;
        log::info!("Added category {} ({})", category.id, category.category_name);
        Ok(category)
    }

    pub fn update_category(&self, id: &str, mut category: Category) -> CoreResult<Category> {
        validate::validate_category(&category)?;
        let existing = self.category(id)?;

        category.id = existing.id;
        category.reg_dttm = existing.reg_dttm;

        self.save(&category.id, &category)?;
        log::info!("Updated category {}", category.id);
        Ok(category)
    }

    pub fn delete_category(&self, id: &str) -> CoreResult<()> {
        self.category(id)?;
        self.store.apply(WriteBatch::new().delete(id))?;
        log::info!("Deleted category {}", id);
        Ok(())
    }

    pub fn category(&self, id: &str) -> CoreResult<Category> {
        let not_found = || CoreError::CategoryNotFound { id: id.to_string() };
        if !Self::has_prefix(id, CATEGORY_PREFIX) {
            return Err(not_found());
        }
        self.load(id)?.ok_or_else(not_found)
    }

    pub fn categories(&self) -> CoreResult<Vec<Category>> {
        self.scan(CATEGORY_PREFIX)
    }

    // ==================== Queries ====================

    /// Load the records behind search hits, in hit order.
    ///
    /// A hit whose record is gone or undecodable is skipped; a store failure
    /// fails the whole call.
    fn hydrate(&self, hits: &[SearchHit]) -> CoreResult<Vec<Record>> {
        let mut records = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.store.get(&hit.id)? {
                Some(bytes) => match serde_json::from_slice::<Record>(&bytes) {
                    Ok(record) => records.push(record),
                    Err(e) => log::warn!("Skipping hit {}: undecodable record ({})", hit.id, e),
                },
                None => log::warn!("Skipping hit {}: record no longer stored", hit.id),
            }
        }
        Ok(records)
    }

    /// Records matching the terms within `start..=end`, oldest first, with
    /// per-category sums split into billed and pending credit charges
    pub fn aggregate(&self, query: &RecordQuery) -> CoreResult<AggregateReport> {
        if query.start > query.end {
            return Err(CoreError::validation("start must not be after end"));
        }

        let request = SearchRequest {
            query: Query::new(query.terms.clone(), query.mode.into()).with_date_range(DateRange {
                start: query.start,
                end: query.end,
            }),
            sort: SortOrder::DateTimeAsc,
            from: 0,
            size: self.index.max_results(),
        };
        let results = self.index.search(&request)?;
        if results.total > results.hits.len() {
            log::warn!(
                "Aggregate query matched {} records; only the first {} are counted",
                results.total,
                results.hits.len()
            );
        }

        let accounts = self.account_map()?;
        let records = self.hydrate(&results.hits)?;
        log::debug!(
            "Aggregating {} records from {} to {} ({} terms, {})",
            records.len(),
            query.start,
            query.end,
            query.terms.len(),
            query.mode
        );
        Ok(aggregate_records(records, &accounts, query.end))
    }

    /// One page of records ranked by relevance
    pub fn search(&self, query: &SearchQuery) -> CoreResult<SearchPage> {
        let page = query.page.max(1);
        let page_size = if query.page_size == 0 || query.page_size > self.search.max_page_size {
            self.search.default_page_size
        } else {
            query.page_size
        };

        let request = SearchRequest {
            query: Query::new(query.terms.clone(), query.mode.into()),
            sort: SortOrder::ScoreDesc,
            from: (page - 1).saturating_mul(page_size),
            size: page_size,
        };
        let results = self.index.search(&request)?;
        let records = self.hydrate(&results.hits)?;
        let (sum_pay, sum_income) = sum_by_type(&records);

        Ok(SearchPage {
            records,
            sum_pay,
            sum_income,
            total_count: results.total,
            page,
            page_size,
        })
    }

    /// Every stored record dated within `start..=end`, straight from the store
    pub fn sum_by_period(&self, start: NaiveDate, end: NaiveDate) -> CoreResult<PeriodSum> {
        if start > end {
            return Err(CoreError::validation("start must not be after end"));
        }

        let records: Vec<Record> = self
            .scan::<Record>(RECORD_PREFIX)?
            .into_iter()
            .filter(|r| r.date_naive().map_or(false, |d| d >= start && d <= end))
            .collect();
        let (sum_pay, sum_income) = sum_by_type(&records);

        Ok(PeriodSum {
            records,
            sum_pay,
            sum_income,
        })
    }

    /// Rebuild the search index from the store, returning the document count
    pub fn reindex(&self) -> CoreResult<usize> {
        self.index.clear()?;
        let records: Vec<Record> = self.scan(RECORD_PREFIX)?;
        for record in &records {
            self.index.index(&record.id, record.to_document())?;
        }
        log::info!("Indexed {} records from {} store", records.len(), self.store.name());
        Ok(records.len())
    }

    pub fn summary(&self) -> CoreResult<LedgerSummary> {
        Ok(LedgerSummary {
            records: self.store.count_prefix(&format!("{}:", RECORD_PREFIX))?,
            accounts: self.store.count_prefix(&format!("{}:", ACCOUNT_PREFIX))?,
            categories: self.store.count_prefix(&format!("{}:", CATEGORY_PREFIX))?,
            indexed: self.index.doc_count()?,
            backend: self.store.name().to_string(),
        })
    }
}

// ==================== Tests ====================
