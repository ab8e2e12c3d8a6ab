//! Per-category spending totals
//!
//! Direct payments and billed credit charges land in the billed map, pending
//! credit charges in the pending map. Income only feeds its own total.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::classify::{classify_credit, Reason};
use crate::models::{Account, Record};
use crate::types::{Bucket, PayType, TransactionType};

/// Accumulated amount of one category in one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub category: String,
    pub amount: Decimal,
}

/// Running state of one aggregation pass
#[derive(Debug, Clone, Default)]
pub struct CategoryAggregator {
    stat_billed: BTreeMap<String, Stat>,
    stat_pending: BTreeMap<String, Stat>,
    total_pay: Decimal,
    total_credit_pay: Decimal,
    total_income: Decimal,
    unconfigured_count: usize,
}

fn add_to(stats: &mut BTreeMap<String, Stat>, category: &str, amount: Decimal) {
    stats
        .entry(category.to_string())
        .or_insert_with(|| Stat {
            category: category.to_string(),
            amount: Decimal::ZERO,
        })
        .amount += amount;
}

impl CategoryAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a payment whose statement has closed (or that never had one)
    pub fn add_billed(&mut self, category: &str, amount: Decimal) {
        add_to(&mut self.stat_billed, category, amount);
        self.total_pay += amount;
    }

    /// Count a credit charge still waiting for its statement
    pub fn add_pending(&mut self, category: &str, amount: Decimal) {
        add_to(&mut self.stat_pending, category, amount);
        self.total_credit_pay += amount;
    }

    pub fn add_income(&mut self, amount: Decimal) {
        self.total_income += amount;
    }

    /// Route one record; credit payments are classified against `end_date`
    pub fn add_record(&mut self, record: &Record, accounts: &HashMap<String, Account>, end_date: NaiveDate) {
        match (record.transaction_type, record.pay_type) {
            (Some(TransactionType::Income), _) => self.add_income(record.amount),
            (Some(TransactionType::Payment), Some(PayType::Direct)) => {
                self.add_billed(&record.category, record.amount)
            }
            (Some(TransactionType::Payment), Some(PayType::Credit)) => {
                let classification = classify_credit(record, accounts.get(&record.account_id), end_date);
                if classification.reason == Reason::Unconfigured {
                    self.unconfigured_count += 1;
                }
                match classification.bucket {
                    Bucket::Billed => self.add_billed(&record.category, record.amount),
                    Bucket::Pending => self.add_pending(&record.category, record.amount),
                }
            }
            _ => log::debug!("Record {} contributes to no total", record.id),
        }
    }

    pub fn finish(self, records: Vec<Record>) -> AggregateReport {
        AggregateReport {
            records,
            stat_billed: self.stat_billed,
            stat_pending: self.stat_pending,
            total_pay: self.total_pay,
            total_credit_pay: self.total_credit_pay,
            total_income: self.total_income,
            unconfigured_count: self.unconfigured_count,
        }
    }
}

/// Result of an aggregate query
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AggregateReport {
    /// Matched records, oldest first
    pub records: Vec<Record>,
    pub stat_billed: BTreeMap<String, Stat>,
    pub stat_pending: BTreeMap<String, Stat>,
    /// Direct payments plus billed credit charges
    pub total_pay: Decimal,
    /// Pending credit charges
    pub total_credit_pay: Decimal,
    pub total_income: Decimal,
    /// Credit charges left pending because their account is unconfigured
    pub unconfigured_count: usize,
}

/// Aggregate `records` as of `end_date`
pub fn aggregate_records(
    records: Vec<Record>,
    accounts: &HashMap<String, Account>,
    end_date: NaiveDate,
) -> AggregateReport {
    let mut aggregator = CategoryAggregator::new();
    for record in &records {
        aggregator.add_record(record, accounts, end_date);
    }
    if aggregator.unconfigured_count > 0 {
        log::warn!(
            "{} credit record(s) left pending because their account has no usable cycle",
            aggregator.unconfigured_count
        );
    }
    aggregator.finish(records)
}
