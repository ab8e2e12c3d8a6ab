//! Core data models for the ledger
//!
//! These are the persisted shapes. They are stored as JSON under namespaced
//! keys and use kebab-case field names on the wire.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use billweb_store::Document;
use billweb_utils::{parse_date, parse_time};

use super::types::{PayType, TransactionType};

/// Key prefix of stored records
pub const RECORD_PREFIX: &str = "record";
/// Key prefix of stored accounts
pub const ACCOUNT_PREFIX: &str = "account";
/// Key prefix of stored categories
pub const CATEGORY_PREFIX: &str = "category";

/// Payment account (cash, card, ...) with its statement-cycle markers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub account_name: String,
    /// direct, credit or hybrid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_type: Option<PayType>,
    /// Day of month the statement is paid; free text, parsed on use
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repay_day: String,
    /// First day of the usage window
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub use_day_from: String,
    /// Last day of the usage window
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub use_day_to: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Registration timestamp (`YYYYMMDDHHMMSS`)
    #[serde(default)]
    pub reg_dttm: String,
}

/// Spending category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Category {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub reg_dttm: String,
}

/// A single payment or income entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    /// Owning account, required for credit payments
    #[serde(default)]
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pay_type: Option<PayType>,
    #[serde(default)]
    pub currency: String,
    /// Signed amount, never zero once validated
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Record date (YYYY-MM-DD format)
    #[serde(default)]
    pub date: String,
    /// Time of day (HH:MM format), may be empty
    #[serde(default)]
    pub time: String,
    /// Registration timestamp (`YYYYMMDDHHMMSS`), never changed by updates
    #[serde(default)]
    pub reg_dttm: String,
}

impl Record {
    /// Get the record date as NaiveDate
    pub fn date_naive(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// Get the time of day, if present and well-formed
    pub fn time_naive(&self) -> Option<NaiveTime> {
        if self.time.is_empty() {
            None
        } else {
            parse_time(&self.time)
        }
    }

    /// Date and time combined; a missing time counts as midnight
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        let date = self.date_naive()?;
        let time = self.time_naive().unwrap_or(NaiveTime::MIN);
        Some(date.and_time(time))
    }

    pub fn is_credit_payment(&self) -> bool {
        self.transaction_type == Some(TransactionType::Payment)
            && self.pay_type == Some(PayType::Credit)
    }

    /// Searchable view of the record
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new()
            .field("description", self.description.as_str())
            .field("category", self.category.as_str())
            .field("currency", self.currency.as_str())
            .field("account-id", self.account_id.as_str())
            .with_date(self.date_naive())
            .with_time(self.time_naive());
        if let Some(t) = self.transaction_type {
            doc = doc.field("transaction-type", t.to_string());
        }
        if let Some(p) = self.pay_type {
            doc = doc.field("pay-type", p.to_string());
        }
        doc
    }
}
