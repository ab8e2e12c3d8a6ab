//! Billed/pending classification of credit payments
//!
//! A credit charge is billed when the statement covering it has closed as of
//! the query's end date. The owning account's current cycle markers decide
//! which statement that is.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::cycle::{resolve_cycle, CycleDays};
use crate::models::{Account, Record};
use crate::types::Bucket;

/// Which rule produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    /// Charged before the window adjacent to the end date opened
    ClosedEarlierCycle,
    /// Inside the adjacent window and its repay date has passed
    StatementClosed,
    /// Statement not closed yet as of the end date
    OpenCycle,
    /// Account missing or its cycle markers unusable
    Unconfigured,
    /// Record date could not be read
    Undated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub bucket: Bucket,
    pub reason: Reason,
}

impl Classification {
    fn billed(reason: Reason) -> Self {
        Self {
            bucket: Bucket::Billed,
            reason,
        }
    }

    fn pending(reason: Reason) -> Self {
        Self {
            bucket: Bucket::Pending,
            reason,
        }
    }
}

/// Classify one credit record for a query ending on `end_date`.
///
/// Never fails: anything that prevents resolving the cycle leaves the charge
/// pending, so spending is never hidden as already billed.
pub fn classify_credit(record: &Record, account: Option<&Account>, end_date: NaiveDate) -> Classification {
    let Some(account) = account else {
        log::warn!(
            "Record {} references unknown account {:?}; counting it as pending",
            record.id,
            record.account_id
        );
        return Classification::pending(Reason::Unconfigured);
    };

    let cycle = CycleDays::from_account(account)
        .and_then(|days| resolve_cycle(days, end_date));
    let dates = match cycle {
        Ok(dates) => dates,
        Err(e) => {
            log::warn!(
                "Account {} has no usable statement cycle ({}); record {} counted as pending",
                account.id,
                e,
                record.id
            );
            return Classification::pending(Reason::Unconfigured);
        }
    };

    let Some(charged_at) = record.datetime() else {
        log::warn!("Record {} has unreadable date {:?}", record.id, record.date);
        return Classification::pending(Reason::Undated);
    };

    let end = end_date.and_time(NaiveTime::MIN);
    let classification = if charged_at < dates.use_date_from {
        Classification::billed(Reason::ClosedEarlierCycle)
    } else if charged_at <= dates.use_date_to && end >= dates.repay_date {
        Classification::billed(Reason::StatementClosed)
    } else {
        Classification::pending(Reason::OpenCycle)
    };

    log::debug!(
        "Record {} at {} -> {} ({:?}; window {}..{}, repay {})",
        record.id,
        charged_at,
        classification.bucket,
        classification.reason,
        dates.use_date_from,
        dates.use_date_to,
        dates.repay_date
    );
    classification
}
