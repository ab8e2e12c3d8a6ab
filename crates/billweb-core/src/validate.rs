//! Write-side validation
//!
//! Checks run in a fixed order and stop at the first failure, so the message
//! names exactly one field.

use rust_decimal::Decimal;

use billweb_utils::{parse_date, parse_time};

use crate::error::{CoreError, CoreResult};
use crate::models::{Account, Category, Record};
use crate::types::PayType;

pub fn validate_record(record: &Record) -> CoreResult<()> {
    if record.transaction_type.is_none() {
        return Err(CoreError::validation("transaction-type is required"));
    }
    if record.currency.trim().is_empty() {
        return Err(CoreError::validation("currency is required"));
    }
    match record.pay_type {
        None => return Err(CoreError::validation("pay-type is required")),
        Some(PayType::Hybrid) => {
            return Err(CoreError::validation(
                "pay-type of a record must be direct or credit",
            ))
        }
        Some(_) => {}
    }
    if record.amount == Decimal::ZERO {
        return Err(CoreError::validation("amount is required and must be non-zero"));
    }
    if record.category.trim().is_empty() {
        return Err(CoreError::validation("category is required"));
    }
    if record.date.is_empty() {
        return Err(CoreError::validation("date is required"));
    }
    if parse_date(&record.date).is_none() {
        return Err(CoreError::validation("invalid date format: use YYYY-MM-DD"));
    }
    if !record.time.is_empty() && parse_time(&record.time).is_none() {
        return Err(CoreError::validation("invalid time format: use HH:MM"));
    }
    if record.pay_type == Some(PayType::Credit) && record.account_id.trim().is_empty() {
        return Err(CoreError::validation("account-id is required for credit payments"));
    }
    Ok(())
}

pub fn validate_account(account: &Account) -> CoreResult<()> {
    if account.account_name.trim().is_empty() {
        return Err(CoreError::validation("account-name is required"));
    }
    if account.pay_type.is_none() {
        return Err(CoreError::validation("pay-type is required"));
    }
    Ok(())
}

pub fn validate_category(category: &Category) -> CoreResult<()> {
    if category.category_name.trim().is_empty() {
        return Err(CoreError::validation("category-name is required"));
    }
    Ok(())
}
