//! Route modules for the API server
//!
//! - records: record CRUD, the aggregate query, search and period sums
//! - accounts: payment account CRUD
//! - categories: category CRUD
//!
//! Query strings are read into a `HashMap` and parsed by the helpers below.

pub mod accounts;
pub mod categories;
pub mod records;

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use billweb_utils::{parse_date, split_terms};
use chrono::NaiveDate;

use crate::ApiError;

pub type Params = HashMap<String, String>;

/// A non-empty query parameter
pub(crate) fn required<'a>(params: &'a Params, name: &str) -> Result<&'a str, ApiError> {
    params
        .get(name)
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("Query parameter '{}' is required", name)))
}

/// A required `YYYY-MM-DD` query parameter
pub(crate) fn required_date(params: &Params, name: &str) -> Result<NaiveDate, ApiError> {
    let value = required(params, name)?;
    parse_date(value).ok_or_else(|| {
        ApiError::bad_request(format!("Query parameter '{}' must be a date (YYYY-MM-DD)", name))
    })
}

/// Whitespace separated terms of `q`, empty when absent
pub(crate) fn terms(params: &Params) -> Vec<String> {
    params.get("q").map(|q| split_terms(q)).unwrap_or_default()
}

/// Unwrap a JSON body, turning extractor rejections into 400s
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text())))
}
