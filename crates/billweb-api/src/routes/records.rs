//! Record endpoints
//!
//! - POST   /api/record            add
//! - PUT    /api/record?id=        update
//! - DELETE /api/record?id=        delete
//! - GET    /api/record            aggregate by statement cycle
//! - GET    /api/record/search     paginated relevance search
//! - GET    /api/record/sum        period sums

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use billweb_core::{AggregateReport, PeriodSum, QueryMode, Record, RecordQuery, SearchPage, SearchQuery};
use serde_json::{json, Value};

use super::{body, required, required_date, terms, Params};
use crate::{ApiError, AppState};

pub async fn add_record(
    State(state): State<AppState>,
    payload: Result<Json<Record>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let record = body(payload)?;
    let record = state
        .ledger
        .add_record(record)
        .map_err(|e| ApiError::logged("add_record", e))?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_record(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    payload: Result<Json<Record>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let id = required(&params, "id")?;
    let record = body(payload)?;
    let record = state
        .ledger
        .update_record(id, record)
        .map_err(|e| ApiError::logged("update_record", e))?;
    Ok(Json(record))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    let id = required(&params, "id")?;
    state
        .ledger
        .delete_record(id)
        .map_err(|e| ApiError::logged("delete_record", e))?;
    Ok(Json(json!({ "status": "success" })))
}

/// Records in `start..=end` matching `q`, with billed and pending sums
pub async fn aggregate_records(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<AggregateReport>, ApiError> {
    let query = RecordQuery {
        terms: terms(&params),
        mode: QueryMode::parse_lenient(params.get("queryType").map(|s| s.as_str())),
        start: required_date(&params, "start")?,
        end: required_date(&params, "end")?,
    };
    let report = state
        .ledger
        .aggregate(&query)
        .map_err(|e| ApiError::logged("aggregate_records", e))?;
    Ok(Json(report))
}

pub async fn search_records(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<SearchPage>, ApiError> {
    required(&params, "q")?;
    let query = SearchQuery {
        terms: terms(&params),
        mode: QueryMode::parse_lenient(params.get("queryType").map(|s| s.as_str())),
        page: params.get("page").and_then(|s| s.parse().ok()).unwrap_or(1),
        page_size: params.get("pageSize").and_then(|s| s.parse().ok()).unwrap_or(0),
    };
    let page = state
        .ledger
        .search(&query)
        .map_err(|e| ApiError::logged("search_records", e))?;
    Ok(Json(page))
}

pub async fn sum_records(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<PeriodSum>, ApiError> {
    let start = required_date(&params, "start")?;
    let end = required_date(&params, "end")?;
    let sum = state
        .ledger
        .sum_by_period(start, end)
        .map_err(|e| ApiError::logged("sum_records", e))?;
    Ok(Json(sum))
}
