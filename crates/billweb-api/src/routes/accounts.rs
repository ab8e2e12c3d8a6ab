//! Account endpoints
//!
//! GET without `id` lists every account; with `id` it returns one.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use billweb_core::Account;
use serde_json::{json, Value};

use super::{body, required, Params};
use crate::{ApiError, AppState};

pub async fn add_account(
    State(state): State<AppState>,
    payload: Result<Json<Account>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = body(payload)?;
    let account = state
        .ledger
        .add_account(account)
        .map_err(|e| ApiError::logged("add_account", e))?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_account(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    payload: Result<Json<Account>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let id = required(&params, "id")?;
    let account = body(payload)?;
    let account = state
        .ledger
        .update_account(id, account)
        .map_err(|e| ApiError::logged("update_account", e))?;
    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    let id = required(&params, "id")?;
    state
        .ledger
        .delete_account(id)
        .map_err(|e| ApiError::logged("delete_account", e))?;
    Ok(Json(json!({ "status": "success" })))
}

pub async fn get_accounts(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    let result = match params.get("id").filter(|id| !id.is_empty()) {
        Some(id) => state.ledger.account(id).map(|a| json!(a)),
        None => state.ledger.accounts().map(|list| json!(list)),
    };
    let value = result.map_err(|e| ApiError::logged("get_accounts", e))?;
    Ok(Json(value))
}
