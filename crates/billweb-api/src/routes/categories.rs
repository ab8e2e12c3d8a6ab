//! Category endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use billweb_core::Category;
use serde_json::{json, Value};

use super::{body, required, Params};
use crate::{ApiError, AppState};

pub async fn add_category(
    State(state): State<AppState>,
    payload: Result<Json<Category>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = body(payload)?;
    let category = state
        .ledger
        .add_category(category)
        .map_err(|e| ApiError::logged("add_category", e))?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    payload: Result<Json<Category>, JsonRejection>,
) -> Result<Json<Category>, ApiError> {
    let id = required(&params, "id")?;
    let category = body(payload)?;
    let category = state
        .ledger
        .update_category(id, category)
        .map_err(|e| ApiError::logged("update_category", e))?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    let id = required(&params, "id")?;
    state
        .ledger
        .delete_category(id)
        .map_err(|e| ApiError::logged("delete_category", e))?;
    Ok(Json(json!({ "status": "success" })))
}

pub async fn get_categories(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Json<Value>, ApiError> {
    let result = match params.get("id").filter(|id| !id.is_empty()) {
        Some(id) => state.ledger.category(id).map(|c| json!(c)),
        None => state.ledger.categories().map(|list| json!(list)),
    };
    let value = result.map_err(|e| ApiError::logged("get_categories", e))?;
    Ok(Json(value))
}
