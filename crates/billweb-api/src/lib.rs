//! HTTP JSON API server
//!
//! Routes are organized into modules:
//! - routes::records: record CRUD, aggregate, search and sums
//! - routes::accounts: payment accounts
//! - routes::categories: categories

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use billweb_config::Config;
use billweb_core::{Ledger, LedgerSummary};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub config: Config,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::accounts::{add_account, delete_account, get_accounts, update_account};
    use routes::categories::{add_category, delete_category, get_categories, update_category};
    use routes::records::{
        add_record, aggregate_records, delete_record, search_records, sum_records, update_record,
    };

    let cors_enable = state.config.server.cors_enable;

    let router = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/summary", get(api_summary))
        .route("/api/reindex", post(api_reindex))
        .route(
            "/api/record",
            get(aggregate_records)
                .post(add_record)
                .put(update_record)
                .delete(delete_record),
        )
        .route("/api/record/search", get(search_records))
        .route("/api/record/sum", get(sum_records))
        .route(
            "/api/account",
            get(get_accounts)
                .post(add_account)
                .put(update_account)
                .delete(delete_account),
        )
        .route(
            "/api/category",
            get(get_categories)
                .post(add_category)
                .put(update_category)
                .delete(delete_category),
        )
        .with_state(state);

    if cors_enable {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Entity counts
async fn api_summary(State(state): State<AppState>) -> Result<Json<LedgerSummary>, ApiError> {
    let summary = state
        .ledger
        .summary()
        .map_err(|e| ApiError::logged("summary", e))?;
    Ok(Json(summary))
}

/// Rebuild the search index from the store
async fn api_reindex(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let indexed = state
        .ledger
        .reindex()
        .map_err(|e| ApiError::logged("reindex", e))?;
    Ok(Json(json!({ "status": "success", "indexed": indexed })))
}

/// Serve until Ctrl-C or SIGTERM
pub async fn start_server(config: Config, ledger: Arc<Ledger>) -> std::io::Result<()> {
    let addr = config.listen_addr();
    let state = AppState { ledger, config };
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting billweb server on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use billweb_store::{MemoryIndex, MemoryStore};
    use tower::ServiceExt;

    fn app() -> Router {
        let config = Config::default();
        let ledger = Ledger::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryIndex::new(config.search.max_results)),
            config.search.clone(),
        );
        create_router(AppState {
            ledger: Arc::new(ledger),
            config,
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn record(pay_type: &str, amount: i64, date: &str, extra: Value) -> Value {
        let mut value = json!({
            "transaction-type": "payment",
            "pay-type": pay_type,
            "currency": "KRW",
            "amount": amount,
            "category": "food",
            "date": date,
            "description": "lunch"
        });
        if let (Some(obj), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        value
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_record_lifecycle() {
        let app = app();
        let (status, created) =
            send(&app, Method::POST, "/api/record", Some(record("direct", 12000, "2024-06-01", json!({})))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/record?id={}", id),
            Some(record("direct", 15000, "2024-06-01", json!({}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["amount"], "15000");
        assert_eq!(updated["reg-dttm"], created["reg-dttm"]);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/record?id={}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::DELETE, &format!("/api/record?id={}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "RECORD_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_validation_and_bad_bodies_are_400() {
        let app = app();
        let (status, body) =
            send(&app, Method::POST, "/api/record", Some(record("direct", 0, "2024-06-01", json!({})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "amount is required and must be non-zero");

        let (status, body) =
            send(&app, Method::POST, "/api/record", Some(record("cash", 10, "2024-06-01", json!({})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");

        let (status, _) = send(&app, Method::PUT, "/api/record", Some(record("direct", 10, "2024-06-01", json!({})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_aggregate_endpoint() {
        let app = app();
        let (_, account) = send(
            &app,
            Method::POST,
            "/api/account",
            Some(json!({
                "account-name": "Card",
                "pay-type": "credit",
                "repay-day": "15",
                "use-day-from": "1",
                "use-day-to": "31"
            })),
        )
        .await;
        let account_id = account["id"].as_str().unwrap().to_string();

        for (amount, date) in [(7000, "2024-05-10"), (3000, "2024-06-05")] {
            let body = record("credit", amount, date, json!({ "account-id": account_id }));
            let (status, _) = send(&app, Method::POST, "/api/record", Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let income = json!({
            "transaction-type": "record_type_income",
            "pay-type": "direct",
            "currency": "KRW",
            "amount": "50000.50",
            "category": "salary",
            "date": "2024-06-01"
        });
        send(&app, Method::POST, "/api/record", Some(income)).await;

        let (status, report) =
            send(&app, Method::GET, "/api/record?start=2024-05-01&end=2024-06-20&queryType=bogus", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["records"].as_array().unwrap().len(), 3);
        assert_eq!(report["stat-billed"]["food"]["amount"], "7000");
        assert_eq!(report["stat-pending"]["food"]["amount"], "3000");
        assert_eq!(report["total-pay"], "7000");
        assert_eq!(report["total-credit-pay"], "3000");
        assert_eq!(report["total-income"], "50000.50");

        let (status, _) = send(&app, Method::GET, "/api/record?start=2024-05-01", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_and_sum_endpoints() {
        let app = app();
        for day in 1..=3 {
            let body = record("direct", 1000, &format!("2024-06-0{}", day), json!({}));
            send(&app, Method::POST, "/api/record", Some(body)).await;
        }

        let (status, page) = send(&app, Method::GET, "/api/record/search?q=lunch&page=1&pageSize=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total-count"], 3);
        assert_eq!(page["records"].as_array().unwrap().len(), 2);
        assert_eq!(page["sum-pay"], "2000");

        let (status, _) = send(&app, Method::GET, "/api/record/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, sum) = send(&app, Method::GET, "/api/record/sum?start=2024-06-02&end=2024-06-03", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sum["sum-pay"], "2000");
    }

    #[tokio::test]
    async fn test_categories_and_summary() {
        let app = app();
        let (status, category) =
            send(&app, Method::POST, "/api/category", Some(json!({ "category-name": "food" }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, list) = send(&app, Method::GET, "/api/category", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let id = category["id"].as_str().unwrap();
        let (status, one) = send(&app, Method::GET, &format!("/api/category?id={}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["category-name"], "food");

        let (status, summary) = send(&app, Method::GET, "/api/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["categories"], 1);

        let (status, reindex) = send(&app, Method::POST, "/api/reindex", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reindex["indexed"], 0);
    }
}
