use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use pantry_inventory::StockMove;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items))
        .route("/items/add", post(add_item))
        .route("/items/remove", post(remove_item))
        .route("/search", get(search_item))
}

pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.inventory().await {
        Ok(snapshot) => (StatusCode::OK, Json(dto::snapshot_to_json(&snapshot))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ItemNameRequest>, JsonRejection>,
) -> axum::response::Response {
    match body {
        Ok(Json(body)) => apply_move(&services, StockMove::Add, &body.name).await,
        Err(rejection) => errors::json_rejection_to_response(rejection),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ItemNameRequest>, JsonRejection>,
) -> axum::response::Response {
    match body {
        Ok(Json(body)) => apply_move(&services, StockMove::Remove, &body.name).await,
        Err(rejection) => errors::json_rejection_to_response(rejection),
    }
}

pub async fn search_item(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    match services.lookup(&query.name).await {
        Ok(Some(record)) => (StatusCode::OK, Json(dto::record_to_json(&record))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "item not found"),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

async fn apply_move(services: &AppServices, mv: StockMove, name: &str) -> axum::response::Response {
    let applied = match services.apply(mv, name).await {
        Ok(v) => v,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    // The move is in the store: 200 even if the re-list failed.
    let mut body = serde_json::json!({
        "outcome": dto::outcome_to_json(mv, &applied.outcome),
        "inventory": serde_json::Value::Null,
    });
    match applied.inventory {
        Ok(snapshot) => body["inventory"] = dto::snapshot_to_json(&snapshot),
        Err(e) => body["refresh_error"] = errors::ledger_error_body(e),
    }

    (StatusCode::OK, Json(body)).into_response()
}
