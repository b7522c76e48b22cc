mod dml;
mod health;
mod normalization;
mod query;
mod schema;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/schema", post(schema::apply_schema))
        .route("/api/current_schema", get(schema::current_schema))
        .route("/api/tables", get(schema::list_tables))
        .route("/api/table_details/{table_name}", get(schema::table_details))
        .route("/api/execute_select", post(query::execute_select))
        .route("/api/execute_dml", post(dml::execute_dml))
        .route("/api/analyze_normalization", post(normalization::analyze_normalization))
        .route("/api/decompose/3nf", post(normalization::decompose_3nf))
        .route("/api/decompose/bcnf", post(normalization::decompose_bcnf))
        .route("/api/save_decomposition", post(normalization::save_decomposition))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
