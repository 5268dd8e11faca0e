use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::task;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::error::ServiceError;
use crate::fetcher::CoindeskFetcher;
use crate::models::{CoinRequest, CoinResponse};
use crate::service::CoinService;
use crate::store::SqliteStore;

type Service = Arc<CoinService<SqliteStore, CoindeskFetcher>>;

pub async fn serve(cfg: Config, service: Service) -> eyre::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(|| async { "Coindesk Proxy API running" }))
        .route("/coin/:name", get(query_coin).delete(delete_coin))
        .route("/coin", post(create_coin).put(update_coin))
        .route("/coindesk", get(fetch_external))
        .route("/convert", get(convert))
        .layer(cors)
        .with_state(service);

    let addr = SocketAddr::from(([127, 0, 0, 1], cfg.port));
    info!("API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Render a service failure as an HTTP response. Delete on a missing coin
/// keeps the literal "Exception!" body.
fn error_response(err: ServiceError) -> (StatusCode, String) {
    match err {
        ServiceError::NotFound => (StatusCode::NOT_FOUND, "Exception!".to_string()),
        ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        ServiceError::Network(msg) => (StatusCode::BAD_GATEWAY, msg),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// A panicked store task answers 500 rather than taking the worker down.
fn join_error(err: task::JoinError) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

// ---------- handlers (store calls via spawn_blocking) ----------

async fn query_coin(
    State(svc): State<Service>,
    Path(name): Path<String>,
) -> Result<Json<CoinResponse>, (StatusCode, String)> {
    task::spawn_blocking(move || svc.query(&name))
        .await
        .map_err(join_error)?
        .map(Json)
        .map_err(error_response)
}

async fn create_coin(
    State(svc): State<Service>,
    Json(req): Json<CoinRequest>,
) -> Result<String, (StatusCode, String)> {
    task::spawn_blocking(move || svc.create(req))
        .await
        .map_err(join_error)?
        .map(|msg| msg.to_string())
        .map_err(error_response)
}

async fn update_coin(
    State(svc): State<Service>,
    Json(req): Json<CoinRequest>,
) -> Result<Json<CoinResponse>, (StatusCode, String)> {
    task::spawn_blocking(move || svc.update(req))
        .await
        .map_err(join_error)?
        .map(Json)
        .map_err(error_response)
}

async fn delete_coin(
    State(svc): State<Service>,
    Path(name): Path<String>,
) -> Result<String, (StatusCode, String)> {
    task::spawn_blocking(move || svc.delete(&name))
        .await
        .map_err(join_error)?
        .map(|msg| msg.to_string())
        .map_err(error_response)
}

async fn fetch_external(State(svc): State<Service>) -> Result<String, (StatusCode, String)> {
    svc.fetch_external().await.map_err(error_response)
}

async fn convert(
    State(svc): State<Service>,
) -> Result<Json<CoinResponse>, (StatusCode, String)> {
    svc.convert().await.map(Json).map_err(error_response)
}
